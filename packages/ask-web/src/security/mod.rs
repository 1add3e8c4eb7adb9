//! Credential handling and SSRF protection.

pub mod credentials;
pub mod validator;

pub use credentials::ApiKey;
pub use validator::UrlValidator;
