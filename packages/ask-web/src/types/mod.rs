pub mod chat;
pub mod chunk;
pub mod config;
pub mod page;
