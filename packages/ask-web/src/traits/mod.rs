//! Capability traits for the external engines the pipeline drives.
//!
//! Browsers, OCR engines, language models, embedders, vector stores and
//! speech services are all consumed through these seams. The library ships
//! real and mock implementations; applications pick one per capability.

pub mod ai;
pub mod browser;
pub mod ocr;
pub mod store;
pub mod voice;
