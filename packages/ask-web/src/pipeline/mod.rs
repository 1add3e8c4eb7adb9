//! Chunking, storage writes, answering and the voice front end.

pub mod answer;
pub mod chunk;
pub mod prompts;
pub mod store_writer;
pub mod voice;

pub use answer::AnswerComposer;
pub use chunk::Chunker;
pub use store_writer::{replace_pages, write_pages};
pub use voice::{VoiceAssistant, VoiceReply};
