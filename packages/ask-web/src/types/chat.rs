//! Conversation messages and chat replies.

use serde::{Deserialize, Serialize};

use super::chunk::SearchResult;

/// Reply text when retrieval finds nothing to ground an answer on.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content found for your query.";

/// Reply text when the session has no usable store.
pub const STORAGE_UNAVAILABLE: &str =
    "Please scrape a website first or check your storage connection.";

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Outcome of answering one question.
///
/// Only `Answer` involved a successful generation call. The other variants
/// are still shown to the user as plain chat text.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// Generated answer and the chunks it was grounded on
    Answer {
        text: String,
        sources: Vec<SearchResult>,
    },

    /// Retrieval returned nothing; the generator was not called
    NoRelevantContent,

    /// The generator failed; `message` embeds the underlying error
    GenerationFailed {
        message: String,
        sources: Vec<SearchResult>,
    },

    /// The store could not be queried
    StorageUnavailable,
}

impl ChatReply {
    /// Text to display and record in the transcript.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer { text, .. } => text.as_str(),
            Self::NoRelevantContent => NO_RELEVANT_CONTENT,
            Self::GenerationFailed { message, .. } => message.as_str(),
            Self::StorageUnavailable => STORAGE_UNAVAILABLE,
        }
    }

    /// Chunks retrieved for this reply, if any.
    pub fn sources(&self) -> &[SearchResult] {
        match self {
            Self::Answer { sources, .. } | Self::GenerationFailed { sources, .. } => sources.as_slice(),
            Self::NoRelevantContent | Self::StorageUnavailable => &[],
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }
}
