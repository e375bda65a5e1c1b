use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The target fragment has more words than the text it is matched against.
    #[error("match precondition violated: target has {target_words} words, source only {source_words}")]
    MatchPrecondition {
        target_words: usize,
        source_words: usize,
    },
    #[error("empty input: {what}")]
    EmptyInput { what: &'static str },
    /// A fragment still had words to place after the last reference verse was filled.
    #[error(
        "fragment {fragment_index} runs past the end of the reference \
         (last verse {verse_id}, {assigned_words} words placed)"
    )]
    ReferenceExhausted {
        fragment_index: usize,
        verse_id: u32,
        assigned_words: usize,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn empty(what: &'static str) -> Self {
        Self::EmptyInput { what }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
