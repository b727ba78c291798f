use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: vector for {word:?} has {found} values, expected {expected}")]
    DimensionMismatch {
        word: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    #[error("record {id}: {source}")]
    Record {
        id: String,
        #[source]
        source: AlignError,
    },
}

/// Reasons a character-level answer span cannot be mapped onto tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("answer offsets {start}..={end} fall outside a context of {len} chars")]
    OffsetsOutOfBounds { start: usize, end: usize, len: usize },

    #[error("answer start maps to token {start} but the context has {total} tokens")]
    StartOutOfRange { start: isize, total: usize },

    #[error("text up to the answer end produced no tokens")]
    EmptyAnswerPrefix,

    #[error("end token {token:?} not found at or after token {start}")]
    EndTokenNotFound { token: String, start: usize },

    #[error("aligned span reads {found:?}, expected {expected:?}")]
    SpanMismatch { expected: String, found: String },

    #[error("token span {start}..={end} was truncated out of the encoded sequence")]
    Truncated { start: usize, end: usize },
}

impl Error {
    pub(crate) fn record(id: impl Into<String>, source: AlignError) -> Self {
        Error::Record {
            id: id.into(),
            source,
        }
    }
}
