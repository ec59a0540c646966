use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A training example whose tag line and word line disagree in length.
    #[error("malformed corpus line {line}: {tags} tags for {words} words")]
    MalformedCorpusLine {
        line: usize,
        tags: usize,
        words: usize,
    },
    /// Training produced no usable rows.
    #[error("empty model: no training examples")]
    EmptyModel,
    /// The decoder frontier ran dry before the last word.
    #[error("no path found: frontier exhausted at word {position}")]
    NoPathFound { position: usize },
    /// The tag file and the word file have different line counts.
    #[error("unaligned corpus: one input ends at line {line}")]
    UnalignedCorpus { line: usize },
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid argument {arg}: {msg}")]
    InvalidArgument { arg: &'static str, msg: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_model<S: Into<String>>(msg: S) -> Self {
        Self::InvalidModel(msg.into())
    }

    pub(crate) fn invalid_argument<S: Into<String>>(arg: &'static str, msg: S) -> Self {
        Self::InvalidArgument {
            arg,
            msg: msg.into(),
        }
    }
}
