use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the splitter and the topic-modeling workflow.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report: {0}")]
    Report(#[source] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Found input variables with inconsistent numbers of samples: {features} rows, {labels} labels")]
    ShapeMismatch { features: usize, labels: usize },

    #[error("Cannot split an empty dataset")]
    EmptyDataset,

    #[error("With n_samples={n_samples}, test_size={test_size} the {side} set would be empty")]
    EmptyPartition {
        n_samples: usize,
        test_size: f64,
        side: &'static str,
    },

    #[error("The least populated class has only {0} member, which is too few (minimum is 2)")]
    ClassTooSmall(usize),

    #[error("The {side} size {size} should be greater than or equal to the number of classes {classes}")]
    TooFewSamples {
        side: &'static str,
        size: usize,
        classes: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cannot build a dictionary without documents")]
    NoDocuments,

    #[error("Dictionary is empty")]
    EmptyDictionary,

    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Token id {id} is outside the vocabulary of {vocab_size} terms")]
    TokenOutOfRange { id: usize, vocab_size: usize },

    #[error("Topic {topic} does not exist (model has {num_topics} topics)")]
    UnknownTopic { topic: usize, num_topics: usize },

    #[error("Model file {path} is inconsistent: {reason}")]
    CorruptModel { path: PathBuf, reason: String },

    #[error("Malformed line {line} in {path}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
