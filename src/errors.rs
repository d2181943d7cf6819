use thiserror::Error;

/// Returned when a record has no tokens left to segment.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot segment a record without tokens")]
pub struct EmptyInputError;

/// Returned when a training block carries a label the knowledge base doesn't know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("label {label:?} is neither \"none\" nor a knowledge base attribute")]
pub struct UnknownLabelError {
    pub label: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainingError {
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabelError),
    #[error("block at position {position} was never labeled")]
    Unlabeled { position: usize },
}

#[derive(Error, Debug)]
pub enum KnowledgeBaseLoadingError {
    #[error("cannot read knowledge base from file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("malformed knowledge base file: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
#[error("cannot read stop words from file: {0}")]
pub struct StopWordsLoadingError(#[from] pub std::io::Error);

#[derive(Error, Debug)]
pub enum ModelLoadingError {
    #[error("cannot read model from file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("malformed model file: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("model has {labels} labels but {cells} cells")]
    Shape { labels: usize, cells: usize },
}

#[derive(Error, Debug)]
pub enum ModelSavingError {
    #[error("cannot write model into file: {0}")]
    WriteFile(#[from] std::io::Error),
    #[error("can't serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Returned when a block without a label is rendered as tagged output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("block at position {position} was never labeled")]
pub struct UnlabeledBlockError {
    pub position: usize,
}
