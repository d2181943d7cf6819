//! Split free-text records, such as classified ads or addresses, into blocks
//! of terms that belong together, and learn how attribute labels follow one
//! another in labeled records.
//!
//! Blocking relies on a [`KnowledgeBase`] of known attribute values: two
//! neighbouring terms stay in the same block when they were both seen under
//! some common attribute. After an external matching step has labeled the
//! blocks of a training corpus, [`PsmTrainer`] turns the label sequences into
//! a [`TransitionMatrix`] for a sequence decoder to use.
//!
//! # Segmenting records
//!
//! ```
//! use ondux::{segment_record, KnowledgeBase, StopWords};
//!
//! let stop_words: StopWords = vec!["das"].into_iter().collect();
//! let knowledge_base = KnowledgeBase::from_values(
//!     vec![
//!         ("nome", vec!["João Silva"]),
//!         ("endereco", vec!["Rua das Flores", "Rua Direita"]),
//!     ],
//!     &stop_words,
//! );
//!
//! let blocks = segment_record("joão silva, rua flores", &knowledge_base, &stop_words).unwrap();
//! let values: Vec<_> = blocks.iter().map(|b| b.value.as_str()).collect();
//! assert_eq!(values, vec!["joao silva", "rua flores"]);
//! ```
//!
//! # Learning transitions
//!
//! ```
//! use ondux::{Block, PsmTrainer};
//!
//! let mut trainer = PsmTrainer::with_attributes(vec!["nome", "endereco"]);
//! trainer
//!     .add_record(&[
//!         Block::with_label("joao silva", "nome"),
//!         Block::with_label("rua flores", "endereco"),
//!         Block::with_label("apto", "none"),
//!     ])
//!     .unwrap();
//!
//! let matrix = trainer.into_matrix();
//! assert_eq!(matrix.probability("nome", "endereco"), Some(1.0));
//! assert!(!matrix.has_evidence("endereco"));
//! ```
//!
//! Labeled records can also be rendered back as inline tags with
//! [`render_tagged`].

mod blocking;
mod errors;
mod knowledge_base;
mod matrix;
mod normalize;
mod tagging;
mod trainer;

pub use blocking::{co_occurs, segment, segment_record, Block, Label};
pub use errors::{
    EmptyInputError, KnowledgeBaseLoadingError, ModelLoadingError, ModelSavingError,
    StopWordsLoadingError, TrainingError, UnknownLabelError, UnlabeledBlockError,
};
pub use knowledge_base::{KnowledgeBase, Occurrence};
pub use matrix::TransitionMatrix;
pub use normalize::{normalize, tokenize, StopWords};
pub use tagging::render_tagged;
pub use trainer::{train, PsmTrainer};
