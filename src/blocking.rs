use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EmptyInputError;
use crate::knowledge_base::KnowledgeBase;
use crate::normalize::{tokenize, StopWords};

const NONE_LABEL: &str = "none";

/// Attribute assigned to a block by the matching step.
///
/// Serialized as a plain string, with `"none"` standing for [`Label::None`].
/// Build labels with `Label::from`: it maps `"none"` to [`Label::None`].
/// A hand-built `Label::Attribute("none")` is not the sentinel; trainers
/// reject it as an unknown label and it reads back as [`Label::None`] after
/// a serialization round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    /// No attribute evidence, or the match was rejected.
    None,
    Attribute(String),
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::None => NONE_LABEL,
            Label::Attribute(attribute) => attribute.as_str(),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Label::None
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        if label == NONE_LABEL {
            Label::None
        } else {
            Label::Attribute(label.to_owned())
        }
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        if label == NONE_LABEL {
            Label::None
        } else {
            Label::Attribute(label)
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::None => NONE_LABEL.to_owned(),
            Label::Attribute(attribute) => attribute,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous span of a record's tokens, treated as one candidate value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Normalized tokens of the span, joined by single spaces.
    pub value: String,
    /// Original text of the span, filled in when reconstructing output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    /// Unset right after segmentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

impl Block {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_label<L: Into<Label>>(value: &str, label: L) -> Self {
        Self {
            value: value.to_owned(),
            raw_value: None,
            label: Some(label.into()),
        }
    }

    fn push_token(&mut self, token: &str) {
        if !self.value.is_empty() {
            self.value.push(' ');
        }
        self.value.push_str(token);
    }
}

/// Split a record's tokens into blocks.
///
/// A token joins the block of the token right before it when the two terms
/// co-occur under some attribute of the knowledge base, and opens a new block
/// otherwise. Only direct neighbours are compared, so a block may contain
/// terms that never appear together anywhere but are chained by the terms
/// between them.
pub fn segment<S: AsRef<str>>(
    tokens: &[S],
    knowledge_base: &KnowledgeBase,
) -> Result<Vec<Block>, EmptyInputError> {
    let (first, rest) = tokens.split_first().ok_or(EmptyInputError)?;

    let mut blocks = vec![Block::new(first.as_ref())];
    let mut previous = first.as_ref();

    for token in rest {
        let token = token.as_ref();
        if !co_occurs(token, previous, knowledge_base) {
            blocks.push(Block::default());
        }
        // there's always at least the seed block
        if let Some(block) = blocks.last_mut() {
            block.push_token(token);
        }
        previous = token;
    }

    tracing::debug!(tokens = tokens.len(), blocks = blocks.len(), "segmented record");

    Ok(blocks)
}

/// Normalize a raw record, drop its stop words and segment what's left.
pub fn segment_record(
    record: &str,
    knowledge_base: &KnowledgeBase,
    stop_words: &StopWords,
) -> Result<Vec<Block>, EmptyInputError> {
    segment(&tokenize(record, stop_words), knowledge_base)
}

/// Whether two terms were seen under a common attribute.
///
/// Terms missing from the knowledge base never co-occur with anything.
pub fn co_occurs(current: &str, previous: &str, knowledge_base: &KnowledgeBase) -> bool {
    let (current, previous) = match (
        knowledge_base.occurrences(current),
        knowledge_base.occurrences(previous),
    ) {
        (Some(current), Some(previous)) => (current, previous),
        _ => return false,
    };

    current
        .iter()
        .any(|c| previous.iter().any(|p| c.attribute == p.attribute))
}
