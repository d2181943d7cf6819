use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::errors::KnowledgeBaseLoadingError;
use crate::normalize::{tokenize, StopWords};

/// A term was seen `frequency` times in values of `attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub attribute: String,
    pub frequency: u32,
}

/// Known attribute values, indexed by the normalized terms they consist of.
///
/// The order of attributes is the order they were first added in and stays
/// fixed; transition matrices are indexed by it. Segmentation and training
/// only ever borrow a knowledge base immutably, so one instance can be shared
/// between threads once it's built.
#[derive(Debug, Default, Clone)]
pub struct KnowledgeBase {
    attributes: IndexSet<String>,
    inverted_index: HashMap<String, Vec<Occurrence>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a knowledge base from attributes and their known values.
    pub fn from_values<I, A, V, S>(values: I, stop_words: &StopWords) -> Self
    where
        I: IntoIterator<Item = (A, V)>,
        A: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut knowledge_base = Self::new();
        for (attribute, attribute_values) in values {
            knowledge_base.add_attribute(attribute.as_ref());
            for value in attribute_values {
                knowledge_base.add_value(attribute.as_ref(), value.as_ref(), stop_words);
            }
        }
        knowledge_base
    }

    /// Load a knowledge base from a JSON file.
    ///
    /// The file holds a single object mapping every attribute to the list of
    /// its known values, e.g. `{"nome": ["João Silva"], "endereco": [...]}`.
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        stop_words: &StopWords,
    ) -> Result<Self, KnowledgeBaseLoadingError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let values: IndexMap<String, Vec<String>> = serde_json::from_reader(reader)?;
        let knowledge_base = Self::from_values(values, stop_words);

        tracing::info!(
            path = %path.as_ref().display(),
            attributes = knowledge_base.attributes.len(),
            terms = knowledge_base.inverted_index.len(),
            "loaded knowledge base"
        );

        Ok(knowledge_base)
    }

    /// Register an attribute without any values. Adding it twice is a no-op.
    pub fn add_attribute(&mut self, attribute: &str) -> &mut Self {
        if !self.attributes.contains(attribute) {
            self.attributes.insert(attribute.to_owned());
        }
        self
    }

    /// Add a raw attribute value; it is normalized and stripped of stop words.
    pub fn add_value(&mut self, attribute: &str, value: &str, stop_words: &StopWords) -> &mut Self {
        self.add_attribute(attribute);

        let terms = tokenize(value, stop_words);
        if terms.is_empty() {
            tracing::warn!(attribute, value, "value has no terms left after normalization");
        }

        for term in &terms {
            self.add_term(attribute, term);
        }
        self
    }

    /// Record one occurrence of an already normalized term under `attribute`.
    pub fn add_term(&mut self, attribute: &str, term: &str) -> &mut Self {
        self.add_attribute(attribute);

        // look up by &str first so known terms aren't cloned on every occurrence
        if let Some(occurrences) = self.inverted_index.get_mut(term) {
            record_occurrence(occurrences, attribute);
            return self;
        }

        let mut occurrences = Vec::with_capacity(1);
        record_occurrence(&mut occurrences, attribute);
        self.inverted_index.insert(term.to_owned(), occurrences);
        self
    }

    pub fn attributes(&self) -> &IndexSet<String> {
        &self.attributes
    }

    /// Position of an attribute in the fixed attribute order.
    pub fn attribute_index(&self, attribute: &str) -> Option<usize> {
        self.attributes.get_index_of(attribute)
    }

    /// Attribute evidence for a normalized term, if the term is known at all.
    pub fn occurrences(&self, term: &str) -> Option<&[Occurrence]> {
        self.inverted_index.get(term).map(Vec::as_slice)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.inverted_index.contains_key(term)
    }
}

fn record_occurrence(occurrences: &mut Vec<Occurrence>, attribute: &str) {
    match occurrences.iter_mut().find(|o| o.attribute == attribute) {
        Some(occurrence) => occurrence.frequency += 1,
        None => occurrences.push(Occurrence {
            attribute: attribute.to_owned(),
            frequency: 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_occurrences_per_attribute() {
        let mut knowledge_base = KnowledgeBase::new();
        let stop_words: StopWords = vec!["das"].into_iter().collect();
        knowledge_base
            .add_value("endereco", "Rua das Flores", &stop_words)
            .add_value("endereco", "Rua Direita", &stop_words)
            .add_value("nome", "Flores", &stop_words);

        assert_eq!(
            knowledge_base.occurrences("rua").unwrap(),
            &[Occurrence {
                attribute: "endereco".to_owned(),
                frequency: 2
            }]
        );
        let flores: Vec<_> = knowledge_base
            .occurrences("flores")
            .unwrap()
            .iter()
            .map(|o| o.attribute.as_str())
            .collect();
        assert_eq!(flores, vec!["endereco", "nome"]);
        assert!(!knowledge_base.contains_term("das"));
    }

    #[test]
    fn keeps_attribute_order() {
        let values = vec![
            ("telefone", vec!["3333 4444"]),
            ("nome", vec!["Ana"]),
            ("bairro", vec![]),
        ];
        let knowledge_base = KnowledgeBase::from_values(values, &StopWords::new());

        let attributes: Vec<_> = knowledge_base.attributes().iter().cloned().collect();
        assert_eq!(attributes, vec!["telefone", "nome", "bairro"]);
        assert_eq!(knowledge_base.attribute_index("bairro"), Some(2));
        assert_eq!(knowledge_base.attribute_index("none"), None);
        assert!(knowledge_base.contains_term("33334444"));
    }
}
