use indexmap::IndexSet;

use crate::blocking::{Block, Label};
use crate::errors::{TrainingError, UnknownLabelError};
use crate::knowledge_base::KnowledgeBase;
use crate::matrix::TransitionMatrix;

/// Trainer for label transition matrices.
///
/// Feed it records whose blocks were labeled by the matching step, then turn
/// the gathered counts into a [`TransitionMatrix`]. Blocks labeled `none`
/// break the chain: no transition is counted into or out of them, and the
/// labels on either side of such a block aren't linked either.
#[derive(Debug, Clone)]
pub struct PsmTrainer {
    labels: IndexSet<String>,
    /// Row-major transition counts, `labels.len()` squared cells.
    counts: Vec<u64>,
    /// Outgoing transitions per label.
    totals: Vec<u64>,
}

impl PsmTrainer {
    /// Create a trainer over the attributes of a knowledge base.
    pub fn new(knowledge_base: &KnowledgeBase) -> Self {
        Self::with_attributes(knowledge_base.attributes().iter())
    }

    /// Create a trainer over an explicit attribute list. Duplicates are ignored.
    pub fn with_attributes<I>(attributes: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let labels: IndexSet<String> = attributes
            .into_iter()
            .map(|attribute| attribute.as_ref().to_owned())
            .collect();
        let n = labels.len();

        Self {
            labels,
            counts: vec![0; n * n],
            totals: vec![0; n],
        }
    }

    /// Count the transitions of one labeled record.
    ///
    /// Every block must carry a label that is either `none` or one of the
    /// trainer's attributes. A record that fails this check is rejected as a
    /// whole and leaves the counts untouched.
    pub fn add_record(&mut self, blocks: &[Block]) -> Result<&mut Self, TrainingError> {
        let indexes = blocks
            .iter()
            .enumerate()
            .map(|(position, block)| match &block.label {
                Some(label) => self.label_index(label).map_err(TrainingError::from),
                None => Err(TrainingError::Unlabeled { position }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        for pair in indexes.windows(2) {
            if let [Some(from), Some(to)] = *pair {
                self.count(from, to, 1);
            }
        }

        Ok(self)
    }

    /// Count the transitions of multiple records from an iterator.
    pub fn add_records_from_iter<I>(&mut self, iter: I) -> Result<&mut Self, TrainingError>
    where
        I: IntoIterator,
        I::Item: AsRef<[Block]>,
    {
        for record in iter {
            self.add_record(record.as_ref())?;
        }

        Ok(self)
    }

    /// Add the counts gathered by another trainer, e.g. one that worked on a
    /// different shard of the corpus on another thread.
    ///
    /// Labels are matched by name, so the other trainer may order its
    /// attributes differently, but each of them must be known to this one.
    pub fn merge(&mut self, other: &PsmTrainer) -> Result<&mut Self, UnknownLabelError> {
        let mapping = other
            .labels
            .iter()
            .map(|label| {
                self.labels
                    .get_index_of(label.as_str())
                    .ok_or_else(|| UnknownLabelError {
                        label: label.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let m = other.labels.len();
        for (i, &from) in mapping.iter().enumerate() {
            for (j, &to) in mapping.iter().enumerate() {
                self.count(from, to, other.counts[i * m + j]);
            }
        }

        Ok(self)
    }

    /// Total number of transitions counted so far.
    pub fn transitions(&self) -> u64 {
        self.totals.iter().sum()
    }

    /// Build a matrix from all gathered counts.
    pub fn into_matrix(self) -> TransitionMatrix {
        let n = self.labels.len();
        let totals = &self.totals;

        let probabilities = self
            .counts
            .iter()
            .enumerate()
            .map(|(cell, &count)| {
                // a non-zero count always comes with a non-zero total
                if count > 0 {
                    count as f64 / totals[cell / n] as f64
                } else {
                    0.0
                }
            })
            .collect();

        tracing::debug!(
            labels = n,
            transitions = self.transitions(),
            "built transition matrix"
        );

        TransitionMatrix {
            labels: self.labels,
            probabilities,
        }
    }

    fn label_index(&self, label: &Label) -> Result<Option<usize>, UnknownLabelError> {
        match label {
            Label::None => Ok(None),
            Label::Attribute(attribute) => match self.labels.get_index_of(attribute.as_str()) {
                Some(index) => Ok(Some(index)),
                None => Err(UnknownLabelError {
                    label: attribute.clone(),
                }),
            },
        }
    }

    fn count(&mut self, from: usize, to: usize, times: u64) {
        let n = self.labels.len();
        self.counts[from * n + to] += times;
        self.totals[from] += times;
    }
}

/// Learn a transition matrix over the attributes of `knowledge_base` from
/// labeled records.
pub fn train<I>(knowledge_base: &KnowledgeBase, records: I) -> Result<TransitionMatrix, TrainingError>
where
    I: IntoIterator,
    I::Item: AsRef<[Block]>,
{
    let mut trainer = PsmTrainer::new(knowledge_base);
    trainer.add_records_from_iter(records)?;
    Ok(trainer.into_matrix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(labels: &[&str]) -> Vec<Block> {
        labels
            .iter()
            .enumerate()
            .map(|(i, &label)| Block::with_label(&format!("v{}", i), label))
            .collect()
    }

    fn trainer() -> PsmTrainer {
        PsmTrainer::with_attributes(vec!["nome", "endereco", "telefone"])
    }

    #[test]
    fn none_blocks_break_the_chain() {
        let records = vec![
            record(&["nome", "nome", "endereco", "none", "endereco"]),
            record(&["nome", "nome", "endereco", "none", "endereco"]),
        ];
        let mut trainer = trainer();
        trainer.add_records_from_iter(&records).unwrap();
        assert_eq!(trainer.counts, vec![2, 2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(trainer.totals, vec![4, 0, 0]);

        let matrix = trainer.into_matrix();
        assert_eq!(matrix.row("nome"), Some(&[0.5, 0.5, 0.0][..]));
        assert_eq!(matrix.row("endereco"), Some(&[0.0, 0.0, 0.0][..]));
        assert!(!matrix.has_evidence("telefone"));
    }

    #[test]
    fn observed_rows_sum_to_one() {
        let records = vec![
            record(&["nome", "endereco", "telefone", "nome"]),
            record(&["telefone", "telefone", "endereco"]),
            record(&["endereco", "nome", "none", "telefone", "nome", "nome"]),
            record(&["nome"]),
            record(&[]),
        ];
        let matrix = PsmTrainer::with_attributes(vec!["nome", "endereco", "telefone", "bairro"])
            .add_records_from_iter(&records)
            .unwrap()
            .clone()
            .into_matrix();

        for label in matrix.labels() {
            let sum: f64 = matrix.row(label).unwrap().iter().sum();
            if matrix.has_evidence(label) {
                assert!((sum - 1.0).abs() < 1e-9, "row {} sums to {}", label, sum);
            } else {
                assert_eq!(sum, 0.0);
            }
        }
        assert_eq!(matrix.labels_without_evidence().collect::<Vec<_>>(), vec!["bairro"]);
        assert_eq!(matrix.probability("telefone", "nome"), Some(2.0 / 4.0));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let mut trainer = trainer();
        trainer.add_record(&record(&["nome", "endereco"])).unwrap();

        let err = trainer
            .add_record(&record(&["nome", "cidade", "nome"]))
            .unwrap_err();
        assert_eq!(
            err,
            TrainingError::UnknownLabel(UnknownLabelError {
                label: "cidade".to_owned()
            })
        );
        // the rejected record didn't leave partial counts behind
        assert_eq!(trainer.transitions(), 1);
    }

    #[test]
    fn unknown_label_next_to_none_is_still_rejected() {
        let err = trainer().add_record(&record(&["none", "cidade"])).unwrap_err();
        assert!(matches!(err, TrainingError::UnknownLabel(_)));
    }

    #[test]
    fn unlabeled_blocks_are_rejected() {
        let mut blocks = record(&["nome", "nome"]);
        blocks.push(Block::new("solto"));
        let err = trainer().add_record(&blocks).unwrap_err();
        assert_eq!(err, TrainingError::Unlabeled { position: 2 });
    }

    #[test]
    fn merging_matches_a_single_pass() {
        let first = vec![record(&["nome", "endereco", "endereco"])];
        let second = vec![record(&["telefone", "nome", "endereco"])];

        let mut whole = trainer();
        whole
            .add_records_from_iter(first.iter().chain(&second))
            .unwrap();

        let mut left = trainer();
        left.add_records_from_iter(&first).unwrap();
        let mut right = PsmTrainer::with_attributes(vec!["telefone", "endereco", "nome"]);
        right.add_records_from_iter(&second).unwrap();
        left.merge(&right).unwrap();

        assert_eq!(left.into_matrix(), whole.into_matrix());
    }

    #[test]
    fn counts_past_u32() {
        let mut trainer = trainer();
        trainer.count(0, 1, u64::from(u32::MAX));
        trainer.count(0, 1, 1);
        trainer.count(0, 0, u64::from(u32::MAX) + 1);

        let mut merged = trainer.clone();
        merged.merge(&trainer).unwrap();
        assert_eq!(merged.transitions(), 4 * (u64::from(u32::MAX) + 1));

        let matrix = merged.into_matrix();
        assert_eq!(matrix.probability("nome", "nome"), Some(0.5));
        assert_eq!(matrix.probability("nome", "endereco"), Some(0.5));
    }

    #[test]
    fn hand_built_none_attribute_is_unknown() {
        let blocks = vec![
            Block::with_label("ana", "nome"),
            Block::with_label("x", Label::Attribute("none".to_owned())),
        ];
        let err = trainer().add_record(&blocks).unwrap_err();
        assert_eq!(
            err,
            TrainingError::UnknownLabel(UnknownLabelError {
                label: "none".to_owned()
            })
        );
    }

    #[test]
    fn merging_unknown_labels_fails() {
        let other = PsmTrainer::with_attributes(vec!["cidade"]);
        let err = trainer().merge(&other).unwrap_err();
        assert_eq!(err.label, "cidade");
    }

    #[test]
    fn trains_over_knowledge_base_attributes() {
        let mut knowledge_base = KnowledgeBase::new();
        knowledge_base
            .add_term("nome", "ana")
            .add_term("endereco", "rua");
        let matrix = train(&knowledge_base, vec![record(&["nome", "endereco"])]).unwrap();

        let labels: Vec<_> = matrix.labels().iter().cloned().collect();
        assert_eq!(labels, vec!["nome", "endereco"]);
        assert_eq!(matrix.probability("nome", "endereco"), Some(1.0));
    }
}
