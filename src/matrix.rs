use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::errors::{ModelLoadingError, ModelSavingError};

/// Label transition probabilities learned by [`PsmTrainer`](crate::PsmTrainer).
///
/// Cell `(i, j)` holds the probability of a block labeled `i` being directly
/// followed by a block labeled `j`. Every row with observed transitions sums
/// to one; rows of labels that were never followed by another attribute are
/// all zero, which means "no evidence" rather than a uniform distribution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    pub(crate) labels: IndexSet<String>,
    /// Row-major, `labels.len()` squared cells.
    pub(crate) probabilities: Vec<f64>,
}

impl TransitionMatrix {
    /// Save this matrix into a file with the given path.
    /// The format is simple JSON right now.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelSavingError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;

        Ok(())
    }

    /// Load a previously saved matrix from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadingError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let matrix: Self = serde_json::from_reader(reader)?;

        let labels = matrix.labels.len();
        let cells = matrix.probabilities.len();
        if labels * labels != cells {
            return Err(ModelLoadingError::Shape { labels, cells });
        }

        tracing::info!(path = %path.as_ref().display(), labels, "loaded transition matrix");

        Ok(matrix)
    }

    /// Labels in row/column order.
    pub fn labels(&self) -> &IndexSet<String> {
        &self.labels
    }

    /// Probability of `to` directly following `from`, or `None` if either
    /// label isn't part of the matrix.
    pub fn probability(&self, from: &str, to: &str) -> Option<f64> {
        let to = self.labels.get_index_of(to)?;
        self.row(from).map(|row| row[to])
    }

    /// Probabilities of every label following `from`, in label order.
    pub fn row(&self, from: &str) -> Option<&[f64]> {
        let n = self.labels.len();
        let from = self.labels.get_index_of(from)?;
        Some(&self.probabilities[from * n..(from + 1) * n])
    }

    /// Whether any transition out of `from` was observed during training.
    pub fn has_evidence(&self, from: &str) -> bool {
        self.row(from)
            .map_or(false, |row| row.iter().any(|&p| p > 0.0))
    }

    /// Labels whose rows are all zero.
    pub fn labels_without_evidence(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .filter(move |label| !self.has_evidence(label))
    }
}

/// Renders the matrix as an aligned table with the labels as headers.
impl fmt::Display for TransitionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.labels.len();

        let mut table = Vec::with_capacity(n + 1);
        table.push(
            std::iter::once(String::new())
                .chain(self.labels.iter().cloned())
                .collect::<Vec<_>>(),
        );
        for (i, label) in self.labels.iter().enumerate() {
            let cells = self.probabilities[i * n..(i + 1) * n]
                .iter()
                .map(|p| p.to_string());
            table.push(std::iter::once(label.clone()).chain(cells).collect());
        }

        let widths: Vec<usize> = (0..=n)
            .map(|column| table.iter().map(|row| row[column].len()).max().unwrap_or(0))
            .collect();

        for row in &table {
            let line: Vec<_> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:width$}", cell, width = width))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }

        Ok(())
    }
}
