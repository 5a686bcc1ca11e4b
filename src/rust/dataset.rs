//! Labeled training data: the built-in sample, CSV loading and holdout splits.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Columns a training CSV must provide.
pub const REQUIRED_COLUMNS: [&str; 2] = ["text", "label"];

pub const DEFAULT_TEST_FRACTION: f64 = 0.25;
pub const DEFAULT_SPLIT_SEED: u64 = 42;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Dataset contains no usable rows")]
    NoExamples,
    #[error("Invalid train/test split: {0}")]
    InvalidSplit(String),
}

/// One labeled piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub label: String,
}

impl Example {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// An ordered collection of labeled examples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    examples: Vec<Example>,
}

impl Dataset {
    pub fn new(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    /// A tiny built-in spam/ham sample, enough to exercise the full
    /// train → save → serve flow without any external data.
    pub fn sample() -> Self {
        Self::new(vec![
            Example::new("Free entry in 2 a wkly comp to win FA Cup final tkts 21st May 2005.", "spam"),
            Example::new("URGENT! You have won a 1 week FREE membership in our £100,000 Prize Jackpot!", "spam"),
            Example::new("Hey, are you coming to the meeting tomorrow?", "ham"),
            Example::new("I'm at the office. Please call me when you get a chance.", "ham"),
            Example::new(
                "Winner!! As a valued network customer you have been selected to receivea £900 prize reward!",
                "spam",
            ),
            Example::new("Hi mom, I'll be home late tonight.", "ham"),
            Example::new("Can you pick up groceries on your way home?", "ham"),
            Example::new("This is an important security notice for your account.", "ham"),
            Example::new("Don't forget to submit your project report by Friday.", "ham"),
            Example::new("Click here to claim your free iPhone 15.", "spam"),
        ])
    }

    /// Loads examples from a CSV file with a header row containing at least
    /// `text` and `label` columns.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        log::info!("Loading dataset from {:?}", path);
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Same as [`Dataset::from_csv`], reading from any byte source.
    ///
    /// Rows with a blank `text` cell are dropped. Rows with a blank `label`
    /// are dropped with a warning.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        let (text_idx, label_idx) = match (position("text"), position("label")) {
            (Some(t), Some(l)) => (t, l),
            _ => return Err(DatasetError::MissingColumns(missing)),
        };

        let mut examples = Vec::new();
        let mut dropped = 0usize;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let text = record.get(text_idx).unwrap_or("");
            let label = record.get(label_idx).unwrap_or("").trim();
            if text.trim().is_empty() {
                dropped += 1;
                continue;
            }
            if label.is_empty() {
                log::warn!("Dropping row {} with an empty label", row + 1);
                dropped += 1;
                continue;
            }
            examples.push(Example::new(text, label));
        }

        if dropped > 0 {
            log::info!("Dropped {} row(s) with missing values", dropped);
        }
        if examples.is_empty() {
            return Err(DatasetError::NoExamples);
        }
        log::info!("Loaded {} examples", examples.len());
        Ok(Self::new(examples))
    }

    /// Shuffles with a seeded RNG and splits into `(train, test)`.
    ///
    /// The test side receives `ceil(len * test_fraction)` examples.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset), DatasetError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "test fraction must be between 0 and 1 (exclusive), got {}",
                test_fraction
            )));
        }
        let n_test = (self.len() as f64 * test_fraction).ceil() as usize;
        if n_test >= self.len() {
            return Err(DatasetError::InvalidSplit(format!(
                "{} example(s) with test fraction {} would leave nothing to train on",
                self.len(),
                test_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let pick = |idx: &[usize]| Dataset::new(idx.iter().map(|&i| self.examples[i].clone()).collect());
        let (test_idx, train_idx) = indices.split_at(n_test);
        Ok((pick(train_idx), pick(test_idx)))
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    /// Labels in example order.
    pub fn label_column(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.label.as_str()).collect()
    }

    /// Distinct labels in sorted order.
    pub fn labels(&self) -> Vec<String> {
        self.examples
            .iter()
            .map(|e| e.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<Example> for Dataset {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
