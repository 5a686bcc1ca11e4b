use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use ndarray::{Array1, Array2};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::normalize_vector;

lazy_static! {
    /// Two or more word characters, the same default as most TF-IDF implementations.
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is a valid regex");
}

/// Settings that control tokenization and term weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Lowercase documents before tokenizing
    pub lowercase: bool,
    /// Add one to document frequencies, as if an extra document contained every term
    pub smooth_idf: bool,
    /// Replace raw term counts with `1 + ln(tf)`
    pub sublinear_tf: bool,
    /// Keep only the most frequent terms across the corpus
    pub max_features: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            smooth_idf: true,
            sublinear_tf: false,
            max_features: None,
        }
    }
}

/// Converts raw text into L2-normalized TF-IDF feature vectors.
///
/// The vocabulary is indexed in sorted term order, so two fits over the
/// same corpus always produce the same feature layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Array1<f64>,
}

impl TfidfVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            vocabulary: BTreeMap::new(),
            idf: Array1::zeros(0),
        }
    }

    /// Splits a document into lowercase (if configured) word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        TOKEN_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Learns the vocabulary and inverse document frequencies from `documents`.
    ///
    /// # Errors
    /// - `ValidationError` if `documents` is empty
    /// - `TrainingError` if no document contains a single token
    pub fn fit(&mut self, documents: &[impl AsRef<str>]) -> Result<(), ClassifierError> {
        if documents.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Cannot fit the vectorizer on an empty corpus".into(),
            ));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = self.tokenize(doc.as_ref());
            for token in &tokens {
                *corpus_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            let unique: HashSet<String> = tokens.into_iter().collect();
            for token in unique {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(ClassifierError::TrainingError(
                "Empty vocabulary; the documents contain no tokens".into(),
            ));
        }

        let mut terms: Vec<String> = document_frequency.keys().cloned().collect();
        if let Some(limit) = self.config.max_features {
            if limit == 0 {
                return Err(ClassifierError::ValidationError(
                    "max_features must be greater than zero".into(),
                ));
            }
            terms.sort_by(|a, b| corpus_frequency[b].cmp(&corpus_frequency[a]).then_with(|| a.cmp(b)));
            terms.truncate(limit);
        }
        terms.sort();

        let n_documents = documents.len() as f64;
        let smooth = if self.config.smooth_idf { 1.0 } else { 0.0 };
        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency[term] as f64;
                ((n_documents + smooth) / (df + smooth)).ln() + 1.0
            })
            .collect::<Array1<f64>>();

        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        self.idf = idf;

        log::debug!("Vectorizer fitted with {} terms", self.vocabulary.len());
        Ok(())
    }

    /// Transforms one document into a TF-IDF vector of width [`Self::vocabulary_size`].
    ///
    /// Tokens outside the vocabulary are ignored; a document without any known
    /// token yields the zero vector.
    pub fn transform(&self, document: &str) -> Result<Array1<f64>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::PredictionError("Vectorizer is not fitted".into()));
        }

        let mut tf = Array1::<f64>::zeros(self.vocabulary.len());
        for token in self.tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                tf[idx] += 1.0;
            }
        }

        if self.config.sublinear_tf {
            tf.mapv_inplace(|count| if count > 0.0 { 1.0 + count.ln() } else { 0.0 });
        }

        let weighted = tf * &self.idf;
        Ok(normalize_vector(&weighted))
    }

    /// Transforms a batch of documents into a `[n_documents, vocabulary_size]` matrix.
    pub fn transform_batch(&self, documents: &[impl AsRef<str>]) -> Result<Array2<f64>, ClassifierError> {
        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (row, doc) in documents.iter().enumerate() {
            matrix.row_mut(row).assign(&self.transform(doc.as_ref())?);
        }
        Ok(matrix)
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Checks that the vocabulary indices and IDF weights agree.
    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(ClassifierError::ModelError(format!(
                "Vocabulary has {} terms but {} IDF weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        let mut seen = vec![false; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            if idx >= seen.len() || seen[idx] {
                return Err(ClassifierError::ModelError(format!(
                    "Term '{}' has an invalid feature index {}",
                    term, idx
                )));
            }
            seen[idx] = true;
        }
        Ok(())
    }
}
