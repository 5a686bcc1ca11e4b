use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::naive_bayes::MultinomialNb;
use super::vectorizer::TfidfVectorizer;
use crate::Dataset;

/// The result of classifying one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// The most probable class label
    pub label: String,
    /// Probability for every known class, summing to one
    pub scores: BTreeMap<String, f64>,
}

/// A fitted TF-IDF vectorizer followed by a multinomial Naive Bayes classifier,
/// fit and invoked as one unit.
///
/// # Thread Safety
///
/// A fitted pipeline is never mutated, so it can be shared across threads or
/// async tasks behind an `Arc` without locking.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use email_classifier::{Dataset, Pipeline};
///
/// let pipeline = Pipeline::builder().fit(&Dataset::sample())?;
/// let prediction = pipeline.predict("Claim your free prize now!")?;
/// println!("{} {:?}", prediction.label, prediction.scores);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    vectorizer: TfidfVectorizer,
    classifier: MultinomialNb,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Pipeline>();
    }
};

impl Pipeline {
    /// Creates a PipelineBuilder for fluent construction
    pub fn builder() -> super::builder::PipelineBuilder {
        super::builder::PipelineBuilder::new()
    }

    pub(crate) fn from_parts(vectorizer: TfidfVectorizer, classifier: MultinomialNb) -> Self {
        Self { vectorizer, classifier }
    }

    /// Returns information about the fitted pipeline
    pub fn info(&self) -> super::PipelineInfo {
        super::PipelineInfo {
            num_classes: self.classifier.classes().len(),
            class_labels: self.classifier.classes().to_vec(),
            vocabulary_size: self.vectorizer.vocabulary_size(),
            alpha: self.classifier.alpha(),
        }
    }

    /// The known class labels in sorted order.
    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    /// Predicts the class of `text` together with per-class probabilities.
    ///
    /// Text without any known term (including the empty string) is scored on
    /// the class priors alone.
    ///
    /// # Example
    /// ```rust
    /// # use email_classifier::{Dataset, Pipeline};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pipeline = Pipeline::builder().fit(&Dataset::sample())?;
    /// let prediction = pipeline.predict("Are you coming to the meeting?")?;
    /// for (class, probability) in &prediction.scores {
    ///     println!("{}: {:.2}", class, probability);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let features = self.vectorizer.transform(text)?;
        let proba = self.classifier.predict_proba(features.view())?;
        let best = MultinomialNb::argmax(proba.view());

        let scores = self
            .classifier
            .classes()
            .iter()
            .cloned()
            .zip(proba.iter().cloned())
            .collect();

        Ok(Prediction {
            label: self.classifier.classes()[best].clone(),
            scores,
        })
    }

    /// Predicts only the label of `text`.
    pub fn predict_label(&self, text: &str) -> Result<&str, ClassifierError> {
        let features = self.vectorizer.transform(text)?;
        self.classifier.predict(features.view())
    }

    /// Fraction of examples in `dataset` whose label is predicted exactly.
    pub fn score(&self, dataset: &Dataset) -> Result<f64, ClassifierError> {
        if dataset.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Cannot score on an empty dataset".into(),
            ));
        }
        let mut correct = 0usize;
        for example in dataset.iter() {
            if self.predict_label(&example.text)? == example.label {
                correct += 1;
            }
        }
        Ok(correct as f64 / dataset.len() as f64)
    }

    /// Checks that the vectorizer and classifier were fitted together.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        if self.vectorizer.vocabulary_size() != self.classifier.n_features() {
            return Err(ClassifierError::ModelError(format!(
                "Vectorizer produces {} features but the classifier expects {}",
                self.vectorizer.vocabulary_size(),
                self.classifier.n_features()
            )));
        }
        Ok(())
    }
}
