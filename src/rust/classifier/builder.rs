use std::collections::BTreeSet;

use log::{info, warn};

use super::error::ClassifierError;
use super::naive_bayes::MultinomialNb;
use super::pipeline::Pipeline;
use super::vectorizer::{TfidfVectorizer, VectorizerConfig};
use crate::Dataset;

/// A builder for fitting a [`Pipeline`] with a fluent interface.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    vectorizer_config: VectorizerConfig,
    alpha: f64,
    fit_prior: bool,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates a builder with the default settings: lowercase tokens, smoothed
    /// IDF, raw term counts, `alpha = 1.0` and priors learned from the data.
    ///
    /// # Example
    /// ```
    /// use email_classifier::PipelineBuilder;
    ///
    /// let builder = PipelineBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            vectorizer_config: VectorizerConfig::default(),
            alpha: 1.0,
            fit_prior: true,
        }
    }

    /// Sets the additive (Laplace/Lidstone) smoothing parameter of the classifier.
    ///
    /// The value is checked when [`PipelineBuilder::fit`] runs; it must be
    /// positive and finite.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Learn class priors from the data (`true`) or use a uniform prior.
    pub fn with_fit_prior(mut self, fit_prior: bool) -> Self {
        self.fit_prior = fit_prior;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.vectorizer_config.lowercase = lowercase;
        self
    }

    pub fn with_smooth_idf(mut self, smooth_idf: bool) -> Self {
        self.vectorizer_config.smooth_idf = smooth_idf;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.vectorizer_config.sublinear_tf = sublinear_tf;
        self
    }

    /// Limits the vocabulary to the `max_features` most frequent terms.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.vectorizer_config.max_features = Some(max_features);
        self
    }

    /// Validates training data according to the following rules:
    /// - There must be at least one example
    /// - No label can be empty
    ///
    /// A single distinct class is accepted but logged, since every
    /// prediction will then return that class.
    fn validate_training_data(dataset: &Dataset) -> Result<(), ClassifierError> {
        if dataset.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Training data must contain at least one example".into(),
            ));
        }
        if let Some(pos) = dataset.iter().position(|e| e.label.trim().is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Example {} has an empty label",
                pos + 1
            )));
        }
        let classes: BTreeSet<&str> = dataset.iter().map(|e| e.label.as_str()).collect();
        if classes.len() < 2 {
            warn!("Training data contains a single class {:?}", classes);
        }
        Ok(())
    }

    /// Fits the vectorizer on the texts in `dataset`, then the classifier on
    /// the resulting features.
    ///
    /// # Returns
    /// * `Result<Pipeline, ClassifierError>` - The fitted pipeline, or an error if:
    ///   - The dataset is empty or has an empty label
    ///   - `alpha` is not positive
    ///   - The texts contain no tokens at all
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use email_classifier::{Dataset, PipelineBuilder};
    ///
    /// let pipeline = PipelineBuilder::new()
    ///     .with_alpha(0.5)
    ///     .fit(&Dataset::sample())?;
    /// assert_eq!(pipeline.classes(), ["ham", "spam"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn fit(self, dataset: &Dataset) -> Result<Pipeline, ClassifierError> {
        Self::validate_training_data(dataset)?;
        let mut classifier = MultinomialNb::new(self.alpha, self.fit_prior)?;

        let texts = dataset.texts();
        let labels = dataset.label_column();

        info!("Fitting vectorizer on {} documents", texts.len());
        let mut vectorizer = TfidfVectorizer::new(self.vectorizer_config);
        vectorizer.fit(&texts)?;

        let features = vectorizer.transform_batch(&texts)?;
        info!(
            "Fitting classifier on a {}x{} feature matrix",
            features.nrows(),
            features.ncols()
        );
        classifier.fit(&features, &labels)?;

        let pipeline = Pipeline::from_parts(vectorizer, classifier);
        pipeline.validate()?;
        Ok(pipeline)
    }
}
