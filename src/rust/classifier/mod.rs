mod error;
mod vectorizer;
mod naive_bayes;
mod pipeline;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use vectorizer::{TfidfVectorizer, VectorizerConfig};
pub use naive_bayes::MultinomialNb;
pub use pipeline::{Pipeline, Prediction};
pub use builder::PipelineBuilder;

/// Information about a fitted pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInfo {
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes, in sorted order
    pub class_labels: Vec<String>,
    /// Number of terms in the TF-IDF vocabulary
    pub vocabulary_size: usize,
    /// Additive smoothing used by the classifier
    pub alpha: f64,
}
