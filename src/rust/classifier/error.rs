use std::fmt;

/// Represents the different types of errors that can occur while fitting or using the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Error occurred due to invalid input parameters or training data
    ValidationError(String),
    /// Error occurred while fitting the vectorizer or the classifier
    TrainingError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// The fitted parameters are inconsistent with each other
    ModelError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::TrainingError(msg) => write!(f, "Training error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}
