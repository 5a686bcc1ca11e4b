//! A spam/ham email classifier: a TF-IDF vectorizer followed by a
//! multinomial Naive Bayes classifier, fit and invoked as one pipeline.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use email_classifier::{Dataset, Pipeline};
//!
//! let (train, test) = Dataset::sample().train_test_split(0.25, 42)?;
//! let pipeline = Pipeline::builder().fit(&train)?;
//! println!("Holdout accuracy: {:.4}", pipeline.score(&test)?);
//!
//! let prediction = pipeline.predict("URGENT! You have won a free prize")?;
//! println!("Predicted class: {}", prediction.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence and Serving
//!
//! A fitted [`Pipeline`] is written to a single JSON file by [`ModelStore`]
//! and served over HTTP by [`server::serve`]:
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use email_classifier::{Dataset, ModelStore, Pipeline, ServeConfig};
//!
//! let pipeline = Pipeline::builder().fit(&Dataset::sample())?;
//! ModelStore::new("email_classifier.json").save(&pipeline)?;
//!
//! email_classifier::server::serve(&ServeConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod model_store;
pub mod server;
pub mod training;

pub use classifier::{
    ClassifierError, MultinomialNb, Pipeline, PipelineBuilder, PipelineInfo, Prediction, TfidfVectorizer,
    VectorizerConfig,
};
pub use config::{ServeConfig, TrainConfig};
pub use dataset::{Dataset, DatasetError, Example};
pub use model_store::{ModelError, ModelStore};
pub use training::{TrainError, TrainingReport};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
