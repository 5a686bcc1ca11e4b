//! The `train` flow: load data, hold out a test split, fit, report, save.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::info;

use crate::classifier::{ClassifierError, Pipeline};
use crate::config::TrainConfig;
use crate::dataset::{Dataset, DatasetError};
use crate::model_store::{ModelError, ModelStore};

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Failed to save model: {0}")]
    Model(#[from] ModelError),
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub class_counts: BTreeMap<String, usize>,
    pub vocabulary_size: usize,
    /// Holdout accuracy in `[0, 1]`
    pub accuracy: f64,
    pub model_path: PathBuf,
    pub elapsed: Duration,
}

/// Runs the full training flow described by `config`.
///
/// Any failure aborts the run; nothing is written unless fitting succeeds.
pub fn run(config: &TrainConfig) -> Result<TrainingReport, TrainError> {
    let start_time = Instant::now();

    let dataset = match &config.data {
        Some(path) => Dataset::from_csv(path)?,
        None => {
            info!("No dataset given, using the built-in sample");
            Dataset::sample()
        }
    };
    info!("Label distribution: {:?}", dataset.label_counts());

    let (train, test) = dataset.train_test_split(config.test_fraction, config.seed)?;
    info!("Split into {} training and {} test examples", train.len(), test.len());

    info!("Training the model...");
    let pipeline = Pipeline::builder().with_alpha(config.alpha).fit(&train)?;
    info!("Model trained successfully");

    let accuracy = pipeline.score(&test)?;
    info!("Model accuracy on test data: {:.4}", accuracy);

    let store = ModelStore::new(&config.output);
    store.save(&pipeline)?;

    Ok(TrainingReport {
        train_size: train.len(),
        test_size: test.len(),
        class_counts: train
            .label_counts()
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect(),
        vocabulary_size: pipeline.info().vocabulary_size,
        accuracy,
        model_path: store.path().to_path_buf(),
        elapsed: start_time.elapsed(),
    })
}
