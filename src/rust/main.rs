use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use email_classifier::config::DEFAULT_PORT;
use email_classifier::dataset::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use email_classifier::model_store::MODEL_PATH_ENV;
use email_classifier::{server, training, ModelStore, ServeConfig, TrainConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit the TF-IDF + Naive Bayes pipeline and save it to disk
    Train {
        /// CSV file with `text` and `label` columns (defaults to a built-in sample)
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Where to write the fitted model
        #[arg(short, long, env = MODEL_PATH_ENV)]
        output: Option<PathBuf>,
        /// Fraction of examples held out for the accuracy report
        #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
        test_size: f64,
        /// Seed for the train/test shuffle
        #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
        seed: u64,
        /// Naive Bayes smoothing parameter
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,
    },
    /// Serve predictions over HTTP
    Serve {
        #[arg(long, env = "EMAIL_CLASSIFIER_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(short, long, env = "EMAIL_CLASSIFIER_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Model file written by `train`
        #[arg(short, long, env = MODEL_PATH_ENV)]
        model: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    email_classifier::init_logger();
    let args = Args::parse();

    match args.command {
        Command::Train {
            data,
            output,
            test_size,
            seed,
            alpha,
        } => {
            let config = TrainConfig {
                data,
                output: output.unwrap_or_else(ModelStore::default_path),
                test_fraction: test_size,
                seed,
                alpha,
            };
            info!("=== Training email classifier ===");
            let report = training::run(&config).context("Training failed")?;

            println!("Model accuracy on test data: {:.4}", report.accuracy);
            println!("Model saved to {}", report.model_path.display());
            info!(
                "Trained on {} examples {:?}, {} terms, took {:.2?}",
                report.train_size, report.class_counts, report.vocabulary_size, report.elapsed
            );
        }
        Command::Serve { host, port, model } => {
            let config = ServeConfig {
                host,
                port,
                model: model.unwrap_or_else(ModelStore::default_path),
            };
            server::serve(&config)
                .await
                .with_context(|| format!("Server on {} failed", config.socket_addr()))?;
        }
    }

    Ok(())
}
