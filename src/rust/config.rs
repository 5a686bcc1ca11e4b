use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::dataset::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use crate::model_store::ModelStore;

pub const DEFAULT_PORT: u16 = 5000;

/// Settings for the `train` command.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// CSV file with `text` and `label` columns; the built-in sample when unset
    pub data: Option<PathBuf>,
    /// Where the fitted pipeline is written
    pub output: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    /// Naive Bayes smoothing
    pub alpha: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data: None,
            output: ModelStore::default_path(),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
            alpha: 1.0,
        }
    }
}

/// Settings for the `serve` command.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: IpAddr,
    pub port: u16,
    pub model: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            model: ModelStore::default_path(),
        }
    }
}

impl ServeConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
