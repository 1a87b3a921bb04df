use std::path::PathBuf;

use envconfig::Envconfig;
use lazy_static::lazy_static;

#[derive(Debug, Envconfig)]
pub struct Config {
    #[envconfig(from = "BLOCKPORT_LOG_LEVEL", default = "info")]
    pub log_level: String,
    /// Root directory of the local filesystem backend.
    #[envconfig(from = "BLOCKPORT_DATA_DIR", default = "./data/")]
    pub data_dir: PathBuf,
    /// Block size in bytes used by backends that have to synthesize a block layout.
    #[envconfig(from = "BLOCKPORT_BLOCK_SIZE", default = "134217728")]
    pub block_size: u64,
    /// Comma separated hosts reported as replicas of every synthesized block.
    #[envconfig(from = "BLOCKPORT_HOSTS", default = "localhost")]
    pub hosts: String,
    /// Comma separated worker names of the in-process executor.
    #[envconfig(from = "BLOCKPORT_WORKERS", default = "localhost")]
    pub workers: String,
    #[envconfig(from = "BLOCKPORT_WORKER_CONCURRENCY", default = "4")]
    pub worker_concurrency: usize,
    /// Bytes fetched per step while scanning for a record delimiter.
    #[envconfig(from = "BLOCKPORT_DELIMITER_SCAN_SIZE", default = "65536")]
    pub delimiter_scan_size: usize,
}

impl Config {
    pub fn init() -> Config {
        Config::init_from_env().expect("Failed to load config")
    }

    pub fn host_list(&self) -> Vec<String> {
        split_list(&self.hosts)
    }

    pub fn worker_list(&self) -> Vec<String> {
        split_list(&self.workers)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

lazy_static! {
    pub static ref CONFIG: Config = Config::init();
}
