use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub listen_port: String,
    pub data_dir: String,
    pub jobs_file: String,
    pub upload_max_bytes: usize,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .set_default("listen_port", "3000")?
            .set_default("data_dir", "data")?
            .set_default("jobs_file", "jobs.json")?
            .set_default("upload_max_bytes", 10_i64 * 1024 * 1024)?
            .add_source(Environment::default())
            .build()?;
        conf.try_deserialize()
    }

    pub fn jobs_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.jobs_file)
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
