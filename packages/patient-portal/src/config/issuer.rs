use crate::error::ConfigError;
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// The encoder stores the cell size in a single byte
const CELL_SIZE_RANGE: RangeInclusive<u32> = 1..=255;

///
/// External program that renders a record link into a scannable image.
///
/// Invoked as `{program} {script} {url} {output_file} {cell_size}`.
///
#[derive(Clone, Debug, Deserialize)]
pub struct CodeIssuerConfig {
    #[serde(default = "CodeIssuerConfig::default_program")]
    pub program: String,

    #[serde(default = "CodeIssuerConfig::default_script")]
    pub script: String,

    #[serde(default = "CodeIssuerConfig::default_cell_size")]
    pub cell_size: u32,

    #[serde(default = "CodeIssuerConfig::default_output_dir")]
    pub output_dir: String,

    #[serde(default = "CodeIssuerConfig::default_timeout")]
    pub timeout: u64,
}

impl Default for CodeIssuerConfig {
    fn default() -> Self {
        CodeIssuerConfig {
            program: CodeIssuerConfig::default_program(),
            script: CodeIssuerConfig::default_script(),
            cell_size: CodeIssuerConfig::default_cell_size(),
            output_dir: CodeIssuerConfig::default_output_dir(),
            timeout: CodeIssuerConfig::default_timeout(),
        }
    }
}

impl CodeIssuerConfig {
    pub fn default_program() -> String {
        "python3".to_string()
    }

    pub fn default_script() -> String {
        "4sqr_encoder.py".to_string()
    }

    pub const fn default_cell_size() -> u32 {
        100
    }

    pub fn default_output_dir() -> String {
        "public/codes".to_string()
    }

    // 10 seconds
    pub const fn default_timeout() -> u64 {
        1000 * 10
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn output_path(&self, record_id: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(format!("{record_id}.png"))
    }

    ///
    /// A fresh file name for one run of the encoder, next to the final image
    ///
    pub fn staging_path(&self, record_id: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(format!(".{record_id}.{}.png", Uuid::new_v4()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CELL_SIZE_RANGE.contains(&self.cell_size) {
            return Err(ConfigError::InvalidParameter {
                name: "code_issuer.cell_size".to_string(),
                value: self.cell_size.to_string(),
            });
        }
        Ok(())
    }
}
