use serde::Deserialize;

use crate::error::ConfigurationError;

/// Knobs shared by every compiler of one `QueryCompiler`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Emit constants as parameters instead of inline literals. `NULL` is always inline.
    pub parameterized: bool,
    /// Fractional-second digits for datetime literals; `None` keeps the dialect default.
    pub datetime_precision: Option<u8>,
    /// Append root key columns to the ORDER BY of to-many selects so rows of one root stay adjacent.
    pub enforce_root_order: bool,
    pub bulk_batch_size: usize,
    /// SQL Server only: add `WITH (NOLOCK)` to select sources.
    pub no_lock: bool,
    pub indent: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            parameterized: true,
            datetime_precision: None,
            enforce_root_order: true,
            bulk_batch_size: 1000,
            no_lock: false,
            indent: 4,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inline() -> Self {
        Self { parameterized: false, ..Self::default() }
    }

    pub fn parameterized() -> Self {
        Self::default()
    }

    pub fn with_datetime_precision(mut self, precision: u8) -> Self {
        self.datetime_precision = Some(precision.min(7));
        self
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        let mut config: Self = serde_json::from_str(text).map_err(|e| ConfigurationError::Load(e.to_string()))?;
        config.datetime_precision = config.datetime_precision.map(|p| p.min(7));
        if config.bulk_batch_size == 0 {
            config.bulk_batch_size = 1;
        }
        Ok(config)
    }
}
