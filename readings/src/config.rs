use std::path::PathBuf;

use crate::error::GenError;

/// Number of outer iterations, each emitting one record per system
pub const DEFAULT_BATCHES: usize = 512;
/// Number of distinct systems, i.e. records per batch
pub const DEFAULT_SYSTEMS: usize = 10;
/// Smallest sample value that may be drawn
pub const DEFAULT_MIN_VALUE: u32 = 1;
/// Largest sample value that may be drawn
pub const DEFAULT_MAX_VALUE: u32 = 9999;
/// System ids are this prefix followed by the system index
pub const DEFAULT_SYSTEM_PREFIX: &str = "starscourge";

/// Shape of a generated file and where it is written.
/// The [`Default`] reproduces a run of 512 batches of 10 systems, values in `1..=9999`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub batches: usize,
    pub systems: usize,
    pub min_value: u32,
    pub max_value: u32,
    pub system_prefix: String,
    pub output_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            batches: DEFAULT_BATCHES,
            systems: DEFAULT_SYSTEMS,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            system_prefix: DEFAULT_SYSTEM_PREFIX.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl GeneratorConfig {
    /// # Errors
    /// 1. `min_value` is greater than `max_value`
    /// 2. `batches * systems` does not fit in a `usize`
    /// 3. `system_prefix` contains whitespace or a `"`, which would split or quote the id field
    pub fn validate(&self) -> Result<(), GenError> {
        if self.min_value > self.max_value {
            return Err(GenError::InvalidRange {
                low: self.min_value,
                high: self.max_value,
            });
        }
        self.expected_records()?;
        if self
            .system_prefix
            .chars()
            .any(|c| c.is_whitespace() || c == '"')
        {
            return Err(GenError::InvalidPrefix(self.system_prefix.clone()));
        }
        Ok(())
    }

    /// # Errors
    /// Errors when `batches * systems` overflows
    pub fn expected_records(&self) -> Result<usize, GenError> {
        self.batches
            .checked_mul(self.systems)
            .ok_or(GenError::LayoutTooLarge {
                batches: self.batches,
                systems: self.systems,
            })
    }
}
