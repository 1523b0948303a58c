use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GenError;

/// Day-month-year immediately followed by clock time, e.g. `0106202514:32:07`
pub const TIMESTAMP_FORMAT: &str = "%d%m%Y%H:%M:%S";

pub const FIELD_DELIMITER: u8 = b' ';

/// A wall-clock instant rendered in [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

/// One line of an output file:
/// `<timestamp> <sample_value> <system_id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: Timestamp,
    pub sample_value: u32,
    pub system_id: String,
}

impl Timestamp {
    #[must_use]
    pub fn new(instant: NaiveDateTime) -> Self {
        Timestamp(instant)
    }

    #[must_use]
    pub fn instant(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(instant: NaiveDateTime) -> Self {
        Timestamp(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = GenError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Timestamp(NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)?))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| de::Error::custom(format!("{}: {:?}", e, raw)))
    }
}

impl Record {
    #[must_use]
    pub fn new(timestamp: Timestamp, sample_value: u32, system_id: String) -> Self {
        Record {
            timestamp,
            sample_value,
            system_id,
        }
    }
}

#[must_use]
pub fn system_id(prefix: &str, index: usize) -> String {
    format!("{}{}", prefix, index)
}

/// Recovers the index from a system id built by [`system_id`].
/// `None` if the prefix differs or the suffix is not a plain decimal number.
#[must_use]
pub fn system_index(prefix: &str, id: &str) -> Option<usize> {
    let suffix = id.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Name of the file a run started at `run_start` writes to
#[must_use]
pub fn file_name(run_start: Timestamp) -> String {
    format!("data_{}.txt", run_start)
}

pub(crate) fn writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .quote_style(QuoteStyle::Never);
    builder
}

pub(crate) fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(false);
    builder
}
