use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use hdrhistogram::Histogram;
use log::{debug, warn};

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::histogram::{new_histogram, record, Stats};
use crate::record::{reader_builder, system_index, Record, Timestamp};

/// Per-system slice of a [`Summary`]
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub system_id: String,
    pub stats: Stats,
}

/// A verified file: statistics over its sample values, overall and per system
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub stats: Stats,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
    /// Keyed by system index, so systems list in numeric order
    pub systems: BTreeMap<usize, SystemSummary>,
}

/// Reads records back from `reader` and checks them against the layout in `config`.
/// `config.output_dir` is ignored.
///
/// # Errors
/// 1. `config` does not validate
/// 2. A line does not parse as a [`Record`]
/// 3. A sample value lies outside `min_value..=max_value`
/// 4. Line `n` (1-based) does not carry system suffix `(n - 1) % systems`
/// 5. The file does not hold exactly `batches * systems` records
pub fn verify<R: Read>(reader: R, config: &GeneratorConfig) -> Result<Summary, GenError> {
    config.validate()?;
    let expected_records = config.expected_records()?;

    let mut reader = reader_builder().from_reader(reader);
    let mut overall = new_histogram()?;
    let mut per_system: BTreeMap<usize, (String, Histogram<u64>)> = BTreeMap::new();
    let mut records = 0;
    let mut first_timestamp = None;
    let mut last_timestamp = None;

    for (index, result) in reader.deserialize::<Record>().enumerate() {
        let line = index + 1;
        let record_line = result.map_err(|e| {
            warn!("Malformed record on line {}: {:?}", line, e);
            e
        })?;

        if record_line.sample_value < config.min_value
            || record_line.sample_value > config.max_value
        {
            warn!("Line {} is out of range: {}", line, record_line.sample_value);
            return Err(GenError::OutOfRange {
                line,
                value: record_line.sample_value,
            });
        }

        let expected = if config.systems == 0 {
            0
        } else {
            index % config.systems
        };
        if config.systems == 0
            || system_index(&config.system_prefix, &record_line.system_id) != Some(expected)
        {
            warn!("Line {} has unexpected system {}", line, record_line.system_id);
            return Err(GenError::SystemOrder {
                line,
                expected,
                found: record_line.system_id,
            });
        }

        let value = u64::from(record_line.sample_value);
        record(&mut overall, value)?;
        match per_system.get_mut(&expected) {
            Some((_, histogram)) => record(histogram, value)?,
            None => {
                let mut histogram = new_histogram()?;
                record(&mut histogram, value)?;
                per_system.insert(expected, (record_line.system_id, histogram));
            }
        }

        records += 1;
        if first_timestamp.is_none() {
            first_timestamp = Some(record_line.timestamp);
        }
        last_timestamp = Some(record_line.timestamp);
    }

    if records != expected_records {
        warn!("Expected {} records, found {}", expected_records, records);
        return Err(GenError::RecordCount {
            expected: expected_records,
            found: records,
        });
    }
    debug!("Verified {} records", records);

    let systems = per_system
        .into_iter()
        .map(|(index, (system_id, histogram))| {
            let summary = SystemSummary {
                system_id,
                stats: Stats::of(&histogram),
            };
            (index, summary)
        })
        .collect();

    Ok(Summary {
        stats: Stats::of(&overall),
        first_timestamp,
        last_timestamp,
        systems,
    })
}

/// # Errors
/// Errors when `path` cannot be opened, or for any reason listed on [`verify`]
pub fn verify_file<P: AsRef<Path>>(path: P, config: &GeneratorConfig) -> Result<Summary, GenError> {
    let file = File::open(path)?;
    verify(file, config)
}
