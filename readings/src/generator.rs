use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info};

use crate::clock::Clock;
use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::random::RandomSource;
use crate::record::{file_name, system_id, writer_builder, Record, Timestamp};

/// Outcome of a completed [`Generator::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub path: PathBuf,
    pub records: usize,
}

#[derive(Debug)]
pub struct Generator<C, R> {
    pub(crate) config: GeneratorConfig,
    pub(crate) clock: C,
    pub(crate) random: R,
}

impl<C: Clock, R: RandomSource> Generator<C, R> {
    /// # Errors
    /// Errors when the sample range of `config` is empty
    pub fn new(config: GeneratorConfig, clock: C, random: R) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Generator {
            config,
            clock,
            random,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Stamps and samples a single record for system `system`
    pub fn next_record(&mut self, system: usize) -> Record {
        let timestamp = Timestamp::new(self.clock.now());
        let sample_value = self
            .random
            .uniform_int(self.config.min_value, self.config.max_value);
        Record::new(
            timestamp,
            sample_value,
            system_id(&self.config.system_prefix, system),
        )
    }

    /// Writes `batches * systems` records to `writer`, one per line.
    /// Returns the number of records written.
    ///
    /// # Errors
    /// Errors when the underlying writer fails. Records already written are not rolled back.
    pub fn write_records<W: Write>(&mut self, writer: W) -> Result<usize, GenError> {
        let mut writer = writer_builder().from_writer(writer);
        let mut written = 0;
        for batch in 0..self.config.batches {
            for system in 0..self.config.systems {
                let record = self.next_record(system);
                writer.serialize(&record)?;
                written += 1;
            }
            debug!("Finished batch {} ({} records)", batch, written);
        }
        writer.flush()?;
        Ok(written)
    }

    /// Creates `data_<run start>.txt` in the output directory and fills it.
    /// An existing file of the same name is truncated.
    ///
    /// # Errors
    /// Errors when the file cannot be created or written
    pub fn run(&mut self) -> Result<GenerationReport, GenError> {
        let run_start = Timestamp::new(self.clock.now());
        let path = self.config.output_dir.join(file_name(run_start));
        info!(
            "Writing {} batches of {} systems to {}",
            self.config.batches,
            self.config.systems,
            path.display()
        );

        let file = File::create(&path)?;
        let records = self.write_records(file)?;
        info!("Wrote {} records to {}", records, path.display());

        Ok(GenerationReport { path, records })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::FixedClock;
    use crate::record::system_index;
    use chrono::{NaiveDate, NaiveDateTime};

    /// Replays `values` in order, cycling when exhausted
    struct ScriptedSource {
        values: Vec<u32>,
        next: usize,
    }

    impl RandomSource for ScriptedSource {
        fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
            let value = self.values[self.next % self.values.len()];
            self.next += 1;
            value.clamp(low, high)
        }
    }

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(14, 32, 7))
            .unwrap()
    }

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            batches: 3,
            systems: 4,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_empty_range() {
        let config = GeneratorConfig {
            min_value: 2,
            max_value: 1,
            ..GeneratorConfig::default()
        };
        let res = Generator::new(
            config,
            FixedClock(instant()),
            ScriptedSource {
                values: vec![1],
                next: 0,
            },
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_new_rejects_field_breaking_prefix() {
        let config = GeneratorConfig {
            system_prefix: "star scourge".to_string(),
            ..small_config()
        };
        let res = Generator::new(
            config,
            FixedClock(instant()),
            ScriptedSource {
                values: vec![9742],
                next: 0,
            },
        );
        assert!(matches!(res, Err(GenError::InvalidPrefix(_))));
    }

    #[test]
    fn test_next_record() {
        let mut generator = Generator::new(
            GeneratorConfig::default(),
            FixedClock(instant()),
            ScriptedSource {
                values: vec![8342],
                next: 0,
            },
        )
        .unwrap();
        let record = generator.next_record(3);
        assert_eq!(record.timestamp.to_string(), "0106202514:32:07");
        assert_eq!(record.sample_value, 8342);
        assert_eq!(record.system_id, "starscourge3");
    }

    #[test]
    fn test_write_records() {
        let mut generator = Generator::new(
            small_config(),
            FixedClock(instant()),
            ScriptedSource {
                values: vec![1, 9999, 500],
                next: 0,
            },
        )
        .unwrap();
        let mut out = vec![];
        let written = generator.write_records(&mut out).unwrap();
        assert_eq!(written, 12);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(text.ends_with('\n'));
        assert_eq!(lines[0], "0106202514:32:07 1 starscourge0");
        assert_eq!(lines[1], "0106202514:32:07 9999 starscourge1");
        assert_eq!(lines[2], "0106202514:32:07 500 starscourge2");
        for (i, line) in lines.iter().enumerate() {
            let id = line.rsplit(' ').next().unwrap();
            assert_eq!(system_index("starscourge", id), Some(i % 4));
        }
    }

    #[test]
    fn test_write_records_empty_layout() {
        let config = GeneratorConfig {
            batches: 0,
            ..GeneratorConfig::default()
        };
        let mut generator = Generator::new(
            config,
            FixedClock(instant()),
            ScriptedSource {
                values: vec![1],
                next: 0,
            },
        )
        .unwrap();
        let mut out = vec![];
        assert_eq!(generator.write_records(&mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_missing_directory() {
        let config = GeneratorConfig {
            output_dir: PathBuf::from("/this/directory/does/not/exist"),
            ..small_config()
        };
        let mut generator = Generator::new(
            config,
            FixedClock(instant()),
            ScriptedSource {
                values: vec![1],
                next: 0,
            },
        )
        .unwrap();
        assert!(matches!(generator.run(), Err(GenError::IoError(_))));
    }
}
