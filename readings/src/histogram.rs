use std::io::{self, BufRead, Write};

use hdrhistogram::iterators::IterationValue;
use hdrhistogram::Histogram;

use crate::error::GenError;

/// Every value below 2^18 is recorded exactly at this precision
pub const SIGNIFICANT_FIGURES: u8 = 5;

/// Descriptive statistics read off a [`Histogram`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub samples: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Population standard deviation
    pub stdev: f64,
}

/// How the percentile table is cut and drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileOptions {
    /// Lowest percentile shown
    pub lower: f64,
    /// Highest percentile shown
    pub upper: f64,
    /// Linear bucket width; `None` gives one bucket per recorded value
    pub resolution: Option<u64>,
    /// Tick marks in the longest bar, `0.` draws no bars
    pub bar_length: f64,
    /// Decimal places the input was scaled by, see [`read_column`]
    pub sig_figs: Option<u32>,
}

/// One bucket of the percentile table
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRow {
    pub percentile: f64,
    /// Highest (scaled) value in the bucket
    pub value: u64,
    pub count: u64,
    pub bar: String,
}

impl Stats {
    #[must_use]
    pub fn of(histogram: &Histogram<u64>) -> Self {
        if histogram.len() == 0 {
            return Stats::default();
        }
        Stats {
            samples: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            stdev: histogram.stdev(),
        }
    }

    /// `(mean - 3 * stdev, mean + 3 * stdev)`
    #[must_use]
    pub fn outlier_bounds(&self) -> (f64, f64) {
        (self.mean - 3. * self.stdev, self.mean + 3. * self.stdev)
    }
}

impl Default for PercentileOptions {
    fn default() -> Self {
        PercentileOptions {
            lower: 0.,
            upper: 100.,
            resolution: None,
            bar_length: 100.,
            sig_figs: None,
        }
    }
}

impl PercentileOptions {
    /// # Errors
    /// 1. `lower` is greater than `upper`, or either lies outside `0..=100`
    /// 2. `resolution` is `Some(0)`
    pub fn validate(&self) -> Result<(), GenError> {
        if !(0. ..=100.).contains(&self.lower)
            || !(0. ..=100.).contains(&self.upper)
            || self.lower > self.upper
        {
            return Err(GenError::InvalidPercentiles {
                lower: self.lower,
                upper: self.upper,
            });
        }
        if self.resolution == Some(0) {
            return Err(GenError::InvalidResolution);
        }
        Ok(())
    }
}

impl PercentileRow {
    #[must_use]
    pub fn line(&self, sig_figs: Option<u32>) -> String {
        #[allow(clippy::cast_precision_loss)]
        let value = unscale(self.value as f64, sig_figs);
        let line = format!(
            "{:>6.2} {:>10.*} {:>10}",
            self.percentile,
            places(sig_figs),
            value,
            self.count
        );
        if self.bar.is_empty() {
            line
        } else {
            format!("{} {}", line, self.bar)
        }
    }
}

/// # Errors
/// Never in practice: creation only fails for an out of range precision
pub fn new_histogram() -> Result<Histogram<u64>, GenError> {
    Histogram::<u64>::new(SIGNIFICANT_FIGURES).map_err(|e| GenError::Histogram(format!("{:?}", e)))
}

/// # Errors
/// Errors when the histogram cannot grow to hold `value`
pub fn record(histogram: &mut Histogram<u64>, value: u64) -> Result<(), GenError> {
    histogram
        .record(value)
        .map_err(|e| GenError::Histogram(format!("{:?}", e)))
}

/// # Errors
/// Errors for the same reasons as [`record`]
pub fn histogram_of(values: &[u64]) -> Result<Histogram<u64>, GenError> {
    let mut histogram = new_histogram()?;
    for &value in values {
        record(&mut histogram, value)?;
    }
    Ok(histogram)
}

/// Parses a non-negative number. With `sig_figs` the input may be fractional and is
/// kept as `round(value * 10^sig_figs)`.
#[must_use]
pub fn parse_value(raw: &str, sig_figs: Option<u32>) -> Option<u64> {
    match sig_figs {
        None => raw.parse::<u64>().ok(),
        Some(s) => {
            let value = raw.parse::<f64>().ok()?;
            if !value.is_finite() || value < 0. {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
            let scaled = (value * 10f64.powi(s as i32)).round() as u64;
            Some(scaled)
        }
    }
}

/// Undoes the scaling of [`parse_value`]
#[must_use]
pub fn unscale(value: f64, sig_figs: Option<u32>) -> f64 {
    match sig_figs {
        #[allow(clippy::cast_possible_wrap)]
        Some(s) => value / 10f64.powi(s as i32),
        None => value,
    }
}

fn places(sig_figs: Option<u32>) -> usize {
    sig_figs.map_or(0, |s| s as usize)
}

/// Reads the whitespace delimited `column` (zero indexed) of every line.
/// Any number of spaces may surround the value.
///
/// # Errors
/// 1. The reader fails
/// 2. A line has fewer than `column + 1` fields
/// 3. A field does not parse, see [`parse_value`]
pub fn read_column<R: BufRead>(
    reader: R,
    column: usize,
    sig_figs: Option<u32>,
) -> Result<Vec<u64>, GenError> {
    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let raw = line
            .split_ascii_whitespace()
            .nth(column)
            .ok_or(GenError::MissingColumn {
                line: index + 1,
                column,
            })?;
        let value = parse_value(raw, sig_figs).ok_or_else(|| GenError::UnparsableValue {
            line: index + 1,
            column,
            value: raw.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Scales `count` between the smallest and largest bucket counts into a bar of `-`.
/// When every bucket holds the same count each bar is full length.
#[must_use]
pub fn bar_string(count: u64, max: u64, min: u64, bar_length: f64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let scaling = if max <= min {
        1.
    } else {
        count.saturating_sub(min) as f64 / (max - min) as f64
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ticks = (scaling * bar_length) as usize;
    "-".repeat(ticks)
}

/// Buckets of `histogram` within the percentile bounds, highest percentile first.
/// Empty buckets are skipped.
///
/// # Errors
/// Errors when `options` does not validate
pub fn percentiles(
    histogram: &Histogram<u64>,
    options: &PercentileOptions,
) -> Result<Vec<PercentileRow>, GenError> {
    options.validate()?;
    if histogram.len() == 0 {
        return Ok(Vec::new());
    }
    let rows = match options.resolution {
        Some(step) => collect_rows(histogram.iter_linear(step), options),
        None => collect_rows(histogram.iter_recorded(), options),
    };
    Ok(rows)
}

fn collect_rows<I>(buckets: I, options: &PercentileOptions) -> Vec<PercentileRow>
where
    I: Iterator<Item = IterationValue<u64>>,
{
    let buckets: Vec<(f64, u64, u64)> = buckets
        .map(|v| {
            (
                v.percentile(),
                v.value_iterated_to(),
                v.count_since_last_iteration(),
            )
        })
        .filter(|&(_, _, count)| count != 0)
        .collect();
    let max = buckets.iter().map(|&(_, _, count)| count).max().unwrap_or(0);
    let min = buckets.iter().map(|&(_, _, count)| count).min().unwrap_or(0);

    let mut rows: Vec<PercentileRow> = buckets
        .into_iter()
        .filter(|&(percentile, _, _)| options.lower <= percentile && percentile <= options.upper)
        .map(|(percentile, value, count)| PercentileRow {
            percentile,
            value,
            count,
            bar: bar_string(count, max, min, options.bar_length),
        })
        .collect();
    rows.reverse();
    rows
}

/// Prints samples, max, min, mean, and standard deviation, followed by a line for each
/// side on which some value lies at least three standard deviations from the mean.
///
/// # Errors
/// Errors when `writer` fails
#[allow(clippy::cast_precision_loss)]
pub fn write_info_to<W: Write>(
    writer: &mut W,
    stats: &Stats,
    sig_figs: Option<u32>,
) -> Result<(), io::Error> {
    let value_places = places(sig_figs);
    let mean_places = value_places.max(2);
    write!(
        writer,
        "Samples: {0: >7}\n\
        Max:  {1: >10.p$}\n\
        Min:  {2: >10.p$}\n\
        Mean: {3: >10.m$}\n\
        SD:   {4: >10.m$}\n",
        stats.samples,
        unscale(stats.max as f64, sig_figs),
        unscale(stats.min as f64, sig_figs),
        unscale(stats.mean, sig_figs),
        unscale(stats.stdev, sig_figs),
        p = value_places,
        m = mean_places,
    )?;

    if stats.samples == 0 || stats.stdev <= 0. {
        return Ok(());
    }
    let (low, high) = stats.outlier_bounds();
    if high <= stats.max as f64 {
        writeln!(
            writer,
            "Outlier(s) >= {0: >10.1$}",
            unscale(high, sig_figs),
            mean_places
        )?;
    }
    if low >= stats.min as f64 {
        writeln!(
            writer,
            "Outlier(s) <= {0: >10.1$}",
            unscale(low, sig_figs),
            mean_places
        )?;
    }
    Ok(())
}

/// Prints at most `max_lines` rows, preceded by a column header when `header` is set.
///
/// # Errors
/// Errors when `writer` fails
pub fn write_percentiles_to<W: Write>(
    writer: &mut W,
    rows: &[PercentileRow],
    max_lines: usize,
    header: bool,
    sig_figs: Option<u32>,
) -> Result<(), io::Error> {
    if header {
        writeln!(writer, "Percentile  bucket      count")?;
    }
    for row in rows.iter().take(max_lines) {
        writeln!(writer, "{}", row.line(sig_figs))?;
    }
    Ok(())
}
