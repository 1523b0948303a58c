use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use csv::WriterBuilder;
use hdrhistogram::Histogram;

use readings::clock::{Clock, SystemClock};
use readings::config::{
    GeneratorConfig, DEFAULT_BATCHES, DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE, DEFAULT_SYSTEMS,
    DEFAULT_SYSTEM_PREFIX,
};
use readings::generator::Generator;
use readings::histogram::{
    histogram_of, percentiles, read_column, write_info_to, write_percentiles_to,
    PercentileOptions, Stats,
};
use readings::random::{RandomSource, RngSource};
use readings::verify::{verify, Summary};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    // no subcommand runs `generate` with every default
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a new data_<timestamp>.txt file of random readings
    Generate {
        #[clap(flatten)]
        layout: LayoutArgs,

        /// Directory the data file is created in
        #[clap(short, long, default_value = ".", parse(from_os_str))]
        output_dir: PathBuf,

        /// Seed for reproducible sample values
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Check a generated file against a layout and print histographic information about it
    Summarize {
        /// The data file to read, standard input when omitted
        #[clap(parse(from_os_str))]
        input_file: Option<PathBuf>,

        #[clap(flatten)]
        layout: LayoutArgs,

        #[clap(flatten)]
        report: ReportArgs,

        /// Skip the layout check and the per-system table.
        ///
        /// Any whitespace delimited input is accepted, only `--column` is read.
        #[clap(long)]
        no_verify: bool,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Number of batches; each batch holds one record per system
    #[clap(short, long, default_value_t = DEFAULT_BATCHES)]
    batches: usize,

    /// Number of distinct systems
    #[clap(short, long, default_value_t = DEFAULT_SYSTEMS)]
    systems: usize,

    /// Smallest sample value
    #[clap(long, default_value_t = DEFAULT_MIN_VALUE)]
    min: u32,

    /// Largest sample value
    #[clap(long, default_value_t = DEFAULT_MAX_VALUE)]
    max: u32,

    /// Prefix of every system id
    #[clap(short, long, default_value = DEFAULT_SYSTEM_PREFIX)]
    prefix: String,
}

#[derive(Args)]
struct ReportArgs {
    /// The space delimited column to read data from (zero indexed)
    ///
    /// The column may be surrounded by any number of spaces. The default
    /// is the sample value of a generated file.
    #[clap(short, long, default_value = "1")]
    column: usize,

    /// Lowest percentile to display
    #[clap(short, long, default_value = "0")]
    lower: f64,

    /// Highest percentile to display
    #[clap(short, long, default_value = "100")]
    upper: f64,

    /// Maximum number of percentile lines to display
    #[clap(short, long, default_value = "100")]
    max_lines: usize,

    /// Bucket size for percentile display.
    ///
    /// When supplied, buckets step linearly by this many values instead of
    /// one bucket per recorded value.
    #[clap(short, long)]
    resolution: Option<u64>,

    /// Do not print the info block
    #[clap(long)]
    no_info: bool,

    /// Do not print percentiles. Implies `--no-bars`.
    #[clap(long)]
    no_percentiles: bool,

    /// Do not print the bar chart
    #[clap(long)]
    no_bars: bool,

    /// Number of tick marks in the longest bar
    #[clap(long, default_value = "100")]
    bar_length: f64,

    /// Decimal places to keep for floating point input.
    ///
    /// `1.13` with `--sig-figs 2` is recorded as `113` and printed back as `1.13`.
    #[clap(long)]
    sig_figs: Option<u32>,
}

impl LayoutArgs {
    fn into_config(self, output_dir: PathBuf) -> GeneratorConfig {
        GeneratorConfig {
            batches: self.batches,
            systems: self.systems,
            min_value: self.min,
            max_value: self.max,
            system_prefix: self.prefix,
            output_dir,
        }
    }
}

impl ReportArgs {
    fn percentile_options(&self) -> PercentileOptions {
        let no_bars = self.no_percentiles || self.no_bars;
        PercentileOptions {
            lower: self.lower,
            upper: self.upper,
            resolution: self.resolution,
            bar_length: if no_bars { 0. } else { self.bar_length },
            sig_figs: self.sig_figs,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        None => generate(GeneratorConfig::default(), None),
        Some(Command::Generate {
            layout,
            output_dir,
            seed,
        }) => generate(layout.into_config(output_dir), seed),
        Some(Command::Summarize {
            input_file,
            layout,
            report,
            no_verify,
        }) => {
            report.percentile_options().validate()?;

            let mut input = Vec::new();
            match &input_file {
                Some(path) => {
                    File::open(path)?.read_to_end(&mut input)?;
                }
                None => {
                    let stdin = io::stdin();
                    stdin.lock().read_to_end(&mut input)?;
                }
            }

            let summary = if no_verify {
                None
            } else {
                let config = layout.into_config(PathBuf::from("."));
                Some(verify(input.as_slice(), &config)?)
            };
            let values = read_column(input.as_slice(), report.column, report.sig_figs)?;
            let histogram = histogram_of(&values)?;

            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            write_report(&mut stdout, &report, &histogram, summary.as_ref())
        }
    }
}

fn generate(config: GeneratorConfig, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    match seed {
        Some(seed) => run(config, SystemClock, RngSource::seeded(seed)),
        None => run(config, SystemClock, RngSource::thread()),
    }
}

fn run<C: Clock, R: RandomSource>(
    config: GeneratorConfig,
    clock: C,
    random: R,
) -> Result<(), Box<dyn Error>> {
    let mut generator = Generator::new(config, clock, random)?;
    let report = generator.run()?;
    println!("{}", report.path.display());
    Ok(())
}

/// Info block, percentile table, then the per-system table of a verified file
fn write_report<W: Write>(
    writer: &mut W,
    report: &ReportArgs,
    histogram: &Histogram<u64>,
    summary: Option<&Summary>,
) -> Result<(), Box<dyn Error>> {
    if !report.no_info {
        write_info_to(writer, &Stats::of(histogram), report.sig_figs)?;
        if let Some(summary) = summary {
            write_span_to(writer, summary)?;
        }
    }

    if !report.no_percentiles {
        let rows = percentiles(histogram, &report.percentile_options())?;
        write_percentiles_to(
            writer,
            &rows,
            report.max_lines,
            !report.no_info,
            report.sig_figs,
        )?;
    }

    if let Some(summary) = summary {
        write_systems_to(writer, summary)?;
    }
    Ok(())
}

fn write_span_to<W: Write>(writer: &mut W, summary: &Summary) -> Result<(), io::Error> {
    if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
        writeln!(writer, "From: {}\nTo:   {}", first, last)?;
    }
    Ok(())
}

fn write_systems_to<W: Write>(writer: &mut W, summary: &Summary) -> Result<(), Box<dyn Error>> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(&["system", "samples", "min", "max", "mean"])?;
    for system in summary.systems.values() {
        writer.write_record(&[
            system.system_id.clone(),
            system.stats.samples.to_string(),
            system.stats.min.to_string(),
            system.stats.max.to_string(),
            format!("{:.2}", system.stats.mean),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const DATA: &str = "0106202514:32:07 10 starscourge0\n\
                        0106202514:32:07 20 starscourge1\n\
                        0106202514:32:08 30 starscourge0\n\
                        0106202514:32:09 40 starscourge1\n";

    fn report_args() -> ReportArgs {
        ReportArgs {
            column: 1,
            lower: 0.,
            upper: 100.,
            max_lines: 100,
            resolution: None,
            no_info: false,
            no_percentiles: false,
            no_bars: true,
            bar_length: 100.,
            sig_figs: None,
        }
    }

    fn render(report: &ReportArgs, data: &str, verified: bool) -> String {
        let summary = if verified {
            let config = GeneratorConfig {
                batches: 2,
                systems: 2,
                ..GeneratorConfig::default()
            };
            Some(verify(data.as_bytes(), &config).unwrap())
        } else {
            None
        };
        let values = read_column(data.as_bytes(), report.column, report.sig_figs).unwrap();
        let histogram = histogram_of(&values).unwrap();
        let mut out = vec![];
        write_report(&mut out, report, &histogram, summary.as_ref()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_full_report() {
        assert_eq!(
            render(&report_args(), DATA, true),
            "Samples:       4\n\
            Max:          40\n\
            Min:          10\n\
            Mean:      25.00\n\
            SD:        11.18\n\
            From: 0106202514:32:07\n\
            To:   0106202514:32:09\n\
            Percentile  bucket      count\n\
            100.00         40          1\n \
            75.00         30          1\n \
            50.00         20          1\n \
            25.00         10          1\n\
            system,samples,min,max,mean\n\
            starscourge0,2,10,30,20.00\n\
            starscourge1,2,20,40,30.00\n"
        );
    }

    #[test]
    fn test_report_with_outlier() {
        let mut data = "10\n".repeat(99);
        data.push_str("1000\n");
        let report = ReportArgs {
            column: 0,
            no_percentiles: true,
            ..report_args()
        };
        assert_eq!(
            render(&report, &data, false),
            "Samples:     100\n\
            Max:        1000\n\
            Min:          10\n\
            Mean:      19.90\n\
            SD:        98.50\n\
            Outlier(s) >=     315.41\n"
        );
    }

    #[test]
    fn test_report_without_info() {
        let report = ReportArgs {
            no_info: true,
            max_lines: 2,
            ..report_args()
        };
        assert_eq!(
            render(&report, DATA, false),
            "100.00         40          1\n 75.00         30          1\n"
        );
    }

    #[test]
    fn test_report_bars() {
        let report = ReportArgs {
            no_info: true,
            no_bars: false,
            bar_length: 4.,
            ..report_args()
        };
        assert_eq!(
            render(&report, "1\n1\n2\n", false),
            "100.00          2          1\n 66.67          1          2 ----\n"
        );

        let report = ReportArgs {
            no_percentiles: true,
            no_bars: false,
            ..report_args()
        };
        assert!((report.percentile_options().bar_length).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_default_invocation() {
        let cli = Cli::try_parse_from(["readings-cli"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::try_parse_from([
            "readings-cli",
            "summarize",
            "--column",
            "0",
            "--sig-figs",
            "2",
            "--resolution",
            "50",
            "--no-verify",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Summarize {
                input_file,
                layout,
                report,
                no_verify,
            }) => {
                assert!(input_file.is_none());
                assert!(no_verify);
                assert_eq!(layout.batches, DEFAULT_BATCHES);
                assert_eq!(report.column, 0);
                assert_eq!(report.sig_figs, Some(2));
                assert_eq!(report.resolution, Some(50));
                assert_eq!(report.max_lines, 100);
            }
            _ => panic!("expected summarize"),
        }
    }
}
