use std::env;
use std::error::Error;
use std::time::Instant;

use log::warn;

use readings::clock::SystemClock;
use readings::config::GeneratorConfig;
use readings::generator::Generator;
use readings::random::RngSource;
use readings::verify::verify_file;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = GeneratorConfig {
        batches: 100_000,
        output_dir: env::temp_dir(),
        ..GeneratorConfig::default()
    };
    let mut generator = Generator::new(config.clone(), SystemClock, RngSource::seeded(0))?;

    let start = Instant::now();
    let report = generator.run()?;
    warn!("Generating {} records took: {:.2?}", report.records, start.elapsed());

    let start_verify = Instant::now();
    let summary = verify_file(&report.path, &config)?;
    warn!(
        "Verifying {} records took: {:.2?}",
        summary.stats.samples,
        start_verify.elapsed()
    );

    warn!("Total took: {:.2?}", start.elapsed());
    println!("{}", report.path.display());

    Ok(())
}
