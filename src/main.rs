//! jlcprep - Convert PCB exports to JLCPCB assembly format

use jlcprep::{config::Config, converter::Converter};
use tracing::{error, info};

fn main() {
    // Parse configuration and initialize logging
    let config = Config::from_args().unwrap_or_else(|e| {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    });

    let mut converter = Converter::new(config);

    if let Err(e) = converter.run() {
        error!("Conversion failed: {:#}", e);
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }

    let stats = converter.get_conversion_stats();
    info!("Conversion finished: {:?}", stats);

    println!(
        "Done: {} steps completed, {} skipped, {} failed",
        stats.steps_completed, stats.steps_skipped, stats.steps_failed
    );
}
