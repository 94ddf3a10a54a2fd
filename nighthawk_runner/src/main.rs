mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "run-nighthawk", about = "Nighthawk NFC detector runner for Vesper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a Nighthawk detection CSV file to a Vesper JSON detection file
    Convert {
        /// Audio file the detections were made on
        input_file_path: PathBuf,
        /// Directory holding the detection files (default: input file directory)
        #[arg(long = "output-dir")]
        output_dir_path: Option<PathBuf>,
        /// Hop duration in seconds, in (0, 1]
        #[arg(long, default_value_t = commands::convert::DEFAULT_HOP_DURATION,
              value_parser = commands::convert::parse_hop_duration)]
        hop_duration: f64,
        /// Detection threshold, in [0, 100]
        #[arg(long, default_value_t = commands::convert::DEFAULT_THRESHOLD,
              value_parser = commands::convert::parse_threshold)]
        threshold: f64,
    },
    /// Run a detector on an audio file and print its clips as JSON lines
    Detect {
        /// Audio file to run the detector on
        input_file_path: PathBuf,
        /// Detector name, e.g. "Nighthawk 0.1.0 80 NMO"
        #[arg(long, short)]
        detector: String,
        /// Channel of the audio file to process
        #[arg(long, default_value_t = 0)]
        channel: u16,
    },
    /// Print and validate the bundled plugin manifest
    Manifest {
        /// Host version to check the manifest's version requirement against
        #[arg(long, env = "VESPER_VERSION")]
        host_version: Option<String>,
    },
}

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();
    let Cli { command } = Cli::parse();

    match command {
        Command::Convert {
            input_file_path,
            output_dir_path,
            hop_duration,
            threshold,
        } => {
            tracing::info!(hop_duration, threshold, "Converting detections");
            let out = commands::convert::run(&input_file_path, output_dir_path.as_deref())?;
            println!("{out}");
        }
        Command::Detect {
            input_file_path,
            detector,
            channel,
        } => {
            let out = commands::detect::run(&input_file_path, &detector, channel).await?;
            print!("{out}");
        }
        Command::Manifest { host_version } => {
            let out = commands::manifest::run(host_version.as_deref())?;
            println!("{out}");
        }
    }

    Ok(())
}
