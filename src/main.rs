//! medvol command line front end.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use medvol::{LoadOptions, LogLevel, Volume};

#[derive(Parser, Debug)]
#[command(name = "medvol", version, about = "Stack DICOM series and NRRD masks into 4-D arrays")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Load options from a JSON file; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Decode files one at a time on the calling thread
    #[arg(long, global = true)]
    sequential: bool,

    /// Number of decode threads
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Follow symbolic links while scanning
    #[arg(long, global = true)]
    follow_links: bool,

    /// Write the stacked volume to a NumPy .npy file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every .dcm file below DIR
    Dicom {
        dir: PathBuf,
    },
    /// Load every mask below DIR whose filename contains REGION
    Masks {
        dir: PathBuf,
        #[arg(short, long)]
        region: String,
    },
}

impl Cli {
    fn load_options(&self) -> Result<LoadOptions, String> {
        let mut options = match &self.config {
            Some(path) => LoadOptions::from_json_file(path)
                .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?,
            None => LoadOptions::default(),
        };
        if self.sequential {
            options.parallel = false;
        }
        if self.threads.is_some() {
            options.threads = self.threads;
        }
        if self.follow_links {
            options.follow_links = true;
        }
        Ok(options)
    }
}

fn run(cli: &Cli) -> Result<Volume, String> {
    let options = cli.load_options()?;
    log::debug!("Load options: {:?}", options);

    let volume = match &cli.command {
        Command::Dicom { dir } => medvol::load_dicom_with(dir, &options),
        Command::Masks { dir, region } => medvol::load_masks_with(dir, region, &options),
    }
    .map_err(|e| e.to_string())?;

    if let Some(output) = &cli.output {
        volume
            .write_npy(output)
            .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
        log::info!("Wrote {}", output.display());
    }
    Ok(volume)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(volume) => {
            let [n, rows, columns, channels] = volume.shape();
            println!(
                "shape=({}, {}, {}, {}) dtype={}",
                n,
                rows,
                columns,
                channels,
                volume.pixel_type()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
