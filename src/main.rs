use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use remocon::transport::UsbTransport;
use remocon::{format, DeviceProfile, Remocon};

#[derive(Parser)]
#[command(
    name = "remocon",
    about = "Capture and replay infrared signals with the ADIR01P USB remote controller"
)]
struct Cli {
    /// Dump every frame exchanged with the device
    #[arg(short, long, global = true)]
    debug: bool,

    /// Carrier frequency in Hz, overrides the profile default and recording files
    #[arg(short, long, global = true)]
    frequency: Option<u32>,

    /// Device profile in YAML, instead of the built-in ADIR01P one
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the connected devices
    List {},
    /// Print the firmware version
    Version {},
    /// Capture one infrared transmission
    Receive {
        /// Give up after this many seconds without a complete signal
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Pause between empty sample reads, in milliseconds
        #[arg(long, default_value_t = 0)]
        poll_interval: u64,
        /// Write the recording here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a recording, `-` reads it from stdin
    Transmit { path: PathBuf },
}

fn open(profile: DeviceProfile) -> Result<Remocon<UsbTransport>> {
    let name = profile.to_string();
    Remocon::new_from_usb(profile).with_context(|| format!("opening {}", name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        simplelog::LevelFilter::Trace
    } else {
        simplelog::LevelFilter::Info
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let profile = match &cli.profile {
        Some(path) => DeviceProfile::from_file(path)
            .with_context(|| format!("loading device profile {}", path.display()))?,
        None => DeviceProfile::adir01p()?,
    };

    match cli.command {
        Commands::List {} => {
            let n = UsbTransport::scan_devices(&profile)?;
            log::info!("Found {} {} device(s)", n, profile.name);
        }
        Commands::Version {} => {
            let mut remocon = open(profile)?;
            let version = remocon.version()?;
            println!("version={}", version);
        }
        Commands::Receive {
            timeout,
            poll_interval,
            output,
        } => {
            let mut remocon = open(profile)?;
            let frequency = cli
                .frequency
                .unwrap_or(remocon.profile().frequency.default);
            let timeout =
                Duration::from_secs(timeout.unwrap_or(remocon.profile().receive_timeout_secs));
            remocon.set_poll_interval(Duration::from_millis(poll_interval));

            let recording = remocon.capture(frequency, timeout)?;
            match output {
                Some(path) => {
                    format::write_recording(&path, &recording)?;
                    log::info!("Recording written to {}", path.display());
                }
                None => print!("{}", recording),
            }
        }
        Commands::Transmit { path } => {
            let mut remocon = open(profile)?;
            let mut recording = format::read_recording(&path, remocon.profile().capacity)
                .with_context(|| format!("reading {}", path.display()))?;
            if let Some(frequency) = cli.frequency {
                recording.frequency = frequency;
            }
            remocon.transmit(&recording)?;
        }
    }

    Ok(())
}
