//! Pulsewire CLI - Command-line interface
//!
//! Headless write/read/encode operations against the loopback backend,
//! for automation and protocol debugging without hardware attached.

use clap::{Parser, Subcommand, ValueEnum};
use pulsewire::core::codec;
use pulsewire::core::protocol::{encode, Frame};
use pulsewire::{AppConfig, LinkDriver, LoopbackGpio};

/// CLI output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format for scripting
    Json,
}

/// Pulsewire CLI
#[derive(Parser, Debug)]
#[command(
    name = "pulsewire",
    version,
    about = "Single-wire pulse-duty-cycle GPIO protocol driver",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Transmit pin (BCM numbering), overrides config
    #[arg(long)]
    tx_pin: Option<u8>,

    /// Receive pin (BCM numbering), overrides config
    #[arg(long)]
    rx_pin: Option<u8>,

    /// Carrier frequency in Hz, overrides config
    #[arg(long)]
    carrier_hz: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write data bytes to a target address
    Write {
        /// Target address, two hex digits (00-7F)
        address: String,

        /// Payload as an even-length hex string, max 8 bytes
        data: String,
    },

    /// Request a read from a target address and decode the response
    Read {
        /// Target address, two hex digits (00-7F)
        address: String,
    },

    /// Encode a frame and dump its pulse table without transmitting
    Encode {
        /// Target address, two hex digits (00-7F)
        address: String,

        /// Payload as an even-length hex string (write frames only)
        #[arg(default_value = "")]
        data: String,

        /// Encode a read frame instead of a write
        #[arg(long)]
        read: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let mut link = AppConfig::load()
        .unwrap_or_else(|e| {
            tracing::warn!("could not load config, using defaults: {e}");
            AppConfig::default()
        })
        .link;
    if let Some(pin) = cli.tx_pin {
        link.tx_pin = pin;
    }
    if let Some(pin) = cli.rx_pin {
        link.rx_pin = pin;
    }
    if let Some(hz) = cli.carrier_hz {
        anyhow::ensure!(hz > 0, "carrier frequency must be non-zero");
        link.carrier_hz = hz;
    }

    match cli.command {
        Commands::Write { address, data } => {
            let backend = LoopbackGpio::new(link.tx_pin, link.rx_pin);
            let mut driver = LinkDriver::new(backend, link);
            let report = driver.write_hex(&address, &data).await?;

            match cli.format {
                OutputFormat::Text => {
                    println!(
                        "wrote {} pulses to address {:#04x} in {} us (transaction {})",
                        report.pulses, report.address, report.wire_time_us, report.id
                    );
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }

        Commands::Read { address } => {
            let backend = LoopbackGpio::new(link.tx_pin, link.rx_pin);
            let mut driver = LinkDriver::new(backend, link);
            let report = driver.read_hex(&address).await?;

            match cli.format {
                OutputFormat::Text => {
                    println!("{}", report.summary);
                    println!(
                        "carrier period {} us, {} bits, {} slot labels in trace",
                        report.decoded.carrier_period_us,
                        report.decoded.bits.len(),
                        report.trace.labels.len()
                    );
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }

        Commands::Encode {
            address,
            data,
            read,
        } => {
            let address = codec::parse_address(&address)?;
            let frame = if read {
                Frame::read(address)?
            } else {
                let payload = codec::parse_payload(&data)?;
                Frame::write(address, &payload)?
            };
            let waveform = encode(&frame, link.tx_pin, link.carrier_hz)?;

            match cli.format {
                OutputFormat::Text => {
                    println!(
                        "{} pulses, {} us on the wire",
                        waveform.len(),
                        waveform.duration_us()
                    );
                    println!("{:>4}  {:>10}  {:>10}  {:>8}", "idx", "set", "clear", "us");
                    for (i, pulse) in waveform.pulses().iter().enumerate() {
                        println!(
                            "{i:>4}  {:#010x}  {:#010x}  {:>8}",
                            pulse.set_mask, pulse.clear_mask, pulse.duration_us
                        );
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&waveform)?);
                }
            }
        }
    }

    Ok(())
}
