mod bootsel;
mod hex;
mod layout;
mod simulate;
mod uf2;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orion-cli")]
#[command(about = "Orion's Hands keyboard tooling: layout, simulation and RP2040 flashing")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the keymap layers as an HTML/SVG page
    Layout {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the firmware against a scripted sequence of key presses
    Simulate {
        /// Path to the key script
        script: PathBuf,
        /// Simulated run time in milliseconds
        #[arg(short, long, default_value_t = 3000)]
        duration: u64,
    },
    /// Convert an Intel HEX image and copy it to a mounted BOOTSEL drive
    Flash {
        /// Path to the Intel HEX firmware file
        firmware: PathBuf,
        /// Mount point of the RPI-RP2 drive
        #[arg(short, long)]
        mount: PathBuf,
    },
    /// Convert an Intel HEX image to UF2
    Uf2 {
        /// Path to the Intel HEX firmware file
        firmware: PathBuf,
        /// Output UF2 file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Detect if an RP2040 is connected in BOOTSEL mode
    Detect,
}

/// Read an Intel HEX file and encode it as an RP2040 UF2 image.
fn load_uf2(firmware: &Path) -> Result<Vec<u8>> {
    let contents = fs::read_to_string(firmware)
        .with_context(|| format!("reading {}", firmware.display()))?;

    let image = uf2::Uf2Image::from_hex(&contents).context("reading Intel HEX file")?;
    println!("Firmware: {} flash pages", image.page_count());

    let blocks = image.encode(uf2::FAMILY_RP2040)?;
    debug!("UF2 image: {} blocks", blocks.len() / uf2::BLOCK_SIZE);
    Ok(blocks)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Layout { output } => {
            let html = layout::generate_html();
            match output {
                Some(path) => {
                    fs::write(&path, html)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Layout written to {}", path.display());
                }
                None => print!("{}", html),
            }
        }
        Command::Simulate { script, duration } => {
            let contents = fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let steps = simulate::parse_script(&contents)
                .with_context(|| format!("parsing {}", script.display()))?;

            for sent in simulate::run(&steps, duration)? {
                println!("{:>6} ms  {}", sent.at_ms, simulate::format_frame(&sent.frame));
            }
        }
        Command::Flash { firmware, mount } => {
            let image = load_uf2(&firmware)?;

            if !bootsel::detect()? {
                bail!("RP2040 bootloader not detected. Hold BOOTSEL while plugging in the keyboard.");
            }

            bootsel::flash(&mount, &image)?;
        }
        Command::Uf2 { firmware, output } => {
            let image = load_uf2(&firmware)?;
            fs::write(&output, &image)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), image.len());
        }
        Command::Detect => {
            if bootsel::detect()? {
                println!("RP2040 bootloader detected (BOOTSEL mode).");
            } else {
                println!("RP2040 bootloader not detected.");
                println!("Hold BOOTSEL while plugging in the keyboard to enter bootloader mode.");
            }
        }
    }

    Ok(())
}
