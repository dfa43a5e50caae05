use std::time::Duration;

use clap::Parser;

use crate::clock::ClockState;
use crate::device::{BlockOrientation, ChainLayout, EmulatorSettings};

pub const DEFAULT_BRIGHTNESS: u8 = 128;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Command line of the `matrix-clock` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "matrix-clock",
    version,
    about = "HH:MM:SS clock for a 32x8 MAX7219 LED matrix",
    after_help = "Examples:\n  \
        matrix-clock --emulator          Run in an on-screen emulator\n  \
        matrix-clock                     Run on MAX7219 hardware\n  \
        matrix-clock --brightness 64     Run with lower brightness"
)]
pub struct Cli {
    /// Use the on-screen emulator instead of real hardware
    #[arg(short, long)]
    pub emulator: bool,

    /// Display brightness, hardware only
    #[arg(short, long, default_value_t = DEFAULT_BRIGHTNESS, value_name = "0-255")]
    pub brightness: u8,

    /// spidev node the MAX7219 chain hangs off
    #[arg(long, default_value = "/dev/spidev0.0")]
    pub spi_device: String,

    /// SPI clock in Hz
    #[arg(long, default_value_t = 1_000_000)]
    pub spi_speed: u32,

    /// sysfs GPIO number wired to the chain's LOAD/CS line
    #[arg(long, default_value_t = 25)]
    pub cs_pin: u64,

    /// Number of chained 8x8 modules
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub cascaded: u8,

    /// Per-block rotation in degrees (0, 90, -90, 180)
    #[arg(long, default_value = "-90", allow_hyphen_values = true, value_parser = parse_orientation)]
    pub orientation: BlockOrientation,

    /// Module 0 is the rightmost block
    #[arg(long)]
    pub reverse_blocks: bool,

    /// Emulator window pixels per LED
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(4..=64))]
    pub scale: u32,

    /// Run a free-running clock from this time instead of the system clock
    #[arg(long, value_name = "HH:MM:SS")]
    pub start: Option<ClockState>,

    /// Milliseconds between clock polls
    #[arg(long, default_value_t = 10)]
    pub poll_ms: u64,
}

fn parse_orientation(value: &str) -> Result<BlockOrientation, String> {
    value
        .parse::<i32>()
        .ok()
        .and_then(BlockOrientation::from_degrees)
        .ok_or_else(|| format!("{value:?} is not one of 0, 90, -90, 180"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Hardware,
    Emulator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    pub spi_device: String,
    pub spi_speed_hz: u32,
    pub cs_pin: u64,
    pub layout: ChainLayout,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            spi_device: "/dev/spidev0.0".to_string(),
            spi_speed_hz: 1_000_000,
            cs_pin: 25,
            layout: ChainLayout::default(),
        }
    }
}

/// Everything the binary needs to start, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    pub mode: Mode,
    pub brightness: u8,
    pub hardware: HardwareConfig,
    pub emulator: EmulatorSettings,
    pub start: Option<ClockState>,
    pub poll_interval: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Hardware,
            brightness: DEFAULT_BRIGHTNESS,
            hardware: HardwareConfig::default(),
            emulator: EmulatorSettings::default(),
            start: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClockConfig {
    /// Brightness to apply at startup. The emulator keeps its own LED color.
    pub fn startup_brightness(&self) -> Option<u8> {
        match self.mode {
            Mode::Hardware => Some(self.brightness),
            Mode::Emulator => None,
        }
    }
}

impl From<Cli> for ClockConfig {
    fn from(cli: Cli) -> Self {
        let layout = ChainLayout {
            cascaded: usize::from(cli.cascaded),
            orientation: cli.orientation,
            reverse_blocks: cli.reverse_blocks,
        };

        Self {
            mode: if cli.emulator {
                Mode::Emulator
            } else {
                Mode::Hardware
            },
            brightness: cli.brightness,
            hardware: HardwareConfig {
                spi_device: cli.spi_device,
                spi_speed_hz: cli.spi_speed,
                cs_pin: cli.cs_pin,
                layout,
            },
            emulator: EmulatorSettings {
                size: layout.size(),
                scale: cli.scale,
                ..EmulatorSettings::default()
            },
            start: cli.start,
            poll_interval: Duration::from_millis(cli.poll_ms),
        }
    }
}
