use core::fmt;

use embedded_graphics::prelude::Size;
use log::{debug, info};
use max7219::{connectors::Connector, MAX7219};

use super::MatrixDevice;
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Pixels per side of one MAX7219 module.
pub const MODULE_SIZE: u32 = 8;
/// Modules a single 32 px frame can feed.
pub const MAX_MODULES: usize = 4;

/// Correction angle for how each 8x8 module is mounted.
///
/// The MAX7219 digit registers are written one per column of the corrected
/// block, bit 0 = top row. `Clockwise` (90) therefore sends one pixel row per
/// register with the leftmost column in bit 7, and `CounterClockwise` (-90)
/// is the same picture turned half way round, which is what FC-16 chains
/// wired like the usual Raspberry Pi boards expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockOrientation {
    Normal,
    Clockwise,
    #[default]
    CounterClockwise,
    UpsideDown,
}

impl BlockOrientation {
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Normal),
            90 => Some(Self::Clockwise),
            -90 | 270 => Some(Self::CounterClockwise),
            180 | -180 => Some(Self::UpsideDown),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Clockwise => 90,
            Self::CounterClockwise => -90,
            Self::UpsideDown => 180,
        }
    }

    /// Turns one block of pixel rows (bit 7 = leftmost column) into the eight
    /// digit register bytes for its module.
    pub fn apply(self, block: &[u8; 8]) -> [u8; 8] {
        let lit = |x: usize, y: usize| block[y] & (0x80 >> x) != 0;
        let mut registers = [0u8; 8];
        for (digit, register) in registers.iter_mut().enumerate() {
            for bit in 0..8 {
                let (x, y) = match self {
                    Self::Normal => (digit, bit),
                    Self::Clockwise => (7 - bit, digit),
                    Self::CounterClockwise => (bit, 7 - digit),
                    Self::UpsideDown => (7 - digit, 7 - bit),
                };
                if lit(x, y) {
                    *register |= 1 << bit;
                }
            }
        }
        registers
    }
}

impl fmt::Display for BlockOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// How the modules are chained into one logical surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLayout {
    pub cascaded: usize,
    pub orientation: BlockOrientation,
    /// Module 0 drives the rightmost block instead of the leftmost.
    pub reverse_blocks: bool,
}

impl Default for ChainLayout {
    fn default() -> Self {
        Self {
            cascaded: MAX_MODULES,
            orientation: BlockOrientation::default(),
            reverse_blocks: false,
        }
    }
}

impl ChainLayout {
    pub fn size(&self) -> Size {
        Size::new(self.cascaded as u32 * MODULE_SIZE, MODULE_SIZE)
    }
}

/// Splits a frame into per-module digit registers, indexed by chain address.
///
/// Module `i` covers columns `8*i..8*i+8`. Entries past `layout.cascaded`
/// stay zero.
pub fn pack_blocks(frame: &Frame, layout: &ChainLayout) -> [[u8; 8]; MAX_MODULES] {
    let cascaded = layout.cascaded.min(MAX_MODULES);
    let mut blocks = [[0u8; 8]; MAX_MODULES];

    for (module, block) in blocks.iter_mut().enumerate().take(cascaded) {
        let shift = 24 - module as u32 * MODULE_SIZE;
        for (row, bits) in block.iter_mut().zip(frame.rows()) {
            *row = ((bits >> shift) & 0xFF) as u8;
        }
        *block = layout.orientation.apply(block);
    }

    if layout.reverse_blocks {
        blocks[..cascaded].reverse();
    }
    blocks
}

/// Maps the 0-255 brightness scale onto the 16 MAX7219 intensity steps.
pub fn intensity(level: u8) -> u8 {
    level >> 4
}

fn transfer<E: fmt::Debug>(err: E) -> Error {
    Error::Transfer(format!("{err:?}"))
}

/// A chain of MAX7219 modules driven as one matrix.
pub struct Max7219Matrix<C: Connector> {
    display: MAX7219<C>,
    layout: ChainLayout,
    released: bool,
}

impl<C: Connector> Max7219Matrix<C> {
    /// Powers the chain on and blanks every module.
    pub fn new(mut display: MAX7219<C>, layout: ChainLayout) -> Result<Self> {
        if layout.cascaded == 0 || layout.cascaded > MAX_MODULES {
            return Err(Error::Startup(format!(
                "{} cascaded modules requested, 1-{MAX_MODULES} supported",
                layout.cascaded
            )));
        }

        display.power_on().map_err(transfer)?;
        for addr in 0..layout.cascaded {
            display.clear_display(addr).map_err(transfer)?;
        }
        debug!(
            "MAX7219 chain ready: {} modules, orientation {}, reversed {}",
            layout.cascaded, layout.orientation, layout.reverse_blocks
        );

        Ok(Self {
            display,
            layout,
            released: false,
        })
    }
}

impl<C: Connector> MatrixDevice for Max7219Matrix<C> {
    fn size(&self) -> Size {
        self.layout.size()
    }

    fn render(&mut self, frame: &Frame) -> Result<()> {
        if self.released {
            return Err(Error::DeviceClosed);
        }
        let blocks = pack_blocks(frame, &self.layout);
        for (addr, block) in blocks.iter().enumerate().take(self.layout.cascaded) {
            self.display.write_raw(addr, block).map_err(transfer)?;
        }
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<()> {
        let intensity = intensity(level);
        for addr in 0..self.layout.cascaded {
            self.display.set_intensity(addr, intensity).map_err(transfer)?;
        }
        info!("Brightness set to {level} (intensity {intensity})");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // power down even if a module refused to clear; report the first error
        let mut outcome = Ok(());
        for addr in 0..self.layout.cascaded {
            if let Err(err) = self.display.clear_display(addr) {
                outcome = outcome.and(Err(transfer(err)));
            }
        }
        let powered_off = self.display.power_off().map_err(transfer);
        outcome.and(powered_off)
    }
}

#[cfg(feature = "hardware")]
pub type SpidevMatrix = Max7219Matrix<
    max7219::connectors::SpiConnectorSW<linux_embedded_hal::Spidev, linux_embedded_hal::SysfsPin>,
>;

/// Opens the SPI bus and latch GPIO described by `config` and wraps them in a
/// MAX7219 chain.
#[cfg(feature = "hardware")]
pub fn open_spidev(config: &crate::config::HardwareConfig) -> Result<SpidevMatrix> {
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
    use linux_embedded_hal::sysfs_gpio::Direction;
    use linux_embedded_hal::{Spidev, SysfsPin};

    let startup = |what: &str, err: &dyn fmt::Debug| Error::Startup(format!("{what}: {err:?}"));

    let mut spi = Spidev::open(&config.spi_device)
        .map_err(|err| startup(&format!("opening {}", config.spi_device), &err))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(config.spi_speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)
        .map_err(|err| startup("configuring SPI", &err))?;

    let cs = SysfsPin::new(config.cs_pin);
    cs.export()
        .map_err(|err| startup(&format!("exporting GPIO {}", config.cs_pin), &err))?;
    // udev may take a moment to hand the exported pin over
    let mut attempts = 0;
    while !cs.is_exported() {
        std::thread::sleep(std::time::Duration::from_millis(10));
        attempts += 1;
        if attempts > 100 {
            return Err(Error::Startup(format!("GPIO {} never appeared", config.cs_pin)));
        }
    }
    cs.set_direction(Direction::High)
        .map_err(|err| startup("configuring latch GPIO", &err))?;

    let display = MAX7219::from_spi_cs(config.layout.cascaded, spi, cs).map_err(transfer)?;
    debug!("Opened {} with latch on GPIO {}", config.spi_device, config.cs_pin);
    Max7219Matrix::new(display, config.layout)
}
