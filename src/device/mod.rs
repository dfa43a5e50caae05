//! Display back ends.
//!
//! Every back end implements [`MatrixDevice`]. The binary picks one at startup
//! with [`open`] and hands it to a [`DeviceSession`], which guarantees
//! `release` runs exactly once however the clock loop ends.

use core::ops::{Deref, DerefMut};

use embedded_graphics::prelude::Size;
use log::{error, info};

use crate::config::{ClockConfig, Mode};
use crate::error::Result;
use crate::frame::Frame;

pub mod emulator;
pub mod hardware;

pub use self::emulator::EmulatorSettings;
pub use self::hardware::{BlockOrientation, ChainLayout, Max7219Matrix};

#[cfg(feature = "emulator")]
pub use self::emulator::LedEmulator;
#[cfg(feature = "hardware")]
pub use self::hardware::SpidevMatrix;

/// A pixel matrix the clock can draw on.
pub trait MatrixDevice {
    /// Logical size of the matrix in pixels.
    fn size(&self) -> Size;

    /// Pushes a complete frame to the matrix.
    fn render(&mut self, frame: &Frame) -> Result<()>;

    /// Sets brightness on a 0-255 scale.
    fn set_brightness(&mut self, level: u8) -> Result<()>;

    /// Tears the device down. Later renders fail with `Error::DeviceClosed`
    /// where the back end can tell.
    fn release(&mut self) -> Result<()>;
}

impl<T: MatrixDevice + ?Sized> MatrixDevice for Box<T> {
    fn size(&self) -> Size {
        (**self).size()
    }

    fn render(&mut self, frame: &Frame) -> Result<()> {
        (**self).render(frame)
    }

    fn set_brightness(&mut self, level: u8) -> Result<()> {
        (**self).set_brightness(level)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

/// Owns a device for the lifetime of the program and releases it once.
///
/// [`close`](Self::close) releases explicitly and reports the outcome; if the
/// session is dropped first (early return, panic) the drop releases instead.
pub struct DeviceSession<D: MatrixDevice> {
    device: D,
    released: bool,
}

impl<D: MatrixDevice> DeviceSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            released: false,
        }
    }

    pub fn close(mut self) -> Result<()> {
        self.release_once()
    }

    fn release_once(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        info!("Releasing display device");
        self.device.release()
    }
}

impl<D: MatrixDevice> Deref for DeviceSession<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.device
    }
}

impl<D: MatrixDevice> DerefMut for DeviceSession<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: MatrixDevice> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        if let Err(err) = self.release_once() {
            error!("Failed to release display device: {err}");
        }
    }
}

/// Builds the back end selected by `config.mode`.
///
/// A mode whose cargo feature was not compiled in fails with
/// `Error::FeatureMissing`.
pub fn open(config: &ClockConfig) -> Result<Box<dyn MatrixDevice>> {
    match config.mode {
        Mode::Emulator => open_emulator(config),
        Mode::Hardware => open_hardware(config),
    }
}

#[cfg(feature = "emulator")]
fn open_emulator(config: &ClockConfig) -> Result<Box<dyn MatrixDevice>> {
    let device = LedEmulator::new(&config.emulator)?;
    info!("Running in emulator mode");
    Ok(Box::new(device))
}

#[cfg(not(feature = "emulator"))]
fn open_emulator(_config: &ClockConfig) -> Result<Box<dyn MatrixDevice>> {
    Err(crate::error::Error::FeatureMissing {
        mode: "emulator",
        feature: "emulator",
    })
}

#[cfg(feature = "hardware")]
fn open_hardware(config: &ClockConfig) -> Result<Box<dyn MatrixDevice>> {
    let device = self::hardware::open_spidev(&config.hardware)?;
    info!("Running on hardware (MAX7219)");
    Ok(Box::new(device))
}

#[cfg(not(feature = "hardware"))]
fn open_hardware(_config: &ClockConfig) -> Result<Box<dyn MatrixDevice>> {
    Err(crate::error::Error::FeatureMissing {
        mode: "hardware",
        feature: "hardware",
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;

    struct Releasing {
        releases: Rc<Cell<u32>>,
        fail: bool,
    }

    impl MatrixDevice for Releasing {
        fn size(&self) -> Size {
            Size::new(32, 8)
        }

        fn render(&mut self, _frame: &Frame) -> Result<()> {
            Ok(())
        }

        fn set_brightness(&mut self, _level: u8) -> Result<()> {
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            self.releases.set(self.releases.get() + 1);
            if self.fail {
                Err(Error::Transfer("bus gone".into()))
            } else {
                Ok(())
            }
        }
    }

    fn session(fail: bool) -> (DeviceSession<Releasing>, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        let device = Releasing {
            releases: releases.clone(),
            fail,
        };
        (DeviceSession::new(device), releases)
    }

    #[test]
    fn close_releases_once() {
        let (session, releases) = session(false);
        session.close().unwrap();
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn drop_releases_once() {
        let (session, releases) = session(false);
        drop(session);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn failed_release_is_reported_and_not_retried() {
        let (session, releases) = session(true);
        assert!(session.close().is_err());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn boxed_devices_forward_calls() {
        let releases = Rc::new(Cell::new(0));
        let boxed: Box<dyn MatrixDevice> = Box::new(Releasing {
            releases: releases.clone(),
            fail: false,
        });
        let session = DeviceSession::new(boxed);
        assert_eq!(session.size(), Size::new(32, 8));
        session.close().unwrap();
        assert_eq!(releases.get(), 1);
    }

    #[cfg(not(feature = "emulator"))]
    #[test]
    fn missing_emulator_feature_is_a_startup_error() {
        let config = ClockConfig {
            mode: Mode::Emulator,
            ..ClockConfig::default()
        };
        assert_eq!(
            open(&config).err(),
            Some(Error::FeatureMissing {
                mode: "emulator",
                feature: "emulator"
            })
        );
    }
}
