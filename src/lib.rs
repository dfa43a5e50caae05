//! Live `HH:MM:SS` clock for a 32x8 LED matrix.
//!
//! The drawing code ([`display`], [`font`], [`frame`]) is back-end agnostic;
//! [`device`] supplies a MAX7219 chain on Linux SPI and an SDL emulator, and
//! [`app::ClockLoop`] ties them to a [`clock::TimeSource`].

pub mod app;
pub mod clock;
pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod font;
pub mod frame;

pub use error::{Error, Result};
