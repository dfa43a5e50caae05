use core::convert::Infallible;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{mode} support not compiled in (rebuild with `--features {feature}`)")]
    FeatureMissing {
        mode: &'static str,
        feature: &'static str,
    },

    #[error("device setup failed: {0}")]
    Startup(String),

    #[error("device closed")]
    DeviceClosed,

    #[error("display transfer failed: {0}")]
    Transfer(String),

    #[error("frame of {width}x{height} exceeds the supported 32x8 surface")]
    FrameTooLarge { width: u32, height: u32 },

    #[error("invalid time {0:?}, expected HH:MM:SS")]
    InvalidTime(String),
}

impl Error {
    /// Cooperative stop conditions: the loop ends cleanly rather than failing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::DeviceClosed)
    }
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = core::result::Result<T, Error>;
