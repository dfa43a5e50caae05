use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::clock::{format_time, ClockState, TimeSource, TIME_TEXT_LEN};
use crate::device::MatrixDevice;
use crate::display::draw_time_string;
use crate::error::Result;
use crate::frame::with_frame;

/// Row the time string is drawn on.
const Y_OFFSET: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
    Rendering,
    Stopped,
}

/// Why [`ClockLoop::run`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    DeviceClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Interrupted => f.write_str("interrupted"),
            StopReason::DeviceClosed => f.write_str("display closed"),
        }
    }
}

/// Polls a time source and redraws the matrix once per second.
pub struct ClockLoop {
    state: LoopState,
    last_second: Option<u8>,
    poll_interval: Duration,
    frames: u64,
}

impl ClockLoop {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: LoopState::Idle,
            last_second: None,
            poll_interval,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Handles one snapshot. Renders and returns `true` when the second
    /// differs from the previous poll.
    pub fn poll<D>(&mut self, device: &mut D, now: ClockState) -> Result<bool>
    where
        D: MatrixDevice + ?Sized,
    {
        self.state = LoopState::Polling;
        if self.last_second == Some(now.secs) {
            return Ok(false);
        }
        self.last_second = Some(now.secs);

        self.state = LoopState::Rendering;
        let mut buf = [0u8; TIME_TEXT_LEN];
        let text = format_time(&now, &mut buf)?;
        with_frame(device, |frame| {
            draw_time_string(frame, text, Y_OFFSET)?;
            Ok(())
        })?;
        debug!("Rendered {text}");

        self.frames += 1;
        self.state = LoopState::Polling;
        Ok(true)
    }

    /// Runs until `stop` is raised or the device reports it was closed.
    ///
    /// Any other error ends the loop and is returned; the caller still owns
    /// the device and is responsible for releasing it.
    pub fn run<D, T>(&mut self, device: &mut D, source: &mut T, stop: &AtomicBool) -> Result<StopReason>
    where
        D: MatrixDevice + ?Sized,
        T: TimeSource + ?Sized,
    {
        info!("Starting clock display... Press Ctrl+C to exit.");
        self.state = LoopState::Polling;

        let reason = loop {
            if stop.load(Ordering::Relaxed) {
                break StopReason::Interrupted;
            }
            match self.poll(device, source.now()) {
                Ok(_) => {}
                Err(err) if err.is_cancellation() => break StopReason::DeviceClosed,
                Err(err) => {
                    self.state = LoopState::Stopped;
                    return Err(err);
                }
            }
            if !self.poll_interval.is_zero() {
                thread::sleep(self.poll_interval);
            }
        };

        self.state = LoopState::Stopped;
        info!("Clock stopped ({reason}) after {} frames", self.frames);
        Ok(reason)
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::Size;

    use super::*;
    use crate::frame::Frame;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Frame>,
    }

    impl MatrixDevice for Recorder {
        fn size(&self) -> Size {
            Size::new(32, 8)
        }

        fn render(&mut self, frame: &Frame) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn set_brightness(&mut self, _level: u8) -> Result<()> {
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn starts_idle_and_renders_first_poll() {
        let mut clock = ClockLoop::new(Duration::ZERO);
        assert_eq!(clock.state(), LoopState::Idle);

        let mut device = Recorder::default();
        assert!(clock.poll(&mut device, ClockState::new(0, 0, 0)).unwrap());
        assert_eq!(clock.state(), LoopState::Polling);
        assert_eq!(device.frames.len(), 1);
    }

    #[test]
    fn same_second_does_not_render() {
        let mut clock = ClockLoop::new(Duration::ZERO);
        let mut device = Recorder::default();
        let now = ClockState::new(10, 20, 30);

        assert!(clock.poll(&mut device, now).unwrap());
        assert!(!clock.poll(&mut device, now).unwrap());
        assert!(!clock.poll(&mut device, now).unwrap());
        assert_eq!(device.frames.len(), 1);
        assert_eq!(clock.frames_rendered(), 1);
    }

    #[test]
    fn invalid_snapshot_fails_without_rendering() {
        let mut clock = ClockLoop::new(Duration::ZERO);
        let mut device = Recorder::default();
        assert!(clock.poll(&mut device, ClockState::new(99, 0, 0)).is_err());
        assert!(device.frames.is_empty());
    }

    #[test]
    fn raised_stop_flag_ends_run_before_polling() {
        struct Unused;
        impl TimeSource for Unused {
            fn now(&mut self) -> ClockState {
                panic!("polled after stop");
            }
        }

        let mut clock = ClockLoop::new(Duration::ZERO);
        let stop = AtomicBool::new(true);
        let reason = clock.run(&mut Recorder::default(), &mut Unused, &stop).unwrap();
        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(clock.state(), LoopState::Stopped);
    }
}
