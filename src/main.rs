use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use matrix_clock::app::{ClockLoop, StopReason};
use matrix_clock::clock::{FreeRunningClock, SystemClock};
use matrix_clock::config::{Cli, ClockConfig};
use matrix_clock::device::{self, DeviceSession, MatrixDevice};
use matrix_clock::Result;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClockConfig::from(Cli::parse());

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl+C handler: {err}");
    }

    match run(&config, &stop) {
        Ok(reason) => {
            info!("Clock stopped: {reason}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ClockConfig, stop: &AtomicBool) -> Result<StopReason> {
    let mut session = DeviceSession::new(device::open(config)?);

    if let Some(level) = config.startup_brightness() {
        session.set_brightness(level)?;
    }

    let mut clock = ClockLoop::new(config.poll_interval);
    let outcome = match config.start {
        Some(start) => {
            info!("Free-running from {start}");
            clock.run(&mut *session, &mut FreeRunningClock::new(start), stop)
        }
        None => clock.run(&mut *session, &mut SystemClock, stop),
    };

    let released = session.close();
    let reason = outcome?;
    released?;
    Ok(reason)
}
