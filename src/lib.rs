//! Polling engine for ELM327 OBD-II adapters
//!
//! Sends Mode 01/03/04 requests over any byte stream, frames and time-boxes the adapter's
//! replies, decodes them into physical values and trouble codes, and runs a background polling
//! loop that feeds a consumer with [Event]s.
//!
//! # Usage
//! ```ignore
//! use obd2_poller::{device::SerialPort, Config, Event, PollMode};
//! use std::sync::mpsc;
//!
//! fn main() -> Result<(), obd2_poller::Error> {
//!     let port = SerialPort::new("/dev/rfcomm0")?;
//!     let (tx, rx) = mpsc::channel();
//!     let poller = obd2_poller::connect(port, Config::default(), tx)?;
//!     poller.set_mode(PollMode::Dashboard);
//!     for event in rx {
//!         if let Event::Dashboard(reading) = event {
//!             println!("{} km/h at {} RPM", reading.speed_kmh, reading.rpm);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The example needs the `serialport_comm` feature.

#![forbid(unsafe_code)]

pub mod commands;

pub mod device;

pub mod fuel;

mod cancel;
pub use cancel::CancelToken;

mod config;
pub use config::{Config, FuelConfig};

mod error;
pub use error::{DeviceError, Error, Result};

mod interface;
pub use interface::Obd2;

mod obd2_device;
pub use obd2_device::Obd2Device;

mod protocol;
pub use protocol::ObdProtocol;

pub mod scheduler;
pub use scheduler::{Controller, DashboardReading, Event, PollMode, SchedulerHandle};

mod session;
pub use session::connect;
