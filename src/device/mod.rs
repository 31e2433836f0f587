//! Byte-level access to the adapter

use std::time::Duration;

mod elm327;
pub use elm327::{clean_response, Elm327};

mod serial_comm;
pub use serial_comm::Transport;

#[cfg(feature = "serialport_comm")]
mod serialport_comm;
#[cfg(feature = "serialport_comm")]
pub use serialport_comm::SerialPort;

#[cfg(feature = "ftdi_comm")]
mod ftdi_comm;
#[cfg(feature = "ftdi_comm")]
pub use ftdi_comm::FTDIDevice;

#[cfg(test)]
pub(crate) mod mock;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// An error talking to the adapter
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "ftdi_comm")]
    #[error("FTDI error: `{0:?}`")]
    Ftdi(ftdi::Error),

    #[cfg(feature = "serialport_comm")]
    #[error("Serial port error: `{0:?}`")]
    Serialport(serialport::Error),

    #[error("IO error: `{0:?}`")]
    IO(std::io::Error),

    /// No `>` prompt arrived within the read window
    #[error("Timeout: no prompt within {0:?}")]
    Timeout(Duration),

    /// The session was cancelled while waiting on the adapter
    #[error("Cancelled")]
    Cancelled,

    #[error("Communication error: `{0}`")]
    Communication(String),
}

#[cfg(feature = "ftdi_comm")]
impl From<ftdi::Error> for Error {
    fn from(e: ftdi::Error) -> Self {
        Error::Ftdi(e)
    }
}

#[cfg(feature = "serialport_comm")]
impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serialport(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}
