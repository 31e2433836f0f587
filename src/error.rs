pub type Result<T> = std::result::Result<T, Error>;

/// An error with OBD-II communication
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error occurred in the [Elm327](crate::device::Elm327) frame reader or its transport
    #[error("Device error: `{0:?}`")]
    Device(DeviceError),

    /// The handshake's `0100` probe was not answered with `4100`
    #[error("Not an OBD-II adapter: `0100` answered with `{response}`")]
    InvalidDevice { response: String },

    /// The adapter stopped answering
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The configuration could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Another error occurred
    #[error("Other OBD2 error: `{0}`")]
    Other(String),
}

#[derive(Debug)]
pub struct DeviceError(crate::device::Error);

impl DeviceError {
    pub fn inner(&self) -> &crate::device::Error {
        &self.0
    }
}

impl Error {
    /// Whether this is a read window expiring without a prompt
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Device(DeviceError(crate::device::Error::Timeout(_)))
        )
    }

    /// Whether the session was cancelled while this operation was waiting
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Device(DeviceError(crate::device::Error::Cancelled)))
    }
}

impl From<crate::device::Error> for Error {
    fn from(e: crate::device::Error) -> Self {
        Error::Device(DeviceError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
