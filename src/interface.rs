use log::{debug, info, trace, warn};
use std::time::Duration;

use crate::{
    cancel::CancelToken,
    commands::{Command, Reading},
    device::{Elm327, Error as DeviceError, Transport},
    Config, Error, Obd2Device, Result,
};

/// An OBD-II interface
///
/// Wraps an [Elm327] frame reader over some [Transport] to allow for higher-level usage of the
/// OBD-II interface. Run [handshake](Self::handshake) once before anything else.
pub struct Obd2<T: Transport> {
    device: Elm327<T>,
    config: Config,
    cancel: CancelToken,
}

impl<T: Transport> Obd2<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Self::with_cancel_token(transport, config, CancelToken::new())
    }

    /// Like [new](Self::new), but waits are cut short when `cancel` fires
    pub fn with_cancel_token(transport: T, config: Config, cancel: CancelToken) -> Self {
        Obd2 {
            device: Elm327::new(transport, &config, cancel.clone()),
            config,
            cancel,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Initialise the adapter and check that it talks to a vehicle
    ///
    /// Turns echo off, forces the configured protocol, waits for the adapter to lock on and
    /// probes the supported PIDs with `0100`. Anything but a `4100` reply means this is not a
    /// usable OBD-II adapter and [Error::InvalidDevice] is returned.
    pub fn handshake(&mut self) -> Result<()> {
        info!("Disabling echo");
        let response = self.device.execute_simple("ATE0")?;
        debug!("handshake: ATE0 got response {:?}", response);

        let protocol = self.config.protocol;
        info!(
            "Selecting protocol {:?} (CAN: {})",
            protocol,
            protocol.is_can()
        );
        let response = self.device.execute_simple(protocol.to_elm_command())?;
        debug!(
            "handshake: {} got response {:?}",
            protocol.to_elm_command(),
            response
        );

        self.pause(self.config.handshake_settle())?;

        let response = self.device.execute_simple("0100")?;
        if response.contains("4100") {
            info!("Adapter answered the supported PID probe");
            Ok(())
        } else {
            warn!("0100 answered with {:?}, not an OBD-II adapter", response);
            Err(Error::InvalidDevice { response })
        }
    }
}

impl<T: Transport> Obd2Device for Obd2<T> {
    fn run(&mut self, command: &Command) -> Result<Reading> {
        let response = self
            .device
            .execute(command.request_code(), self.config.frame_timeout())?;

        let reading = Reading {
            value: command.decode(&response),
            command: command.clone(),
        };
        trace!("{} {:?} -> {:?}", command.name(), response, reading.value);
        Ok(reading)
    }

    fn pause(&mut self, duration: Duration) -> Result<()> {
        if self.cancel.sleep(duration) {
            Err(DeviceError::Cancelled.into())
        } else {
            Ok(())
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.device.close() {
            warn!("Failed to close transport: {}", e);
        }
    }
}
