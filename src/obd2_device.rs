use std::time::Duration;

use crate::commands::{Command, Dtc, Pid, Reading};
use crate::Result;

/// A higher-level API for using an OBD-II device
///
/// Only one command is ever in flight: every method takes `&mut self` and runs to completion
/// before returning.
pub trait Obd2Device {
    /// Send a command and decode the reply
    ///
    /// A reply that does not match the command still succeeds, with the command's default
    /// value. Errors mean the adapter did not answer (timeout) or the transport failed.
    fn run(&mut self, command: &Command) -> Result<Reading>;

    /// Wait for the adapter, returning early with an error if the session is cancelled
    fn pause(&mut self, duration: Duration) -> Result<()>;

    /// Close the underlying transport; calling it again does nothing
    fn close(&mut self);

    /// Get the speed in km/h
    fn get_speed(&mut self) -> Result<i32> {
        Ok(self.run(&Pid::Speed.into())?.number().unwrap_or(0))
    }

    /// Get the RPM, rounded down
    fn get_rpm(&mut self) -> Result<i32> {
        Ok(self.run(&Pid::Rpm.into())?.number().unwrap_or(0))
    }

    /// Get the temperature of the engine's coolant in ºC
    fn get_coolant_temperature(&mut self) -> Result<i32> {
        Ok(self.run(&Pid::Coolant.into())?.number().unwrap_or(0))
    }

    /// Get the fuel tank level in percent
    fn get_fuel_level(&mut self) -> Result<i32> {
        Ok(self.run(&Pid::FuelLevel.into())?.number().unwrap_or(0))
    }

    /// Get the mass air flow in g/s
    fn get_maf(&mut self) -> Result<f64> {
        Ok(self
            .run(&Pid::Maf.into())?
            .maf_grams_per_sec()
            .unwrap_or(0.0))
    }

    /// Get stored DTCs (diagnostic trouble codes)
    fn get_dtcs(&mut self) -> Result<Vec<Dtc>> {
        Ok(self.run(&Command::ReadDtcs)?.codes().to_vec())
    }
}
