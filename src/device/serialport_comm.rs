use super::serial_comm::{Transport, DEFAULT_BAUD_RATE};
use super::{Error, Result};
use std::io::{Read, Write};
use std::time::Duration;

/// Communicate with a serial device using the
/// serialport library
///
/// /dev/tty* or /dev/rfcomm* on unix-like systems
/// COM devices on Windows systems
pub struct SerialPort {
    device: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPort {
    /// Creates a new instance of a SerialPort
    pub fn new(path: &str) -> Result<Self> {
        let device = serialport::new(path, DEFAULT_BAUD_RATE)
            .timeout(Duration::from_millis(10))
            .parity(serialport::Parity::None)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .path(path)
            .open()?;

        Ok(Self {
            device: Some(device),
        })
    }

    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        Ok(self.port()?.set_baud_rate(baud_rate)?)
    }

    fn port(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.device
            .as_mut()
            .ok_or_else(|| Error::Communication("serial port is closed".to_owned()))
    }
}

impl Transport for SerialPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Ok(Write::write_all(self.port()?, data)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(Write::flush(self.port()?)?)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        Read::read_exact(self.port()?, &mut byte)?;
        Ok(byte[0])
    }

    fn close(&mut self) -> Result<()> {
        if let Some(device) = self.device.take() {
            device.clear(serialport::ClearBuffer::All)?;
        }
        Ok(())
    }
}
