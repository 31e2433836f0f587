use super::serial_comm::{Transport, DEFAULT_BAUD_RATE};
use super::{Error, Result};
use log::trace;
use std::collections::VecDeque;
use std::io::{Read, Write};

/// Communicate with a USB to Serial FTDI device
/// with the FTDI library
///
/// The FTDI driver has no "bytes waiting" query, so whatever the chip has is drained into a
/// local queue and counted there.
pub struct FTDIDevice {
    device: Option<ftdi::Device>,
    buffer: VecDeque<u8>,
}

impl FTDIDevice {
    /// Creates a new instance of an FTDIDevice
    pub fn new() -> Result<Self> {
        let mut device = ftdi::find_by_vid_pid(0x0403, 0x6001)
            .interface(ftdi::Interface::A)
            .open()?;

        device.set_baud_rate(DEFAULT_BAUD_RATE)?;
        device.configure(ftdi::Bits::Eight, ftdi::StopBits::One, ftdi::Parity::None)?;
        device.usb_reset()?;

        Ok(Self {
            device: Some(device),
            buffer: VecDeque::new(),
        })
    }

    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        Ok(self.device()?.set_baud_rate(baud_rate)?)
    }

    fn device(&mut self) -> Result<&mut ftdi::Device> {
        self.device
            .as_mut()
            .ok_or_else(|| Error::Communication("FTDI device is closed".to_owned()))
    }

    fn read_into_queue(&mut self) -> Result<()> {
        let mut buf = [0u8; 16];
        loop {
            let len = self.device()?.read(&mut buf)?;
            if len > 0 {
                self.buffer.extend(buf[0..len].iter().filter(|&&b| b != b'\0'));
                trace!(
                    "read_into_queue: values {:?}",
                    std::str::from_utf8(&buf[0..len])
                );
            } else {
                break;
            }
        }
        Ok(())
    }
}

impl Transport for FTDIDevice {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.device()?.write_all(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.device()?.flush()?)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        if self.buffer.is_empty() {
            self.read_into_queue()?;
        }
        Ok(self.buffer.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.buffer.is_empty() {
            self.read_into_queue()?;
        }
        self.buffer
            .pop_front()
            .ok_or_else(|| Error::Communication("no byte available".to_owned()))
    }

    fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        if let Some(mut device) = self.device.take() {
            device.usb_purge_buffers()?;
        }
        Ok(())
    }
}
