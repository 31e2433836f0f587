use super::Result;

#[cfg(any(feature = "serialport_comm", feature = "ftdi_comm"))]
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// A duplex byte channel to an ELM327 adapter
///
/// The adapter is half-duplex: a request is written, then the reply is read byte by byte until
/// the `>` prompt. Implementations only need to report how many bytes can be read without
/// blocking; the [Elm327](super::Elm327) frame reader does the waiting.
pub trait Transport {
    /// Write every byte of `data`
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Push written bytes out to the adapter
    fn flush(&mut self) -> Result<()>;

    /// Number of bytes that [read_byte](Self::read_byte) can return without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read a single byte
    ///
    /// Only called after [bytes_available](Self::bytes_available) reported at least one byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Release the underlying channel
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
