//! Adapter for UARTs exposed through the blocking [`embedded_io`] traits.
//!
//! Works for buffered UART handles wired half-duplex onto the bus: every
//! transmitted octet is echoed back through the receiver, so a full-duplex
//! exchange is a write of the whole slot buffer followed by reading the
//! same number of octets back. The receiver must buffer at least eight
//! octets (one byte exchange) between reads.

use embedded_io::{Read, ReadExactError, Write};
use thiserror::Error;

use crate::UartDriver;

/// Baudrate control for a UART handle, alongside its I/O traits.
///
/// HALs name this differently (`set_baudrate`, reconfigure, …); the
/// implementation maps its configuration error into the handle's
/// [`embedded_io`] error type.
pub trait SetBaudrate: embedded_io::ErrorType {
    /// Changes the UART baudrate. Only 9600 and 115200 are requested.
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error>;
}

/// Error of the [`UartIo`] adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartIoError<E> {
    /// The underlying UART handle failed.
    #[error("UART I/O failed")]
    Io(E),
    /// The receiver ran dry before every transmitted octet was echoed
    /// back; the RX wiring or buffering is broken.
    #[error("echo stream ended early")]
    Eof,
}

/// [`UartDriver`] over a single handle implementing [`Read`], [`Write`]
/// and [`SetBaudrate`].
pub struct UartIo<T> {
    uart: T,
}

impl<T> UartIo<T> {
    /// Wraps `uart`.
    pub fn new(uart: T) -> Self {
        Self { uart }
    }

    /// Returns the wrapped handle.
    pub fn into_inner(self) -> T {
        self.uart
    }
}

impl<T: Read + Write + SetBaudrate> UartDriver for UartIo<T> {
    type Error = UartIoError<T::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        self.uart.set_baudrate(baudrate).map_err(UartIoError::Io)
    }

    fn tx_rx(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        self.uart.write_all(tx).map_err(UartIoError::Io)?;
        self.uart.flush().map_err(UartIoError::Io)?;
        self.uart.read_exact(rx).map_err(|e| match e {
            ReadExactError::UnexpectedEof => UartIoError::Eof,
            ReadExactError::Other(e) => UartIoError::Io(e),
        })
    }
}
