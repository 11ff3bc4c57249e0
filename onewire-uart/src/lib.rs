#![no_std]
#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[cfg(test)]
extern crate std;

pub mod consts;

mod bus;
mod crc;
mod driver;
mod error;
#[cfg(feature = "embedded-io")]
mod io;
mod mutex;
mod rom;
mod search;
#[cfg(test)]
mod sim;

pub use crc::OneWireCrc;
pub use driver::UartDriver;
pub use error::OneWireError;
#[cfg(feature = "embedded-io")]
pub use io::{SetBaudrate, UartIo, UartIoError};
pub use mutex::{BusMutex, NoopMutex};
pub use rom::Rom;
pub use search::SearchState;

/// Result type for 1-Wire operations, generic over the transport error.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;

/// One logical 1-Wire bus, driven through a UART transport.
///
/// The session owns the transport `D` and the lock `M`, the 8-octet ROM
/// buffer assembled during searches, and the discrepancy marker that
/// carries enumeration progress from one [`search`](OneWireUart::search)
/// call to the next.
///
/// Bus operations come in pairs: the plain method takes the session lock
/// for its whole duration, the `_raw` sibling assumes the caller holds it
/// (via [`protect`](OneWireUart::protect) or by construction).
pub struct OneWireUart<D, M = NoopMutex> {
    pub(crate) drv: D,
    pub(crate) mutex: M,
    pub(crate) rom: [u8; 8],
    pub(crate) state: SearchState,
    pub(crate) initialized: bool,
}

impl<D> OneWireUart<D, NoopMutex> {
    /// Creates a session over `drv` without cross-thread locking.
    pub fn new(drv: D) -> Self {
        Self::with_mutex(drv, NoopMutex)
    }
}

impl<D, M> OneWireUart<D, M> {
    /// Creates a session over `drv`, serialized by `mutex`.
    pub fn with_mutex(drv: D, mutex: M) -> Self {
        Self {
            drv,
            mutex,
            rom: [0; 8],
            state: SearchState::FreshStart,
            initialized: false,
        }
    }

    /// Progress of the ROM enumeration across [`search`](OneWireUart::search) calls.
    pub fn search_state(&self) -> SearchState {
        self.state
    }
}

impl<D: UartDriver, M> OneWireUart<D, M> {
    /// Brings up the UART transport.
    ///
    /// The transport's `init` runs at most once per session; repeated calls
    /// after a success are no-ops.
    ///
    /// # Errors
    /// [`OneWireError::Driver`] when the transport fails to configure itself.
    pub fn init(&mut self) -> OneWireResult<(), D::Error> {
        if self.initialized {
            return Ok(());
        }
        self.drv.init().map_err(OneWireError::Driver)?;
        self.initialized = true;
        Ok(())
    }

    /// Releases the UART transport. A no-op on a session that was never
    /// initialized or has already been deinitialized.
    pub fn deinit(&mut self) {
        if !self.initialized {
            return;
        }
        let _ = self.drv.deinit();
        self.initialized = false;
    }
}
