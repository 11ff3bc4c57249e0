use thiserror::Error;

/// 1-Wire communication error, generic over the UART transport's error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneWireError<E> {
    /// The UART transport failed to initialize.
    #[error("UART transport failed to initialize")]
    Driver(E),
    /// A UART exchange reported failure.
    #[error("UART exchange failed")]
    TxRx(E),
    /// The UART rejected a baudrate change.
    #[error("UART baudrate change rejected")]
    Baudrate(E),
    /// The session lock could not be acquired or released.
    #[error("bus lock unavailable")]
    Lock,
    /// A reset was issued but no device answered with a presence pulse.
    #[error("no presence pulse after reset")]
    NoPresence,
    /// The search enumeration is complete, or the bus holds no devices.
    #[error("no more devices on the bus")]
    NoDevice,
}
