/// The UART capability consumed by [`OneWireUart`](crate::OneWireUart).
///
/// Implementations wrap a concrete UART peripheral wired half-duplex onto
/// the 1-Wire line (open-drain TX, RX listening on the same wire). The
/// session derives all bus timing from two baudrates, so the peripheral
/// must support switching between
/// [`RESET_BAUDRATE`](crate::consts::RESET_BAUDRATE) and
/// [`DATA_BAUDRATE`](crate::consts::DATA_BAUDRATE) with 8-N-1 framing.
pub trait UartDriver {
    /// Error produced by the underlying peripheral.
    type Error;

    /// Configures the UART (typically 8-N-1 at 115200 baud).
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Releases the UART.
    fn deinit(&mut self) -> Result<(), Self::Error>;

    /// Changes the baudrate. Only 9600 and 115200 are requested.
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error>;

    /// Full-duplex exchange: transmits every octet of `tx` and stores in
    /// `rx[i]` the octet sampled from the line while `tx[i]` was being
    /// driven. Blocks until the exchange completes.
    ///
    /// Callers always pass slices of equal length.
    fn tx_rx(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: UartDriver + ?Sized> UartDriver for &mut T {
    type Error = T::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        T::init(self)
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        T::deinit(self)
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        T::set_baudrate(self, baudrate)
    }

    fn tx_rx(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        T::tx_rx(self, tx, rx)
    }
}
