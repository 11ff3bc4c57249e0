use crate::consts::{
    BIT_HIGH_OCTET, BIT_LOW_OCTET, CMD_MATCH_ROM, CMD_SKIP_ROM, DATA_BAUDRATE, RESET_BAUDRATE,
    RESET_OCTET,
};
use crate::{BusMutex, OneWireError, OneWireResult, OneWireUart, Rom, UartDriver};

impl<D: UartDriver, M: BusMutex> OneWireUart<D, M> {
    /// Takes the session lock. Pair with [`unprotect`](Self::unprotect)
    /// when composing multi-step sequences out of `_raw` calls.
    pub fn protect(&mut self) -> OneWireResult<(), D::Error> {
        if self.mutex.lock() {
            Ok(())
        } else {
            Err(OneWireError::Lock)
        }
    }

    /// Releases the session lock.
    pub fn unprotect(&mut self) -> OneWireResult<(), D::Error> {
        if self.mutex.unlock() {
            Ok(())
        } else {
            Err(OneWireError::Lock)
        }
    }

    /// Runs `op` with the session lock held for its whole duration.
    pub(crate) fn locked<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> OneWireResult<T, D::Error>,
    ) -> OneWireResult<T, D::Error> {
        self.protect()?;
        let res = op(self);
        let _ = self.unprotect();
        res
    }

    /// Resets the bus and checks for a presence pulse.
    ///
    /// The reset pulse is one 0xF0 octet at 9600 baud; its start bit plus
    /// four low data bits hold the line low long enough for every device
    /// to re-arm and answer. The baudrate is restored to 115200 before the
    /// sampled octet is interpreted.
    ///
    /// # Errors
    /// [`OneWireError::NoPresence`] when the line stayed low (`0x00`) or
    /// only the echo came back (`0xF0`); [`OneWireError::Baudrate`] /
    /// [`OneWireError::TxRx`] on transport failures. After a baudrate
    /// error the UART may be left at either rate; the next reset
    /// re-establishes it.
    pub fn reset(&mut self) -> OneWireResult<(), D::Error> {
        self.locked(Self::reset_raw)
    }

    /// [`reset`](Self::reset) without taking the session lock.
    pub fn reset_raw(&mut self) -> OneWireResult<(), D::Error> {
        self.drv
            .set_baudrate(RESET_BAUDRATE)
            .map_err(OneWireError::Baudrate)?;
        let tx = [RESET_OCTET];
        let mut rx = [0u8; 1];
        self.drv.tx_rx(&tx, &mut rx).map_err(OneWireError::TxRx)?;
        self.drv
            .set_baudrate(DATA_BAUDRATE)
            .map_err(OneWireError::Baudrate)?;

        match rx[0] {
            // Line stuck low, or a pure echo with nobody pulling.
            BIT_LOW_OCTET | RESET_OCTET => Err(OneWireError::NoPresence),
            _ => Ok(()),
        }
    }

    /// One time slot: drives `bit` and samples the line.
    ///
    /// A high bit (and every read) is the 0xFF octet, whose only low time
    /// is the start bit; a device holding the line low past it turns the
    /// sample into something other than 0xFF. A low bit is the 0x00 octet.
    pub(crate) fn exchange_bit_raw(&mut self, bit: bool) -> OneWireResult<bool, D::Error> {
        let tx = [if bit { BIT_HIGH_OCTET } else { BIT_LOW_OCTET }];
        let mut rx = [0u8; 1];
        self.drv.tx_rx(&tx, &mut rx).map_err(OneWireError::TxRx)?;
        Ok(rx[0] == BIT_HIGH_OCTET)
    }

    /// Writes a byte LSB-first and returns the byte sampled back from the
    /// line during the same eight slots.
    ///
    /// On an idle bus the sample equals the written byte; a device pulling
    /// slots low clears the corresponding bits.
    pub fn write_byte(&mut self, byte: u8) -> OneWireResult<u8, D::Error> {
        self.locked(|ow| ow.write_byte_raw(byte))
    }

    /// [`write_byte`](Self::write_byte) without taking the session lock.
    pub fn write_byte_raw(&mut self, byte: u8) -> OneWireResult<u8, D::Error> {
        // One UART octet per bit, eight octets per byte.
        let mut tx = [BIT_LOW_OCTET; 8];
        for (i, slot) in tx.iter_mut().enumerate() {
            if byte & (1 << i) != 0 {
                *slot = BIT_HIGH_OCTET;
            }
        }
        let mut rx = [0u8; 8];
        self.drv.tx_rx(&tx, &mut rx).map_err(OneWireError::TxRx)?;

        let mut sampled = 0u8;
        for (i, slot) in rx.iter().enumerate() {
            if *slot == BIT_HIGH_OCTET {
                sampled |= 1 << i;
            }
        }
        Ok(sampled)
    }

    /// Reads a byte by issuing eight read slots.
    pub fn read_byte(&mut self) -> OneWireResult<u8, D::Error> {
        self.locked(Self::read_byte_raw)
    }

    /// [`read_byte`](Self::read_byte) without taking the session lock.
    pub fn read_byte_raw(&mut self) -> OneWireResult<u8, D::Error> {
        self.write_byte_raw(0xFF)
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> OneWireResult<bool, D::Error> {
        self.locked(Self::read_bit_raw)
    }

    /// [`read_bit`](Self::read_bit) without taking the session lock.
    pub fn read_bit_raw(&mut self) -> OneWireResult<bool, D::Error> {
        self.exchange_bit_raw(true)
    }

    /// Selects the device carrying `rom`: MATCH ROM (0x55) followed by the
    /// eight ROM octets. Must follow a [`reset`](Self::reset).
    pub fn match_rom(&mut self, rom: &Rom) -> OneWireResult<(), D::Error> {
        self.locked(|ow| ow.match_rom_raw(rom))
    }

    /// [`match_rom`](Self::match_rom) without taking the session lock.
    pub fn match_rom_raw(&mut self, rom: &Rom) -> OneWireResult<(), D::Error> {
        self.write_byte_raw(CMD_MATCH_ROM)?;
        for &byte in rom.as_bytes() {
            self.write_byte_raw(byte)?;
        }
        Ok(())
    }

    /// Addresses every device at once: SKIP ROM (0xCC). Must follow a
    /// [`reset`](Self::reset).
    pub fn skip_rom(&mut self) -> OneWireResult<(), D::Error> {
        self.locked(Self::skip_rom_raw)
    }

    /// [`skip_rom`](Self::skip_rom) without taking the session lock.
    pub fn skip_rom_raw(&mut self) -> OneWireResult<(), D::Error> {
        self.write_byte_raw(CMD_SKIP_ROM)?;
        Ok(())
    }
}
