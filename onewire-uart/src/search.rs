use crate::consts::CMD_SEARCH_ROM;
use crate::{BusMutex, OneWireError, OneWireResult, OneWireUart, Rom, UartDriver};

/// Progress of the binary-tree ROM enumeration between
/// [`search`](OneWireUart::search) calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SearchState {
    /// No pass has run yet; the next search starts a fresh traversal.
    #[default]
    FreshStart,
    /// The previous pass took the 0 branch at this bit position (1..=64)
    /// and the 1 branch there is still unexplored.
    Pending(u8),
    /// The previous pass returned the last device of the tree.
    Exhausted,
}

impl<D: UartDriver, M: BusMutex> OneWireUart<D, M> {
    /// Restarts the enumeration: the next [`search`](OneWireUart::search)
    /// begins a fresh traversal of the tree.
    pub fn search_reset(&mut self) -> OneWireResult<(), D::Error> {
        self.locked(Self::search_reset_raw)
    }

    /// [`search_reset`](Self::search_reset) without taking the session lock.
    pub fn search_reset_raw(&mut self) -> OneWireResult<(), D::Error> {
        self.state = SearchState::FreshStart;
        Ok(())
    }

    /// Returns the next device of the enumeration, one ROM per call.
    ///
    /// Successive calls visit every device exactly once, in the fixed
    /// order of the ROM tree: bits are compared in wire order (LSB of
    /// octet 0 first) and every fork yields its 0 branch first. After the
    /// last device, the next call returns [`OneWireError::NoDevice`] and
    /// re-arms a fresh traversal.
    pub fn search(&mut self) -> OneWireResult<Rom, D::Error> {
        self.locked(Self::search_raw)
    }

    /// [`search`](Self::search) without taking the session lock.
    pub fn search_raw(&mut self) -> OneWireResult<Rom, D::Error> {
        self.search_with_command_raw(CMD_SEARCH_ROM)
    }

    /// Like [`search`](Self::search) with a caller-chosen search command,
    /// e.g. [`CMD_ALARM_SEARCH`](crate::consts::CMD_ALARM_SEARCH) to
    /// enumerate only devices in alarm state.
    pub fn search_with_command(&mut self, cmd: u8) -> OneWireResult<Rom, D::Error> {
        self.locked(|ow| ow.search_with_command_raw(cmd))
    }

    /// [`search_with_command`](Self::search_with_command) without taking
    /// the session lock.
    pub fn search_with_command_raw(&mut self, cmd: u8) -> OneWireResult<Rom, D::Error> {
        let previous = match self.state {
            SearchState::Exhausted => {
                // Enumeration already delivered the last device; re-arm
                // for the caller's next round.
                self.search_reset_raw()?;
                return Err(OneWireError::NoDevice);
            }
            SearchState::FreshStart => 0,
            SearchState::Pending(position) => position,
        };

        self.reset_raw()?;
        self.write_byte_raw(cmd)?;

        // Deepest position where this pass chose 0 at a discrepancy; the
        // 1 branch there is the next one to explore.
        let mut last_zero = 0u8;
        let mut idx = 0usize;
        let mut mask = 1u8;
        let mut complete = true;

        for position in 1..=64u8 {
            // Two read slots: the bit ANDed over all remaining devices,
            // then the AND of its complement.
            let bit = self.exchange_bit_raw(true)?;
            let complement = self.exchange_bit_raw(true)?;

            let chosen = if bit && complement {
                // No device answered the slot pair: every remaining
                // device dropped out of this pass.
                complete = false;
                break;
            } else if bit != complement {
                // Every remaining device agrees here.
                bit
            } else {
                // Discrepancy. Follow the previous pass up to its fork,
                // flip to 1 at the fork, take 0 in new territory.
                let direction = if position < previous {
                    self.rom[idx] & mask != 0
                } else {
                    position == previous
                };
                if !direction {
                    last_zero = position;
                }
                direction
            };

            // Writing the chosen bit back drops every device that does
            // not carry it.
            self.exchange_bit_raw(chosen)?;
            if chosen {
                self.rom[idx] |= mask;
            } else {
                self.rom[idx] &= !mask;
            }

            mask = mask.wrapping_shl(1);
            if mask == 0 {
                idx += 1;
                mask = 1;
            }
        }

        self.state = if last_zero == 0 {
            SearchState::Exhausted
        } else {
            SearchState::Pending(last_zero)
        };

        if complete {
            Ok(Rom::new(self.rom))
        } else {
            Err(OneWireError::NoDevice)
        }
    }

    /// Enumerates the whole bus, invoking `visit` once per device with the
    /// ROM and its zero-based index, and a final time with `None` to mark
    /// the end of the iteration. Returns the number of devices found.
    ///
    /// A `visit` error aborts the batch and is returned as-is; running off
    /// the end of the tree is not an error here.
    pub fn search_with_callback<F>(&mut self, visit: F) -> OneWireResult<usize, D::Error>
    where
        F: FnMut(Option<&Rom>, usize) -> OneWireResult<(), D::Error>,
    {
        self.search_with_command_callback(CMD_SEARCH_ROM, visit)
    }

    /// [`search_with_callback`](Self::search_with_callback) with a
    /// caller-chosen search command.
    ///
    /// The session lock is taken once for the whole batch.
    pub fn search_with_command_callback<F>(
        &mut self,
        cmd: u8,
        mut visit: F,
    ) -> OneWireResult<usize, D::Error>
    where
        F: FnMut(Option<&Rom>, usize) -> OneWireResult<(), D::Error>,
    {
        self.protect()?;
        let mut found = 0usize;
        let mut res = self.search_reset_raw();
        while res.is_ok() {
            match self.search_with_command_raw(cmd) {
                Ok(rom) => {
                    res = visit(Some(&rom), found);
                    if res.is_ok() {
                        found += 1;
                    }
                }
                Err(e) => res = Err(e),
            }
        }
        let _ = visit(None, found);
        let _ = self.unprotect();

        match res {
            Ok(()) | Err(OneWireError::NoDevice) => Ok(found),
            Err(e) => Err(e),
        }
    }

    /// Enumerates into `roms`, stopping at the end of the tree or when the
    /// slice is full. Returns the number of slots filled.
    ///
    /// Running off the end of the tree is only an error when nothing was
    /// found at all. A full slice leaves the enumeration resumable: the
    /// next [`search`](OneWireUart::search) continues where it stopped.
    pub fn search_devices(&mut self, roms: &mut [Rom]) -> OneWireResult<usize, D::Error> {
        self.locked(|ow| ow.search_devices_raw(roms))
    }

    /// [`search_devices`](Self::search_devices) without taking the session
    /// lock.
    pub fn search_devices_raw(&mut self, roms: &mut [Rom]) -> OneWireResult<usize, D::Error> {
        self.search_devices_with_command_raw(CMD_SEARCH_ROM, roms)
    }

    /// [`search_devices`](Self::search_devices) with a caller-chosen
    /// search command.
    pub fn search_devices_with_command(
        &mut self,
        cmd: u8,
        roms: &mut [Rom],
    ) -> OneWireResult<usize, D::Error> {
        self.locked(|ow| ow.search_devices_with_command_raw(cmd, roms))
    }

    /// [`search_devices_with_command`](Self::search_devices_with_command)
    /// without taking the session lock.
    pub fn search_devices_with_command_raw(
        &mut self,
        cmd: u8,
        roms: &mut [Rom],
    ) -> OneWireResult<usize, D::Error> {
        debug_assert!(!roms.is_empty());

        self.search_reset_raw()?;
        let mut found = 0usize;
        while found < roms.len() {
            match self.search_with_command_raw(cmd) {
                Ok(rom) => {
                    roms[found] = rom;
                    found += 1;
                }
                Err(OneWireError::NoDevice) if found > 0 => break,
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }
}
