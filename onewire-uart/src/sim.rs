//! Simulated bus for tests: a [`UartDriver`] whose far end models real
//! 1-Wire slaves octet by octet.
//!
//! The model follows the line semantics of the UART mapping: an octet is
//! one time slot, the line reads back 0xFF only if neither the master nor
//! any responding slave pulled it low at sample time. Slaves decode the
//! command byte after a reset and take part in search, match-ROM and
//! alarm-search sequences the way hardware does, so enumeration tests run
//! against protocol behavior instead of canned octet scripts.

use std::vec::Vec;

use crate::{BusMutex, UartDriver};
use crate::consts::{
    BIT_HIGH_OCTET, CMD_ALARM_SEARCH, CMD_MATCH_ROM, CMD_SEARCH_ROM, DATA_BAUDRATE, RESET_BAUDRATE,
    RESET_OCTET,
};

/// Error of the simulated UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimError;

/// Lock that journals its use and can be told to fail.
#[derive(Default)]
pub(crate) struct CountingMutex {
    pub locks: usize,
    pub unlocks: usize,
    pub fail: bool,
}

impl BusMutex for CountingMutex {
    fn lock(&mut self) -> bool {
        if self.fail {
            return false;
        }
        self.locks += 1;
        true
    }

    fn unlock(&mut self) -> bool {
        self.unlocks += 1;
        true
    }
}

/// One journaled transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SetBaudrate(u32),
    TxRx(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Slave {
    rom: [u8; 8],
    alarmed: bool,
    participating: bool,
}

impl Slave {
    fn rom_bit(&self, bit: u8) -> bool {
        self.rom[usize::from(bit / 8)] & (1 << (bit % 8)) != 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// No command in flight; write slots echo, read slots idle high.
    Idle,
    /// Accumulating the command byte that follows a reset.
    Command { acc: u8, nbits: u8 },
    /// Running the 64 search triplets.
    Search { bit: u8, slot: u8 },
    /// Comparing the 64 ROM bits after MATCH ROM.
    MatchRom { bit: u8 },
}

pub(crate) struct SimBus {
    slaves: Vec<Slave>,
    baudrate: u32,
    phase: Phase,
    /// Forced reply to the reset exchange, overriding the slave model.
    pub presence: Option<u8>,
    /// Baudrate value the driver refuses to set.
    pub fail_baudrate: Option<u32>,
    /// When set, every exchange fails.
    pub fail_txrx: bool,
    pub calls: Vec<Call>,
    pub inits: usize,
    pub deinits: usize,
}

impl SimBus {
    pub fn new<I: IntoIterator<Item = [u8; 8]>>(roms: I) -> Self {
        Self {
            slaves: roms
                .into_iter()
                .map(|rom| Slave {
                    rom,
                    alarmed: false,
                    participating: false,
                })
                .collect(),
            baudrate: DATA_BAUDRATE,
            phase: Phase::Idle,
            presence: None,
            fail_baudrate: None,
            fail_txrx: false,
            calls: Vec::new(),
            inits: 0,
            deinits: 0,
        }
    }

    /// Puts the slave carrying `rom` into alarm state.
    pub fn alarm(&mut self, rom: [u8; 8]) {
        for slave in &mut self.slaves {
            if slave.rom == rom {
                slave.alarmed = true;
            }
        }
    }

    fn presence_octet(&self) -> u8 {
        match self.presence {
            Some(octet) => octet,
            // Presence pulses overlap the echoed high bits of 0xF0; an
            // empty bus echoes the pulse unchanged.
            None if self.slaves.is_empty() => RESET_OCTET,
            None => 0xE0,
        }
    }

    fn begin_reset(&mut self) {
        self.phase = Phase::Command { acc: 0, nbits: 0 };
        for slave in &mut self.slaves {
            slave.participating = true;
        }
    }

    fn participants(&self) -> impl Iterator<Item = &Slave> {
        self.slaves.iter().filter(|s| s.participating)
    }

    fn dispatch_command(&mut self, cmd: u8) {
        match cmd {
            CMD_SEARCH_ROM => self.phase = Phase::Search { bit: 0, slot: 0 },
            CMD_ALARM_SEARCH => {
                for slave in &mut self.slaves {
                    slave.participating = slave.alarmed;
                }
                self.phase = Phase::Search { bit: 0, slot: 0 };
            }
            CMD_MATCH_ROM => self.phase = Phase::MatchRom { bit: 0 },
            _ => self.phase = Phase::Idle,
        }
    }

    fn exchange_octet(&mut self, tx: u8) -> u8 {
        let master_high = tx == BIT_HIGH_OCTET;
        match self.phase {
            Phase::Idle => tx,
            Phase::Command { mut acc, nbits } => {
                if master_high {
                    acc |= 1 << nbits;
                }
                if nbits == 7 {
                    self.dispatch_command(acc);
                } else {
                    self.phase = Phase::Command {
                        acc,
                        nbits: nbits + 1,
                    };
                }
                tx
            }
            Phase::Search { bit, slot } => match slot {
                0 => {
                    let pulled = self.participants().any(|s| !s.rom_bit(bit));
                    self.phase = Phase::Search { bit, slot: 1 };
                    line_octet(master_high && !pulled)
                }
                1 => {
                    let pulled = self.participants().any(|s| s.rom_bit(bit));
                    self.phase = Phase::Search { bit, slot: 2 };
                    line_octet(master_high && !pulled)
                }
                _ => {
                    for slave in &mut self.slaves {
                        if slave.participating && slave.rom_bit(bit) != master_high {
                            slave.participating = false;
                        }
                    }
                    self.phase = if bit == 63 {
                        Phase::Idle
                    } else {
                        Phase::Search {
                            bit: bit + 1,
                            slot: 0,
                        }
                    };
                    tx
                }
            },
            Phase::MatchRom { bit } => {
                for slave in &mut self.slaves {
                    if slave.participating && slave.rom_bit(bit) != master_high {
                        slave.participating = false;
                    }
                }
                self.phase = if bit == 63 {
                    Phase::Idle
                } else {
                    Phase::MatchRom { bit: bit + 1 }
                };
                tx
            }
        }
    }
}

fn line_octet(high: bool) -> u8 {
    if high { BIT_HIGH_OCTET } else { 0x00 }
}

impl UartDriver for SimBus {
    type Error = SimError;

    fn init(&mut self) -> Result<(), SimError> {
        self.inits += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), SimError> {
        self.deinits += 1;
        Ok(())
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), SimError> {
        self.calls.push(Call::SetBaudrate(baudrate));
        if self.fail_baudrate == Some(baudrate) {
            return Err(SimError);
        }
        self.baudrate = baudrate;
        Ok(())
    }

    fn tx_rx(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SimError> {
        assert_eq!(tx.len(), rx.len(), "exchange buffers must match");
        self.calls.push(Call::TxRx(tx.to_vec()));
        if self.fail_txrx {
            return Err(SimError);
        }
        for (t, r) in tx.iter().zip(rx.iter_mut()) {
            *r = if self.baudrate == RESET_BAUDRATE {
                self.begin_reset();
                self.presence_octet()
            } else {
                self.exchange_octet(*t)
            };
        }
        Ok(())
    }
}
