//! Wire-level constants of the 1-Wire-over-UART mapping.

/// SEARCH ROM command, starts the binary-tree enumeration.
pub const CMD_SEARCH_ROM: u8 = 0xF0;

/// ALARM SEARCH command, enumerates only devices in alarm state.
pub const CMD_ALARM_SEARCH: u8 = 0xEC;

/// MATCH ROM command, selects one device by its 64-bit address.
pub const CMD_MATCH_ROM: u8 = 0x55;

/// SKIP ROM command, addresses every device on the bus at once.
pub const CMD_SKIP_ROM: u8 = 0xCC;

/// Baudrate of the reset/presence exchange; one UART bit lasts ~104 us.
pub const RESET_BAUDRATE: u32 = 9_600;

/// Baudrate of the bit slots; one UART bit lasts ~8.7 us.
pub const DATA_BAUDRATE: u32 = 115_200;

/// Octet whose start bit plus four low data bits form the ~520 us reset
/// pulse at 9600 baud.
pub const RESET_OCTET: u8 = 0xF0;

/// Octet for a write-1 or read slot: only the start bit pulls the line low,
/// then it is released for any device to hold down.
pub const BIT_HIGH_OCTET: u8 = 0xFF;

/// Octet for a write-0 slot: the line stays low through all data bits.
pub const BIT_LOW_OCTET: u8 = 0x00;
