use std::io::{Read, Write};
use std::time::Duration;

use clap::Parser;
use onewire_uart::{OneWireUart, UartDriver, consts};

/// Enumerate all devices on a UART-wired 1-Wire bus.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the serial port (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    port: String,
    /// Search only for devices in alarm state
    #[arg(long)]
    alarmed: bool,
    /// Per-exchange timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    timeout_ms: u64,
}

/// UART capability over a Linux serial port.
struct SerialUart {
    port: Box<dyn serialport::SerialPort>,
}

impl UartDriver for SerialUart {
    type Error = serialport::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.port.set_baud_rate(consts::DATA_BAUDRATE)?;
        self.port.clear(serialport::ClearBuffer::All)
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        self.port.set_baud_rate(baudrate)
    }

    fn tx_rx(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        // Half-duplex wiring echoes every transmitted octet into RX; the
        // readback after a full write is the line sample per slot.
        self.port.write_all(tx)?;
        self.port.flush()?;
        self.port.read_exact(rx)?;
        Ok(())
    }
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the serial port in 8-N-1 framing at the bit-slot baudrate
    let port = serialport::new(&args.port, consts::DATA_BAUDRATE)
        .timeout(Duration::from_millis(args.timeout_ms))
        .open()
        .expect("Failed to open serial port");
    let mut bus = OneWireUart::new(SerialUart { port });
    bus.init().expect("Failed to bring up the UART");

    let cmd = if args.alarmed {
        consts::CMD_ALARM_SEARCH
    } else {
        consts::CMD_SEARCH_ROM
    };
    // Enumerate devices on the 1-Wire bus
    let found = bus
        .search_with_command_callback(cmd, |rom, index| {
            if let Some(rom) = rom {
                if rom.is_crc_valid() {
                    log::info!("#{index}: {:02x?}", rom.as_bytes());
                } else {
                    log::warn!("#{index}: {:02x?} (ROM CRC mismatch)", rom.as_bytes());
                }
            }
            Ok(())
        })
        .expect("Failed to enumerate devices");
    log::info!("Found {found} device(s)");
    bus.deinit();
}
