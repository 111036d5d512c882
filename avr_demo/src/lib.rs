#![no_std]

use lowpower::{ConfigError, Port, PowerConfig};

/// PB5, the on-board LED (D13).
pub const LED: u8 = 1 << 5;

/// PD0/PD1, USART0 RX/TX.
pub const SERIAL: u8 = 0b0000_0011;

/// Arduino defaults, plus the LED and (with `ufmt`) the serial port left alone.
pub fn board_config() -> Result<PowerConfig, ConfigError> {
    let config = PowerConfig::default().reserve_pins(Port::B, LED)?;
    #[cfg(feature = "ufmt")]
    let config = config
        .keep(lowpower::Peripheral::Usart0)
        .reserve_pins(Port::D, SERIAL)?;
    Ok(config)
}

/// One `NAME = value` line per register.
#[cfg(feature = "ufmt")]
pub fn print_snapshot<W: ufmt::uWrite>(
    w: &mut W,
    snapshot: &lowpower::RegisterSnapshot,
) -> Result<(), W::Error> {
    for (reg, value) in snapshot.iter() {
        ufmt::uwriteln!(w, "{} = {}", reg.name(), value)?;
    }
    Ok(())
}
