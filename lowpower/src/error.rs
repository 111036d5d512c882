// SPDX-License-Identifier: Apache-2.0

use crate::registers::Port;

/// Errors raised while building a [`PowerConfig`](crate::PowerConfig).
///
/// Register accesses themselves never fail; these only catch configurations
/// that cannot be expressed on the target device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The mask names pins that do not exist on the port.
    PinOutOfRange { port: Port, mask: u8 },
    /// Analog input requested on a pin without an ADC channel (PC0..PC5 only).
    NotAnalogCapable(u8),
    /// Pins were declared both as reserved digital pins and as analog inputs.
    PinConflict { port: Port, mask: u8 },
    /// A fixed watchdog value would leave WDE, WDIE or WDCE set.
    WatchdogStillEnabled(u8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::PinOutOfRange { port, mask } => {
                write!(f, "pins {mask:#010b} do not exist on {port}")
            }
            ConfigError::NotAnalogCapable(mask) => {
                write!(f, "pins {mask:#010b} on PORTC have no ADC channel")
            }
            ConfigError::PinConflict { port, mask } => {
                write!(f, "pins {mask:#010b} on {port} are both reserved and analog")
            }
            ConfigError::WatchdogStillEnabled(value) => {
                write!(f, "WDTCSR value {value:#04x} leaves the watchdog enabled")
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::PinOutOfRange {
            port: Port::C,
            mask: 0x80,
        };
        assert_eq!(err.to_string(), "pins 0b10000000 do not exist on PORTC");

        assert_eq!(
            ConfigError::WatchdogStillEnabled(0x08).to_string(),
            "WDTCSR value 0x08 leaves the watchdog enabled"
        );
        assert_eq!(
            ConfigError::NotAnalogCapable(0x40).to_string(),
            "pins 0b01000000 on PORTC have no ADC channel"
        );
    }
}
