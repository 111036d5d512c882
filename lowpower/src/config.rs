// SPDX-License-Identifier: Apache-2.0

//! Which parts of the chip the application still needs.

use crate::error::ConfigError;
use crate::registers::bits::{didr0, didr1};
use crate::registers::{Peripheral, PeripheralSet, Port};
use crate::watchdog::WatchdogPolicy;

/// PD6/PD7 carry AIN0/AIN1.
const COMPARATOR_PINS_SHIFT: u8 = 6;

/// Input to [`minimize_power`](crate::minimize_power).
///
/// Anything not marked as in use is powered down; any pin not reserved is
/// turned into an input, with the pull-up enabled unless it is an analog
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    in_use: PeripheralSet,
    reserved: [u8; Port::ALL.len()],
    analog: u8,
    watchdog: WatchdogPolicy,
}

impl PowerConfig {
    /// Nothing in use, no pins reserved.
    pub fn new() -> Self {
        Self {
            in_use: PeripheralSet::EMPTY,
            reserved: [0; Port::ALL.len()],
            analog: 0,
            watchdog: WatchdogPolicy::default(),
        }
    }

    /// Keeps Timer0 running, which the Arduino core needs for `millis()` and
    /// `delay()`. This is the [`Default`].
    pub fn arduino() -> Self {
        Self::new().keep(Peripheral::Timer0)
    }

    /// Leaves `peripheral` powered and configured.
    pub fn keep(mut self, peripheral: Peripheral) -> Self {
        self.in_use = self.in_use.with(peripheral);
        self
    }

    /// Leaves the pins in `mask` untouched (direction, pull-up and DIDR).
    pub fn reserve_pins(mut self, port: Port, mask: u8) -> Result<Self, ConfigError> {
        let outside = mask & !port.pin_mask();
        if outside != 0 {
            return Err(ConfigError::PinOutOfRange {
                port,
                mask: outside,
            });
        }
        if port == Port::C && mask & self.analog != 0 {
            return Err(ConfigError::PinConflict {
                port,
                mask: mask & self.analog,
            });
        }
        self.reserved[port_index(port)] |= mask;
        Ok(self)
    }

    /// Declares PC0..PC5 pins sampled by the ADC. They get their digital
    /// input buffer disabled and no pull-up.
    pub fn analog_inputs(mut self, mask: u8) -> Result<Self, ConfigError> {
        let outside = mask & !didr0::ADC_MASK;
        if outside != 0 {
            return Err(ConfigError::NotAnalogCapable(outside));
        }
        let overlap = mask & self.reserved(Port::C);
        if overlap != 0 {
            return Err(ConfigError::PinConflict {
                port: Port::C,
                mask: overlap,
            });
        }
        self.analog |= mask;
        Ok(self)
    }

    pub fn watchdog(mut self, policy: WatchdogPolicy) -> Self {
        self.watchdog = policy;
        self
    }

    pub fn in_use(&self) -> PeripheralSet {
        self.in_use
    }

    pub fn unused(&self) -> PeripheralSet {
        self.in_use.complement()
    }

    pub fn reserved(&self, port: Port) -> u8 {
        self.reserved[port_index(port)]
    }

    pub fn analog(&self) -> u8 {
        self.analog
    }

    pub fn watchdog_policy(&self) -> WatchdogPolicy {
        self.watchdog
    }

    /// DIDR0: every ADC pin the application does not drive digitally.
    pub fn didr0(&self) -> u8 {
        (didr0::ADC_MASK & !self.reserved(Port::C)) | self.analog
    }

    /// DIDR1: AIN0/AIN1 unless PD6/PD7 are reserved.
    pub fn didr1(&self) -> u8 {
        let reserved = self.reserved(Port::D) >> COMPARATOR_PINS_SHIFT;
        (didr1::AIN0D | didr1::AIN1D) & !reserved
    }

    /// Pins this configuration takes over on `port`.
    pub fn managed_pins(&self, port: Port) -> u8 {
        port.pin_mask() & !self.reserved(port)
    }

    /// Managed pins that get the pull-up.
    pub fn pull_ups(&self, port: Port) -> u8 {
        let analog = if port == Port::C { self.analog } else { 0 };
        self.managed_pins(port) & !analog
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self::arduino()
    }
}

fn port_index(port: Port) -> usize {
    match port {
        Port::B => 0,
        Port::C => 1,
        Port::D => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_arduino_build() {
        let config = PowerConfig::default();
        assert!(config.in_use().contains(Peripheral::Timer0));
        assert_eq!(config.unused().prr_bits(), 0b1100_1111);
        assert_eq!(config.didr0(), 0b0011_1111);
        assert_eq!(config.didr1(), 0b11);
        assert_eq!(config.pull_ups(Port::B), 0xFF);
        assert_eq!(config.pull_ups(Port::C), 0x7F);
        assert_eq!(config.pull_ups(Port::D), 0xFF);
    }

    #[test]
    fn reserved_pins_are_left_alone() {
        // PB5 drives the on-board LED, PD0/PD1 are the serial port
        let config = PowerConfig::new()
            .reserve_pins(Port::B, 1 << 5)
            .and_then(|c| c.reserve_pins(Port::D, 0b0000_0011))
            .unwrap();
        assert_eq!(config.managed_pins(Port::B), 0b1101_1111);
        assert_eq!(config.managed_pins(Port::D), 0b1111_1100);
        assert_eq!(config.didr1(), 0b11);
    }

    #[test]
    fn reserved_comparator_pins_keep_digital_buffer() {
        let config = PowerConfig::new()
            .reserve_pins(Port::D, 1 << 7)
            .unwrap();
        assert_eq!(config.didr1(), didr1::AIN0D);
    }

    #[test]
    fn analog_inputs_skip_pull_up() {
        let config = PowerConfig::new()
            .keep(Peripheral::Adc)
            .analog_inputs(0b0000_0011)
            .unwrap();
        assert_eq!(config.pull_ups(Port::C), 0b0111_1100);
        assert_eq!(config.didr0(), 0b0011_1111);
    }

    #[test]
    fn reserved_adc_pin_keeps_digital_buffer() {
        let config = PowerConfig::new()
            .reserve_pins(Port::C, 1 << 4)
            .unwrap();
        assert_eq!(config.didr0(), 0b0010_1111);
    }

    #[test]
    fn rejects_missing_pins() {
        assert_eq!(
            PowerConfig::new().reserve_pins(Port::C, 0x80),
            Err(ConfigError::PinOutOfRange {
                port: Port::C,
                mask: 0x80
            })
        );
        assert_eq!(
            PowerConfig::new().analog_inputs(0b0100_0001),
            Err(ConfigError::NotAnalogCapable(0b0100_0000))
        );
    }

    #[test]
    fn rejects_conflicts_in_either_order() {
        let err = PowerConfig::new()
            .analog_inputs(0b1)
            .and_then(|c| c.reserve_pins(Port::C, 0b11));
        assert_eq!(
            err,
            Err(ConfigError::PinConflict {
                port: Port::C,
                mask: 0b1
            })
        );

        let err = PowerConfig::new()
            .reserve_pins(Port::C, 0b10)
            .and_then(|c| c.analog_inputs(0b11));
        assert_eq!(
            err,
            Err(ConfigError::PinConflict {
                port: Port::C,
                mask: 0b10
            })
        );
    }
}
