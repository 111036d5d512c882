// SPDX-License-Identifier: Apache-2.0

use log::debug;

use crate::config::PowerConfig;
use crate::hal::RegisterBus;
use crate::registers::bits::acsr;
use crate::registers::{Peripheral, Port, Register};
use crate::watchdog;

/// Puts everything `config` does not need into its lowest power state, then
/// turns the watchdog off.
///
/// Call once during start-up, after the peripherals the application uses
/// have been set up and before entering the main loop. Running it again
/// leaves the registers unchanged. SREG.I is the same on return as on entry.
///
/// Nothing here can fail. A pin that is wired to active circuitry but not
/// reserved will be turned into a pulled-up input regardless.
pub fn minimize_power<B: RegisterBus>(bus: &mut B, config: &PowerConfig) {
    let in_use = config.in_use();

    // ADEN has to be cleared before PRADC gates the ADC clock
    if !in_use.contains(Peripheral::Adc) {
        debug!("ADC off");
        bus.write(Register::Adcsra, 0);
    }

    let prr = config.unused().prr_bits();
    debug!("PRR = {prr:#010b}");
    bus.write(Register::Prr, prr);

    if !in_use.contains(Peripheral::AnalogComparator) {
        disable_comparator(bus);
    }

    debug!(
        "DIDR0 = {:#010b}, DIDR1 = {:#04b}",
        config.didr0(),
        config.didr1()
    );
    bus.write(Register::Didr0, config.didr0());
    bus.write(Register::Didr1, config.didr1());

    for port in Port::ALL {
        park_pins(bus, config, port);
    }

    watchdog::disable_watchdog(bus, config.watchdog_policy());
}

/// ACIE must be clear while ACD changes, or the change itself can raise
/// an interrupt.
fn disable_comparator<B: RegisterBus>(bus: &mut B) {
    let value = bus.read(Register::Acsr);
    if value & acsr::ACIE != 0 {
        bus.write(Register::Acsr, value & !acsr::ACIE);
    }
    if value & acsr::ACD == 0 {
        debug!("analog comparator off");
        bus.write(Register::Acsr, (value & !acsr::ACIE) | acsr::ACD);
    }
}

/// Managed pins become inputs; pull-ups on all of them but analog inputs.
fn park_pins<B: RegisterBus>(bus: &mut B, config: &PowerConfig, port: Port) {
    let managed = config.managed_pins(port);
    let pull_ups = config.pull_ups(port);
    debug!("{port}: inputs {managed:#010b}, pull-ups {pull_ups:#010b}");

    // Direction first so no managed pin drives high on the way
    if managed == port.pin_mask() {
        bus.write(port.ddr(), 0);
        bus.write(port.port(), pull_ups);
    } else {
        bus.modify(port.ddr(), |v| v & !managed);
        bus.modify(port.port(), |v| (v & !managed) | pull_ups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::bits::{adcsra, sreg};
    use crate::registers::WatchdogPrescaler;
    use crate::sim::SimulatedMcu;
    use test_log::test;

    #[test]
    fn arduino_defaults_match_example_firmware() {
        let mut mcu = SimulatedMcu::power_on()
            .with_watchdog(WatchdogPrescaler::Cycles2K, false);
        mcu.preset(Register::Adcsra, adcsra::ADEN | 0x07);

        minimize_power(&mut mcu, &PowerConfig::default());

        let snap = mcu.snapshot();
        assert_eq!(snap.get(Register::Adcsra), 0);
        assert_eq!(snap.get(Register::Prr), 0b1100_1111);
        assert_eq!(snap.get(Register::Acsr), acsr::ACD);
        assert_eq!(snap.get(Register::Didr0), 0b0011_1111);
        assert_eq!(snap.get(Register::Didr1), 0b11);
        assert_eq!(snap.get(Register::Ddrb), 0);
        assert_eq!(snap.get(Register::Portb), 0xFF);
        assert_eq!(snap.get(Register::Ddrc), 0);
        assert_eq!(snap.get(Register::Portc), 0x7F);
        assert_eq!(snap.get(Register::Ddrd), 0);
        assert_eq!(snap.get(Register::Portd), 0xFF);
        assert!(!mcu.watchdog_enabled());
    }

    #[test]
    fn comparator_interrupt_cleared_before_disable() {
        let mut mcu = SimulatedMcu::power_on();
        mcu.preset(Register::Acsr, acsr::ACIE);

        minimize_power(&mut mcu, &PowerConfig::new());

        assert_eq!(mcu.read(Register::Acsr), acsr::ACD);
        assert_eq!(mcu.write_count(Register::Acsr), 2);
    }

    #[test]
    fn comparator_in_use_is_untouched() {
        let mut mcu = SimulatedMcu::power_on();
        mcu.preset(Register::Acsr, acsr::ACIE);
        let config = PowerConfig::new().keep(Peripheral::AnalogComparator);

        minimize_power(&mut mcu, &config);

        assert_eq!(mcu.read(Register::Acsr), acsr::ACIE);
        assert_eq!(mcu.write_count(Register::Acsr), 0);
    }

    #[test]
    fn adc_in_use_stays_enabled() {
        let mut mcu = SimulatedMcu::power_on();
        mcu.preset(Register::Adcsra, adcsra::ADEN);
        let config = PowerConfig::new().keep(Peripheral::Adc);

        minimize_power(&mut mcu, &config);

        assert_eq!(mcu.read(Register::Adcsra), adcsra::ADEN);
        assert_eq!(mcu.read(Register::Prr) & 1, 0);
    }

    #[test]
    fn reserved_pins_keep_their_state() {
        let mut mcu = SimulatedMcu::power_on();
        // PB5 as a high output
        mcu.preset(Register::Ddrb, 1 << 5);
        mcu.preset(Register::Portb, 1 << 5);
        let config = PowerConfig::new().reserve_pins(Port::B, 1 << 5).unwrap();

        minimize_power(&mut mcu, &config);

        assert_eq!(mcu.read(Register::Ddrb), 1 << 5);
        assert_eq!(mcu.read(Register::Portb), 0xFF);
    }

    #[test]
    fn single_write_per_register_when_nothing_reserved() {
        let mut mcu = SimulatedMcu::power_on();
        minimize_power(&mut mcu, &PowerConfig::new());
        for reg in [
            Register::Adcsra,
            Register::Prr,
            Register::Didr0,
            Register::Didr1,
            Register::Ddrb,
            Register::Portb,
            Register::Ddrc,
            Register::Portc,
            Register::Ddrd,
            Register::Portd,
            Register::Acsr,
        ] {
            assert_eq!(mcu.write_count(reg), 1, "{reg}");
        }
    }

    #[test]
    fn restores_interrupt_flag() {
        let mut mcu = SimulatedMcu::power_on().with_interrupts_enabled();
        minimize_power(&mut mcu, &PowerConfig::default());
        assert_eq!(mcu.read(Register::Sreg) & sreg::I, sreg::I);

        let mut mcu = SimulatedMcu::power_on();
        minimize_power(&mut mcu, &PowerConfig::default());
        assert_eq!(mcu.read(Register::Sreg) & sreg::I, 0);
    }
}
