// Register-state properties of minimize_power, checked on the simulator
use lowpower::registers::bits::{acsr, adcsra, sreg, wdtcsr};
use lowpower::{
    minimize_power, Mcu, Peripheral, Port, PowerConfig, Register, RegisterBus, SimulatedMcu,
    WatchdogPolicy, WatchdogPrescaler,
};

/// A chip as a bootloader or earlier init code might leave it: ADC and
/// comparator interrupt on, a few outputs driven, watchdog running.
fn busy_chip() -> SimulatedMcu {
    let mut mcu = SimulatedMcu::power_on()
        .with_watchdog(WatchdogPrescaler::Cycles512K, true)
        .with_interrupts_enabled();
    mcu.preset(Register::Adcsra, adcsra::ADEN | 0x07);
    mcu.preset(Register::Acsr, acsr::ACIE);
    mcu.preset(Register::Ddrb, 0b0010_0001);
    mcu.preset(Register::Portb, 0b0000_0001);
    mcu.preset(Register::Ddrd, 0b0000_0010);
    mcu.preset(Register::Prr, 0);
    mcu
}

#[test_log::test]
fn adc_reads_disabled() {
    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&PowerConfig::new());
    assert!(!mcu.adc_enabled());
}

#[test_log::test]
fn every_free_pin_is_pulled_up_input() {
    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&PowerConfig::new());
    for port in Port::ALL {
        let state = mcu.port(port);
        assert_eq!(state.ddr, 0, "{port}");
        assert_eq!(state.port, port.pin_mask(), "{port}");
    }
}

#[test_log::test]
fn analog_pins_have_no_pull_up() {
    let config = PowerConfig::new()
        .keep(Peripheral::Adc)
        .analog_inputs(0b0000_1001)
        .unwrap();
    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&config);

    let c = mcu.port(Port::C);
    assert_eq!(c.ddr, 0);
    assert_eq!(c.port, 0b0111_0110);
    assert_eq!(mcu.digital_input_disable().0 & 0b1001, 0b1001);
    assert!(mcu.adc_enabled());
}

#[test_log::test]
fn watchdog_reads_fully_disabled() {
    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&PowerConfig::new());
    assert_eq!(
        mcu.watchdog_control() & (wdtcsr::WDE | wdtcsr::WDIE | wdtcsr::WDCE),
        0
    );
    assert!(mcu.watchdog_disabled());
}

#[test_log::test]
fn policy_controls_final_prescaler() {
    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&PowerConfig::new().watchdog(WatchdogPolicy::PRESERVE_PRESCALER));
    assert_eq!(mcu.watchdog_prescaler(), Some(WatchdogPrescaler::Cycles512K));

    let mut mcu = Mcu::new(busy_chip());
    mcu.minimize_power(&PowerConfig::new().watchdog(WatchdogPolicy::FIXED_DISABLE));
    assert_eq!(mcu.watchdog_control(), 0);
}

#[test_log::test]
fn running_twice_equals_running_once() {
    let config = PowerConfig::default()
        .reserve_pins(Port::B, 1 << 5)
        .unwrap();

    let mut once = busy_chip();
    minimize_power(&mut once, &config);

    let mut twice = busy_chip();
    minimize_power(&mut twice, &config);
    minimize_power(&mut twice, &config);

    let (a, b) = (once.snapshot(), twice.snapshot());
    assert_eq!(a.diff(&b).count(), 0, "once:\n{a}\ntwice:\n{b}");
}

#[test_log::test]
fn interrupt_flag_is_restored() {
    let mut enabled = busy_chip();
    minimize_power(&mut enabled, &PowerConfig::default());
    assert!(enabled.interrupts_enabled());

    let mut disabled = busy_chip();
    disabled.preset(Register::Sreg, 0);
    minimize_power(&mut disabled, &PowerConfig::default());
    assert!(!disabled.interrupts_enabled());
}

#[test_log::test]
fn only_routine_registers_change() {
    let mut mcu = busy_chip();
    let before = mcu.snapshot();
    minimize_power(&mut mcu, &PowerConfig::default());
    let after = mcu.snapshot();

    for reg in before.diff(&after) {
        assert_ne!(reg, Register::Sreg);
        assert_ne!(reg, Register::Clkpr);
    }
    assert_eq!(after.get(Register::Sreg), sreg::I);
}

fn check_kept(peripheral: Peripheral) {
    let mut mcu = busy_chip();
    minimize_power(&mut mcu, &PowerConfig::new().keep(peripheral));

    let prr = mcu.read(Register::Prr);
    for other in Peripheral::ALL {
        let Some(bit) = other.prr_bit() else {
            continue;
        };
        if other == peripheral {
            assert_eq!(prr & bit, 0, "{peripheral:?} should stay powered");
        } else {
            assert_eq!(prr & bit, bit, "{other:?} should be gated");
        }
    }
}

macro_rules! generate_keep_tests {
    ($($name:ident => $peripheral:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test_log::test]
                fn [<keeps_ $name _powered>]() {
                    check_kept($peripheral);
                }
            }
        )*
    };
}

generate_keep_tests!(
    twi => Peripheral::Twi,
    timer2 => Peripheral::Timer2,
    timer0 => Peripheral::Timer0,
    timer1 => Peripheral::Timer1,
    spi => Peripheral::Spi,
    usart0 => Peripheral::Usart0,
    adc => Peripheral::Adc,
    comparator => Peripheral::AnalogComparator,
);

#[test_log::test]
fn comparator_kept_leaves_acsr_alone() {
    let mut mcu = busy_chip();
    minimize_power(
        &mut mcu,
        &PowerConfig::new().keep(Peripheral::AnalogComparator),
    );
    assert_eq!(mcu.read(Register::Acsr), acsr::ACIE);
}
