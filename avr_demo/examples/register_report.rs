#![feature(asm_experimental_arch)]
#![no_std]
#![no_main]

//! Prints the register file before and after `minimize_power` over serial,
//! then halts. Needs the `ufmt` feature.

use avr_demo::{board_config, print_snapshot};
use lowpower::{AvrBus, Mcu};
use panic_halt as _;
use ufmt::uwriteln;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let mut serial = arduino_hal::default_serial!(dp, pins, 57600);

    // SAFETY: USART0 and its pins are kept by `board_config`.
    let mut mcu = Mcu::new(unsafe { AvrBus::steal() });

    uwriteln!(&mut serial, "--- before").ok();
    print_snapshot(&mut serial, &mcu.snapshot()).ok();

    mcu.minimize_power(&board_config().unwrap());

    uwriteln!(&mut serial, "--- after").ok();
    print_snapshot(&mut serial, &mcu.snapshot()).ok();
    uwriteln!(&mut serial, "watchdog off: {}", mcu.watchdog_disabled()).ok();
    uwriteln!(&mut serial, "=== TEST COMPLETE ===").ok();

    // Exit the simulator
    unsafe { core::arch::asm!("sleep") };
    loop {}
}
