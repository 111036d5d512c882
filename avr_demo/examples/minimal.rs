#![feature(asm_experimental_arch)]
#![no_std]
#![no_main]

use lowpower::{minimize_power, AvrBus, PowerConfig};
use panic_halt as _;

#[arduino_hal::entry]
fn main() -> ! {
    // SAFETY: nothing else in this program touches the registers.
    let mut bus = unsafe { AvrBus::steal() };
    minimize_power(&mut bus, &PowerConfig::new());

    loop {
        unsafe { core::arch::asm!("sleep") }
    }
}
