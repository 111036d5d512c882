#![feature(asm_experimental_arch)]
#![no_std]
#![no_main]

//! Blinks D13 four times at every system clock divider, /1 through /256.
//! `delay_ms` assumes 16 MHz, so the blinks slow down as the clock does.

use avr_demo::board_config;
use lowpower::{AvrBus, ClockDivider, Mcu};
use panic_halt as _;

// Conditional import of uwriteln! - stub out if ufmt feature is not enabled
#[cfg(feature = "ufmt")]
use ufmt::uwriteln;

#[cfg(not(feature = "ufmt"))]
macro_rules! uwriteln {
    ($($args:tt)*) => {
        Ok::<(), core::convert::Infallible>(())
    };
}

const BASE_HZ: u32 = 16_000_000;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    #[cfg(feature = "ufmt")]
    let mut serial = arduino_hal::default_serial!(dp, pins, 57600);
    let mut led = pins.d13.into_output();

    // SAFETY: the LED and serial pins are reserved and USART0 is kept, so the
    // HAL handles above never write what the bus changes.
    let mut mcu = Mcu::new(unsafe { AvrBus::steal() });
    mcu.minimize_power(&board_config().unwrap());

    uwriteln!(&mut serial, "watchdog off: {}", mcu.watchdog_disabled()).ok();
    uwriteln!(&mut serial, "PRR: {}", mcu.power_reduction()).ok();

    loop {
        for divider in ClockDivider::ALL {
            // The UART baud rate is only right at /1
            if divider == ClockDivider::Div1 {
                uwriteln!(&mut serial, "cpu at {} Hz", divider.cpu_hz(BASE_HZ)).ok();
            }
            mcu.set_clock_divider(divider);
            for _ in 0..8 {
                led.toggle();
                arduino_hal::delay_ms(100);
            }
        }
        mcu.set_clock_divider(ClockDivider::Div1);
    }
}
