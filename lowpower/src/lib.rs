// SPDX-License-Identifier: Apache-2.0

//! Power minimisation for the ATmega328P.
//!
//! [`minimize_power`] powers down every peripheral the application has not
//! claimed, parks unused pins as pulled-up inputs and finally switches the
//! watchdog off with the datasheet's timed sequence. All hardware access goes
//! through [`RegisterBus`], so the same routines run against the real chip
//! (`AvrBus`, AVR targets only) or against [`SimulatedMcu`] in host tests.
//!
//! ```
//! use lowpower::{minimize_power, Mcu, Peripheral, Port, PowerConfig, SimulatedMcu};
//!
//! let config = PowerConfig::new()
//!     .keep(Peripheral::Usart0)
//!     .reserve_pins(Port::D, 0b0000_0011)?;
//!
//! let mut mcu = Mcu::new(SimulatedMcu::power_on());
//! mcu.minimize_power(&config);
//!
//! assert!(!mcu.adc_enabled());
//! assert!(mcu.watchdog_disabled());
//! assert_eq!(mcu.port(Port::B).pulled_up_inputs(), 0xFF);
//! # Ok::<(), lowpower::ConfigError>(())
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

// Compile-time configuration validation
mod config_check;

mod error;
pub use error::ConfigError;

pub mod registers;
pub use registers::{ClockDivider, Peripheral, PeripheralSet, Port, Register, WatchdogPrescaler};

mod hal;
#[cfg(target_arch = "avr")]
pub use hal::AvrBus;
pub use hal::{Mcu, PortState, RegisterBus, RegisterSnapshot};

mod config;
pub use config::PowerConfig;

mod watchdog;
pub use watchdog::{disable_watchdog, is_watchdog_disabled, watchdog_prescaler, WatchdogPolicy};

mod power;
pub use power::minimize_power;

mod clock;
pub use clock::{clock_divider, set_clock_divider};

mod sim;
pub use sim::SimulatedMcu;
