// SPDX-License-Identifier: Apache-2.0

//! Register access seam.
//!
//! Routines in this crate only talk to hardware through [`RegisterBus`]. The
//! on-target implementation is `AvrBus`; host tests use
//! [`SimulatedMcu`](crate::SimulatedMcu).

use crate::clock;
use crate::config::PowerConfig;
use crate::power;
use crate::registers::{bits, ClockDivider, Port, Register, WatchdogPrescaler};
use crate::watchdog::{self, WatchdogPolicy};

/// Byte-wide access to the MCU's control registers.
///
/// Implementations must perform exactly one hardware access per call, in
/// program order.
pub trait RegisterBus {
    fn read(&self, reg: Register) -> u8;

    fn write(&mut self, reg: Register, value: u8);

    /// Read-modify-write.
    fn modify<F: FnOnce(u8) -> u8>(&mut self, reg: Register, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Restart the watchdog count (`wdr`).
    fn watchdog_reset(&mut self);

    /// Change-enable pair: `arm` then `value`, back to back.
    ///
    /// Callers run this inside [`interrupt_free`](Self::interrupt_free); the
    /// second write must land within four cycles of the first.
    fn timed_write(&mut self, reg: Register, arm: u8, value: u8) {
        self.write(reg, arm);
        self.write(reg, value);
    }

    /// Runs `f` with global interrupts disabled, then restores SREG as it was.
    ///
    /// Interrupts are never enabled here unless they were enabled on entry.
    fn interrupt_free<R, F: FnOnce(&mut Self) -> R>(&mut self, f: F) -> R {
        let sreg = self.read(Register::Sreg);
        self.write(Register::Sreg, sreg & !bits::sreg::I);
        let result = f(self);
        self.write(Register::Sreg, sreg);
        result
    }

    /// Timed watchdog shutdown. See [`watchdog::disable_watchdog`].
    fn disable_watchdog(&mut self, policy: WatchdogPolicy)
    where
        Self: Sized,
    {
        watchdog::timed_disable(self, policy);
    }
}

/// Register file snapshot, indexed by [`Register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot([u8; Register::ALL.len()]);

impl RegisterSnapshot {
    pub fn capture<B: RegisterBus>(bus: &B) -> Self {
        let mut values = [0u8; Register::ALL.len()];
        for (slot, reg) in values.iter_mut().zip(Register::ALL) {
            *slot = bus.read(reg);
        }
        Self(values)
    }

    pub(crate) fn from_values(values: [u8; Register::ALL.len()]) -> Self {
        Self(values)
    }

    pub fn get(&self, reg: Register) -> u8 {
        self.0[reg.index()]
    }

    /// `(register, value)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u8)> + '_ {
        Register::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Registers whose values differ between `self` and `other`.
    pub fn diff<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = Register> + 'a {
        Register::ALL
            .into_iter()
            .filter(move |reg| self.get(*reg) != other.get(*reg))
    }
}

impl core::fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (reg, value) in self.iter() {
            writeln!(f, "{:<7} {:#06x}  {value:#010b}", reg.name(), reg.address())?;
        }
        Ok(())
    }
}

/// Direction and output/pull-up bits of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortState {
    pub ddr: u8,
    pub port: u8,
}

impl PortState {
    /// Pins configured as input with the pull-up enabled.
    pub fn pulled_up_inputs(&self) -> u8 {
        !self.ddr & self.port
    }
}

/// Named accessors over a [`RegisterBus`].
#[derive(Debug)]
pub struct Mcu<B> {
    bus: B,
}

impl<B: RegisterBus> Mcu<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    pub fn adc_enabled(&self) -> bool {
        self.bus.read(Register::Adcsra) & bits::adcsra::ADEN != 0
    }

    /// Raw PRR value; a set bit means the peripheral is powered down.
    pub fn power_reduction(&self) -> u8 {
        self.bus.read(Register::Prr)
    }

    pub fn comparator_disabled(&self) -> bool {
        self.bus.read(Register::Acsr) & bits::acsr::ACD != 0
    }

    pub fn digital_input_disable(&self) -> (u8, u8) {
        (self.bus.read(Register::Didr0), self.bus.read(Register::Didr1))
    }

    pub fn port(&self, port: Port) -> PortState {
        PortState {
            ddr: self.bus.read(port.ddr()),
            port: self.bus.read(port.port()),
        }
    }

    pub fn reset_flags(&self) -> u8 {
        self.bus.read(Register::Mcusr)
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.bus.read(Register::Sreg) & bits::sreg::I != 0
    }

    pub fn watchdog_control(&self) -> u8 {
        self.bus.read(Register::Wdtcsr)
    }

    pub fn watchdog_disabled(&self) -> bool {
        watchdog::is_watchdog_disabled(&self.bus)
    }

    pub fn watchdog_prescaler(&self) -> Option<WatchdogPrescaler> {
        WatchdogPrescaler::from_wdtcsr(self.watchdog_control())
    }

    pub fn clock_divider(&self) -> Option<ClockDivider> {
        clock::clock_divider(&self.bus)
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot::capture(&self.bus)
    }

    pub fn minimize_power(&mut self, config: &PowerConfig) {
        power::minimize_power(&mut self.bus, config);
    }

    pub fn disable_watchdog(&mut self, policy: WatchdogPolicy) {
        watchdog::disable_watchdog(&mut self.bus, policy);
    }

    pub fn set_clock_divider(&mut self, divider: ClockDivider) {
        clock::set_clock_divider(&mut self.bus, divider);
    }
}

#[cfg(target_arch = "avr")]
pub use self::avr::AvrBus;

#[cfg(target_arch = "avr")]
mod avr {
    use super::RegisterBus;
    use crate::registers::{bits, Register};
    use crate::watchdog::WatchdogPolicy;
    use core::arch::asm;
    use core::marker::PhantomData;

    /// Direct volatile access to the ATmega328P register file.
    #[derive(Debug)]
    pub struct AvrBus {
        // Registers are process-wide state; keep the handle on one thread.
        _not_sync: PhantomData<*const ()>,
    }

    impl AvrBus {
        /// # Safety
        ///
        /// At most one `AvrBus` may exist, and nothing else (including HAL
        /// peripheral singletons) may write the registers it touches while it
        /// is alive.
        pub unsafe fn steal() -> Self {
            Self {
                _not_sync: PhantomData,
            }
        }
    }

    macro_rules! timed_sts {
        ($addr:expr, $arm:expr, $value:expr) => {
            // SAFETY: fixed MMIO address; two adjacent `sts` (2 cycles each)
            // keep the second write inside the change-enable window.
            unsafe {
                asm!(
                    "sts {addr}, {arm}",
                    "sts {addr}, {value}",
                    addr = const $addr,
                    arm = in(reg) $arm,
                    value = in(reg) $value,
                    options(nostack),
                )
            }
        };
    }

    impl RegisterBus for AvrBus {
        fn read(&self, reg: Register) -> u8 {
            // SAFETY: `reg.address()` is a valid MMIO register on this device.
            unsafe { core::ptr::read_volatile(reg.address() as *const u8) }
        }

        fn write(&mut self, reg: Register, value: u8) {
            // SAFETY: as above; exclusive access per `steal`'s contract.
            unsafe { core::ptr::write_volatile(reg.address() as *mut u8, value) }
        }

        fn watchdog_reset(&mut self) {
            // SAFETY: `wdr` has no operands and no memory effects.
            unsafe { asm!("wdr", options(nomem, nostack, preserves_flags)) }
        }

        fn timed_write(&mut self, reg: Register, arm: u8, value: u8) {
            match reg {
                Register::Wdtcsr => timed_sts!(Register::Wdtcsr.address(), arm, value),
                Register::Clkpr => timed_sts!(Register::Clkpr.address(), arm, value),
                _ => {
                    self.write(reg, arm);
                    self.write(reg, value);
                }
            }
        }

        fn interrupt_free<R, F: FnOnce(&mut Self) -> R>(&mut self, f: F) -> R {
            let sreg: u8;
            // SAFETY: saves SREG and clears I; acts as a compiler barrier.
            unsafe {
                asm!(
                    "in {sreg}, {SREG}",
                    "cli",
                    sreg = out(reg) sreg,
                    SREG = const 0x3F,
                    options(nostack),
                )
            };
            let result = f(self);
            // SAFETY: restores the SREG captured above.
            unsafe {
                asm!(
                    "out {SREG}, {sreg}",
                    sreg = in(reg) sreg,
                    SREG = const 0x3F,
                    options(nostack),
                )
            };
            result
        }

        fn disable_watchdog(&mut self, policy: WatchdogPolicy) {
            let (keep, set) = policy.final_write_parts();
            // SAFETY: touches only SREG, MCUSR and WDTCSR. SREG (and with it
            // the I flag) is restored before returning; every scratch register
            // is a compiler-allocated operand.
            unsafe {
                asm!(
                    "in {sreg}, {SREG}",
                    "cli",
                    "wdr",
                    // WDRF forces WDE on; clear it first
                    "in {tmp}, {MCUSR}",
                    "andi {tmp}, {NOT_WDRF}",
                    "out {MCUSR}, {tmp}",
                    "lds {tmp}, {WDTCSR}",
                    "mov {fin}, {tmp}",
                    "and {fin}, {keep}",
                    "or {fin}, {set}",
                    "ori {tmp}, {WDCE_WDE}",
                    "sts {WDTCSR}, {tmp}",
                    "sts {WDTCSR}, {fin}",
                    "out {SREG}, {sreg}",
                    sreg = out(reg) _,
                    tmp = out(reg_upper) _,
                    fin = out(reg) _,
                    keep = in(reg) keep,
                    set = in(reg) set,
                    SREG = const 0x3F,
                    MCUSR = const 0x34,
                    WDTCSR = const 0x60,
                    NOT_WDRF = const !bits::mcusr::WDRF,
                    WDCE_WDE = const bits::wdtcsr::WDCE | bits::wdtcsr::WDE,
                    options(nostack),
                )
            }
        }
    }
}
