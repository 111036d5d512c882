// SPDX-License-Identifier: Apache-2.0

//! Register-level ATmega328P model for host-side testing.
//!
//! Only the behaviour the routines in this crate depend on is modelled:
//! cycle counting per access, the four-cycle change-enable windows of WDTCSR
//! and CLKPR, WDRF and the WDTON fuse forcing WDE, write-one-to-clear WDIF, and
//! a single interrupt source that preempts whenever SREG.I is set.

use core::cell::Cell;

use log::trace;

use crate::hal::{RegisterBus, RegisterSnapshot};
use crate::registers::bits::{clkpr, mcusr, sreg, wdtcsr};
use crate::registers::{Port, Register, WatchdogPrescaler};

/// Cycles between arming and the last cycle on which the protected write
/// may complete.
const CHANGE_WINDOW_CYCLES: u64 = 4;

const DEFAULT_ISR_CYCLES: u64 = 40;

const REGISTER_COUNT: usize = Register::ALL.len();

/// Simulated register file implementing [`RegisterBus`].
#[derive(Debug)]
pub struct SimulatedMcu {
    regs: [Cell<u8>; REGISTER_COUNT],
    writes: [Cell<u16>; REGISTER_COUNT],
    cycles: Cell<u64>,
    wdt_window: Cell<Option<u64>>,
    clk_window: Cell<Option<u64>>,
    interrupt_at: Cell<Option<u64>>,
    interrupts_serviced: Cell<u32>,
    isr_cycles: u64,
    wdton: bool,
}

impl SimulatedMcu {
    /// Power-on reset state: everything zero except PORF, watchdog off.
    pub fn power_on() -> Self {
        Self {
            regs: Register::ALL.map(|reg| Cell::new(reg.reset_value())),
            writes: Default::default(),
            cycles: Cell::new(0),
            wdt_window: Cell::new(None),
            clk_window: Cell::new(None),
            interrupt_at: Cell::new(None),
            interrupts_serviced: Cell::new(0),
            isr_cycles: DEFAULT_ISR_CYCLES,
            wdton: false,
        }
    }

    /// State right after a watchdog system reset: WDRF set, watchdog running.
    pub fn after_watchdog_reset(prescaler: WatchdogPrescaler) -> Self {
        let sim = Self::power_on();
        sim.set_raw(Register::Mcusr, mcusr::WDRF);
        sim.set_raw(Register::Wdtcsr, wdtcsr::WDE | prescaler.wdtcsr_bits());
        sim
    }

    /// Watchdog running in reset mode, plus interrupt mode if `interrupt`.
    pub fn with_watchdog(self, prescaler: WatchdogPrescaler, interrupt: bool) -> Self {
        let mut value = wdtcsr::WDE | prescaler.wdtcsr_bits();
        if interrupt {
            value |= wdtcsr::WDIE;
        }
        self.set_raw(Register::Wdtcsr, value);
        self
    }

    /// Programs the WDTON fuse: the watchdog can no longer be turned off.
    pub fn with_wdton_fuse(mut self) -> Self {
        self.wdton = true;
        self.set_raw(
            Register::Wdtcsr,
            self.raw(Register::Wdtcsr) | wdtcsr::WDE,
        );
        self
    }

    pub fn with_interrupts_enabled(self) -> Self {
        self.set_raw(Register::Sreg, self.raw(Register::Sreg) | sreg::I);
        self
    }

    pub fn with_isr_cycles(mut self, cycles: u64) -> Self {
        self.isr_cycles = cycles;
        self
    }

    /// Sets a register without going through the write semantics, like a
    /// debugger poke. Does not count as a write and takes no cycles.
    pub fn preset(&mut self, reg: Register, value: u8) {
        self.set_raw(reg, value);
    }

    /// Makes the interrupt source pending from `cycle` on.
    pub fn schedule_interrupt(&mut self, cycle: u64) {
        self.interrupt_at.set(Some(cycle));
    }

    /// Makes the interrupt source pending now.
    pub fn raise_interrupt(&mut self) {
        self.interrupt_at.set(Some(self.cycles.get()));
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt_at.get().is_some()
    }

    pub fn interrupts_serviced(&self) -> u32 {
        self.interrupts_serviced.get()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    pub fn write_count(&self, reg: Register) -> u16 {
        self.writes[reg.index()].get()
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.raw(Register::Sreg) & sreg::I != 0
    }

    /// WDE or WDIE set.
    pub fn watchdog_enabled(&self) -> bool {
        self.raw(Register::Wdtcsr) & (wdtcsr::WDE | wdtcsr::WDIE) != 0
    }

    /// Register values without taking cycles or servicing interrupts.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot::from_values(Register::ALL.map(|reg| self.raw(reg)))
    }

    fn raw(&self, reg: Register) -> u8 {
        self.regs[reg.index()].get()
    }

    fn set_raw(&self, reg: Register, value: u8) {
        self.regs[reg.index()].set(value & implemented_bits(reg));
    }

    /// Services a due interrupt, then accounts for the access itself.
    /// Returns the cycle on which the access completes.
    fn access(&self, reg: Option<Register>) -> u64 {
        if let Some(at) = self.interrupt_at.get() {
            if self.cycles.get() >= at && self.interrupts_enabled() {
                self.interrupt_at.set(None);
                self.cycles.set(self.cycles.get() + self.isr_cycles);
                self.interrupts_serviced
                    .set(self.interrupts_serviced.get() + 1);
                trace!("interrupt serviced, now at cycle {}", self.cycles.get());
            }
        }
        let cost = match reg.and_then(Register::io_address) {
            // in/out/cli/wdr
            Some(_) => 1,
            None if reg.is_none() => 1,
            // lds/sts
            None => 2,
        };
        let now = self.cycles.get() + cost;
        self.cycles.set(now);
        now
    }

    fn window_open(window: &Cell<Option<u64>>, now: u64) -> bool {
        match window.get() {
            Some(deadline) if now <= deadline => true,
            Some(_) => {
                window.set(None);
                false
            }
            None => false,
        }
    }

    fn write_wdtcsr(&self, value: u8, now: u64) {
        let mut current = self.raw(Register::Wdtcsr);
        if value & wdtcsr::WDIF != 0 {
            current &= !wdtcsr::WDIF;
        }
        if Self::window_open(&self.wdt_window, now) {
            let protected = wdtcsr::WDIE | wdtcsr::WDE | wdtcsr::WDP_MASK;
            current = (current & !protected) | (value & protected);
            self.wdt_window.set(None);
            trace!("WDTCSR protected write {value:#04x} at cycle {now}");
        } else {
            // WDIE is unprotected, and WDE may always be set
            current = (current & !wdtcsr::WDIE) | (value & wdtcsr::WDIE);
            current |= value & wdtcsr::WDE;
            let arm = wdtcsr::WDCE | wdtcsr::WDE;
            if value & arm == arm {
                self.wdt_window.set(Some(now + CHANGE_WINDOW_CYCLES));
                trace!("WDTCSR change enable armed at cycle {now}");
            }
        }
        if self.wdton || self.raw(Register::Mcusr) & mcusr::WDRF != 0 {
            current |= wdtcsr::WDE;
        }
        self.set_raw(Register::Wdtcsr, current);
    }

    fn write_clkpr(&self, value: u8, now: u64) {
        if value == clkpr::CLKPCE {
            self.clk_window.set(Some(now + CHANGE_WINDOW_CYCLES));
            trace!("CLKPR change enable armed at cycle {now}");
        } else if value & clkpr::CLKPCE == 0 && Self::window_open(&self.clk_window, now) {
            self.clk_window.set(None);
            self.set_raw(Register::Clkpr, value & clkpr::CLKPS_MASK);
        } else {
            trace!("CLKPR write {value:#04x} ignored at cycle {now}");
        }
    }
}

impl Default for SimulatedMcu {
    fn default() -> Self {
        Self::power_on()
    }
}

/// Bits that exist in hardware; the rest read as zero.
fn implemented_bits(reg: Register) -> u8 {
    match reg {
        Register::Ddrc | Register::Portc => Port::C.pin_mask(),
        Register::Didr0 => 0x3F,
        Register::Didr1 => 0x03,
        Register::Prr => 0xEF,
        Register::Mcusr => 0x0F,
        Register::Clkpr => clkpr::CLKPCE | clkpr::CLKPS_MASK,
        _ => 0xFF,
    }
}

impl RegisterBus for SimulatedMcu {
    fn read(&self, reg: Register) -> u8 {
        let now = self.access(Some(reg));
        let mut value = self.raw(reg);
        match reg {
            Register::Wdtcsr if Self::window_open(&self.wdt_window, now) => {
                value |= wdtcsr::WDCE
            }
            Register::Clkpr if Self::window_open(&self.clk_window, now) => {
                value |= clkpr::CLKPCE
            }
            _ => {}
        }
        trace!("read  {reg} = {value:#04x} at cycle {now}");
        value
    }

    fn write(&mut self, reg: Register, value: u8) {
        let now = self.access(Some(reg));
        let count = &self.writes[reg.index()];
        count.set(count.get().saturating_add(1));
        trace!("write {reg} = {value:#04x} at cycle {now}");
        match reg {
            Register::Wdtcsr => self.write_wdtcsr(value, now),
            Register::Clkpr => self.write_clkpr(value, now),
            // Reset flags are cleared by writing zero
            Register::Mcusr => self.set_raw(reg, self.raw(reg) & value),
            _ => self.set_raw(reg, value),
        }
    }

    fn watchdog_reset(&mut self) {
        let now = self.access(None);
        trace!("wdr at cycle {now}");
    }
}
