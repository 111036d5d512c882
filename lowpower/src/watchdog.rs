// SPDX-License-Identifier: Apache-2.0

//! Watchdog shutdown.
//!
//! WDTCSR is guarded by timed-write protection: WDE can only be cleared by
//! first writing WDCE and WDE together, then writing the new value within four
//! clock cycles. WDRF in MCUSR overrides WDE, so it has to be cleared before
//! the sequence starts. The whole sequence runs with interrupts disabled; an
//! interrupt taken between the two writes would let the window expire.

use log::debug;

use crate::error::ConfigError;
use crate::hal::RegisterBus;
use crate::registers::bits::{mcusr, wdtcsr};
use crate::registers::{Register, WatchdogPrescaler};

/// Final value written to WDTCSR once the change-enable window is open.
///
/// The final value is `(current & keep) | set`, where `current` is WDTCSR as
/// read just before arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogPolicy {
    keep: u8,
    set: u8,
}

impl WatchdogPolicy {
    /// Keep WDP3..0, clear WDE and WDIE, clear a pending WDIF.
    pub const PRESERVE_PRESCALER: Self = Self {
        keep: wdtcsr::WDP_MASK,
        set: wdtcsr::WDIF,
    };

    /// Write `WDIF` only: watchdog off, prescaler back to 2K cycles.
    pub const FIXED_DISABLE: Self = Self {
        keep: 0,
        set: wdtcsr::WDIF,
    };

    /// Write `value` verbatim.
    ///
    /// Rejects values that leave WDE, WDIE or WDCE set.
    pub fn fixed(value: u8) -> Result<Self, ConfigError> {
        if value & (wdtcsr::WDE | wdtcsr::WDIE | wdtcsr::WDCE) != 0 {
            return Err(ConfigError::WatchdogStillEnabled(value));
        }
        Ok(Self {
            keep: 0,
            set: value,
        })
    }

    pub fn preserves_prescaler(&self) -> bool {
        self.keep & wdtcsr::WDP_MASK == wdtcsr::WDP_MASK
    }

    pub const fn final_value(&self, current: u8) -> u8 {
        (current & self.keep) | self.set
    }

    /// `(keep, set)` masks, for sequences that compute the final value in
    /// registers.
    pub const fn final_write_parts(&self) -> (u8, u8) {
        (self.keep, self.set)
    }
}

impl Default for WatchdogPolicy {
    #[cfg(feature = "wdt-fixed-disable")]
    fn default() -> Self {
        Self::FIXED_DISABLE
    }

    #[cfg(not(feature = "wdt-fixed-disable"))]
    fn default() -> Self {
        Self::PRESERVE_PRESCALER
    }
}

/// Brings the watchdog to a fully disabled state (WDE and WDIE clear).
///
/// Interrupts are disabled for the duration and SREG is restored afterwards.
/// There is no failure report: with the WDTON fuse programmed the hardware
/// ignores the request, which [`is_watchdog_disabled`] can detect.
pub fn disable_watchdog<B: RegisterBus>(bus: &mut B, policy: WatchdogPolicy) {
    debug!(
        "disabling watchdog, keep={:#04x} set={:#04x}",
        policy.keep, policy.set
    );
    bus.disable_watchdog(policy);
}

/// Reference sequence built from bus primitives. Buses with an atomic
/// implementation override [`RegisterBus::disable_watchdog`] instead.
pub(crate) fn timed_disable<B: RegisterBus>(bus: &mut B, policy: WatchdogPolicy) {
    bus.interrupt_free(|bus| {
        bus.watchdog_reset();
        bus.modify(Register::Mcusr, |v| v & !mcusr::WDRF);
        let current = bus.read(Register::Wdtcsr);
        let value = policy.final_value(current);
        bus.timed_write(
            Register::Wdtcsr,
            current | wdtcsr::WDCE | wdtcsr::WDE,
            value,
        );
    });
}

pub fn is_watchdog_disabled<B: RegisterBus>(bus: &B) -> bool {
    bus.read(Register::Wdtcsr) & (wdtcsr::WDE | wdtcsr::WDIE) == 0
}

/// Currently configured timeout, whether or not the watchdog is running.
pub fn watchdog_prescaler<B: RegisterBus>(bus: &B) -> Option<WatchdogPrescaler> {
    WatchdogPrescaler::from_wdtcsr(bus.read(Register::Wdtcsr))
}
