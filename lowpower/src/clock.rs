// SPDX-License-Identifier: Apache-2.0

//! System clock prescaler.
//!
//! Running the core slower is the other big lever on active current. CLKPR
//! uses the same change-enable scheme as WDTCSR: write CLKPCE alone, then the
//! new CLKPS value within four cycles.

use log::debug;

use crate::hal::RegisterBus;
use crate::registers::bits::clkpr;
use crate::registers::{ClockDivider, Register};

pub fn set_clock_divider<B: RegisterBus>(bus: &mut B, divider: ClockDivider) {
    debug!("clock divider /{}", divider.factor());
    bus.interrupt_free(|bus| {
        bus.timed_write(Register::Clkpr, clkpr::CLKPCE, divider.clkps());
    });
}

/// `None` for the reserved CLKPS encodings.
pub fn clock_divider<B: RegisterBus>(bus: &B) -> Option<ClockDivider> {
    ClockDivider::from_clkpr(bus.read(Register::Clkpr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::bits::sreg;
    use crate::sim::SimulatedMcu;
    use test_log::test;

    #[test]
    fn cycles_through_every_divider() {
        let mut mcu = SimulatedMcu::power_on();
        for divider in ClockDivider::ALL {
            set_clock_divider(&mut mcu, divider);
            assert_eq!(clock_divider(&mcu), Some(divider));
        }
    }

    #[test]
    fn survives_pending_interrupt() {
        let mut mcu = SimulatedMcu::power_on().with_interrupts_enabled();
        // Lands right after `cli`
        mcu.schedule_interrupt(2);

        set_clock_divider(&mut mcu, ClockDivider::Div16);

        assert_eq!(clock_divider(&mcu), Some(ClockDivider::Div16));
        assert_eq!(mcu.interrupts_serviced(), 1);
        assert_ne!(mcu.read(Register::Sreg) & sreg::I, 0);
    }
}
