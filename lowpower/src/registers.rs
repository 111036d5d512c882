// SPDX-License-Identifier: Apache-2.0

//! ATmega328P register map and the typed values stored in it.
//!
//! Addresses are data-space addresses (what `lds`/`sts` and volatile pointer
//! accesses use). Registers below 0x60 are also reachable through `in`/`out`
//! at `address - 0x20`.

/// Memory-mapped registers touched by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Port B data direction.
    Ddrb,
    /// Port B output / pull-up enable.
    Portb,
    /// Port C data direction.
    Ddrc,
    /// Port C output / pull-up enable.
    Portc,
    /// Port D data direction.
    Ddrd,
    /// Port D output / pull-up enable.
    Portd,
    /// Analog comparator control and status.
    Acsr,
    /// MCU status register (reset cause flags).
    Mcusr,
    /// CPU status register.
    Sreg,
    /// Watchdog timer control.
    Wdtcsr,
    /// System clock prescaler.
    Clkpr,
    /// Power reduction.
    Prr,
    /// ADC control and status A.
    Adcsra,
    /// Digital input disable for ADC0..ADC5.
    Didr0,
    /// Digital input disable for AIN0/AIN1.
    Didr1,
}

impl Register {
    /// Every register, in address order.
    pub const ALL: [Register; 15] = [
        Register::Ddrb,
        Register::Portb,
        Register::Ddrc,
        Register::Portc,
        Register::Ddrd,
        Register::Portd,
        Register::Acsr,
        Register::Mcusr,
        Register::Sreg,
        Register::Wdtcsr,
        Register::Clkpr,
        Register::Prr,
        Register::Adcsra,
        Register::Didr0,
        Register::Didr1,
    ];

    /// Data-space address.
    pub const fn address(self) -> u16 {
        match self {
            Register::Ddrb => 0x24,
            Register::Portb => 0x25,
            Register::Ddrc => 0x27,
            Register::Portc => 0x28,
            Register::Ddrd => 0x2A,
            Register::Portd => 0x2B,
            Register::Acsr => 0x50,
            Register::Mcusr => 0x54,
            Register::Sreg => 0x5F,
            Register::Wdtcsr => 0x60,
            Register::Clkpr => 0x61,
            Register::Prr => 0x64,
            Register::Adcsra => 0x7A,
            Register::Didr0 => 0x7E,
            Register::Didr1 => 0x7F,
        }
    }

    /// I/O-space address, if the register is reachable with `in`/`out`.
    pub const fn io_address(self) -> Option<u8> {
        let addr = self.address();
        if addr >= 0x20 && addr < 0x60 {
            Some((addr - 0x20) as u8)
        } else {
            None
        }
    }

    /// Value after a power-on reset.
    pub const fn reset_value(self) -> u8 {
        match self {
            // Power-on flag set
            Register::Mcusr => bits::mcusr::PORF,
            // CKDIV8 fuse unprogrammed on Arduino boards
            _ => 0,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Short datasheet name.
    pub const fn name(self) -> &'static str {
        match self {
            Register::Ddrb => "DDRB",
            Register::Portb => "PORTB",
            Register::Ddrc => "DDRC",
            Register::Portc => "PORTC",
            Register::Ddrd => "DDRD",
            Register::Portd => "PORTD",
            Register::Acsr => "ACSR",
            Register::Mcusr => "MCUSR",
            Register::Sreg => "SREG",
            Register::Wdtcsr => "WDTCSR",
            Register::Clkpr => "CLKPR",
            Register::Prr => "PRR",
            Register::Adcsra => "ADCSRA",
            Register::Didr0 => "DIDR0",
            Register::Didr1 => "DIDR1",
        }
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit positions, as masks.
pub mod bits {
    pub mod sreg {
        /// Global interrupt enable.
        pub const I: u8 = 1 << 7;
    }

    pub mod mcusr {
        pub const WDRF: u8 = 1 << 3;
        pub const BORF: u8 = 1 << 2;
        pub const EXTRF: u8 = 1 << 1;
        pub const PORF: u8 = 1 << 0;
    }

    pub mod wdtcsr {
        pub const WDIF: u8 = 1 << 7;
        pub const WDIE: u8 = 1 << 6;
        pub const WDP3: u8 = 1 << 5;
        pub const WDCE: u8 = 1 << 4;
        pub const WDE: u8 = 1 << 3;
        pub const WDP2: u8 = 1 << 2;
        pub const WDP1: u8 = 1 << 1;
        pub const WDP0: u8 = 1 << 0;
        /// WDP3..0 (not contiguous).
        pub const WDP_MASK: u8 = WDP3 | WDP2 | WDP1 | WDP0;
    }

    pub mod clkpr {
        pub const CLKPCE: u8 = 1 << 7;
        pub const CLKPS_MASK: u8 = 0x0F;
    }

    pub mod prr {
        pub const PRTWI: u8 = 1 << 7;
        pub const PRTIM2: u8 = 1 << 6;
        pub const PRTIM0: u8 = 1 << 5;
        pub const PRTIM1: u8 = 1 << 3;
        pub const PRSPI: u8 = 1 << 2;
        pub const PRUSART0: u8 = 1 << 1;
        pub const PRADC: u8 = 1 << 0;
    }

    pub mod adcsra {
        pub const ADEN: u8 = 1 << 7;
    }

    pub mod acsr {
        /// Analog comparator disable.
        pub const ACD: u8 = 1 << 7;
        pub const ACIE: u8 = 1 << 3;
    }

    pub mod didr0 {
        /// ADC0D..ADC5D. ADC6/ADC7 on the TQFP package have no digital buffer.
        pub const ADC_MASK: u8 = 0x3F;
    }

    pub mod didr1 {
        pub const AIN1D: u8 = 1 << 1;
        pub const AIN0D: u8 = 1 << 0;
    }
}

/// General purpose I/O port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    B,
    C,
    D,
}

impl Port {
    pub const ALL: [Port; 3] = [Port::B, Port::C, Port::D];

    /// Data direction register.
    pub const fn ddr(self) -> Register {
        match self {
            Port::B => Register::Ddrb,
            Port::C => Register::Ddrc,
            Port::D => Register::Ddrd,
        }
    }

    /// Output / pull-up register.
    pub const fn port(self) -> Register {
        match self {
            Port::B => Register::Portb,
            Port::C => Register::Portc,
            Port::D => Register::Portd,
        }
    }

    /// Pins that physically exist. PC7 does not; PC6 doubles as RESET.
    pub const fn pin_mask(self) -> u8 {
        match self {
            Port::C => 0x7F,
            Port::B | Port::D => 0xFF,
        }
    }
}

impl core::fmt::Display for Port {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let c = match self {
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
        };
        write!(f, "PORT{c}")
    }
}

/// On-chip peripheral that can be powered down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    Twi,
    Timer2,
    Timer0,
    Timer1,
    Spi,
    Usart0,
    Adc,
    /// Not clock gated through PRR; disabled through ACSR.ACD.
    AnalogComparator,
}

impl Peripheral {
    pub const ALL: [Peripheral; 8] = [
        Peripheral::Twi,
        Peripheral::Timer2,
        Peripheral::Timer0,
        Peripheral::Timer1,
        Peripheral::Spi,
        Peripheral::Usart0,
        Peripheral::Adc,
        Peripheral::AnalogComparator,
    ];

    /// PRR bit gating this peripheral's clock, if any.
    pub const fn prr_bit(self) -> Option<u8> {
        use bits::prr::*;
        match self {
            Peripheral::Twi => Some(PRTWI),
            Peripheral::Timer2 => Some(PRTIM2),
            Peripheral::Timer0 => Some(PRTIM0),
            Peripheral::Timer1 => Some(PRTIM1),
            Peripheral::Spi => Some(PRSPI),
            Peripheral::Usart0 => Some(PRUSART0),
            Peripheral::Adc => Some(PRADC),
            Peripheral::AnalogComparator => None,
        }
    }

    const fn flag(self) -> u8 {
        1 << (self as u8)
    }

    /// Parses the lowercase name used on command lines (`"timer0"`, `"usart0"`...).
    pub fn from_name(name: &str) -> Option<Self> {
        Peripheral::ALL.into_iter().find(|p| p.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Peripheral::Twi => "twi",
            Peripheral::Timer2 => "timer2",
            Peripheral::Timer0 => "timer0",
            Peripheral::Timer1 => "timer1",
            Peripheral::Spi => "spi",
            Peripheral::Usart0 => "usart0",
            Peripheral::Adc => "adc",
            Peripheral::AnalogComparator => "ac",
        }
    }
}

/// Small copyable set of [`Peripheral`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PeripheralSet(u8);

impl PeripheralSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0xFF);

    pub const fn with(self, p: Peripheral) -> Self {
        Self(self.0 | p.flag())
    }

    pub const fn without(self, p: Peripheral) -> Self {
        Self(self.0 & !p.flag())
    }

    pub const fn contains(self, p: Peripheral) -> bool {
        self.0 & p.flag() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every peripheral not in `self`.
    pub const fn complement(self) -> Self {
        Self(!self.0)
    }

    /// PRR value that gates every member with a PRR bit.
    pub fn prr_bits(self) -> u8 {
        Peripheral::ALL
            .into_iter()
            .filter(|p| self.contains(*p))
            .filter_map(Peripheral::prr_bit)
            .fold(0, |acc, bit| acc | bit)
    }

    pub fn iter(self) -> impl Iterator<Item = Peripheral> {
        Peripheral::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Peripheral> for PeripheralSet {
    fn from_iter<I: IntoIterator<Item = Peripheral>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Watchdog timeout, WDP3..0 encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogPrescaler {
    Cycles2K,
    Cycles4K,
    Cycles8K,
    Cycles16K,
    Cycles32K,
    Cycles64K,
    Cycles128K,
    Cycles256K,
    Cycles512K,
    Cycles1024K,
}

impl WatchdogPrescaler {
    /// Decodes the WDP bits of a WDTCSR value. Reserved encodings yield `None`.
    pub fn from_wdtcsr(value: u8) -> Option<Self> {
        use bits::wdtcsr::*;
        let low = value & (WDP2 | WDP1 | WDP0);
        let idx = if value & WDP3 != 0 { low | 0x08 } else { low };
        Some(match idx {
            0 => Self::Cycles2K,
            1 => Self::Cycles4K,
            2 => Self::Cycles8K,
            3 => Self::Cycles16K,
            4 => Self::Cycles32K,
            5 => Self::Cycles64K,
            6 => Self::Cycles128K,
            7 => Self::Cycles256K,
            8 => Self::Cycles512K,
            9 => Self::Cycles1024K,
            _ => return None,
        })
    }

    /// WDP bits in WDTCSR position.
    pub const fn wdtcsr_bits(self) -> u8 {
        let idx = self as u8;
        let low = idx & 0x07;
        if idx & 0x08 != 0 {
            low | bits::wdtcsr::WDP3
        } else {
            low
        }
    }

    /// Nominal timeout at the 128 kHz watchdog oscillator.
    pub const fn timeout_ms(self) -> u32 {
        16 << (self as u32)
    }
}

/// System clock division factor, CLKPS encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDivider {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

impl ClockDivider {
    pub const ALL: [ClockDivider; 9] = [
        ClockDivider::Div1,
        ClockDivider::Div2,
        ClockDivider::Div4,
        ClockDivider::Div8,
        ClockDivider::Div16,
        ClockDivider::Div32,
        ClockDivider::Div64,
        ClockDivider::Div128,
        ClockDivider::Div256,
    ];

    pub const fn clkps(self) -> u8 {
        self as u8
    }

    pub fn from_clkpr(value: u8) -> Option<Self> {
        Self::ALL
            .get((value & bits::clkpr::CLKPS_MASK) as usize)
            .copied()
    }

    pub const fn factor(self) -> u16 {
        1 << (self as u16)
    }

    /// CPU frequency produced from `base_hz`.
    pub const fn cpu_hz(self, base_hz: u32) -> u32 {
        base_hz >> (self as u32)
    }
}
