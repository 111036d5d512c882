// SPDX-License-Identifier: Apache-2.0

//! Runs `minimize_power` against the simulated ATmega328P and prints the
//! resulting register file.

use clap::Parser;
use log::info;
use lowpower::{
    minimize_power, ConfigError, Mcu, Peripheral, Port, PowerConfig, SimulatedMcu,
    WatchdogPolicy, WatchdogPrescaler,
};

#[derive(Parser, Debug)]
#[command(name = "lowpower-sim", about = "Simulate ATmega328P power minimisation")]
struct Args {
    /// Peripheral to keep powered (twi, timer0, timer1, timer2, spi, usart0, adc, ac)
    #[arg(long = "keep", value_parser = parse_peripheral)]
    keep: Vec<Peripheral>,

    /// Pins to leave untouched, as PORT:MASK (e.g. B:0x20)
    #[arg(long = "reserve", value_parser = parse_reservation)]
    reserve: Vec<(Port, u8)>,

    /// PC0..PC5 pins used as ADC inputs
    #[arg(long, value_parser = parse_number)]
    analog: Option<u8>,

    /// Write this fixed WDTCSR value instead of preserving the prescaler
    #[arg(long = "fixed-wdt", value_parser = parse_number)]
    fixed_wdt: Option<u8>,

    /// Start from nothing in use instead of the Arduino defaults (Timer0 kept)
    #[arg(long)]
    bare: bool,

    /// Simulate a programmed WDTON fuse
    #[arg(long)]
    wdton: bool,

    /// Start as if the last reset came from the watchdog
    #[arg(long)]
    after_wdt_reset: bool,

    /// Number of times to run the routine
    #[arg(long, default_value_t = 1)]
    times: u32,
}

fn parse_number(s: &str) -> Result<u8, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(&bin.replace('_', ""), 2)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid mask '{s}': {e}"))
}

fn parse_peripheral(s: &str) -> Result<Peripheral, String> {
    Peripheral::from_name(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown peripheral '{s}'"))
}

fn parse_reservation(s: &str) -> Result<(Port, u8), String> {
    let (port, mask) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PORT:MASK, got '{s}'"))?;
    let port = match port.to_ascii_uppercase().as_str() {
        "B" => Port::B,
        "C" => Port::C,
        "D" => Port::D,
        other => return Err(format!("unknown port '{other}'")),
    };
    Ok((port, parse_number(mask)?))
}

fn build_config(args: &Args) -> Result<PowerConfig, ConfigError> {
    let mut config = if args.bare {
        PowerConfig::new()
    } else {
        PowerConfig::default()
    };
    for peripheral in &args.keep {
        config = config.keep(*peripheral);
    }
    for (port, mask) in &args.reserve {
        config = config.reserve_pins(*port, *mask)?;
    }
    if let Some(mask) = args.analog {
        config = config.analog_inputs(mask)?;
    }
    if let Some(value) = args.fixed_wdt {
        config = config.watchdog(WatchdogPolicy::fixed(value)?);
    }
    Ok(config)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut sim = if args.after_wdt_reset {
        SimulatedMcu::after_watchdog_reset(WatchdogPrescaler::Cycles1024K)
    } else {
        SimulatedMcu::power_on().with_watchdog(WatchdogPrescaler::Cycles1024K, false)
    };
    if args.wdton {
        sim = sim.with_wdton_fuse();
    }
    let before = sim.snapshot();

    for run in 0..args.times {
        info!("run {}", run + 1);
        minimize_power(&mut sim, &config);
    }

    let cycles = sim.cycles();
    let after = sim.snapshot();
    let mcu = Mcu::new(sim);

    println!("{after}");
    print!("changed:");
    for reg in before.diff(&after) {
        print!(" {reg}");
    }
    println!();
    println!("cycles: {cycles}");
    println!("ADC enabled: {}", mcu.adc_enabled());
    println!("PRR: {:#010b}", mcu.power_reduction());
    println!("comparator disabled: {}", mcu.comparator_disabled());
    for port in Port::ALL {
        println!(
            "{port}: pulled-up inputs {:#010b}",
            mcu.port(port).pulled_up_inputs()
        );
    }
    println!("watchdog disabled: {}", mcu.watchdog_disabled());

    if !mcu.watchdog_disabled() {
        eprintln!("Error: watchdog is still running");
        std::process::exit(1);
    }
}
