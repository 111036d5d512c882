// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration validation
//!
//! This module contains compile-time checks to ensure that mutually exclusive
//! features are not enabled simultaneously.

// Target device
#[cfg(not(feature = "atmega328p"))]
compile_error!("No target device selected: enable the 'atmega328p' feature");

// Watchdog policy: exactly one
#[cfg(not(any(feature = "wdt-preserve-prescaler", feature = "wdt-fixed-disable")))]
compile_error!(
    "No watchdog policy selected: choose one of 'wdt-preserve-prescaler' or 'wdt-fixed-disable'"
);

#[cfg(all(feature = "wdt-preserve-prescaler", feature = "wdt-fixed-disable"))]
compile_error!(
    "Cannot enable both 'wdt-preserve-prescaler' and 'wdt-fixed-disable' features simultaneously: choose one watchdog policy"
);
