//! ATmega328P board support for the lumitag handheld
//!
//! Every module owns one peripheral of the device and exposes a
//! `init → steady` lifecycle: call `init()` once at startup, then use the
//! module-level entry points from the foreground loop. Interrupt service
//! routines are wired here and drive the state machines from
//! `lumitag-core`.
//!
//! Timer allotment:
//! - Timer0: speaker tone generation (CTC, OC0A)
//! - Timer1: 38 kHz IR carrier (fast PWM, OC1A)
//! - Timer2: microsecond clock (overflow), IR transmit scheduling
//!   (compare A) and IR receive timeout (compare B)

#![no_std]
#![feature(asm_experimental_arch)]
#![feature(abi_avr_interrupt)]

pub mod clock;
pub mod game;
pub mod gpio;
pub mod ir;
pub mod lcd;
pub mod led;
pub mod radio;
pub mod shift;
pub mod speaker;
pub mod spi;
pub mod uart;

// Critical section implementation is provided by avr-device crate
// with the "critical-section-impl" feature
// We need to ensure avr-device is actually linked
extern crate avr_device;

/// The CPU clock frequency in Hz.
pub const F_CPU: u32 = 16_000_000;

/// Enables global interrupts.
///
/// Called once from `main` after every `init()` has run.
pub fn enable_interrupts() {
    unsafe {
        core::arch::asm!("sei");
    }
}
