//! Muzzle flash and team indicator LEDs
//!
//! The muzzle LED sits directly on PB0 and flashes for a tenth of a
//! second per shot. The eight team LEDs (two banks of four colors) hang
//! off a shift register on PC0..PC2 and alternate between the team color
//! and an accent color twice a second. All state is foreground-only;
//! [`cycle`] does the timing off the microsecond clock.

use core::cell::Cell;
use core::ptr::{read_volatile, write_volatile};
use critical_section::Mutex;
use lumitag_core::clock::elapsed;

use crate::clock;
use crate::gpio::Port;
use crate::shift::ShiftRegister;

/// The number of microseconds the muzzle flash LED stays on.
const MUZZLE_USECS: u32 = 100_000;

/// The number of microseconds between alternate team LED flashes.
const TEAM_USECS: u32 = 500_000;

const LED_SHIFT: ShiftRegister = ShiftRegister {
    port: Port::C,
    data: 0,
    clock: 1,
    latch: 2,
};

// Port B bit for the muzzle LED
const PORTB: *mut u8 = 0x25 as *mut u8;
const DDRB: *mut u8 = 0x24 as *mut u8;
const PB0: u8 = 0;

/// One of the four team LED colors in each bank.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red LED
    Red = 0x1,
    /// Green LED
    Green = 0x2,
    /// Yellow LED
    Yellow = 0x4,
    /// Blue LED
    Blue = 0x8,
}

/// Time the muzzle pin was raised; zero means it is off.
static MUZZLE_START: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Team LED state: the two color nibbles and which bank shows which.
static TEAM_START: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static TEAM_COLORS: Mutex<Cell<(u8, u8)>> = Mutex::new(Cell::new((0, 0)));
static TEAM_ALT: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Sets up the shift register (all outputs low) and the muzzle pin.
pub fn init() {
    LED_SHIFT.init();
    LED_SHIFT.write(0);

    unsafe {
        write_volatile(DDRB, read_volatile(DDRB) | (1 << PB0));
    }
}

/// Runs the LED timing; call from the foreground loop.
pub fn cycle() {
    let now = clock::micros();

    critical_section::with(|cs| {
        // Turn off the muzzle LED once it has been on for its duration.
        let muzzle = MUZZLE_START.borrow(cs);
        if muzzle.get() != 0 && elapsed(now, muzzle.get()) >= MUZZLE_USECS {
            muzzle.set(0);
            unsafe {
                write_volatile(PORTB, read_volatile(PORTB) & !(1 << PB0));
            }
        }

        // Swap the team banks.
        let start = TEAM_START.borrow(cs);
        if elapsed(now, start.get()) >= TEAM_USECS {
            start.set(now);
            let (color, alt_color) = TEAM_COLORS.borrow(cs).get();
            let alt = !TEAM_ALT.borrow(cs).get();
            TEAM_ALT.borrow(cs).set(alt);
            if alt {
                LED_SHIFT.write(color << 4 | alt_color);
            } else {
                LED_SHIFT.write(color | alt_color << 4);
            }
        }
    });
}

/// Flashes the muzzle LED.
pub fn muzzle_flash() {
    // Zero marks the LED as off, so a start time that happens to land on
    // zero is nudged to one; nothing here needs that microsecond back.
    let mut start = clock::micros();
    if start == 0 {
        start = 1;
    }

    critical_section::with(|cs| MUZZLE_START.borrow(cs).set(start));

    unsafe {
        write_volatile(PORTB, read_volatile(PORTB) | (1 << PB0));
    }
}

/// Starts flashing the team LEDs in the given colors.
pub fn team_on(color: Color, alt_color: Color) {
    critical_section::with(|cs| {
        TEAM_COLORS.borrow(cs).set((color as u8, alt_color as u8));
    });
}

/// Turns the team LEDs off at the next cycle.
pub fn team_off() {
    critical_section::with(|cs| {
        TEAM_COLORS.borrow(cs).set((0, 0));
    });
}
