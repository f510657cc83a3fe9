//! Microsecond timekeeping on Timer2
//!
//! Timer2 free-runs at F_CPU/256 (one tick every 16 µs, overflow every
//! 4.096 ms) in normal mode. The overflow interrupt counts overflows and
//! [`micros`] composes the 32-bit microsecond clock from the pair. The
//! same counter feeds the IR modem: its compare channels schedule the
//! transmit and timeout interrupts against the raw tick value from
//! [`ticks`].

use core::cell::Cell;
use core::ptr::{read_volatile, write_volatile};
use critical_section::Mutex;
use lumitag_core::clock::{compose, elapsed};

// Timer2 registers
const TCCR2A: *mut u8 = 0xB0 as *mut u8; // Timer/Counter Control Register A
const TCCR2B: *mut u8 = 0xB1 as *mut u8; // Timer/Counter Control Register B
const TCNT2: *mut u8 = 0xB2 as *mut u8;  // Timer/Counter Register
const TIMSK2: *mut u8 = 0x70 as *mut u8; // Timer/Counter Interrupt Mask Register
const TIFR2: *mut u8 = 0x37 as *mut u8;  // Timer/Counter Interrupt Flag Register

// TCCR2B bits
const CS22: u8 = 2;
const CS21: u8 = 1;

// TIMSK2 bits
const TOIE2: u8 = 0; // Overflow Interrupt Enable

// TIFR2 bits
const TOV2: u8 = 0; // Overflow Flag

/// Overflows of the 8-bit counter since `init`.
static OVERFLOWS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Starts Timer2 in normal mode with a prescaler of 256 and unmasks the
/// overflow interrupt.
///
/// The waveform generator stays in mode 0; the IR module only touches the
/// compare registers and interrupt masks of this timer, never its mode
/// bits.
pub fn init() {
    unsafe {
        write_volatile(TCCR2A, 0);
        write_volatile(TCCR2B, (1 << CS22) | (1 << CS21));
        write_volatile(TIMSK2, read_volatile(TIMSK2) | (1 << TOIE2));
    }
}

/// Timer2 overflow interrupt: one more lap of the tick counter.
#[link_section = ".text"]
#[export_name = "__vector_9"]
pub unsafe extern "avr-interrupt" fn __vector_9() {
    critical_section::with(|cs| {
        let overflows = OVERFLOWS.borrow(cs);
        overflows.set(overflows.get().wrapping_add(1));
    });
}

/// Returns the number of microseconds since `init`.
///
/// Wraps after about 71 minutes. The (overflow, tick) pair is sampled in
/// one critical section so a reader never pairs a post-overflow tick value
/// with a pre-overflow lap count; an overflow that has been raised but not
/// yet serviced is folded in by inspecting the flag register.
pub fn micros() -> u32 {
    critical_section::with(|cs| {
        let mut overflows = OVERFLOWS.borrow(cs).get();
        let ticks = unsafe { read_volatile(TCNT2) };
        let pending = unsafe { read_volatile(TIFR2) } & (1 << TOV2) != 0;
        if pending && ticks < 255 {
            overflows = overflows.wrapping_add(1);
        }
        compose(overflows, ticks)
    })
}

/// Returns the raw 8-bit tick counter.
///
/// This is the time base the IR interrupt handlers run on.
pub fn ticks() -> u8 {
    unsafe { read_volatile(TCNT2) }
}

/// Busy-waits for at least `usecs` microseconds.
///
/// Requires the overflow interrupt to be running, so only valid once
/// global interrupts are enabled. Never call this inside a critical
/// section.
pub fn delay_us(usecs: u32) {
    let start = micros();
    while elapsed(micros(), start) < usecs {}
}

/// Busy-waits for at least `msecs` milliseconds.
pub fn delay_ms(msecs: u32) {
    delay_us(msecs.saturating_mul(1000));
}
