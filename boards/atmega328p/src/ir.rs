//! Infrared transceiver hardware glue
//!
//! The modem logic lives in `lumitag_core::ir`; this module owns the three
//! pieces of hardware it runs on:
//!
//! - Timer1 generates the 38 kHz carrier on PB1 (fast PWM mode 14 with the
//!   TOP value in ICR1; the carrier is gated by connecting and
//!   disconnecting the channel A compare output).
//! - Timer2 compare channel A paces the transmitter through its marks and
//!   spaces; compare channel B is the receive idle timeout. Both schedule
//!   ahead with wrapping 8-bit arithmetic on the shared tick counter.
//! - INT0 fires on every edge of the photo-receiver output on PD2 (active
//!   low) and feeds the receiver state machine.
//!
//! Foreground code only sees [`tx`] and [`rx`]; both take a critical
//! section around the shared state.

use core::cell::RefCell;
use core::ptr::{read_volatile, write_volatile};
use critical_section::Mutex;
use lumitag_core::ir::{Receiver, RxStep, Transmitter, TxStep};
use lumitag_core::ir::{CARRIER_DUTY_RECIPROCAL, CARRIER_HZ, RX_TIMEOUT};

use crate::F_CPU;

// Timer1 registers (carrier generation)
const TCCR1A: *mut u8 = 0x80 as *mut u8; // Timer/Counter1 Control Register A
const TCCR1B: *mut u8 = 0x81 as *mut u8; // Timer/Counter1 Control Register B
const TCCR1C: *mut u8 = 0x82 as *mut u8; // Timer/Counter1 Control Register C
const ICR1L: *mut u8 = 0x86 as *mut u8;  // Input Capture Register (TOP value)
const ICR1H: *mut u8 = 0x87 as *mut u8;
const OCR1AL: *mut u8 = 0x88 as *mut u8; // Output Compare Register A (duty)
const OCR1AH: *mut u8 = 0x89 as *mut u8;

// TCCR1A bits
const COM1A1: u8 = 7; // Compare Output Mode, non-inverting when set
const WGM11: u8 = 1;

// TCCR1B bits
const WGM13: u8 = 4;
const WGM12: u8 = 3;
const CS10: u8 = 0; // No prescaling

// Timer2 registers (bit pacing and receive timeout)
const TCNT2: *mut u8 = 0xB2 as *mut u8;
const OCR2A: *mut u8 = 0xB3 as *mut u8;
const OCR2B: *mut u8 = 0xB4 as *mut u8;
const TIMSK2: *mut u8 = 0x70 as *mut u8;
const TIFR2: *mut u8 = 0x37 as *mut u8;

// TIMSK2 bits
const OCIE2B: u8 = 2;
const OCIE2A: u8 = 1;

// TIFR2 bits
const OCF2B: u8 = 2;
const OCF2A: u8 = 1;

// External interrupt registers
const EICRA: *mut u8 = 0x69 as *mut u8;
const EIMSK: *mut u8 = 0x3D as *mut u8;

// EICRA bits
const ISC00: u8 = 0; // Any logical change with ISC01 clear

// EIMSK bits
const INT0: u8 = 0;

// Port registers for the IR LED (PB1/OC1A) and photo-receiver (PD2/INT0)
const DDRB: *mut u8 = 0x24 as *mut u8;
const DDRD: *mut u8 = 0x2A as *mut u8;
const PIND: *const u8 = 0x29 as *const u8;
const PB1: u8 = 1;
const PD2: u8 = 2;

/// The TX state machine and its queue.
static TRANSMITTER: Mutex<RefCell<Transmitter>> = Mutex::new(RefCell::new(Transmitter::new()));

/// The RX state machine and its queue.
static RECEIVER: Mutex<RefCell<Receiver>> = Mutex::new(RefCell::new(Receiver::new()));

/// Configures the carrier timer, the receiver pin and the edge interrupt.
pub fn init() {
    unsafe {
        // IR LED out, photo-receiver in.
        write_volatile(DDRB, read_volatile(DDRB) | (1 << PB1));
        write_volatile(DDRD, read_volatile(DDRD) & !(1 << PD2));

        // INT0 on any edge of PD2.
        write_volatile(EICRA, read_volatile(EICRA) | (1 << ISC00));
        write_volatile(EIMSK, read_volatile(EIMSK) | (1 << INT0));

        // Timer1 in fast PWM mode 14: counts from zero to ICR1, PB1 goes
        // high at zero and low at OCR1A while the channel is connected.
        // Clocked straight off the oscillator so ICR1 sets the carrier
        // frequency and OCR1A/ICR1 the duty cycle.
        write_volatile(TCCR1A, 1 << WGM11);
        write_volatile(TCCR1B, (1 << WGM13) | (1 << WGM12) | (1 << CS10));
        write_volatile(TCCR1C, 0);

        let top = (F_CPU / CARRIER_HZ - 1) as u16;
        let duty = top / CARRIER_DUTY_RECIPROCAL as u16;
        // 16-bit timer registers want the high byte written first.
        write_volatile(ICR1H, (top >> 8) as u8);
        write_volatile(ICR1L, top as u8);
        write_volatile(OCR1AH, (duty >> 8) as u8);
        write_volatile(OCR1AL, duty as u8);
    }
}

/// Connects the channel A compare output: PB1 carries the 38 kHz wave.
///
/// NB: interrupts must be disabled by the caller. Idempotent.
unsafe fn carrier_on() {
    write_volatile(TCCR1A, read_volatile(TCCR1A) | (1 << COM1A1));
}

/// Disconnects the compare output: PB1 drops low.
///
/// NB: interrupts must be disabled by the caller. Idempotent.
unsafe fn carrier_off() {
    write_volatile(TCCR1A, read_volatile(TCCR1A) & !(1 << COM1A1));
}

/// Fires the transmit compare interrupt `ticks` from now.
///
/// The compare flag is cleared before the interrupt is unmasked, so a
/// stale flag cannot fire it immediately.
///
/// NB: interrupts must be disabled by the caller.
unsafe fn schedule_tx_intr(ticks: u8) {
    write_volatile(TIMSK2, read_volatile(TIMSK2) & !(1 << OCIE2A));
    write_volatile(TIFR2, 1 << OCF2A);
    write_volatile(OCR2A, read_volatile(TCNT2).wrapping_add(ticks));
    write_volatile(TIMSK2, read_volatile(TIMSK2) | (1 << OCIE2A));
}

/// Masks any further transmit interrupts.
unsafe fn mask_tx_intr() {
    write_volatile(TIMSK2, read_volatile(TIMSK2) & !(1 << OCIE2A));
}

/// Fires the receive timeout interrupt `RX_TIMEOUT` ticks from now.
///
/// NB: interrupts must be disabled by the caller.
unsafe fn schedule_timeout_intr() {
    write_volatile(TIMSK2, read_volatile(TIMSK2) & !(1 << OCIE2B));
    write_volatile(TIFR2, 1 << OCF2B);
    write_volatile(OCR2B, read_volatile(TCNT2).wrapping_add(RX_TIMEOUT));
    write_volatile(TIMSK2, read_volatile(TIMSK2) | (1 << OCIE2B));
}

/// Masks any further receive timeout interrupts.
unsafe fn mask_timeout_intr() {
    write_volatile(TIMSK2, read_volatile(TIMSK2) & !(1 << OCIE2B));
}

/// Applies a transmitter step to the carrier and the compare channel.
///
/// NB: interrupts must be disabled by the caller.
fn apply(step: TxStep) {
    unsafe {
        match step {
            TxStep::CarrierOn(ticks) => {
                carrier_on();
                schedule_tx_intr(ticks);
            }
            TxStep::CarrierOff(ticks) => {
                carrier_off();
                schedule_tx_intr(ticks);
            }
            TxStep::Done => mask_tx_intr(),
        }
    }
}

/// Submits a packet for transmission.
///
/// An idle transmitter picks it up immediately; otherwise it queues behind
/// the packet in flight. When the queue is full the packet is dropped -
/// the link is lossy and offers no delivery guarantee.
pub fn tx(packet: u16) {
    critical_section::with(|cs| {
        if let Some(step) = TRANSMITTER.borrow_ref_mut(cs).send(packet) {
            apply(step);
        }
    });
}

/// Returns the oldest received packet, if one has arrived.
pub fn rx() -> Option<u16> {
    critical_section::with(|cs| RECEIVER.borrow_ref_mut(cs).poll())
}

/// Timer2 compare A: the current mark or space has run its course.
#[link_section = ".text"]
#[export_name = "__vector_7"]
pub unsafe extern "avr-interrupt" fn __vector_7() {
    critical_section::with(|cs| {
        let step = TRANSMITTER.borrow_ref_mut(cs).step();
        apply(step);
    });
}

/// Timer2 compare B: no edge for RX_TIMEOUT ticks, give up on the packet.
#[link_section = ".text"]
#[export_name = "__vector_8"]
pub unsafe extern "avr-interrupt" fn __vector_8() {
    critical_section::with(|cs| {
        RECEIVER.borrow_ref_mut(cs).timeout();
        unsafe {
            mask_timeout_intr();
        }
    });
}

/// INT0: the photo-receiver output changed level.
#[link_section = ".text"]
#[export_name = "__vector_1"]
pub unsafe extern "avr-interrupt" fn __vector_1() {
    // Record the time of the edge first; the TSOP output is active low,
    // so a low pin level means the carrier just came on.
    let now = read_volatile(TCNT2);
    let rising = read_volatile(PIND) & (1 << PD2) == 0;

    critical_section::with(|cs| {
        match RECEIVER.borrow_ref_mut(cs).edge(now, rising) {
            RxStep::Rearm => unsafe { schedule_timeout_intr() },
            RxStep::Disarm => unsafe { mask_timeout_intr() },
        }
    });
}
