//! Infrared modem: pulse-distance encoding of 16-bit packets
//!
//! A packet on the wire is a long header mark followed by sixteen
//! space/mark pairs, most significant bit first. Spaces have a fixed
//! length; the length of each mark encodes the bit. The carrier is a
//! 38 kHz square wave at 25% duty, on during marks and off otherwise:
//!
//! ```text
//! HEADER | (SPACE | MARK)*16
//! HEADER    1200 µs carrier on
//! SPACE      400 µs carrier off
//! MARK       800 µs carrier on for a one, 400 µs for a zero
//! ```
//!
//! The receiver accepts each interval within ±200 µs of nominal. There is
//! no checksum and no acknowledgement; anything that does not classify
//! cleanly is dropped and the receiver re-arms for the next header.
//!
//! [`Transmitter`] and [`Receiver`] are pure state machines: the board
//! crate owns the carrier PWM, the timer compare channels and the edge
//! interrupt, and exchanges [`TxStep`]/[`RxStep`] values with them.

pub mod rx;
pub mod tx;

pub use rx::{Receiver, RxStep};
pub use tx::{Transmitter, TxStep};

use crate::clock::USECS_PER_TICK;

/// The frequency of the infrared carrier in Hz.
pub const CARRIER_HZ: u32 = 38_000;

/// The reciprocal of the duty cycle of the carrier, i.e. a value of 4 sets
/// the duty cycle to 1/4 or 25%.
pub const CARRIER_DUTY_RECIPROCAL: u32 = 4;

// Interval lengths in clock ticks. TOLERANCE is the acceptable error on
// either side of the nominal value.
const HEADER: u8 = (1200 / USECS_PER_TICK) as u8;
const MARK_ONE: u8 = (800 / USECS_PER_TICK) as u8;
const MARK_ZERO: u8 = (400 / USECS_PER_TICK) as u8;
const SPACE: u8 = (400 / USECS_PER_TICK) as u8;
const TOLERANCE: u8 = (200 / USECS_PER_TICK) as u8;

// The nominal values must stay distinguishable under the tolerance.
const _: () = assert!(MARK_ZERO + TOLERANCE < MARK_ONE - TOLERANCE);
const _: () = assert!(MARK_ONE + TOLERANCE < HEADER - TOLERANCE);

/// The receive timeout in clock ticks, slightly longer than the maximum
/// number of ticks the carrier is expected to stay on for.
pub const RX_TIMEOUT: u8 = HEADER + TOLERANCE * 2;

/// The number of packets in the RX and TX rings. The photo-receiver can
/// only manage around 800 bursts per second, so the rings stay small.
const QUEUE_LEN: usize = 4;

/// Where a state machine is within a packet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    /// Doing nothing.
    Idle,
    /// Transmitting or receiving a mark.
    Mark,
    /// Transmitting or receiving a space.
    Space,
}
