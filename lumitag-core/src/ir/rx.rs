//! Receive half of the IR modem
//!
//! The photo-receiver demodulates the 38 kHz carrier and presents its
//! envelope on a pin, active low. The board forwards every edge of that
//! pin here together with the raw 8-bit tick counter; the receiver
//! measures the interval since the previous edge, classifies it against
//! the nominal mark/space/header lengths and assembles the packet.
//!
//! A malformed interval or an edge in an unexpected direction abandons the
//! packet in progress. An idle timeout does the same when the transmitter
//! on the other side stops mid-packet (lost line of sight, noise burst);
//! the board arms and disarms that timeout as instructed by [`RxStep`].

use crate::clock::tick_delta;
use crate::ring::RingBuffer;

use super::{Phase, HEADER, MARK_ONE, MARK_ZERO, QUEUE_LEN, SPACE, TOLERANCE};

/// What the board must do with the timeout compare channel after an edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RxStep {
    /// More edges are expected: (re-)arm the idle timeout.
    Rearm,
    /// The packet finished or was abandoned: mask the idle timeout.
    Disarm,
}

/// The receive state machine and its completed-packet queue.
pub struct Receiver {
    phase: Phase,
    packet: u16,
    /// Bit index the next mark encodes, 15 down to 0; 16 while expecting
    /// the header.
    bit: u8,
    /// Tick counter value at the previous edge.
    clock_last: u8,
    queue: RingBuffer<u16, QUEUE_LEN>,
}

/// True if `delta` is within the accepted tolerance of `nominal`.
fn near(delta: u8, nominal: u8) -> bool {
    delta >= nominal - TOLERANCE && delta <= nominal + TOLERANCE
}

impl Receiver {
    /// Creates an idle receiver.
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            packet: 0,
            bit: 0,
            clock_last: 0,
            queue: RingBuffer::new(),
        }
    }

    /// Classifies one edge of the photo-receiver pin.
    ///
    /// `now` is the raw tick counter at the edge and `rising` is true when
    /// the carrier just came on. Called from the edge interrupt.
    pub fn edge(&mut self, now: u8, rising: bool) -> RxStep {
        match (self.phase, rising) {
            (Phase::Idle, true) => {
                // First rising edge of a new packet: the start of the
                // header mark.
                self.clock_last = now;
                self.packet = 0;
                self.bit = 16;
                self.phase = Phase::Mark;
                RxStep::Rearm
            }
            (Phase::Space, true) => {
                // End of a space, start of the next mark.
                if near(tick_delta(now, self.clock_last), SPACE) {
                    self.clock_last = now;
                    self.phase = Phase::Mark;
                    RxStep::Rearm
                } else {
                    self.reset()
                }
            }
            (Phase::Mark, false) => self.mark_end(now),
            // An edge we cannot account for: another interrupt was missed
            // or we are too slow to keep up. Drop the packet in progress.
            _ => self.reset(),
        }
    }

    fn mark_end(&mut self, now: u8) -> RxStep {
        let delta = tick_delta(now, self.clock_last);

        if self.bit == 16 {
            // Looking for the header mark.
            return if near(delta, HEADER) {
                self.next_space(now)
            } else {
                self.reset()
            };
        }

        // Looking for a zero or one mark.
        if near(delta, MARK_ZERO) {
            // The packet buffer started zeroed, nothing to set.
        } else if near(delta, MARK_ONE) {
            self.packet |= 1 << self.bit;
        } else {
            return self.reset();
        }

        if self.bit == 0 {
            // A whole packet. Queue it if there is room (all we can do
            // otherwise is drop it) and get ready for the next one.
            let _ = self.queue.push(self.packet);
            self.phase = Phase::Idle;
            RxStep::Disarm
        } else {
            self.next_space(now)
        }
    }

    fn next_space(&mut self, now: u8) -> RxStep {
        self.clock_last = now;
        self.phase = Phase::Space;
        self.bit -= 1;
        RxStep::Rearm
    }

    fn reset(&mut self) -> RxStep {
        self.phase = Phase::Idle;
        RxStep::Disarm
    }

    /// Forces the receiver back to idle.
    ///
    /// Called from the timeout compare interrupt when no edge arrived for
    /// [`super::RX_TIMEOUT`] ticks.
    pub fn timeout(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Removes the oldest completed packet, if any.
    ///
    /// Must run with interrupts disabled: the edge interrupt pushes into
    /// the same queue.
    pub fn poll(&mut self) -> Option<u16> {
        self.queue.pop()
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Feeds a header and `bits` payload marks with the given durations,
    /// starting from idle at tick `start`. Durations are (space, mark)
    /// pairs in ticks.
    fn feed(rx: &mut Receiver, start: u8, header: u8, pairs: &[(u8, u8)]) -> RxStep {
        let mut now = start;
        rx.edge(now, true);
        now = now.wrapping_add(header);
        let mut step = rx.edge(now, false);
        for &(space, mark) in pairs {
            now = now.wrapping_add(space);
            step = rx.edge(now, true);
            if step == RxStep::Disarm {
                return step;
            }
            now = now.wrapping_add(mark);
            step = rx.edge(now, false);
            if step == RxStep::Disarm {
                return step;
            }
        }
        step
    }

    fn pairs_for(packet: u16) -> Vec<(u8, u8)> {
        (0..16)
            .rev()
            .map(|bit| {
                let mark = if packet & (1 << bit) != 0 {
                    MARK_ONE
                } else {
                    MARK_ZERO
                };
                (SPACE, mark)
            })
            .collect()
    }

    #[test]
    fn nominal_timing_decodes() {
        let mut rx = Receiver::new();
        let step = feed(&mut rx, 0, HEADER, &pairs_for(0xCAFE));
        assert_eq!(step, RxStep::Disarm);
        assert_eq!(rx.poll(), Some(0xCAFE));
    }

    #[test]
    fn falling_edge_while_idle_is_spurious() {
        let mut rx = Receiver::new();
        assert_eq!(rx.edge(10, false), RxStep::Disarm);
        assert_eq!(rx.poll(), None);
    }

    #[test]
    fn rising_edge_during_a_mark_resets() {
        let mut rx = Receiver::new();
        rx.edge(0, true);
        // The carrier cannot come on while it is already on; some edge was
        // missed.
        assert_eq!(rx.edge(40, true), RxStep::Disarm);
        // And the partial packet is gone.
        let step = feed(&mut rx, 60, HEADER, &pairs_for(0x0F0F));
        assert_eq!(step, RxStep::Disarm);
        assert_eq!(rx.poll(), Some(0x0F0F));
    }

    #[test]
    fn timeout_mid_packet_recovers_to_idle() {
        let mut rx = Receiver::new();
        rx.edge(0, true);
        rx.edge(HEADER, false);
        rx.timeout();
        // Idle again: the next header is treated as a fresh packet.
        let step = feed(&mut rx, 77, HEADER, &pairs_for(0xF00D));
        assert_eq!(step, RxStep::Disarm);
        assert_eq!(rx.poll(), Some(0xF00D));
    }

    #[test]
    fn edges_spanning_the_tick_wrap_decode() {
        let mut rx = Receiver::new();
        // Start close to 255 so the header interval wraps the counter.
        let step = feed(&mut rx, 250, HEADER, &pairs_for(0x8421));
        assert_eq!(step, RxStep::Disarm);
        assert_eq!(rx.poll(), Some(0x8421));
    }

    #[test]
    fn a_mark_between_the_bit_bands_flips_the_bit_not_the_packet() {
        // MARK_ONE shortened past its band lands in the zero band: the
        // packet still decodes, with that bit read as zero. There is no
        // guard interval between the two bands.
        let mut pairs = pairs_for(0x8000);
        pairs[0].1 = MARK_ONE - TOLERANCE - 1;
        assert_eq!(pairs[0].1, MARK_ZERO + TOLERANCE);
        let mut rx = Receiver::new();
        let step = feed(&mut rx, 0, HEADER, &pairs);
        assert_eq!(step, RxStep::Disarm);
        assert_eq!(rx.poll(), Some(0x0000));
    }

    proptest! {
        // Accept envelope: every duration may wander anywhere within the
        // tolerance and the packet still decodes.
        #[test]
        fn jitter_within_tolerance_decodes(
            packet: u16,
            start: u8,
            header_jitter in -(TOLERANCE as i16)..=TOLERANCE as i16,
            jitter in proptest::collection::vec((-(TOLERANCE as i16)..=TOLERANCE as i16,
                                                 -(TOLERANCE as i16)..=TOLERANCE as i16), 16),
        ) {
            let mut pairs = pairs_for(packet);
            for (pair, (dspace, dmark)) in pairs.iter_mut().zip(&jitter) {
                pair.0 = (pair.0 as i16 + dspace) as u8;
                pair.1 = (pair.1 as i16 + dmark) as u8;
            }
            let header = (HEADER as i16 + header_jitter) as u8;
            let mut rx = Receiver::new();
            let step = feed(&mut rx, start, header, &pairs);
            prop_assert_eq!(step, RxStep::Disarm);
            prop_assert_eq!(rx.poll(), Some(packet));
        }

        // Reject envelope: a single space pushed just past the tolerance
        // kills the packet.
        #[test]
        fn bad_space_resets(packet: u16, index in 0usize..16, longer: bool) {
            let mut pairs = pairs_for(packet);
            pairs[index].0 = if longer {
                SPACE + TOLERANCE + 1
            } else {
                SPACE - TOLERANCE - 1
            };
            let mut rx = Receiver::new();
            feed(&mut rx, 0, HEADER, &pairs);
            prop_assert_eq!(rx.poll(), None);
        }

        // Reject envelope: a mark outside both bit bands kills the packet.
        #[test]
        fn bad_mark_resets(packet: u16, index in 0usize..16, longer: bool) {
            let mut pairs = pairs_for(packet);
            pairs[index].1 = if longer {
                MARK_ONE + TOLERANCE + 1
            } else {
                MARK_ZERO - TOLERANCE - 1
            };
            let mut rx = Receiver::new();
            feed(&mut rx, 0, HEADER, &pairs);
            prop_assert_eq!(rx.poll(), None);
        }

        // Reject envelope: a header outside its band never starts a
        // packet.
        #[test]
        fn bad_header_resets(packet: u16, longer: bool) {
            let header = if longer {
                HEADER + TOLERANCE + 1
            } else {
                HEADER - TOLERANCE - 1
            };
            let mut rx = Receiver::new();
            feed(&mut rx, 0, header, &pairs_for(packet));
            prop_assert_eq!(rx.poll(), None);
        }
    }
}
