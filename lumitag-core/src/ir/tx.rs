//! Transmit half of the IR modem
//!
//! The transmitter runs off a single timer compare channel. Each
//! [`TxStep`] tells the board what to do with the carrier and when the
//! next compare interrupt must fire; the board calls [`Transmitter::step`]
//! from that interrupt to fetch the next one.

use crate::ring::RingBuffer;

use super::{Phase, HEADER, MARK_ONE, MARK_ZERO, QUEUE_LEN, SPACE};

/// The action the board applies after a foreground send or a compare
/// interrupt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TxStep {
    /// Turn the carrier on and fire the compare interrupt again after the
    /// given number of ticks.
    CarrierOn(u8),
    /// Turn the carrier off and fire the compare interrupt again after the
    /// given number of ticks.
    CarrierOff(u8),
    /// The packet (and the queue behind it) is exhausted: mask the compare
    /// interrupt.
    Done,
}

/// The transmit state machine and its packet queue.
pub struct Transmitter {
    phase: Phase,
    packet: u16,
    /// Marks still to emit for the current packet, 16 down to 0.
    bit: u8,
    queue: RingBuffer<u16, QUEUE_LEN>,
}

impl Transmitter {
    /// Creates an idle transmitter.
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            packet: 0,
            bit: 0,
            queue: RingBuffer::new(),
        }
    }

    /// Submits a packet for transmission.
    ///
    /// Returns the step to apply when the transmitter was idle and the
    /// packet goes straight to the wire. Otherwise the packet is queued
    /// behind the one in flight, or dropped silently if the queue is full.
    ///
    /// Must run with interrupts disabled: the compare interrupt mutates
    /// the same state.
    pub fn send(&mut self, packet: u16) -> Option<TxStep> {
        if self.phase == Phase::Idle {
            Some(self.start(packet))
        } else {
            let _ = self.queue.push(packet);
            None
        }
    }

    fn start(&mut self, packet: u16) -> TxStep {
        self.phase = Phase::Mark;
        self.packet = packet;
        self.bit = 16;
        TxStep::CarrierOn(HEADER)
    }

    /// Advances the state machine at the end of the current mark or space.
    ///
    /// Called from the compare interrupt.
    pub fn step(&mut self) -> TxStep {
        if self.phase == Phase::Mark {
            // End of the header or of a bit mark; every mark is followed
            // by a space, including the terminating one after the last
            // bit.
            self.phase = Phase::Space;
            return TxStep::CarrierOff(SPACE);
        }

        if self.bit == 0 {
            // All sixteen marks are out and the terminating space has just
            // ended.
            return match self.queue.pop() {
                Some(next) => self.start(next),
                None => {
                    self.phase = Phase::Idle;
                    TxStep::Done
                }
            };
        }

        self.bit -= 1;
        self.phase = Phase::Mark;
        if self.packet & (1 << self.bit) != 0 {
            TxStep::CarrierOn(MARK_ONE)
        } else {
            TxStep::CarrierOn(MARK_ZERO)
        }
    }
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_from_idle_starts_the_header() {
        let mut tx = Transmitter::new();
        assert_eq!(tx.send(0xFFFF), Some(TxStep::CarrierOn(HEADER)));
    }

    #[test]
    fn marks_and_spaces_alternate() {
        let mut tx = Transmitter::new();
        tx.send(0x8000);
        // Header ends: space. Space ends: first bit mark (a one).
        assert_eq!(tx.step(), TxStep::CarrierOff(SPACE));
        assert_eq!(tx.step(), TxStep::CarrierOn(MARK_ONE));
        assert_eq!(tx.step(), TxStep::CarrierOff(SPACE));
        assert_eq!(tx.step(), TxStep::CarrierOn(MARK_ZERO));
    }

    #[test]
    fn finishes_after_the_terminating_space() {
        let mut tx = Transmitter::new();
        tx.send(0x0000);
        let mut steps = 0;
        loop {
            let step = tx.step();
            if step == TxStep::Done {
                break;
            }
            steps += 1;
            assert!(steps < 100, "transmitter never went idle");
        }
        // 16 space/mark pairs plus the terminating space.
        assert_eq!(steps, 33);
        // Idle again: the next send starts immediately.
        assert_eq!(tx.send(0x0001), Some(TxStep::CarrierOn(HEADER)));
    }

    #[test]
    fn busy_sends_queue_in_fifo_order() {
        let mut tx = Transmitter::new();
        assert!(tx.send(0x0001).is_some());
        assert_eq!(tx.send(0x0002), None);
        assert_eq!(tx.send(0x0003), None);

        // Drain the first packet; the second starts without going idle.
        for _ in 0..33 {
            tx.step();
        }
        assert_eq!(tx.step(), TxStep::CarrierOn(HEADER));
        assert_eq!(tx.packet, 0x0002);
    }

    #[test]
    fn queue_overflow_is_silent() {
        let mut tx = Transmitter::new();
        for packet in 1..=5 {
            tx.send(packet);
        }
        // One in flight, three queued, the fifth dropped.
        let mut seen = Vec::new();
        loop {
            match tx.step() {
                TxStep::CarrierOn(HEADER) => seen.push(tx.packet),
                TxStep::Done => break,
                _ => {}
            }
        }
        // The in-flight packet's header was issued by send, not step.
        assert_eq!(seen, vec![2, 3, 4]);
    }
}
