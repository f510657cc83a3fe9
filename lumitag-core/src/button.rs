//! Sampling debouncer for the trigger, reload and mode buttons
//!
//! Each button keeps the last eight pin samples bit-packed in a shift
//! register, with the least significant bit being the most recent. The
//! debounced `pressed` flag only turns on once the last five samples are
//! all high, and only turns off once the last five are all low; any mixed
//! window leaves it unchanged. Five samples at the 10 ms cadence give a
//! latency of about 50 ms while rejecting more noise than a majority vote.

use embedded_hal::digital::InputPin;

use crate::clock;

/// The number of microseconds between samples.
pub const SAMPLE_INTERVAL_USECS: u32 = 10_000;

/// The pattern of high/low samples required for the button to turn on/off.
const SAMPLE_MASK: u8 = 0x1F;

/// A debounced button on an input pin.
pub struct Button<P> {
    pin: P,
    pressed: bool,
    samples: u8,
    sampled_at: u32,
}

impl<P: InputPin> Button<P> {
    /// Wraps an already-configured input pin.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            pressed: false,
            samples: 0,
            sampled_at: 0,
        }
    }

    /// Samples the pin and updates the debounced state.
    ///
    /// Called from the foreground loop with the current microsecond clock;
    /// returns immediately unless a sample interval has passed since the
    /// previous sample.
    pub fn cycle(&mut self, now: u32) {
        if clock::elapsed(now, self.sampled_at) < SAMPLE_INTERVAL_USECS {
            return;
        }

        self.sampled_at = now;
        self.samples <<= 1;
        if let Ok(true) = self.pin.is_high() {
            self.samples |= 0x1;
        }

        if self.samples & SAMPLE_MASK == SAMPLE_MASK {
            self.pressed = true;
        } else if !self.samples & SAMPLE_MASK == SAMPLE_MASK {
            self.pressed = false;
        }
    }

    /// The debounced state of the button.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use proptest::prelude::*;

    /// An input pin whose level the test scripts directly.
    struct FakePin {
        level: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level)
        }
    }

    /// Feeds one sample per 10 ms step and records the pressed flag after
    /// each.
    fn run(samples: &[bool]) -> Vec<bool> {
        let mut button = Button::new(FakePin { level: false });
        let mut out = Vec::new();
        let mut now = SAMPLE_INTERVAL_USECS;
        for &level in samples {
            button.pin.level = level;
            button.cycle(now);
            out.push(button.is_pressed());
            now += SAMPLE_INTERVAL_USECS;
        }
        out
    }

    #[test]
    fn ignores_samples_within_the_interval() {
        let mut button = Button::new(FakePin { level: true });
        button.cycle(SAMPLE_INTERVAL_USECS);
        // 9,999 µs later: no new sample is taken.
        button.cycle(2 * SAMPLE_INTERVAL_USECS - 1);
        assert_eq!(button.samples, 0x1);
    }

    #[test]
    fn rises_only_after_five_consecutive_highs() {
        // Noise, then a clean press, then a single glitch low.
        let t = true;
        let f = false;
        let states = run(&[f, t, f, t, t, t, t, t, f]);
        // The transient ones never fire the flag...
        assert_eq!(&states[..7], &[f, f, f, f, f, f, f]);
        // ...only the fifth consecutive high does, and a single low does
        // not clear it.
        assert!(states[7]);
        assert!(states[8]);
    }

    #[test]
    fn falls_only_after_five_consecutive_lows() {
        let t = true;
        let f = false;
        let mut samples = vec![t; 5];
        samples.extend([f, t, f, f, f, f, f]);
        let states = run(&samples);
        assert!(states[4]);
        // Bouncing release keeps the flag up until five clean lows.
        assert!(states[5..10].iter().all(|&p| p));
        assert!(!states[11]);
    }

    proptest! {
        // Hysteresis: the flag changes exactly when the last five samples
        // are unanimous.
        #[test]
        fn transitions_require_unanimous_window(samples in proptest::collection::vec(any::<bool>(), 1..64)) {
            let states = run(&samples);
            let mut pressed = false;
            for (i, &now) in states.iter().enumerate() {
                let window = &samples[i.saturating_sub(4)..=i];
                if window.len() == 5 && window.iter().all(|&s| s) {
                    pressed = true;
                } else if window.len() == 5 && window.iter().all(|&s| !s) {
                    pressed = false;
                }
                prop_assert_eq!(now, pressed);
            }
        }
    }
}
