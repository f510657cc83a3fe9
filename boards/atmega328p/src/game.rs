//! Player controls: trigger, reload and mode buttons
//!
//! The three buttons sit on PD4, PD5 and PD7 and are debounced by
//! `lumitag_core::button`. [`Controls::cycle`] samples them and reports
//! which ones were newly pressed, leaving what to do about it to the main
//! loop.

use lumitag_core::button::Button;

use crate::gpio::{InPin, Port};

/// Debounced edge events from one pass over the buttons.
#[derive(Clone, Copy, Default)]
pub struct Pressed {
    /// The trigger was pulled.
    pub trigger: bool,
    /// The reload button went down.
    pub reload: bool,
    /// The mode button went down.
    pub mode: bool,
}

/// The three debounced buttons and their previous states.
pub struct Controls {
    trigger: Button<InPin>,
    reload: Button<InPin>,
    mode: Button<InPin>,
    was: [bool; 3],
}

impl Controls {
    /// Configures the button pins.
    pub fn new() -> Self {
        Self {
            trigger: Button::new(InPin::new(Port::D, 4)),
            reload: Button::new(InPin::new(Port::D, 5)),
            mode: Button::new(InPin::new(Port::D, 7)),
            was: [false; 3],
        }
    }

    /// Samples all three buttons and returns the fresh press edges.
    pub fn cycle(&mut self, now: u32) -> Pressed {
        self.trigger.cycle(now);
        self.reload.cycle(now);
        self.mode.cycle(now);

        let is = [
            self.trigger.is_pressed(),
            self.reload.is_pressed(),
            self.mode.is_pressed(),
        ];
        let pressed = Pressed {
            trigger: is[0] && !self.was[0],
            reload: is[1] && !self.was[1],
            mode: is[2] && !self.was[2],
        };
        self.was = is;
        pressed
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}
