//! 74HC595 shift register output
//!
//! The LEDs and the LCD each sit behind their own 74HC595, saving port
//! pins. Data is clocked out most significant bit first and latched onto
//! the outputs in one strobe.
//!
//! No delays are needed between edges: at 16 MHz a single AVR clock cycle
//! is 62.5 ns, longer than the minimum the 74HC595 needs to detect a
//! clock edge.

use crate::gpio::{self, Port};

/// The pins one shift register hangs off.
pub struct ShiftRegister {
    /// Port carrying all three control lines.
    pub port: Port,
    /// Serial data bit
    pub data: u8,
    /// Shift clock bit
    pub clock: u8,
    /// Storage (latch) clock bit
    pub latch: u8,
}

impl ShiftRegister {
    /// Sets all three control lines to outputs.
    pub fn init(&self) {
        unsafe {
            gpio::set_output(self.port, self.data);
            gpio::set_output(self.port, self.clock);
            gpio::set_output(self.port, self.latch);
        }
    }

    /// Shifts out 8 bits of data and latches them onto the outputs.
    pub fn write(&self, data: u8) {
        unsafe {
            let mut mask = 0x80u8;
            while mask != 0 {
                if data & mask != 0 {
                    gpio::set_high(self.port, self.data);
                } else {
                    gpio::set_low(self.port, self.data);
                }

                gpio::set_high(self.port, self.clock);
                gpio::set_low(self.port, self.clock);

                mask >>= 1;
            }

            gpio::set_low(self.port, self.data);

            gpio::set_high(self.port, self.latch);
            gpio::set_low(self.port, self.latch);
        }
    }
}
