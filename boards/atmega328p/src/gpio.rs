//! Raw GPIO access for the three ATmega328P ports
//!
//! The device's pin assignment is fixed, so pins are addressed by
//! (port, bit) the way the datasheet names them rather than through a
//! numbered-pin abstraction. The [`InPin`]/[`OutPin`] wrappers carry the
//! embedded-hal digital traits for code that wants a trait bound (the
//! button debouncer); the peripheral modules poke their own registers
//! directly.

use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

// Port B registers
const PORTB: *mut u8 = 0x25 as *mut u8;
const DDRB: *mut u8 = 0x24 as *mut u8;
const PINB: *const u8 = 0x23 as *const u8;

// Port C registers
const PORTC: *mut u8 = 0x28 as *mut u8;
const DDRC: *mut u8 = 0x27 as *mut u8;
const PINC: *const u8 = 0x26 as *const u8;

// Port D registers
const PORTD: *mut u8 = 0x2B as *mut u8;
const DDRD: *mut u8 = 0x2A as *mut u8;
const PIND: *const u8 = 0x29 as *const u8;

/// One of the ATmega328P I/O ports.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Port B (PB0-PB7)
    B,
    /// Port C (PC0-PC6)
    C,
    /// Port D (PD0-PD7)
    D,
}

impl Port {
    /// Data register address
    pub(crate) fn port_addr(self) -> *mut u8 {
        match self {
            Port::B => PORTB,
            Port::C => PORTC,
            Port::D => PORTD,
        }
    }

    /// Direction register address
    pub(crate) fn ddr_addr(self) -> *mut u8 {
        match self {
            Port::B => DDRB,
            Port::C => DDRC,
            Port::D => DDRD,
        }
    }

    /// Input register address
    pub(crate) fn pin_addr(self) -> *const u8 {
        match self {
            Port::B => PINB,
            Port::C => PINC,
            Port::D => PIND,
        }
    }
}

/// Configure a pin as output
///
/// # Safety
/// This function directly manipulates hardware registers
pub(crate) unsafe fn set_output(port: Port, bit: u8) {
    let ddr = port.ddr_addr();
    write_volatile(ddr, read_volatile(ddr) | (1 << bit));
}

/// Configure a pin as input
///
/// # Safety
/// This function directly manipulates hardware registers
pub(crate) unsafe fn set_input(port: Port, bit: u8) {
    let ddr = port.ddr_addr();
    write_volatile(ddr, read_volatile(ddr) & !(1 << bit));
}

/// Drive a pin high
///
/// # Safety
/// This function directly manipulates hardware registers
pub(crate) unsafe fn set_high(port: Port, bit: u8) {
    let reg = port.port_addr();
    write_volatile(reg, read_volatile(reg) | (1 << bit));
}

/// Drive a pin low
///
/// # Safety
/// This function directly manipulates hardware registers
pub(crate) unsafe fn set_low(port: Port, bit: u8) {
    let reg = port.port_addr();
    write_volatile(reg, read_volatile(reg) & !(1 << bit));
}

/// Read a pin level
///
/// # Safety
/// This function directly manipulates hardware registers
pub(crate) unsafe fn read(port: Port, bit: u8) -> bool {
    read_volatile(port.pin_addr()) & (1 << bit) != 0
}

/// An input pin, configured on construction.
pub struct InPin {
    port: Port,
    bit: u8,
}

impl InPin {
    /// Configures (port, bit) as an input and wraps it.
    pub fn new(port: Port, bit: u8) -> Self {
        unsafe {
            set_input(port, bit);
        }
        Self { port, bit }
    }
}

impl ErrorType for InPin {
    type Error = Infallible;
}

impl InputPin for InPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(unsafe { read(self.port, self.bit) })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!unsafe { read(self.port, self.bit) })
    }
}

/// An output pin, configured on construction.
pub struct OutPin {
    port: Port,
    bit: u8,
}

impl OutPin {
    /// Configures (port, bit) as an output and wraps it.
    pub fn new(port: Port, bit: u8) -> Self {
        unsafe {
            set_output(port, bit);
        }
        Self { port, bit }
    }
}

impl ErrorType for OutPin {
    type Error = Infallible;
}

impl OutputPin for OutPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        unsafe {
            set_high(self.port, self.bit);
        }
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        unsafe {
            set_low(self.port, self.bit);
        }
        Ok(())
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        match state {
            PinState::High => self.set_high(),
            PinState::Low => self.set_low(),
        }
    }
}
