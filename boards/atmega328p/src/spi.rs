//! SPI bus in master mode
//!
//! Single blocking byte transfers at 1 MHz, enough for the radio's control
//! interface. Slave select is owned by the radio module.

use core::ptr::{read_volatile, write_volatile};

// SPI registers
const SPCR: *mut u8 = 0x4C as *mut u8; // SPI Control Register
const SPSR: *mut u8 = 0x4D as *mut u8; // SPI Status Register
const SPDR: *mut u8 = 0x4E as *mut u8; // SPI Data Register

// SPCR bits
const SPE: u8 = 6;  // SPI Enable
const MSTR: u8 = 4; // Master mode
const SPR0: u8 = 0; // Clock rate select (F_CPU/16)

// SPSR bits
const SPIF: u8 = 7; // Transfer complete flag

// Port B bits for the SPI pins
const DDRB: *mut u8 = 0x24 as *mut u8;
const PB3: u8 = 3; // MOSI
const PB4: u8 = 4; // MISO
const PB5: u8 = 5; // SCK

/// Configures the bus pins and enables the SPI master at 1 MHz.
pub fn init() {
    unsafe {
        write_volatile(DDRB, read_volatile(DDRB) | (1 << PB3) | (1 << PB5));
        write_volatile(DDRB, read_volatile(DDRB) & !(1 << PB4));
        write_volatile(SPCR, (1 << SPE) | (1 << MSTR) | (1 << SPR0));
    }
}

/// Shifts one byte out while shifting one in.
pub fn transfer(value: u8) -> u8 {
    unsafe {
        write_volatile(SPDR, value);
        while read_volatile(SPSR) & (1 << SPIF) == 0 {}
        read_volatile(SPDR)
    }
}
