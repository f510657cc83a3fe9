//! Interrupt-driven UART on USART0 (9600 8-N-1)
//!
//! Received bytes are pushed into a 16-byte ring by the RX interrupt and
//! popped by [`getc`]. Transmission drains a second ring through the
//! data-register-empty interrupt, which masks itself when the ring runs
//! dry; [`putc`] spins until its byte fits. The host side sees plain
//! asynchronous framing; no protocol is defined at this layer.

use core::cell::RefCell;
use core::convert::Infallible;
use core::ptr::{read_volatile, write_volatile};
use critical_section::Mutex;
use lumitag_core::ring::RingBuffer;
use ufmt::uWrite;

use crate::F_CPU;

// USART0 registers
const UDR0: *mut u8 = 0xC6 as *mut u8;   // USART Data Register
const UCSR0A: *mut u8 = 0xC0 as *mut u8; // USART Control and Status Register A
const UCSR0B: *mut u8 = 0xC1 as *mut u8; // USART Control and Status Register B
const UCSR0C: *mut u8 = 0xC2 as *mut u8; // USART Control and Status Register C
const UBRR0L: *mut u8 = 0xC4 as *mut u8; // USART Baud Rate Register Low
const UBRR0H: *mut u8 = 0xC5 as *mut u8; // USART Baud Rate Register High

// UCSR0B bits
const RXCIE0: u8 = 7; // RX Complete Interrupt Enable
const UDRIE0: u8 = 5; // Data Register Empty Interrupt Enable
const RXEN0: u8 = 4;  // Receiver Enable
const TXEN0: u8 = 3;  // Transmitter Enable

// UCSR0C bits
const UCSZ01: u8 = 2; // Character Size
const UCSZ00: u8 = 1;

// Port D bits for the UART pins
const DDRD: *mut u8 = 0x2A as *mut u8;
const PD0: u8 = 0; // RX
const PD1: u8 = 1; // TX

/// The baud rate.
const BAUD: u32 = 9600;

/// The number of bytes in the RX and TX rings.
const BUF_SIZE: usize = 16;

static RX_BUF: Mutex<RefCell<RingBuffer<u8, BUF_SIZE>>> =
    Mutex::new(RefCell::new(RingBuffer::new()));
static TX_BUF: Mutex<RefCell<RingBuffer<u8, BUF_SIZE>>> =
    Mutex::new(RefCell::new(RingBuffer::new()));

/// Configures USART0 for 9600 8-N-1 and unmasks the RX interrupt.
pub fn init() {
    unsafe {
        write_volatile(DDRD, read_volatile(DDRD) & !(1 << PD0));
        write_volatile(DDRD, read_volatile(DDRD) | (1 << PD1));

        let ubrr = (F_CPU / (16 * BAUD) - 1) as u16;
        write_volatile(UBRR0H, (ubrr >> 8) as u8);
        write_volatile(UBRR0L, ubrr as u8);

        // The register is documented to be zero on boot, but a boot
        // loader may have set the 2X flag (the Arduino loader on pre-R3
        // boards does), which would double the effective baud rate.
        write_volatile(UCSR0A, 0);

        // Enable receiver/transmitter and unmask the RX interrupt.
        write_volatile(UCSR0B, (1 << RXCIE0) | (1 << RXEN0) | (1 << TXEN0));

        // Async mode, 8 data bits, no parity, 1 stop bit.
        write_volatile(UCSR0C, (1 << UCSZ01) | (1 << UCSZ00));
    }
}

/// USART RX complete: queue the byte if there is room.
///
/// A full ring means the foreground is not keeping up; the byte has to be
/// discarded.
#[link_section = ".text"]
#[export_name = "__vector_18"]
pub unsafe extern "avr-interrupt" fn __vector_18() {
    let byte = read_volatile(UDR0);
    critical_section::with(|cs| {
        let _ = RX_BUF.borrow_ref_mut(cs).push(byte);
    });
}

/// USART data register empty: feed the next byte, or mask ourselves once
/// the ring is drained.
#[link_section = ".text"]
#[export_name = "__vector_19"]
pub unsafe extern "avr-interrupt" fn __vector_19() {
    critical_section::with(|cs| match TX_BUF.borrow_ref_mut(cs).pop() {
        Some(byte) => unsafe { write_volatile(UDR0, byte) },
        None => unsafe { write_volatile(UCSR0B, read_volatile(UCSR0B) & !(1 << UDRIE0)) },
    });
}

/// Returns the next received byte, or `WouldBlock` if none has arrived.
pub fn getc() -> nb::Result<u8, Infallible> {
    critical_section::with(|cs| RX_BUF.borrow_ref_mut(cs).pop()).ok_or(nb::Error::WouldBlock)
}

/// Queues a byte for transmission, spinning until there is room for it.
pub fn putc(byte: u8) {
    loop {
        let queued = critical_section::with(|cs| {
            if TX_BUF.borrow_ref_mut(cs).push(byte).is_err() {
                return false;
            }
            unsafe {
                // Unmask the data-register-empty interrupt; it fires as
                // soon as UDR0 can take the byte.
                write_volatile(UCSR0B, read_volatile(UCSR0B) | (1 << UDRIE0));
            }
            true
        });
        if queued {
            return;
        }
    }
}

/// Writes a string.
pub fn puts(s: &str) {
    for byte in s.bytes() {
        putc(byte);
    }
}

/// A `uWrite` handle over the UART, for `ufmt::uwriteln!` and friends.
pub struct Uart;

impl uWrite for Uart {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        puts(s);
        Ok(())
    }
}
