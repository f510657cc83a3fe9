//! IR link bring-up tool
//!
//! Prints every packet the receiver decodes as a hex word on the UART.
//! Sending 't' over the serial line transmits a test packet; point two
//! units at each other to watch the link both ways.

#![no_std]
#![no_main]

use panic_halt as _;

use lumitag_atmega328p::{clock, enable_interrupts, ir, uart};

const TEST_PACKET: u16 = 0xA5A5;

fn write_hex(value: u16) {
    for shift in [12, 8, 4, 0] {
        let nibble = (value >> shift & 0xF) as u8;
        uart::putc(match nibble {
            0..=9 => b'0' + nibble,
            _ => b'a' + nibble - 10,
        });
    }
}

#[avr_device::entry]
fn main() -> ! {
    uart::init();
    clock::init();
    ir::init();
    enable_interrupts();

    uart::puts("ir monitor: 't' transmits ");
    write_hex(TEST_PACKET);
    uart::puts("\r\n");

    loop {
        if let Some(packet) = ir::rx() {
            uart::puts("rx ");
            write_hex(packet);
            uart::puts("\r\n");
        }

        if let Ok(byte) = uart::getc() {
            if byte == b't' {
                ir::tx(TEST_PACKET);
                uart::puts("tx ");
                write_hex(TEST_PACKET);
                uart::puts("\r\n");
            }
        }
    }
}
