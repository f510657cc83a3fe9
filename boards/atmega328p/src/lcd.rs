//! HD44780 character LCD behind a shift register
//!
//! The display is driven in 4-bit mode through a 74HC595 on PC3..PC5.
//! Shift register outputs 0-3 carry the LCD's D4-D7 data lines, output 4
//! is register select and output 5 is the enable strobe; each nibble takes
//! two shift-outs, one with enable high and one with it low.
//!
//! Timing uses the microsecond clock, so `init` must run after
//! `clock::init` with global interrupts enabled.

use core::cell::Cell;
use critical_section::Mutex;

use crate::clock;
use crate::gpio::Port;
use crate::shift::ShiftRegister;

const LCD_SHIFT: ShiftRegister = ShiftRegister {
    port: Port::C,
    data: 3,
    clock: 4,
    latch: 5,
};

// Shift register output mapping
const RS: u8 = 0x10; // Register select (0 = command, 1 = data)
const EN: u8 = 0x20; // Enable strobe

// LCD commands
const LCD_CLEARDISPLAY: u8 = 0x01;
const LCD_ENTRYMODESET: u8 = 0x04;
const LCD_DISPLAYCONTROL: u8 = 0x08;
const LCD_FUNCTIONSET: u8 = 0x20;
const LCD_SETCGRAMADDR: u8 = 0x40;
const LCD_SETDDRAMADDR: u8 = 0x80;

// Entry mode flags
const LCD_ENTRYLEFT: u8 = 0x02;

// Display control flags
const LCD_DISPLAYON: u8 = 0x04;
const LCD_CURSORON: u8 = 0x02;
const LCD_BLINKON: u8 = 0x01;

// Function set flags
const LCD_4BITMODE: u8 = 0x00;
const LCD_2LINE: u8 = 0x08;
const LCD_5X8DOTS: u8 = 0x00;

// DDRAM offsets of the two rows
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// The current display control bits, so cursor and power state can be
/// changed independently.
static DISPLAY_CTRL: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

fn display_ctrl() -> u8 {
    critical_section::with(|cs| DISPLAY_CTRL.borrow(cs).get())
}

fn set_display_ctrl(ctrl: u8) {
    critical_section::with(|cs| DISPLAY_CTRL.borrow(cs).set(ctrl));
    command(LCD_DISPLAYCONTROL | ctrl);
}

/// Clocks one nibble out with the enable strobe.
fn write_nibble(nibble: u8, rs: bool) {
    let mut value = nibble & 0x0F;
    if rs {
        value |= RS;
    }
    LCD_SHIFT.write(value | EN);
    LCD_SHIFT.write(value);
    // Longest ordinary instruction time.
    clock::delay_us(40);
}

fn write_byte(byte: u8, rs: bool) {
    write_nibble(byte >> 4, rs);
    write_nibble(byte & 0x0F, rs);
}

fn command(byte: u8) {
    write_byte(byte, false);
}

/// Puts the controller into 4-bit mode and clears the display.
///
/// The display is left switched off; call [`enable`] to show it.
pub fn init() {
    LCD_SHIFT.init();

    // Power-on: the controller may be in 8-bit mode, 4-bit mode, or half
    // way through a 4-bit transfer. The three 0x3 nibbles force it into a
    // known 8-bit state before the switch to 4-bit.
    clock::delay_ms(50);
    write_nibble(0x03, false);
    clock::delay_ms(5);
    write_nibble(0x03, false);
    clock::delay_us(150);
    write_nibble(0x03, false);
    write_nibble(0x02, false);

    command(LCD_FUNCTIONSET | LCD_4BITMODE | LCD_2LINE | LCD_5X8DOTS);
    set_display_ctrl(0);
    clear();
    command(LCD_ENTRYMODESET | LCD_ENTRYLEFT);
}

/// Switches the display on.
pub fn enable() {
    set_display_ctrl(display_ctrl() | LCD_DISPLAYON);
}

/// Switches the display off without losing its contents.
pub fn disable() {
    set_display_ctrl(display_ctrl() & !LCD_DISPLAYON);
}

/// Blanks the display and homes the cursor.
pub fn clear() {
    command(LCD_CLEARDISPLAY);
    clock::delay_ms(2);
}

/// Shows the cursor, optionally blinking the whole cell.
pub fn show_cursor(blink: bool) {
    let mut ctrl = display_ctrl() | LCD_CURSORON;
    if blink {
        ctrl |= LCD_BLINKON;
    } else {
        ctrl &= !LCD_BLINKON;
    }
    set_display_ctrl(ctrl);
}

/// Hides the cursor.
pub fn hide_cursor() {
    set_display_ctrl(display_ctrl() & !(LCD_CURSORON | LCD_BLINKON));
}

/// Moves the cursor to the given column and row.
pub fn move_cursor(col: u8, row: u8) {
    let row = row as usize % ROW_OFFSETS.len();
    command(LCD_SETDDRAMADDR | (ROW_OFFSETS[row] + col));
}

/// Writes a single character at the cursor.
pub fn putc(c: u8) {
    write_byte(c, true);
}

/// Writes a string at the cursor.
pub fn puts(s: &str) {
    for byte in s.bytes() {
        putc(byte);
    }
}

/// Loads a 5x8 custom character bitmap into one of the eight CGRAM slots.
///
/// The character can then be written with `putc(id)`.
pub fn make_char(id: u8, bitmap: &[u8; 8]) {
    command(LCD_SETCGRAMADDR | ((id & 0x7) << 3));
    for &row in bitmap {
        write_byte(row, true);
    }
    // Leave the address counter pointing back at the display.
    command(LCD_SETDDRAMADDR);
}
