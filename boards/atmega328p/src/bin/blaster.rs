//! Main firmware for the lumitag handheld
//!
//! Wires the peripherals together: the trigger fires a shot packet over
//! the IR link with a muzzle flash and a click, the mode button switches
//! teams, and packets from the opposing team count as hits on the LCD.

#![no_std]
#![no_main]

use panic_halt as _;

use lumitag_atmega328p::led::Color;
use lumitag_atmega328p::{clock, enable_interrupts, game, ir, lcd, led, radio, speaker, spi, uart};
use lumitag_core::clock::elapsed;

/// This unit's player number, the low byte of every shot packet.
const PLAYER: u8 = 1;

/// Team colors: the steady color and the alternating accent.
const TEAMS: [(Color, Color); 2] = [(Color::Red, Color::Yellow), (Color::Blue, Color::Green)];

/// How long the shot and hit tones last.
const TONE_USECS: u32 = 150_000;

/// A shot packet: team in the high byte, player in the low byte.
fn shot_packet(team: u8) -> u16 {
    (team as u16) << 8 | PLAYER as u16
}

/// Writes a number at the current LCD cursor.
fn lcd_write_u16(value: u16) {
    let mut divisor = 10_000;
    let mut leading = true;
    while divisor > 0 {
        let digit = (value / divisor % 10) as u8;
        if digit != 0 || divisor == 1 {
            leading = false;
        }
        if !leading {
            lcd::putc(b'0' + digit);
        }
        divisor /= 10;
    }
}

fn show_status(team: usize, hits: u16) {
    lcd::clear();
    lcd::puts(if team == 0 { "team RED" } else { "team BLUE" });
    lcd::move_cursor(0, 1);
    lcd::puts("hits ");
    lcd_write_u16(hits);
}

#[avr_device::entry]
fn main() -> ! {
    uart::init();
    clock::init();
    ir::init();
    spi::init();
    radio::init();
    speaker::init();
    led::init();
    enable_interrupts();

    // The LCD timing runs off the clock, so it comes up last.
    lcd::init();
    lcd::enable();

    let mut controls = game::Controls::new();
    let mut team: usize = 0;
    let mut hits: u16 = 0;
    let mut tone_start: u32 = 0;

    led::team_on(TEAMS[team].0, TEAMS[team].1);
    show_status(team, hits);
    let _ = ufmt::uwriteln!(&mut uart::Uart, "lumitag {} up as player {}\r", lumitag_core::VERSION, PLAYER);

    loop {
        let now = clock::micros();
        let pressed = controls.cycle(now);
        led::cycle();

        if pressed.trigger {
            ir::tx(shot_packet(team as u8));
            led::muzzle_flash();
            speaker::tone(1760);
            tone_start = now.max(1);
        }

        if pressed.mode {
            team = (team + 1) % TEAMS.len();
            led::team_on(TEAMS[team].0, TEAMS[team].1);
            show_status(team, hits);
        }

        if pressed.reload {
            speaker::tone(440);
            tone_start = now.max(1);
        }

        if let Some(packet) = ir::rx() {
            // Friendly fire does not count.
            if (packet >> 8) as usize != team {
                hits += 1;
                show_status(team, hits);
                speaker::tone(880);
                tone_start = now.max(1);
            }
        }

        if tone_start != 0 && elapsed(now, tone_start) >= TONE_USECS {
            tone_start = 0;
            speaker::off();
        }
    }
}
