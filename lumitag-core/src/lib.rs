//! Lumitag Core - platform-independent logic for the IR laser-tag firmware
//!
//! This crate holds everything that does not touch a hardware register: the
//! infrared modem state machines, the microsecond clock arithmetic, the
//! ring buffers shared between interrupt and foreground contexts, and the
//! button debouncer. The board crates feed these types raw timer ticks, pin
//! levels and edge events, and apply the actions they hand back.
//!
//! Keeping this crate free of register access means the whole IR protocol
//! can be driven tick-by-tick on the host under `cargo test`.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod button;
pub mod clock;
pub mod ir;
pub mod ring;

/// Re-export embedded-hal traits
pub use embedded_hal;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
