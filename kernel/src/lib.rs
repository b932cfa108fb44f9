//! EmberOS image: early initialization after the loader hands over.
//!
//! The image is entered at its load address with interrupts disabled and
//! never enables them. It resets the display, touches a fixed memory
//! region, installs an inert vector table, draws a startup pattern and
//! then polls the keyboard forever.
#![no_std]

#[cfg(test)]
extern crate alloc;

pub mod init;
pub mod input;
pub mod memtouch;
pub mod pattern;
pub mod vectors;

pub use init::{EarlyInit, InitReport, Timing};
pub use input::{InputLoop, KeyEvent};
