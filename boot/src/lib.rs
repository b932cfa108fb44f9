//! EmberOS boot loader.
//!
//! Firmware loads the first sector of the boot disk at 0x7C00 and jumps
//! to it. That sector only fetches the loader stage, which is this
//! library: it detects the disk, copies the image to a fixed address,
//! publishes a memory map and transfers control:
//!
//! - `disk`: ATA primary channel, CHS addressing, retry policy
//! - `loader`: image sectors from block 1 into the load region
//! - `memmap`: memory descriptor table for the image
//! - `handoff`: the stage machine tying these together
#![no_std]

#[cfg(test)]
extern crate alloc;

pub mod disk;
pub mod handoff;
pub mod loader;
pub mod memmap;

pub use handoff::{
    BootConfig, BootController, BootError, HardwarePlatform, ParkingSlot, Platform, Stage, Step,
};
