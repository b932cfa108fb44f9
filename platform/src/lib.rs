//! EmberOS platform layer, shared by the boot loader and the image.
//!
//! All CPU intrinsics sit in `arch`; every fixed-address structure is
//! reached through `region::HardwareRegion`. The rest of the tree stays
//! free of inline assembly and raw pointer arithmetic.
#![no_std]

#[cfg(test)]
extern crate alloc;

pub mod arch;
pub mod display;
pub mod layout;
pub mod memory;
pub mod port;
pub mod region;
pub mod wait;

pub use display::{Attribute, Color, DisplayWriter, GlyphSink, TextBuffer};
pub use memory::{MemoryMap, MemoryMapTable, MemoryRegion, RegionKind};
pub use port::{HardwarePorts, PortIo};
pub use region::{HardwareRegion, PhysAddr};
