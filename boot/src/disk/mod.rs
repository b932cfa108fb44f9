/// Disk subsystem: legacy ATA controller access with fixed CHS geometry.
///
/// `Ata` drives the controller registers through a `PortIo`. A drive that
/// passed detection is handed out as an `AtaDisk`, which implements
/// `SectorDevice`; the image loader only ever sees that trait.
mod ata;
mod chs;
#[cfg(test)]
pub mod mock;

pub use ata::{Ata, AtaDisk, Drive, Status, MAX_ATTEMPTS};
pub use chs::{Chs, HEADS, MAX_CYLINDER, MAX_FIRMWARE_CYLINDER, SECTORS_PER_TRACK};

use core::fmt;

pub use emberos_platform::layout::SECTOR_SIZE;

/// One sector of data, owned by the caller for the duration of a transfer.
pub type SectorBuf = [u8; SECTOR_SIZE];

/// Single-sector block access.
pub trait SectorDevice {
    /// Read logical block `lba` into `buf`.
    fn read_sector(&mut self, lba: u32, buf: &mut SectorBuf) -> Result<(), DiskError>;

    /// Write `buf` to logical block `lba`.
    fn write_sector(&mut self, lba: u32, buf: &SectorBuf) -> Result<(), DiskError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// No drive answered the identify command.
    DeviceNotPresent,
    /// Every attempt at this block reported an error.
    RetriesExhausted { lba: u32, attempts: u32 },
    /// The block's cylinder does not fit the 16-bit cylinder registers.
    AddressOutOfRange { lba: u32 },
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskError::DeviceNotPresent => write!(f, "disk not present"),
            DiskError::RetriesExhausted { lba, attempts } => {
                write!(f, "disk error at block {} after {} attempts", lba, attempts)
            }
            DiskError::AddressOutOfRange { lba } => {
                write!(f, "block {} is beyond the addressable cylinders", lba)
            }
        }
    }
}

#[cfg(test)]
mod tests;
