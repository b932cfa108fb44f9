/// Fixed-address image loader.
///
/// Block 0 holds the boot sector, so the image starts at block 1; the
/// loader stage follows the image on disk. Sectors are read one at a time into consecutive 512-byte slots of the
/// destination. The first failure aborts the load; a half-loaded image
/// is never used.
use core::fmt;

use emberos_platform::{serial_println, HardwareRegion};

use crate::disk::{DiskError, SectorBuf, SectorDevice, SECTOR_SIZE};

pub use emberos_platform::layout::{IMAGE_FIRST_LBA, IMAGE_SECTORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Reading image sector `index` (block `lba`) failed.
    Sector { index: usize, lba: u32, source: DiskError },
    /// The destination cannot hold the requested sectors.
    DestinationTooSmall { needed: usize, available: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Sector { index, lba, source } => {
                write!(f, "image sector {} (block {}): {}", index, lba, source)
            }
            LoadError::DestinationTooSmall { needed, available } => {
                write!(f, "image needs {} bytes, destination holds {}", needed, available)
            }
        }
    }
}

/// Copy `sector_count` sectors starting at `IMAGE_FIRST_LBA` into `dest`.
///
/// Returns the number of bytes loaded.
pub fn load_image<D: SectorDevice>(
    disk: &mut D,
    dest: &mut HardwareRegion<'_, u8>,
    sector_count: usize,
) -> Result<usize, LoadError> {
    let needed = sector_count * SECTOR_SIZE;
    if needed > dest.len() {
        return Err(LoadError::DestinationTooSmall { needed, available: dest.len() });
    }

    let mut buf: SectorBuf = [0; SECTOR_SIZE];
    for index in 0..sector_count {
        let lba = IMAGE_FIRST_LBA + index as u32;
        disk.read_sector(lba, &mut buf)
            .map_err(|source| LoadError::Sector { index, lba, source })?;
        dest.write_slice(index * SECTOR_SIZE, &buf);
    }

    serial_println!("[load] {} sectors ({} bytes) at {:#x}", sector_count, needed, dest.base_addr());
    Ok(needed)
}
