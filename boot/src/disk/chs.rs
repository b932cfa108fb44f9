/// Logical block to cylinder/head/sector translation.
///
/// The geometry is fixed: 2 heads, 18 sectors per track, sectors
/// numbered from 1.
use emberos_platform::layout::{LOADER_STAGE_FIRST_LBA, LOADER_STAGE_MAX_SECTORS};

pub const HEADS: u32 = 2;
pub const SECTORS_PER_TRACK: u32 = 18;

/// Largest cylinder the low/high cylinder register pair can carry.
pub const MAX_CYLINDER: u32 = 0xFFFF;

/// Largest cylinder the firmware disk service can carry (10 bits).
pub const MAX_FIRMWARE_CYLINDER: u32 = 0x3FF;

// The boot sector reads the loader stage through the firmware disk
// service, which packs the sector number into 6 bits.
static_assertions::const_assert!(SECTORS_PER_TRACK < 64);
static_assertions::const_assert!(
    (LOADER_STAGE_FIRST_LBA + LOADER_STAGE_MAX_SECTORS as u32) / (SECTORS_PER_TRACK * HEADS)
        <= MAX_FIRMWARE_CYLINDER
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chs {
    pub cylinder: u32,
    pub head: u8,
    pub sector: u8,
}

impl Chs {
    pub fn from_lba(lba: u32) -> Self {
        let track = lba / SECTORS_PER_TRACK;
        Self {
            cylinder: track / HEADS,
            head: (track % HEADS) as u8,
            sector: (lba % SECTORS_PER_TRACK + 1) as u8,
        }
    }

    /// Back to a logical block number.
    pub fn to_lba(self) -> u32 {
        (self.cylinder * HEADS + self.head as u32) * SECTORS_PER_TRACK + (self.sector as u32 - 1)
    }

    /// Whether the cylinder fits the controller's cylinder registers.
    pub fn is_addressable(&self) -> bool {
        self.cylinder <= MAX_CYLINDER
    }
}
