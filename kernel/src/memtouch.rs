/// Memory touch: fill a fixed region with a recognizable word and read
/// it back.
///
/// This is a liveness check of the first megabyte above conventional
/// memory, not an allocation. A mismatch means the region is missing or
/// not plain RAM.
use core::fmt;

use emberos_platform::layout::TOUCH_REGION_BASE;
use emberos_platform::HardwareRegion;

pub const FILL_PATTERN: u32 = 0xDEAD_BEEF;

/// Number of 32-bit words touched (4 KiB).
pub const TOUCH_WORDS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchError {
    /// The word at byte `offset` read back as `found`.
    Mismatch { offset: usize, found: u32 },
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchError::Mismatch { offset, found } => {
                write!(f, "Memory touch mismatch at +0x{:08X}: read 0x{:08X}", offset, found)
            }
        }
    }
}

/// # Safety
/// Nothing else may use the touch region.
pub unsafe fn fixed_region() -> HardwareRegion<'static, u32> {
    unsafe { HardwareRegion::at(TOUCH_REGION_BASE, TOUCH_WORDS) }
}

/// Fill `region` with `FILL_PATTERN`, then verify every word.
pub fn touch(region: &mut HardwareRegion<'_, u32>) -> Result<(), TouchError> {
    region.fill(FILL_PATTERN);
    for index in 0..region.len() {
        let found = region.read(index);
        if found != FILL_PATTERN {
            return Err(TouchError::Mismatch { offset: index * 4, found });
        }
    }
    Ok(())
}
