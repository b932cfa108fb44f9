/// Fixed physical layout shared by the loader and the loaded image.
///
/// These addresses are an interoperability contract: the loader writes
/// at them and the image reads from them. They must not move.
///
/// Disk blocks:
///
/// ```text
/// 0        boot sector (first stage, 512 bytes)
/// 1..=6    image
/// 7..      loader stage, at most LOADER_STAGE_MAX_SECTORS blocks
/// ```
///
/// Memory below 64 KiB, where every statically linked address must live
/// because the code runs in real mode:
///
/// ```text
/// 0x0000..0x0800  vector table
/// 0x1000..0x1C00  image
/// ..0x7C00        first-stage stack
/// 0x7C00..0x7E00  boot sector
/// 0x7FFC..0x8190  memory map count and records
/// ..0x9000        loader stack
/// 0x9000..0x10000 loader stage
/// ```
use crate::region::PhysAddr;

/// Size of one disk sector and of the boot sector image.
pub const SECTOR_SIZE: usize = 512;

/// Signature the firmware checks in the last two bytes of the boot sector.
pub const BOOT_SIGNATURE: u16 = 0xAA55;

/// Where the firmware loads the boot sector.
pub const BOOT_SECTOR_ADDR: PhysAddr = PhysAddr::new(0x7C00);

/// Segment every stage runs in. The boot sector far-jumps to 0000:7C00
/// and all data segments stay zero-based.
pub const BOOT_SEGMENT: u16 = 0x0000;

/// Small stack set up by the boot sector, growing down below it.
pub const INITIAL_STACK_TOP: u32 = 0x7C00;

/// Loader working stack, installed during stack setup.
pub const LOADER_STACK_TOP: u32 = 0x9000;

/// First disk block of the image. Block 0 is the boot sector.
pub const IMAGE_FIRST_LBA: u32 = 1;

/// Image length in sectors.
pub const IMAGE_SECTORS: usize = 6;

/// Where the image is copied and entered.
pub const IMAGE_LOAD_ADDR: PhysAddr = PhysAddr::new(0x1000);

/// First disk block of the loader stage, right after the image.
pub const LOADER_STAGE_FIRST_LBA: u32 = IMAGE_FIRST_LBA + IMAGE_SECTORS as u32;

/// Blocks reserved for the loader stage.
pub const LOADER_STAGE_MAX_SECTORS: usize = 56;

/// Where the boot sector loads the loader stage and jumps to it.
pub const LOADER_STAGE_ADDR: PhysAddr = PhysAddr::new(0x9000);

/// End of the memory that 16-bit code can address with a zero segment.
pub const REAL_MODE_LIMIT: u32 = 0x1_0000;

/// First memory-map record.
pub const MEMORY_MAP_BASE: PhysAddr = PhysAddr::new(0x8000);

/// Number of published memory-map records (one u32).
pub const MEMORY_MAP_COUNT_ADDR: PhysAddr = PhysAddr::new(0x7FFC);

/// Capacity of the memory-map table.
pub const MAX_MEMORY_REGIONS: usize = 20;

/// Size of one memory-map record.
pub const MEMORY_REGION_SIZE: usize = 20;

/// Interrupt vector table: 256 entries of 8 bytes.
pub const VECTOR_TABLE_BASE: PhysAddr = PhysAddr::new(0x0);
pub const VECTOR_TABLE_END: PhysAddr = PhysAddr::new(0x800);

/// Color text-mode display window.
pub const DISPLAY_BASE: PhysAddr = PhysAddr::new(0xB_8000);

/// Region the image fills with a recognizable pattern at startup.
pub const TOUCH_REGION_BASE: PhysAddr = PhysAddr::new(0x10_0000);

const fn end_of(base: PhysAddr, bytes: usize) -> u32 {
    base.as_u32() + bytes as u32
}

static_assertions::const_assert!(INITIAL_STACK_TOP <= BOOT_SECTOR_ADDR.as_u32());
static_assertions::const_assert!(IMAGE_LOAD_ADDR.as_u32() >= VECTOR_TABLE_END.as_u32());
static_assertions::const_assert!(end_of(IMAGE_LOAD_ADDR, IMAGE_SECTORS * SECTOR_SIZE) <= INITIAL_STACK_TOP);
static_assertions::const_assert!(MEMORY_MAP_COUNT_ADDR.as_u32() >= end_of(BOOT_SECTOR_ADDR, SECTOR_SIZE));
static_assertions::const_assert_eq!(MEMORY_MAP_COUNT_ADDR.as_u32() + 4, MEMORY_MAP_BASE.as_u32());
static_assertions::const_assert!(
    end_of(MEMORY_MAP_BASE, MAX_MEMORY_REGIONS * MEMORY_REGION_SIZE) < LOADER_STACK_TOP
);
static_assertions::const_assert_eq!(LOADER_STAGE_ADDR.as_u32(), LOADER_STACK_TOP);
static_assertions::const_assert!(
    end_of(LOADER_STAGE_ADDR, LOADER_STAGE_MAX_SECTORS * SECTOR_SIZE) <= REAL_MODE_LIMIT
);
