/// Memory-map records shared by the loader and the image.
///
/// The loader publishes an ordered list of region descriptors at
/// `MEMORY_MAP_BASE` and the number of records at `MEMORY_MAP_COUNT_ADDR`.
/// Records use the firmware's 20-byte layout: base (u64), length (u64),
/// kind (u32), packed.
use core::fmt;

use crate::layout::{MAX_MEMORY_REGIONS, MEMORY_MAP_BASE, MEMORY_MAP_COUNT_ADDR, MEMORY_REGION_SIZE};
use crate::region::HardwareRegion;

/// Region classification, numbered as the firmware numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RegionKind {
    Usable = 1,
    Reserved = 2,
    AcpiReclaimable = 3,
    AcpiNvs = 4,
    Unusable = 5,
}

impl RegionKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Usable),
            2 => Some(Self::Reserved),
            3 => Some(Self::AcpiReclaimable),
            4 => Some(Self::AcpiNvs),
            5 => Some(Self::Unusable),
            _ => None,
        }
    }
}

/// One memory region descriptor.
#[repr(C, packed)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    base: u64,
    length: u64,
    kind: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<MemoryRegion>(), MEMORY_REGION_SIZE);

impl MemoryRegion {
    pub const fn new(base: u64, length: u64, kind: RegionKind) -> Self {
        Self { base, length, kind: kind as u32 }
    }

    pub const fn empty() -> Self {
        Self { base: 0, length: 0, kind: 0 }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// First byte past the region, saturating at the top of the address
    /// space for records that would wrap.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.length)
    }

    /// `None` for kinds this code does not know.
    pub fn kind(&self) -> Option<RegionKind> {
        RegionKind::from_raw(self.kind)
    }

    pub fn is_usable(&self) -> bool {
        self.kind() == Some(RegionKind::Usable)
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Copy out of the packed struct before borrowing.
        let (base, length, kind) = (self.base, self.length, self.kind);
        f.debug_struct("MemoryRegion")
            .field("base", &format_args!("{:#x}", base))
            .field("length", &format_args!("{:#x}", length))
            .field("kind", &kind)
            .finish()
    }
}

/// The map already holds `MAX_MEMORY_REGIONS` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMapFull;

impl fmt::Display for MemoryMapFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory map full ({} regions)", MAX_MEMORY_REGIONS)
    }
}

/// An ordered, fixed-capacity list of regions. Order is insertion order;
/// nothing is merged or sorted.
#[derive(Clone, Copy)]
pub struct MemoryMap {
    regions: [MemoryRegion; MAX_MEMORY_REGIONS],
    len: usize,
}

impl MemoryMap {
    pub const fn new() -> Self {
        Self {
            regions: [MemoryRegion::empty(); MAX_MEMORY_REGIONS],
            len: 0,
        }
    }

    pub fn push(&mut self, region: MemoryRegion) -> Result<(), MemoryMapFull> {
        let slot = self.regions.get_mut(self.len).ok_or(MemoryMapFull)?;
        *slot = region;
        self.len += 1;
        Ok(())
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        self.regions.get(..self.len).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of the lengths of all usable regions, saturating.
    pub fn usable_bytes(&self) -> u64 {
        self.regions()
            .iter()
            .filter(|r| r.is_usable())
            .map(|r| r.length())
            .fold(0u64, u64::saturating_add)
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.regions()).finish()
    }
}

/// The published memory-map table: a record count plus the records.
pub struct MemoryMapTable<'a> {
    count: HardwareRegion<'a, u32>,
    records: HardwareRegion<'a, MemoryRegion>,
}

impl MemoryMapTable<'static> {
    /// Bind to the fixed table location.
    ///
    /// # Safety
    /// Only one table binding may be live at a time, and the fixed
    /// location must not overlap the stack in use.
    pub unsafe fn fixed() -> Self {
        unsafe {
            Self {
                count: HardwareRegion::at(MEMORY_MAP_COUNT_ADDR, 1),
                records: HardwareRegion::at(MEMORY_MAP_BASE, MAX_MEMORY_REGIONS),
            }
        }
    }
}

impl<'a> MemoryMapTable<'a> {
    pub fn new(count: HardwareRegion<'a, u32>, records: HardwareRegion<'a, MemoryRegion>) -> Self {
        Self { count, records }
    }

    /// Write `map` and then its record count.
    pub fn publish(&mut self, map: &MemoryMap) {
        self.records.write_slice(0, map.regions());
        self.count.write(0, map.len() as u32);
    }

    /// Read the published table back. A corrupt count is clamped to the
    /// table capacity.
    pub fn read(&self) -> MemoryMap {
        let count = (self.count.read(0) as usize).min(self.records.len()).min(MAX_MEMORY_REGIONS);
        let mut map = MemoryMap::new();
        for index in 0..count {
            // Cannot fail: count is clamped to the capacity.
            let _ = map.push(self.records.read(index));
        }
        map
    }
}
