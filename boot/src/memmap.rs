/// Memory descriptor builder.
///
/// The map is a fixed table: conventional memory below 640 KiB and
/// 16 MiB of extended memory from the 1 MiB boundary, both usable. No
/// firmware query is made, so the table does not reflect the installed
/// memory.
// TODO: fill the map from INT 15h E820 once the loader has a real-mode
// call path; until then the image must treat the map as advisory.
use emberos_platform::{serial_println, MemoryMap, MemoryMapTable, MemoryRegion, RegionKind};

/// Conventional memory: 0 .. 640 KiB.
pub const CONVENTIONAL: MemoryRegion = MemoryRegion::new(0, 0xA_0000, RegionKind::Usable);

/// Extended memory: 16 MiB starting at 1 MiB.
pub const EXTENDED: MemoryRegion = MemoryRegion::new(0x10_0000, 0x100_0000, RegionKind::Usable);

/// Build the memory map.
pub fn build_memory_map() -> MemoryMap {
    let mut map = MemoryMap::new();
    for region in [CONVENTIONAL, EXTENDED] {
        // Two records never exceed the table capacity.
        let _ = map.push(region);
    }
    map
}

/// Build the map and publish it into `table`.
pub fn publish_memory_map(table: &mut MemoryMapTable<'_>) -> MemoryMap {
    let map = build_memory_map();
    table.publish(&map);
    for region in map.regions() {
        serial_println!("[mem] {:#010x}..{:#010x} {:?}", region.base(), region.end(), region.kind());
    }
    serial_println!("[mem] {} regions, {} KiB usable", map.len(), map.usable_bytes() / 1024);
    map
}
