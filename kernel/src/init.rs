/// Image early initialization.
///
/// Runs once, on the stack the loader left, in this order:
/// 1. clear the display and report that the image is running
/// 2. read back the memory map the loader published
/// 3. touch the fixed memory region
/// 4. install the stub vector table
/// 5. draw the startup pattern
/// 6. clear the display and report readiness
///
/// The caller then hands the display to the input loop.
use emberos_platform::{
    serial_println, wait, Attribute, Color, DisplayWriter, GlyphSink, HardwareRegion, MemoryMap,
    MemoryMapTable,
};

use crate::memtouch::{self, TouchError};
use crate::pattern::{self, CELL_DELAY};
use crate::vectors::{self, VectorEntry};

/// Cosmetic pauses between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub step_delay: u32,
    pub cell_delay: u32,
}

impl Timing {
    pub const HARDWARE: Timing = Timing { step_delay: 1_000_000, cell_delay: CELL_DELAY };
    pub const NONE: Timing = Timing { step_delay: 0, cell_delay: 0 };
}

/// What early init found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub memory_regions: usize,
    pub usable_bytes: u64,
    pub touch: Result<(), TouchError>,
}

const HEADLINE: Attribute = Attribute::on_black(Color::White);
const PROGRESS: Attribute = Attribute::on_black(Color::Yellow);
const MEMORY: Attribute = Attribute::on_black(Color::LightRed);
const VECTORS: Attribute = Attribute::on_black(Color::LightGreen);
const PATTERN: Attribute = Attribute::on_black(Color::LightBlue);
const READY: Attribute = Attribute::on_black(Color::LightGreen);

pub struct EarlyInit<'a, S: GlyphSink> {
    display: DisplayWriter<S>,
    touch_region: HardwareRegion<'a, u32>,
    vector_table: HardwareRegion<'a, VectorEntry>,
    memory_map: MemoryMapTable<'a>,
    timing: Timing,
}

impl<'a, S: GlyphSink> EarlyInit<'a, S> {
    pub fn new(
        display: DisplayWriter<S>,
        touch_region: HardwareRegion<'a, u32>,
        vector_table: HardwareRegion<'a, VectorEntry>,
        memory_map: MemoryMapTable<'a>,
        timing: Timing,
    ) -> Self {
        Self { display, touch_region, vector_table, memory_map, timing }
    }

    pub fn display(&self) -> &DisplayWriter<S> {
        &self.display
    }

    /// Give up everything but the display.
    pub fn into_display(self) -> DisplayWriter<S> {
        self.display
    }

    pub fn run(&mut self) -> InitReport {
        self.display.clear();
        self.display.print("Kernel booted successfully!\n", HEADLINE);
        self.display.print("Initializing system components...\n", PROGRESS);
        serial_println!("[init] image running");

        let map = self.read_memory_map();
        self.pause();

        self.display.print("Setting up memory...\n", MEMORY);
        let touch = self.touch_memory();
        self.pause();

        self.display.print("Configuring interrupts...\n", VECTORS);
        vectors::install_stub_table(&mut self.vector_table);
        self.display.print("Interrupt Descriptor Table setup complete\n", MEMORY);
        serial_println!("[init] {} stub vectors installed", self.vector_table.len());
        self.pause();

        self.display.print("Drawing startup pattern...\n", PATTERN);
        pattern::draw_pattern(&mut self.display, self.timing.cell_delay);
        self.pause();

        self.display.clear();
        self.display.print("System ready!\n", READY);
        self.display.print("Starting shell...\n", PROGRESS);
        serial_println!("[init] ready");

        InitReport { memory_regions: map.len(), usable_bytes: map.usable_bytes(), touch }
    }

    fn read_memory_map(&mut self) -> MemoryMap {
        let map = self.memory_map.read();
        for region in map.regions() {
            serial_println!("[mem] {:#010x}..{:#010x} {:?}", region.base(), region.end(), region.kind());
        }
        serial_println!("[mem] {} regions from loader, {} KiB usable", map.len(), map.usable_bytes() / 1024);
        map
    }

    fn touch_memory(&mut self) -> Result<(), TouchError> {
        let result = memtouch::touch(&mut self.touch_region);
        match result {
            Ok(()) => {
                self.display.print("Memory initialized at ", PROGRESS);
                self.display.print_hex(self.touch_region.base_addr() as u32, PROGRESS);
                self.display.put_char(b'\n', PROGRESS);
                serial_println!("[init] touched {} words", self.touch_region.len());
            }
            Err(err) => {
                // Same text as the error's Display, built without core::fmt.
                let TouchError::Mismatch { offset, found } = err;
                self.display.print("Memory touch mismatch at +", Attribute::ERROR);
                self.display.print_hex(offset as u32, Attribute::ERROR);
                self.display.print(": read ", Attribute::ERROR);
                self.display.print_hex(found, Attribute::ERROR);
                self.display.put_char(b'\n', Attribute::ERROR);
                serial_println!("[init] {}", err);
            }
        }
        result
    }

    fn pause(&self) {
        wait::busy_delay(self.timing.step_delay);
    }
}
