/// Stub interrupt vector table.
///
/// Interrupts stay disabled for the life of the image, so the table is
/// inert: every one of the 256 slots gets the same not-yet-wired gate
/// (offset 0, code selector 0x08, present interrupt gate). The point is
/// that no slot is left holding whatever was in memory before.
use emberos_platform::layout::{VECTOR_TABLE_BASE, VECTOR_TABLE_END};
use emberos_platform::HardwareRegion;

pub const VECTOR_COUNT: usize = 256;

/// Code segment selector every stub entry points at.
pub const STUB_SELECTOR: u16 = 0x08;

/// Present | 32-bit interrupt gate | DPL 0.
pub const STUB_ATTRIBUTES: u8 = 0x8E;

/// One 8-byte gate descriptor.
#[repr(C, packed)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VectorEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

static_assertions::const_assert_eq!(core::mem::size_of::<VectorEntry>(), 8);
static_assertions::const_assert_eq!(
    VECTOR_COUNT * core::mem::size_of::<VectorEntry>(),
    (VECTOR_TABLE_END.as_u32() - VECTOR_TABLE_BASE.as_u32()) as usize
);

impl VectorEntry {
    pub const fn gate(handler: u32, selector: u16, type_attr: u8) -> Self {
        Self {
            offset_low: handler as u16,
            selector,
            zero: 0,
            type_attr,
            offset_high: (handler >> 16) as u16,
        }
    }

    /// The placeholder installed in every slot.
    pub const fn stub() -> Self {
        Self::gate(0, STUB_SELECTOR, STUB_ATTRIBUTES)
    }

    pub fn handler(&self) -> u32 {
        let (low, high) = (self.offset_low, self.offset_high);
        ((high as u32) << 16) | low as u32
    }

    pub fn selector(&self) -> u16 {
        self.selector
    }

    pub fn type_attr(&self) -> u8 {
        self.type_attr
    }
}

impl core::fmt::Debug for VectorEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VectorEntry")
            .field("handler", &format_args!("{:#x}", self.handler()))
            .field("selector", &format_args!("{:#x}", self.selector()))
            .field("type_attr", &format_args!("{:#x}", self.type_attr()))
            .finish()
    }
}

/// The table at its fixed address.
///
/// # Safety
/// The low 2 KiB of physical memory must not be in use by anything else.
/// The real-mode firmware vectors there are overwritten.
pub unsafe fn fixed_table() -> HardwareRegion<'static, VectorEntry> {
    unsafe { HardwareRegion::at(VECTOR_TABLE_BASE, VECTOR_COUNT) }
}

/// Fill every slot of `table` with the stub gate.
pub fn install_stub_table(table: &mut HardwareRegion<'_, VectorEntry>) {
    table.fill(VectorEntry::stub());
}
