/// Hardware regions: typed, bounds-checked views of fixed physical memory.
///
/// The display buffer, the memory-map table, the vector table and the
/// image destination are all fixed-address structures. Each is reached
/// through a `HardwareRegion` bound to a base address and an element
/// count; this is the only place in the tree that turns an address into
/// a pointer. Tests bind regions to ordinary slices instead.
use core::fmt;
use core::marker::PhantomData;

/// A physical address. Real mode and flat 32-bit mode both identity-map
/// the low 4 GiB, so the value doubles as a pointer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u32);

impl PhysAddr {
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn offset(self, bytes: u32) -> Self {
        Self(self.0 + bytes)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Exclusive, typed access to `len` consecutive `T` records.
///
/// All element accesses are volatile: the memory behind a region is
/// observed by hardware or by code running after us.
pub struct HardwareRegion<'a, T: Copy> {
    base: *mut T,
    len: usize,
    _owner: PhantomData<&'a mut [T]>,
}

// A region is the only handle to its memory, so moving it between
// contexts moves that exclusive access with it.
unsafe impl<T: Copy + Send> Send for HardwareRegion<'_, T> {}

impl<T: Copy> HardwareRegion<'static, T> {
    /// Bind a region to `len` records at physical address `base`.
    ///
    /// # Safety
    /// The range must be identity-mapped, suitably aligned for `T`, and
    /// not reachable through any other live region or reference.
    pub const unsafe fn at(base: PhysAddr, len: usize) -> Self {
        Self {
            base: base.as_u32() as usize as *mut T,
            len,
            _owner: PhantomData,
        }
    }
}

impl<'a, T: Copy> HardwareRegion<'a, T> {
    /// Bind a region to ordinary memory.
    pub fn from_slice(slice: &'a mut [T]) -> Self {
        Self {
            base: slice.as_mut_ptr(),
            len: slice.len(),
            _owner: PhantomData,
        }
    }

    /// Number of `T` records in the region.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first record.
    pub fn base_addr(&self) -> usize {
        self.base as usize
    }

    /// Read record `index`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn read(&self, index: usize) -> T {
        assert!(index < self.len, "region read out of bounds");
        // Safety: in bounds, and the constructor guaranteed validity.
        unsafe { self.base.add(index).read_volatile() }
    }

    /// Write record `index`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn write(&mut self, index: usize, value: T) {
        assert!(index < self.len, "region write out of bounds");
        // Safety: in bounds, and the constructor guaranteed validity.
        unsafe { self.base.add(index).write_volatile(value) }
    }

    /// Copy `src` into the region starting at record `offset`.
    pub fn write_slice(&mut self, offset: usize, src: &[T]) {
        assert!(
            offset <= self.len && src.len() <= self.len - offset,
            "region slice write out of bounds"
        );
        for (i, value) in src.iter().enumerate() {
            // Safety: bounds checked above.
            unsafe { self.base.add(offset + i).write_volatile(*value) }
        }
    }

    /// Set every record to `value`.
    pub fn fill(&mut self, value: T) {
        for i in 0..self.len {
            // Safety: i < len.
            unsafe { self.base.add(i).write_volatile(value) }
        }
    }
}
