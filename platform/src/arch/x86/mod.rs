/// x86 platform primitives.
///
/// Every CPU intrinsic used by the loader and the image lives here:
/// - Port I/O (in/out instructions, byte and word width)
/// - Interrupt flag control and halting
/// - Data segment normalization
/// - Stack switching and calls into loaded code
///
/// Nothing outside this module emits inline assembly.
pub mod serial;

/// Halt the CPU until the next interrupt.
#[inline(always)]
pub fn hlt() {
    unsafe { core::arch::asm!("hlt", options(nostack, nomem)); }
}

/// Disable interrupts.
#[inline(always)]
pub fn cli() {
    unsafe { core::arch::asm!("cli", options(nostack, nomem)); }
}

/// Park the processor. Interrupts stay disabled, so only an external
/// reset leaves this loop.
pub fn halt_forever() -> ! {
    cli();
    loop {
        hlt();
    }
}

/// Write a byte to an I/O port.
#[inline(always)]
pub fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") val,
            options(nostack, preserves_flags),
        );
    }
}

/// Read a byte from an I/O port.
#[inline(always)]
pub fn inb(port: u16) -> u8 {
    let val: u8;
    unsafe {
        core::arch::asm!(
            "in al, dx",
            in("dx") port,
            out("al") val,
            options(nostack, preserves_flags),
        );
    }
    val
}

/// Write a 16-bit value to an I/O port.
#[inline(always)]
pub fn outw(port: u16, val: u16) {
    unsafe {
        core::arch::asm!(
            "out dx, ax",
            in("dx") port,
            in("ax") val,
            options(nostack, preserves_flags),
        );
    }
}

/// Read a 16-bit value from an I/O port.
#[inline(always)]
pub fn inw(port: u16) -> u16 {
    let val: u16;
    unsafe {
        core::arch::asm!(
            "in ax, dx",
            in("dx") port,
            out("ax") val,
            options(nostack, preserves_flags),
        );
    }
    val
}

/// Small I/O delay: a write to the unused POST diagnostic port.
#[inline(always)]
pub fn io_wait() {
    outb(0x80, 0);
}

/// Load DS, ES, FS and GS with `segment`.
///
/// # Safety
/// Every live reference into a data segment must remain valid under the
/// new base. Only called from the boot entry, before any such reference
/// exists.
pub unsafe fn load_data_segments(segment: u16) {
    unsafe {
        core::arch::asm!(
            "mov ds, {0:x}",
            "mov es, {0:x}",
            "mov fs, {0:x}",
            "mov gs, {0:x}",
            in(reg) segment,
            options(nostack, preserves_flags),
        );
    }
}

/// Point the stack at `top` and call `entry` on the fresh stack.
///
/// The old stack is abandoned, not unwound: anything `entry` needs from
/// the caller must live in static storage.
///
/// # Safety
/// `top` must be the upper end of writable memory that no live data
/// occupies.
#[cfg(target_arch = "x86")]
pub unsafe fn switch_stack(top: u32, entry: extern "C" fn() -> !) -> ! {
    unsafe {
        core::arch::asm!(
            "mov esp, {top:e}",
            "xor ebp, ebp",
            "call {entry:e}",
            "2:",
            "hlt",
            "jmp 2b",
            top = in(reg) top,
            entry = in(reg) entry,
            options(noreturn),
        );
    }
}

/// Point the stack at `top` and call `entry` on the fresh stack.
///
/// # Safety
/// See the 32-bit variant.
#[cfg(target_arch = "x86_64")]
pub unsafe fn switch_stack(top: u32, entry: extern "C" fn() -> !) -> ! {
    unsafe {
        core::arch::asm!(
            "mov rsp, {top}",
            "and rsp, -16",
            "xor ebp, ebp",
            "call {entry}",
            "2:",
            "hlt",
            "jmp 2b",
            top = in(reg) top as u64,
            entry = in(reg) entry,
            options(noreturn),
        );
    }
}

/// Call the code at physical address `entry`.
///
/// Returns only if the called code returns.
///
/// # Safety
/// `entry` must hold executable code that follows the C calling
/// convention for a function taking no arguments.
pub unsafe fn call_entry(entry: u32) {
    let entry_point: extern "C" fn() =
        unsafe { core::mem::transmute(entry as usize as *const ()) };
    entry_point();
}
