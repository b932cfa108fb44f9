//! EmberOS boot loader, binary entry.
//!
//! Two stages share this binary. The firmware runs the 512-byte first
//! stage at 0x7C00: it opens the A20 gate, lifts the data segment limits
//! to 4 GiB without leaving real mode, reads the loader stage from the
//! blocks after the image into 0x9000 and jumps to `loader_main`. That
//! builds the controller over the real hardware and drives it until it
//! transfers control or halts.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod entry {
    use core::fmt::Write;
    use core::panic::PanicInfo;

    use emberos_boot::disk::{Ata, HEADS, MAX_ATTEMPTS, SECTORS_PER_TRACK};
    use emberos_boot::{BootConfig, BootController, HardwarePlatform, ParkingSlot, Step};
    use emberos_platform::arch::x86;
    use emberos_platform::layout::{
        INITIAL_STACK_TOP, LOADER_STAGE_ADDR, LOADER_STAGE_FIRST_LBA, SECTOR_SIZE,
    };
    use emberos_platform::{
        serial_println, Attribute, DisplayWriter, HardwarePorts, HardwareRegion, MemoryMapTable,
        PhysAddr, TextBuffer,
    };

    type Loader = BootController<'static, HardwarePlatform, HardwarePorts, TextBuffer<'static>>;

    /// The controller while it crosses a stack switch.
    static LOADER: ParkingSlot<Loader> = ParkingSlot::new();

    // First stage. `loader_stage_sectors` comes from the linker script.
    core::arch::global_asm!(
        ".section .boot, \"ax\"",
        ".code16",
        ".global _start",
        "_start:",
        "    cli",
        // ljmp 0000:2f
        "    .byte 0xEA",
        "    .word 2f",
        "    .word 0",
        "2:",
        "    xor ax, ax",
        "    mov ds, ax",
        "    mov es, ax",
        "    mov ss, ax",
        "    mov sp, {stack}",
        "    mov byte ptr [stage1_drive], dl",
        // Fast A20.
        "    in al, 0x92",
        "    or al, 2",
        "    and al, 0xFE",
        "    out 0x92, al",
        // Load flat 4 GiB descriptors into the data segment caches, then
        // return to real mode with zero bases.
        "    lgdt [stage1_gdt_ptr]",
        "    mov eax, cr0",
        "    or al, 1",
        "    mov cr0, eax",
        "    mov bx, 0x08",
        "    mov ds, bx",
        "    mov es, bx",
        "    mov fs, bx",
        "    mov gs, bx",
        "    and al, 0xFE",
        "    mov cr0, eax",
        "    xor ax, ax",
        "    mov ds, ax",
        "    mov es, ax",
        "    mov fs, ax",
        "    mov gs, ax",
        "    sti",
        // si = block, es:bx = destination, cx = blocks left.
        "    mov si, {stage_lba}",
        "    mov bx, {stage_addr}",
        "    mov cx, offset loader_stage_sectors",
        "3:",
        "    mov di, {attempts}",
        "4:",
        "    push cx",
        "    mov ax, si",
        "    xor dx, dx",
        "    mov bp, {sectors_per_track}",
        "    div bp",
        "    mov cl, dl",
        "    inc cl",
        "    xor dx, dx",
        "    mov bp, {heads}",
        "    div bp",
        "    mov dh, dl",
        "    mov ch, al",
        "    shl ah, 6",
        "    or cl, ah",
        "    mov dl, byte ptr [stage1_drive]",
        "    mov ax, 0x0201",
        "    int 0x13",
        "    pop cx",
        "    jnc 5f",
        "    xor ax, ax",
        "    mov dl, byte ptr [stage1_drive]",
        "    int 0x13",
        "    dec di",
        "    jnz 4b",
        "    jmp 6f",
        "5:",
        "    add bx, {sector_size}",
        "    inc si",
        "    dec cx",
        "    jnz 3b",
        "    cli",
        "    jmp {entry}",
        "6:",
        "    mov si, offset stage1_failed",
        "7:",
        "    lodsb",
        "    test al, al",
        "    jz 8f",
        "    mov ah, 0x0E",
        "    xor bx, bx",
        "    int 0x10",
        "    jmp 7b",
        "8:",
        "    cli",
        "    hlt",
        "    jmp 8b",
        "stage1_failed:",
        "    .asciz \"Loader stage read failed\"",
        "stage1_drive:",
        "    .byte 0",
        "    .p2align 3",
        "stage1_gdt:",
        "    .quad 0",
        "    .quad 0x00CF92000000FFFF",
        "stage1_gdt_ptr:",
        "    .word 15",
        "    .long stage1_gdt",
        stack = const INITIAL_STACK_TOP,
        stage_lba = const LOADER_STAGE_FIRST_LBA,
        stage_addr = const LOADER_STAGE_ADDR.as_u32(),
        attempts = const MAX_ATTEMPTS,
        sectors_per_track = const SECTORS_PER_TRACK,
        heads = const HEADS,
        sector_size = const SECTOR_SIZE,
        entry = sym loader_main,
    );

    #[used]
    #[link_section = ".signature"]
    static BOOT_SIGNATURE: u16 = emberos_platform::layout::BOOT_SIGNATURE;

    #[no_mangle]
    extern "C" fn loader_main() -> ! {
        #[cfg(feature = "trace")]
        x86::serial::SERIAL.lock().init();
        serial_println!("[boot] EmberOS loader stage");

        let config = BootConfig::DEFAULT;
        // Safety: each fixed region is bound exactly once, here, and none
        // of them overlaps the loader stage or its stack.
        let loader = unsafe {
            BootController::new(
                HardwarePlatform,
                Ata::new(HardwarePorts),
                DisplayWriter::new(TextBuffer::fixed()),
                HardwareRegion::at(config.load_address, config.image_sectors * SECTOR_SIZE),
                MemoryMapTable::fixed(),
                config,
            )
        };
        drive(loader)
    }

    /// Continue on the loader stack.
    extern "C" fn resume() -> ! {
        match LOADER.take() {
            Some(loader) => drive(loader),
            None => x86::halt_forever(),
        }
    }

    fn drive(mut loader: Loader) -> ! {
        match loader.drive(enter_image) {
            Step::SwitchStack(top) => {
                serial_println!("[boot] stack -> {:#x}", top);
                LOADER.park(loader);
                // Safety: the loader stack grows down from the loader stage
                // toward the end of the memory map table; the controller
                // now lives in static storage.
                unsafe { x86::switch_stack(top, resume) }
            }
            _ => x86::halt_forever(),
        }
    }

    fn enter_image(entry: PhysAddr) {
        // Safety: the controller only reports a transfer after the whole
        // image was loaded at `entry`.
        unsafe { x86::call_entry(entry.as_u32()) }
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        serial_println!("!!! LOADER PANIC !!!");
        serial_println!("{}", info);
        // Safety: the panic path never returns to the code holding the
        // controller that owns the display.
        let mut display = DisplayWriter::new(unsafe { TextBuffer::fixed() });
        let _ = write!(display.paint(Attribute::ERROR), "Loader panic: {}", info.message());
        x86::halt_forever()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
