//! EmberOS image, binary entry.
//!
//! The loader calls the first byte of the image at 0x1000 with
//! interrupts disabled and its own stack still in place. The whole image
//! must fit the six sectors the loader reads, so nothing on this path
//! formats with `core::fmt` unless the `trace` feature is on.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod entry {
    use core::panic::PanicInfo;

    use emberos_kernel::{memtouch, vectors, EarlyInit, InputLoop, Timing};
    use emberos_platform::arch::x86;
    use emberos_platform::{serial_println, Attribute, DisplayWriter, HardwarePorts, MemoryMapTable, TextBuffer};

    #[no_mangle]
    #[link_section = ".text.entry"]
    pub extern "C" fn kernel_main() -> ! {
        #[cfg(feature = "trace")]
        x86::serial::SERIAL.lock().init();
        serial_println!("[init] EmberOS image entered");

        // Safety: the loader is gone; every fixed region is bound once.
        let mut init = unsafe {
            EarlyInit::new(
                DisplayWriter::new(TextBuffer::fixed()),
                memtouch::fixed_region(),
                vectors::fixed_table(),
                MemoryMapTable::fixed(),
                Timing::HARDWARE,
            )
        };
        let report = init.run();
        serial_println!("[init] {:?}", report);

        let mut display = init.into_display();
        InputLoop::new(HardwarePorts, &mut display).run()
    }

    /// Also the report for an input loop that somehow returned.
    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        serial_println!("!!! KERNEL PANIC !!!");
        serial_println!("{}", info);
        // Safety: nothing runs after this handler.
        let mut display = DisplayWriter::new(unsafe { TextBuffer::fixed() });
        display.print("Kernel halted unexpectedly!\n", Attribute::ERROR);
        x86::halt_forever()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
