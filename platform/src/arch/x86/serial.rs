/// Serial port logger (COM1, 0x3F8), output only.
///
/// Debug logging for both stages goes through `serial_println!`. The
/// display carries the user-facing messages; serial carries the trace.
/// Output is compiled in only when the calling crate enables its
/// `trace` feature: the image has no room for `core::fmt`.
use core::fmt;
use spin::Mutex;

const COM1: u16 = 0x3F8;

pub static SERIAL: Mutex<Serial> = Mutex::new(Serial::new(COM1));

pub struct Serial {
    port: u16,
}

impl Serial {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }

    /// Initialize the serial port (8N1, 115200 baud, no interrupts).
    pub fn init(&self) {
        super::outb(self.port + 1, 0x00); // Disable interrupts
        super::outb(self.port + 3, 0x80); // Enable DLAB (set baud rate divisor)
        super::outb(self.port, 0x01); // 115200 baud (divisor 1, low byte)
        super::outb(self.port + 1, 0x00); // (divisor 1, high byte)
        super::outb(self.port + 3, 0x03); // 8 bits, no parity, one stop bit
        super::outb(self.port + 2, 0xC7); // Enable FIFO, clear, 14-byte threshold
        super::outb(self.port + 4, 0x03); // RTS/DTR set, OUT2 clear: no IRQ line
    }

    /// Check if the transmit buffer is empty.
    fn is_transmit_empty(&self) -> bool {
        super::inb(self.port + 5) & 0x20 != 0
    }

    /// Write a single byte, waiting for the transmit buffer.
    pub fn write_byte(&self, byte: u8) {
        crate::wait::poll_until(|| self.is_transmit_empty());
        super::outb(self.port, byte);
    }

    /// Write a string, expanding `\n` to CRLF.
    pub fn write_str_raw(&self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}

impl fmt::Write for Serial {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_str_raw(s);
        Ok(())
    }
}

/// Print to the serial console.
///
/// Without the calling crate's `trace` feature, and in its unit-test
/// build, the arguments are still type-checked but nothing is written.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        {
            #[cfg(all(feature = "trace", not(test)))]
            {
                use core::fmt::Write;
                let mut serial = $crate::arch::x86::serial::SERIAL.lock();
                let _ = write!(serial, $($arg)*);
            }
            #[cfg(not(all(feature = "trace", not(test))))]
            {
                let _ = format_args!($($arg)*);
            }
        }
    };
}

/// Print to the serial console with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => {
        $crate::serial_print!("{}\n", format_args!($($arg)*))
    };
}
