/// Port I/O seam.
///
/// Disk and keyboard code talk to hardware through `PortIo` so tests can
/// substitute register-level mocks for the real I/O address space.
use crate::arch::x86;

/// Byte and word access to the I/O address space.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
    fn read_u16(&mut self, port: u16) -> u16;
    fn write_u16(&mut self, port: u16, value: u16);
}

/// The machine's real I/O ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwarePorts;

impl PortIo for HardwarePorts {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        x86::inb(port)
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        x86::outb(port, value)
    }

    #[inline]
    fn read_u16(&mut self, port: u16) -> u16 {
        x86::inw(port)
    }

    #[inline]
    fn write_u16(&mut self, port: u16, value: u16) {
        x86::outw(port, value)
    }
}

impl<P: PortIo + ?Sized> PortIo for &mut P {
    fn read_u8(&mut self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        (**self).read_u16(port)
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        (**self).write_u16(port, value)
    }
}
