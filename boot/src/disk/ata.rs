/// Legacy ATA controller driver, primary channel, CHS addressing, PIO.
///
/// Every transfer is one sector. A transfer whose status reports an
/// error is retried up to `MAX_ATTEMPTS` times in total, with a software
/// reset of the channel between consecutive attempts. Busy waits have no
/// timeout.
use bitflags::bitflags;
use emberos_platform::{serial_println, wait, PortIo};

use super::chs::Chs;
use super::{DiskError, SectorBuf, SectorDevice, SECTOR_SIZE};

/// Primary channel register ports.
mod regs {
    pub const DATA: u16 = 0x1F0;
    pub const SECTOR_COUNT: u16 = 0x1F2;
    pub const SECTOR: u16 = 0x1F3;
    pub const CYLINDER_LOW: u16 = 0x1F4;
    pub const CYLINDER_HIGH: u16 = 0x1F5;
    pub const DRIVE_HEAD: u16 = 0x1F6;
    pub const STATUS: u16 = 0x1F7; // read
    pub const COMMAND: u16 = 0x1F7; // write
    pub const ALT_STATUS: u16 = 0x3F6; // read
    pub const CONTROL: u16 = 0x3F6; // write
}

/// Command opcodes.
mod cmd {
    pub const READ_SECTORS: u8 = 0x20;
    pub const WRITE_SECTORS: u8 = 0x30;
    pub const IDENTIFY: u8 = 0xEC;
}

/// Device control register: software reset.
const CONTROL_SRST: u8 = 0x04;
/// Device control register: interrupts off.
const CONTROL_NIEN: u8 = 0x02;

/// Total attempts per sector before a transfer is reported failed.
pub const MAX_ATTEMPTS: u32 = 5;

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const ERR  = 0x01;
        const DRQ  = 0x08;
        const DF   = 0x20;
        const DRDY = 0x40;
        const BSY  = 0x80;
    }
}

/// A firmware drive number (0x80 = first hard disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drive(pub u8);

impl Drive {
    pub const FIRST_HARD_DISK: Drive = Drive(0x80);

    /// Drive/head register value for this drive and `head`. Only the low
    /// bit of the drive number picks master or slave on the channel.
    pub fn select(self, head: u8) -> u8 {
        0xA0 | ((self.0 & 0x01) << 4) | (head & 0x0F)
    }
}

/// The ATA controller on the primary channel.
pub struct Ata<P: PortIo> {
    ports: P,
}

impl<P: PortIo> Ata<P> {
    pub fn new(ports: P) -> Self {
        Self { ports }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    fn status(&mut self) -> Status {
        Status::from_bits_retain(self.ports.read_u8(regs::STATUS))
    }

    /// Block until the controller clears BSY; returns the final status.
    fn wait_not_busy(&mut self) -> Status {
        let mut status = Status::empty();
        wait::poll_until(|| {
            status = self.status();
            !status.contains(Status::BSY)
        });
        status
    }

    /// Issue IDENTIFY to `drive` and report whether anything answered.
    ///
    /// An all-zero status means no device; all-ones is a floating bus.
    /// Neither is waited on, so an empty channel cannot stall detection.
    pub fn detect(&mut self, drive: Drive) -> bool {
        self.ports.write_u8(regs::DRIVE_HEAD, drive.select(0));
        self.ports.write_u8(regs::COMMAND, cmd::IDENTIFY);

        let raw = self.ports.read_u8(regs::STATUS);
        if raw == 0x00 || raw == 0xFF {
            serial_println!("[disk] drive {:#x}: no device (status {:#04x})", drive.0, raw);
            return false;
        }

        let status = self.wait_not_busy();
        if status.contains(Status::DRQ) {
            // Drain the identify block so the device is idle again.
            for _ in 0..SECTOR_SIZE / 2 {
                self.ports.read_u16(regs::DATA);
            }
        }
        serial_println!("[disk] drive {:#x}: present (status {:#04x})", drive.0, status.bits());
        true
    }

    /// Software-reset the channel and wait for `drive` to come back.
    pub fn reset(&mut self, drive: Drive) {
        self.ports.write_u8(regs::CONTROL, CONTROL_SRST | CONTROL_NIEN);
        // Four alternate-status reads give the ~400ns the reset needs.
        for _ in 0..4 {
            self.ports.read_u8(regs::ALT_STATUS);
        }
        self.ports.write_u8(regs::CONTROL, CONTROL_NIEN);
        self.ports.write_u8(regs::DRIVE_HEAD, drive.select(0));
        self.wait_not_busy();
    }

    /// Program the task file for a one-sector command at `chs`.
    fn issue(&mut self, drive: Drive, chs: Chs, command: u8) {
        self.ports.write_u8(regs::DRIVE_HEAD, drive.select(chs.head));
        self.ports.write_u8(regs::SECTOR_COUNT, 1);
        self.ports.write_u8(regs::SECTOR, chs.sector);
        self.ports.write_u8(regs::CYLINDER_LOW, (chs.cylinder & 0xFF) as u8);
        self.ports.write_u8(regs::CYLINDER_HIGH, ((chs.cylinder >> 8) & 0xFF) as u8);
        self.ports.write_u8(regs::COMMAND, command);
    }

    /// Run one-sector `command` at `lba` under the retry policy. `data`
    /// moves the sector once the device accepted the command and returns
    /// whether the data phase succeeded.
    fn transfer(
        &mut self,
        drive: Drive,
        lba: u32,
        command: u8,
        mut data: impl FnMut(&mut Self) -> bool,
    ) -> Result<(), DiskError> {
        let chs = Chs::from_lba(lba);
        if !chs.is_addressable() {
            return Err(DiskError::AddressOutOfRange { lba });
        }

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                self.reset(drive);
            }

            self.wait_not_busy();
            self.issue(drive, chs, command);
            let status = self.wait_not_busy();

            if !status.intersects(Status::ERR | Status::DF) && data(self) {
                return Ok(());
            }
            serial_println!(
                "[disk] block {} (c={} h={} s={}) attempt {}/{} failed",
                lba, chs.cylinder, chs.head, chs.sector, attempt, MAX_ATTEMPTS
            );
        }

        Err(DiskError::RetriesExhausted { lba, attempts: MAX_ATTEMPTS })
    }

    /// Read block `lba` of `drive` into `buf`.
    ///
    /// The data register delivers 16-bit words, low byte first.
    pub fn read_sector(&mut self, drive: Drive, lba: u32, buf: &mut SectorBuf) -> Result<(), DiskError> {
        self.transfer(drive, lba, cmd::READ_SECTORS, |ata| {
            for pair in buf.chunks_exact_mut(2) {
                let word = ata.ports.read_u16(regs::DATA);
                pair[0] = (word & 0xFF) as u8;
                pair[1] = (word >> 8) as u8;
            }
            true
        })
    }

    /// Write `buf` to block `lba` of `drive`.
    pub fn write_sector(&mut self, drive: Drive, lba: u32, buf: &SectorBuf) -> Result<(), DiskError> {
        self.transfer(drive, lba, cmd::WRITE_SECTORS, |ata| {
            for pair in buf.chunks_exact(2) {
                ata.ports.write_u16(regs::DATA, u16::from(pair[0]) | (u16::from(pair[1]) << 8));
            }
            !ata.wait_not_busy().intersects(Status::ERR | Status::DF)
        })
    }

    /// Detect `drive` and hand it out as a sector device.
    pub fn attach(&mut self, drive: Drive) -> Result<AtaDisk<'_, P>, DiskError> {
        if self.detect(drive) {
            Ok(AtaDisk { ata: self, drive })
        } else {
            Err(DiskError::DeviceNotPresent)
        }
    }
}

/// A detected drive on an `Ata` controller.
pub struct AtaDisk<'a, P: PortIo> {
    ata: &'a mut Ata<P>,
    drive: Drive,
}

impl<P: PortIo> AtaDisk<'_, P> {
    pub fn drive(&self) -> Drive {
        self.drive
    }
}

impl<P: PortIo> SectorDevice for AtaDisk<'_, P> {
    fn read_sector(&mut self, lba: u32, buf: &mut SectorBuf) -> Result<(), DiskError> {
        self.ata.read_sector(self.drive, lba, buf)
    }

    fn write_sector(&mut self, lba: u32, buf: &SectorBuf) -> Result<(), DiskError> {
        self.ata.write_sector(self.drive, lba, buf)
    }
}
