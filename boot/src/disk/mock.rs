/// Test doubles for the disk subsystem.
///
/// - `MockAta`: a register-level primary ATA channel behind `PortIo`,
///   with scripted failures and busy periods, recording every command.
/// - `RamDisk`: a RAM-backed `SectorDevice` that records reads.
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec;
use alloc::vec::Vec;

use emberos_platform::PortIo;

use super::{Chs, DiskError, SectorBuf, SectorDevice, SECTOR_SIZE};

const DATA: u16 = 0x1F0;
const SECTOR_COUNT: u16 = 0x1F2;
const SECTOR: u16 = 0x1F3;
const CYLINDER_LOW: u16 = 0x1F4;
const CYLINDER_HIGH: u16 = 0x1F5;
const DRIVE_HEAD: u16 = 0x1F6;
const STATUS_COMMAND: u16 = 0x1F7;
const CONTROL: u16 = 0x3F6;

const ERR: u8 = 0x01;
const DRQ: u8 = 0x08;
const DRDY: u8 = 0x40;
const BSY: u8 = 0x80;

/// Something the mock controller observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Command { command: u8, lba: u32 },
    Reset,
}

/// A primary ATA channel with one drive backed by RAM.
pub struct MockAta {
    present: bool,
    sectors: Vec<SectorBuf>,
    drive_head: u8,
    sector: u8,
    cylinder_low: u8,
    cylinder_high: u8,
    status: u8,
    busy_polls: u32,
    busy_after_command: u32,
    read_queue: VecDeque<u16>,
    write_words: Vec<u16>,
    pending_write: Option<u32>,
    failures: BTreeMap<u32, u32>,
    events: Vec<Event>,
}

impl MockAta {
    /// A present drive with `sector_count` sectors; byte `i` of sector
    /// `lba` holds `pattern_byte(lba, i)`.
    pub fn with_sectors(sector_count: u32) -> Self {
        let sectors = (0..sector_count)
            .map(|lba| {
                let mut sector = [0u8; SECTOR_SIZE];
                for (i, byte) in sector.iter_mut().enumerate() {
                    *byte = pattern_byte(lba, i);
                }
                sector
            })
            .collect();
        Self {
            present: true,
            sectors,
            drive_head: 0,
            sector: 0,
            cylinder_low: 0,
            cylinder_high: 0,
            status: DRDY,
            busy_polls: 0,
            busy_after_command: 0,
            read_queue: VecDeque::new(),
            write_words: Vec::new(),
            pending_write: None,
            failures: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// An empty channel: the status register reads back zero.
    pub fn absent() -> Self {
        Self { present: false, ..Self::with_sectors(0) }
    }

    /// Report BSY for `polls` status reads after every command.
    pub fn busy_for(mut self, polls: u32) -> Self {
        self.busy_after_command = polls;
        self
    }

    /// Fail every command at `lba`.
    pub fn fail_always(&mut self, lba: u32) {
        self.failures.insert(lba, u32::MAX);
    }

    /// Fail the next `times` commands at `lba`, then succeed.
    pub fn fail_times(&mut self, lba: u32, times: u32) {
        self.failures.insert(lba, times);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Blocks of every READ SECTORS command, in issue order.
    pub fn reads(&self) -> Vec<u32> {
        self.commands(0x20)
    }

    /// Blocks of every WRITE SECTORS command, in issue order.
    pub fn writes(&self) -> Vec<u32> {
        self.commands(0x30)
    }

    pub fn reset_count(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Reset).count()
    }

    pub fn sector(&self, lba: u32) -> &SectorBuf {
        &self.sectors[lba as usize]
    }

    fn commands(&self, opcode: u8) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Command { command, lba } if command == opcode => Some(lba),
                _ => None,
            })
            .collect()
    }

    fn task_file_lba(&self) -> u32 {
        let chs = Chs {
            cylinder: u32::from(self.cylinder_low) | (u32::from(self.cylinder_high) << 8),
            head: self.drive_head & 0x0F,
            // IDENTIFY leaves the sector register untouched.
            sector: self.sector.max(1),
        };
        chs.to_lba()
    }

    fn should_fail(&mut self, lba: u32) -> bool {
        if lba as usize >= self.sectors.len() {
            return true;
        }
        match self.failures.get_mut(&lba) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                true
            }
            _ => false,
        }
    }

    fn command(&mut self, command: u8) {
        if !self.present {
            return;
        }
        let lba = self.task_file_lba();
        self.events.push(Event::Command { command, lba });
        self.busy_polls = self.busy_after_command;
        self.read_queue.clear();
        self.pending_write = None;

        match command {
            0xEC => self.status = DRDY,
            0x20 => {
                if self.should_fail(lba) {
                    self.status = DRDY | ERR;
                } else {
                    let sector = self.sectors[lba as usize];
                    self.read_queue = sector
                        .chunks_exact(2)
                        .map(|pair| u16::from(pair[0]) | (u16::from(pair[1]) << 8))
                        .collect();
                    self.status = DRDY | DRQ;
                }
            }
            0x30 => {
                if self.should_fail(lba) {
                    self.status = DRDY | ERR;
                } else {
                    self.write_words.clear();
                    self.pending_write = Some(lba);
                    self.status = DRDY | DRQ;
                }
            }
            _ => self.status = DRDY | ERR,
        }
    }
}

impl PortIo for MockAta {
    fn read_u8(&mut self, port: u16) -> u8 {
        if !self.present {
            return 0;
        }
        match port {
            STATUS_COMMAND | CONTROL => {
                if self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    BSY
                } else {
                    self.status
                }
            }
            _ => 0,
        }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        match port {
            SECTOR_COUNT => assert_eq!(value, 1, "driver only issues one-sector commands"),
            SECTOR => self.sector = value,
            CYLINDER_LOW => self.cylinder_low = value,
            CYLINDER_HIGH => self.cylinder_high = value,
            DRIVE_HEAD => self.drive_head = value,
            STATUS_COMMAND => self.command(value),
            CONTROL if value & 0x04 != 0 && self.present => {
                self.events.push(Event::Reset);
                self.read_queue.clear();
                self.pending_write = None;
                self.status = DRDY;
            }
            _ => {}
        }
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        if port != DATA {
            return 0;
        }
        let word = self.read_queue.pop_front().unwrap_or(0);
        if self.read_queue.is_empty() {
            self.status &= !DRQ;
        }
        word
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        if port != DATA {
            return;
        }
        let Some(lba) = self.pending_write else { return };
        self.write_words.push(value);
        if self.write_words.len() == SECTOR_SIZE / 2 {
            let sector = &mut self.sectors[lba as usize];
            for (pair, word) in sector.chunks_exact_mut(2).zip(&self.write_words) {
                pair[0] = (*word & 0xFF) as u8;
                pair[1] = (*word >> 8) as u8;
            }
            self.pending_write = None;
            self.status = DRDY;
        }
    }
}

/// Default content of byte `index` of block `lba` on a fresh mock disk.
pub fn pattern_byte(lba: u32, index: usize) -> u8 {
    (lba as u8).wrapping_mul(31) ^ (index as u8)
}

/// RAM-backed sector device.
pub struct RamDisk {
    data: Vec<u8>,
    fail_at: Option<u32>,
    reads: Vec<u32>,
}

impl RamDisk {
    /// `sector_count` sectors filled with `pattern_byte`.
    pub fn new(sector_count: u32) -> Self {
        let mut data = vec![0u8; sector_count as usize * SECTOR_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = pattern_byte((i / SECTOR_SIZE) as u32, i % SECTOR_SIZE);
        }
        Self { data, fail_at: None, reads: Vec::new() }
    }

    /// Make every read of `lba` fail as if retries ran out.
    pub fn fail_at(mut self, lba: u32) -> Self {
        self.fail_at = Some(lba);
        self
    }

    /// Blocks read so far, in order.
    pub fn reads(&self) -> &[u32] {
        &self.reads
    }
}

impl SectorDevice for RamDisk {
    fn read_sector(&mut self, lba: u32, buf: &mut SectorBuf) -> Result<(), DiskError> {
        self.reads.push(lba);
        let start = lba as usize * SECTOR_SIZE;
        if self.fail_at == Some(lba) || start + SECTOR_SIZE > self.data.len() {
            return Err(DiskError::RetriesExhausted { lba, attempts: super::MAX_ATTEMPTS });
        }
        buf.copy_from_slice(&self.data[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&mut self, lba: u32, buf: &SectorBuf) -> Result<(), DiskError> {
        let start = lba as usize * SECTOR_SIZE;
        if start + SECTOR_SIZE > self.data.len() {
            return Err(DiskError::RetriesExhausted { lba, attempts: super::MAX_ATTEMPTS });
        }
        self.data[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }
}
