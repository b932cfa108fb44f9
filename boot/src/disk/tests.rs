/// Unit tests for the ATA driver against the register-level mock.
///
/// Run with: cargo test -p emberos-boot --lib
use super::mock::{pattern_byte, Event, MockAta};
use super::*;

const DRIVE: Drive = Drive::FIRST_HARD_DISK;

// ---- Detection and reset ----

#[test]
fn detect_present_drive() {
    let mut ata = Ata::new(MockAta::with_sectors(8));
    assert!(ata.detect(DRIVE));
    assert_eq!(ata.ports().events(), &[Event::Command { command: 0xEC, lba: 0 }]);
}

#[test]
fn detect_waits_out_busy_drive() {
    let mut ata = Ata::new(MockAta::with_sectors(8).busy_for(3));
    assert!(ata.detect(DRIVE));
}

#[test]
fn detect_absent_drive_reports_false() {
    let mut ata = Ata::new(MockAta::absent());
    assert!(!ata.detect(DRIVE));
}

#[test]
fn attach_requires_detection() {
    let mut ata = Ata::new(MockAta::absent());
    assert_eq!(ata.attach(DRIVE).err(), Some(DiskError::DeviceNotPresent));

    let mut ata = Ata::new(MockAta::with_sectors(4));
    let disk = ata.attach(DRIVE).unwrap();
    assert_eq!(disk.drive(), DRIVE);
}

#[test]
fn reset_is_a_control_register_pulse() {
    let mut ata = Ata::new(MockAta::with_sectors(4));
    ata.reset(DRIVE);
    assert_eq!(ata.ports().reset_count(), 1);
}

#[test]
fn drive_select_uses_low_drive_bit_and_head() {
    assert_eq!(Drive(0x80).select(0), 0xA0);
    assert_eq!(Drive(0x81).select(1), 0xB1);
}

// ---- Reads and writes ----

#[test]
fn read_sector_is_little_endian_word_order() {
    let mut ata = Ata::new(MockAta::with_sectors(40));
    let mut buf = [0u8; SECTOR_SIZE];
    ata.read_sector(DRIVE, 37, &mut buf).unwrap();
    for (i, byte) in buf.iter().enumerate() {
        assert_eq!(*byte, pattern_byte(37, i), "byte {}", i);
    }
    assert_eq!(ata.ports().reads(), [37]);
}

#[test]
fn read_sector_through_busy_controller() {
    let mut ata = Ata::new(MockAta::with_sectors(8).busy_for(5));
    let mut buf = [0u8; SECTOR_SIZE];
    ata.read_sector(DRIVE, 2, &mut buf).unwrap();
    assert_eq!(buf[1], pattern_byte(2, 1));
}

#[test]
fn write_then_read_returns_same_bytes() {
    let mut ata = Ata::new(MockAta::with_sectors(64));
    let mut data = [0u8; SECTOR_SIZE];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (i * 7 % 251) as u8;
    }

    ata.write_sector(DRIVE, 50, &data).unwrap();
    let mut back = [0u8; SECTOR_SIZE];
    ata.read_sector(DRIVE, 50, &mut back).unwrap();

    assert_eq!(back, data);
    assert_eq!(ata.ports().sector(50), &data);
    assert_eq!(ata.ports().writes(), [50]);
}

#[test]
fn read_write_read_is_idempotent() {
    let mut ata = Ata::new(MockAta::with_sectors(16));
    let mut first = [0u8; SECTOR_SIZE];
    ata.read_sector(DRIVE, 9, &mut first).unwrap();
    ata.write_sector(DRIVE, 9, &first).unwrap();
    let mut second = [0u8; SECTOR_SIZE];
    ata.read_sector(DRIVE, 9, &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn attached_disk_is_a_sector_device() {
    let mut ata = Ata::new(MockAta::with_sectors(4));
    let mut disk = ata.attach(DRIVE).unwrap();
    let mut buf = [0u8; SECTOR_SIZE];
    SectorDevice::read_sector(&mut disk, 3, &mut buf).unwrap();
    assert_eq!(buf[0], pattern_byte(3, 0));
}

// ---- Retry policy ----

#[test]
fn persistent_read_failure_makes_exactly_five_attempts() {
    let mut mock = MockAta::with_sectors(8);
    mock.fail_always(4);
    let mut ata = Ata::new(mock);
    let mut buf = [0u8; SECTOR_SIZE];

    let err = ata.read_sector(DRIVE, 4, &mut buf).unwrap_err();

    assert_eq!(err, DiskError::RetriesExhausted { lba: 4, attempts: 5 });
    assert_eq!(ata.ports().reads(), [4, 4, 4, 4, 4]);
    assert_eq!(ata.ports().reset_count(), 4);
}

#[test]
fn reset_separates_every_pair_of_attempts() {
    let mut mock = MockAta::with_sectors(8);
    mock.fail_always(1);
    let mut ata = Ata::new(mock);
    let mut buf = [0u8; SECTOR_SIZE];
    let _ = ata.read_sector(DRIVE, 1, &mut buf);

    let read = Event::Command { command: 0x20, lba: 1 };
    assert_eq!(
        ata.ports().events(),
        &[read, Event::Reset, read, Event::Reset, read, Event::Reset, read, Event::Reset, read]
    );
}

#[test]
fn transient_failure_recovers() {
    let mut mock = MockAta::with_sectors(8);
    mock.fail_times(6, 2);
    let mut ata = Ata::new(mock);
    let mut buf = [0u8; SECTOR_SIZE];

    ata.read_sector(DRIVE, 6, &mut buf).unwrap();

    assert_eq!(ata.ports().reads(), [6, 6, 6]);
    assert_eq!(ata.ports().reset_count(), 2);
    assert_eq!(buf[10], pattern_byte(6, 10));
}

#[test]
fn four_failures_then_success_is_still_success() {
    let mut mock = MockAta::with_sectors(8);
    mock.fail_times(2, 4);
    let mut ata = Ata::new(mock);
    let mut buf = [0u8; SECTOR_SIZE];
    assert!(ata.read_sector(DRIVE, 2, &mut buf).is_ok());
    assert_eq!(ata.ports().reads().len(), 5);
}

#[test]
fn persistent_write_failure_makes_exactly_five_attempts() {
    let mut mock = MockAta::with_sectors(8);
    mock.fail_always(3);
    let mut ata = Ata::new(mock);
    let buf = [0xA5u8; SECTOR_SIZE];

    let err = ata.write_sector(DRIVE, 3, &buf).unwrap_err();

    assert_eq!(err, DiskError::RetriesExhausted { lba: 3, attempts: 5 });
    assert_eq!(ata.ports().writes().len(), 5);
    assert_eq!(ata.ports().reset_count(), 4);
    assert_eq!(ata.ports().sector(3)[0], pattern_byte(3, 0));
}

#[test]
fn unaddressable_cylinder_is_rejected_without_io() {
    let mut ata = Ata::new(MockAta::with_sectors(1));
    let mut buf = [0u8; SECTOR_SIZE];
    let lba = (MAX_CYLINDER + 1) * HEADS * SECTORS_PER_TRACK;
    assert_eq!(
        ata.read_sector(DRIVE, lba, &mut buf),
        Err(DiskError::AddressOutOfRange { lba })
    );
    assert!(ata.ports().events().is_empty());
}

#[test]
fn error_display() {
    use alloc::string::ToString;
    assert_eq!(
        DiskError::RetriesExhausted { lba: 3, attempts: 5 }.to_string(),
        "disk error at block 3 after 5 attempts"
    );
    assert_eq!(DiskError::DeviceNotPresent.to_string(), "disk not present");
}
