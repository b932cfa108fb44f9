/// Boot handoff controller.
///
/// A linear state machine from firmware entry to control transfer:
///
/// ```text
/// Init -> DisplayReset -> StackSetup -> DiskDetect -> ImageLoad -> MemoryMap -> Transfer
///                                           |             |                         |
///                                           +-------------+-------> FailHalt <------+
/// ```
///
/// `advance` runs the current stage and says what the caller must do
/// next. Stack switching and the jump into the image cannot happen
/// inside a method that expects to return, so they are reported as
/// `Step`s. `drive` carries out the transfer itself and returns the
/// rest to the binary.
use core::fmt;
use core::fmt::Write;

use emberos_platform::arch::x86;
use emberos_platform::layout::{BOOT_SEGMENT, IMAGE_LOAD_ADDR, IMAGE_SECTORS, LOADER_STACK_TOP};
use emberos_platform::{
    serial_println, Attribute, DisplayWriter, GlyphSink, HardwareRegion, MemoryMapTable, PhysAddr,
    PortIo,
};

use crate::disk::{Ata, Drive};
use crate::loader::{load_image, LoadError};
use crate::memmap::publish_memory_map;

mod slot;

pub use slot::ParkingSlot;

/// CPU-level operations the controller needs before it touches devices.
pub trait Platform {
    fn disable_interrupts(&mut self);
    fn normalize_segments(&mut self, segment: u16);
}

/// The real processor.
pub struct HardwarePlatform;

impl Platform for HardwarePlatform {
    fn disable_interrupts(&mut self) {
        x86::cli();
    }

    fn normalize_segments(&mut self, segment: u16) {
        // Safety: runs first thing in the loader stage, before any
        // segment-relative reference is held. The boot sector already
        // left every data segment at this base.
        unsafe { x86::load_data_segments(segment) }
    }
}

/// Fixed boot parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    pub drive: Drive,
    pub image_sectors: usize,
    pub load_address: PhysAddr,
    pub stack_top: u32,
    pub boot_segment: u16,
}

impl BootConfig {
    pub const DEFAULT: BootConfig = BootConfig {
        drive: Drive::FIRST_HARD_DISK,
        image_sectors: IMAGE_SECTORS,
        load_address: IMAGE_LOAD_ADDR,
        stack_top: LOADER_STACK_TOP,
        boot_segment: BOOT_SEGMENT,
    };
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    DisplayReset,
    StackSetup,
    DiskDetect,
    ImageLoad,
    MemoryMap,
    Transfer,
    FailHalt,
}

/// Terminal boot failures. None of them is recoverable: only an
/// external reset starts a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// The boot drive did not answer detection.
    DeviceNotPresent,
    /// Image sector `sector` (0-based) could not be read.
    TransferFailure { sector: usize },
    /// The image is larger than its destination region.
    ImageTooLarge { needed: usize, available: usize },
    /// The image returned to the loader.
    UnexpectedReturn,
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::DeviceNotPresent => write!(f, "No bootable disk found!"),
            BootError::TransferFailure { sector } => {
                write!(f, "Failed to load image sector {}", sector)
            }
            BootError::ImageTooLarge { needed, available } => {
                write!(f, "Image of {} bytes does not fit in {}", needed, available)
            }
            BootError::UnexpectedReturn => write!(f, "Image returned to the loader!"),
        }
    }
}

impl From<LoadError> for BootError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Sector { index, .. } => BootError::TransferFailure { sector: index },
            LoadError::DestinationTooSmall { needed, available } => {
                BootError::ImageTooLarge { needed, available }
            }
        }
    }
}

/// What the driver loop must do after a stage ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Call `advance` again.
    Continue,
    /// Move onto a fresh stack with this top, then keep advancing.
    SwitchStack(u32),
    /// Call the image at this address. If it returns, report it with
    /// `image_returned`.
    Transfer(PhysAddr),
    /// Park the processor.
    Halt(BootError),
}

pub struct BootController<'a, C: Platform, P: PortIo, S: GlyphSink> {
    platform: C,
    ata: Ata<P>,
    display: DisplayWriter<S>,
    image: HardwareRegion<'a, u8>,
    memory_map: MemoryMapTable<'a>,
    config: BootConfig,
    stage: Stage,
    failure: Option<BootError>,
}

impl<'a, C: Platform, P: PortIo, S: GlyphSink> BootController<'a, C, P, S> {
    pub fn new(
        platform: C,
        ata: Ata<P>,
        display: DisplayWriter<S>,
        image: HardwareRegion<'a, u8>,
        memory_map: MemoryMapTable<'a>,
        config: BootConfig,
    ) -> Self {
        Self {
            platform,
            ata,
            display,
            image,
            memory_map,
            config,
            stage: Stage::Init,
            failure: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn failure(&self) -> Option<BootError> {
        self.failure
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayWriter<S> {
        &self.display
    }

    pub fn ata(&self) -> &Ata<P> {
        &self.ata
    }

    pub fn platform(&self) -> &C {
        &self.platform
    }

    /// Run the current stage.
    pub fn advance(&mut self) -> Step {
        match self.stage {
            Stage::Init => {
                self.platform.disable_interrupts();
                self.platform.normalize_segments(self.config.boot_segment);
                self.enter(Stage::DisplayReset);
                Step::Continue
            }
            Stage::DisplayReset => {
                self.display.clear();
                self.say("EmberOS loader starting...\n");
                self.enter(Stage::StackSetup);
                Step::Continue
            }
            Stage::StackSetup => {
                self.say("Setting up stack...\n");
                self.enter(Stage::DiskDetect);
                Step::SwitchStack(self.config.stack_top)
            }
            Stage::DiskDetect => {
                self.say("Checking for boot disk...\n");
                if !self.ata.detect(self.config.drive) {
                    return self.fail(BootError::DeviceNotPresent);
                }
                self.enter(Stage::ImageLoad);
                Step::Continue
            }
            Stage::ImageLoad => {
                self.say("Loading image into memory...\n");
                if let Err(err) = self.load() {
                    return self.fail(err);
                }
                let _ = writeln!(
                    self.display.paint(Attribute::SUCCESS),
                    "Image loaded at {}",
                    self.config.load_address
                );
                self.enter(Stage::MemoryMap);
                Step::Continue
            }
            Stage::MemoryMap => {
                self.say("Building memory map...\n");
                let map = publish_memory_map(&mut self.memory_map);
                let _ = writeln!(
                    self.display.paint(Attribute::NORMAL),
                    "Memory map built with {} entries",
                    map.len()
                );
                self.enter(Stage::Transfer);
                Step::Continue
            }
            Stage::Transfer => {
                self.say("Jumping to image...\n");
                serial_println!("[boot] entering image at {}", self.config.load_address);
                Step::Transfer(self.config.load_address)
            }
            Stage::FailHalt => Step::Halt(self.failure.unwrap_or(BootError::UnexpectedReturn)),
        }
    }

    /// Report that the image handed control back.
    pub fn image_returned(&mut self) -> Step {
        self.fail(BootError::UnexpectedReturn)
    }

    /// Advance until a step needs the caller: a stack switch or a halt.
    ///
    /// A transfer calls `enter_image`. If that returns, the step from
    /// `image_returned` is driven like any other.
    pub fn drive(&mut self, mut enter_image: impl FnMut(PhysAddr)) -> Step {
        let mut step = self.advance();
        loop {
            step = match step {
                Step::Continue => self.advance(),
                Step::Transfer(entry) => {
                    enter_image(entry);
                    self.image_returned()
                }
                Step::SwitchStack(_) | Step::Halt(_) => return step,
            };
        }
    }

    fn load(&mut self) -> Result<(), BootError> {
        let mut disk = self.ata.attach(self.config.drive).map_err(|_| BootError::DeviceNotPresent)?;
        load_image(&mut disk, &mut self.image, self.config.image_sectors)?;
        Ok(())
    }

    fn say(&mut self, message: &str) {
        self.display.print(message, Attribute::NORMAL);
    }

    fn enter(&mut self, next: Stage) {
        serial_println!("[boot] {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, error: BootError) -> Step {
        let _ = writeln!(self.display.paint(Attribute::ERROR), "{}", error);
        serial_println!("[boot] halted in {:?}: {}", self.stage, error);
        self.failure = Some(error);
        self.stage = Stage::FailHalt;
        Step::Halt(error)
    }
}
