/// Polled keyboard input.
///
/// The i8042 controller is read directly: when the status register says
/// the output buffer is full, the data register holds one scan code set 1
/// byte. Three make codes echo a letter, Enter reprints the prompt, and
/// everything else (break codes included) is dropped. No line is kept.
use bitflags::bitflags;

use emberos_platform::{serial_println, wait, Attribute, Color, DisplayWriter, GlyphSink, PortIo};

pub const DATA_PORT: u16 = 0x60;
pub const STATUS_PORT: u16 = 0x64;

bitflags! {
    /// i8042 status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControllerStatus: u8 {
        const OUTPUT_FULL = 1 << 0;
        const INPUT_FULL  = 1 << 1;
        const SYSTEM      = 1 << 2;
        const COMMAND     = 1 << 3;
        const TIMEOUT     = 1 << 6;
        const PARITY      = 1 << 7;
    }
}

/// Enter make code.
pub const SUBMIT_CODE: u8 = 0x1C;

/// Break (release) codes have the high bit set.
pub const RELEASE_BIT: u8 = 0x80;

/// Make codes that echo a character.
pub const KEYMAP: [(u8, u8); 3] = [(0x1E, b'A'), (0x30, b'B'), (0x2E, b'C')];

pub const PROMPT: &str = "EmberOS> ";
pub const PROMPT_ATTR: Attribute = Attribute::on_black(Color::LightCyan);
pub const ECHO_ATTR: Attribute = Attribute::on_black(Color::White);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Echo(u8),
    Submit,
    Ignored,
}

pub fn classify(code: u8) -> KeyEvent {
    if code == SUBMIT_CODE {
        return KeyEvent::Submit;
    }
    if code & RELEASE_BIT != 0 {
        return KeyEvent::Ignored;
    }
    KEYMAP
        .iter()
        .find(|(make, _)| *make == code)
        .map_or(KeyEvent::Ignored, |&(_, glyph)| KeyEvent::Echo(glyph))
}

pub struct InputLoop<'d, P: PortIo, S: GlyphSink> {
    ports: P,
    display: &'d mut DisplayWriter<S>,
}

impl<'d, P: PortIo, S: GlyphSink> InputLoop<'d, P, S> {
    pub fn new(ports: P, display: &'d mut DisplayWriter<S>) -> Self {
        Self { ports, display }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn display(&self) -> &DisplayWriter<S> {
        self.display
    }

    pub fn show_prompt(&mut self) {
        self.display.print(PROMPT, PROMPT_ATTR);
    }

    fn status(&mut self) -> ControllerStatus {
        ControllerStatus::from_bits_retain(self.ports.read_u8(STATUS_PORT))
    }

    /// Read and handle at most one scan code. Returns `None` when the
    /// controller had nothing for us.
    pub fn poll_once(&mut self) -> Option<KeyEvent> {
        if !self.status().contains(ControllerStatus::OUTPUT_FULL) {
            return None;
        }
        let code = self.ports.read_u8(DATA_PORT);
        let event = classify(code);
        self.handle(event);
        if event == KeyEvent::Submit {
            serial_println!("[input] submit");
        }
        Some(event)
    }

    fn handle(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Echo(glyph) => self.display.put_char(glyph, ECHO_ATTR),
            KeyEvent::Submit => {
                self.display.put_char(b'\n', PROMPT_ATTR);
                self.show_prompt();
            }
            KeyEvent::Ignored => {}
        }
    }

    /// Show the prompt and poll forever.
    pub fn run(mut self) -> ! {
        serial_println!("[input] polling keyboard");
        self.show_prompt();
        loop {
            wait::poll_until(|| self.poll_once().is_some());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::string::String;
    use emberos_platform::display::{CELLS, COLUMNS};
    use emberos_platform::{HardwareRegion, TextBuffer};

    /// Keyboard controller replaying a fixed list of scan codes.
    struct ScriptedKeyboard {
        pending: VecDeque<u8>,
        status_reads: usize,
    }

    impl ScriptedKeyboard {
        fn new(codes: &[u8]) -> Self {
            Self { pending: codes.iter().copied().collect(), status_reads: 0 }
        }
    }

    impl PortIo for ScriptedKeyboard {
        fn read_u8(&mut self, port: u16) -> u8 {
            match port {
                STATUS_PORT => {
                    self.status_reads += 1;
                    if self.pending.is_empty() {
                        0
                    } else {
                        ControllerStatus::OUTPUT_FULL.bits()
                    }
                }
                DATA_PORT => self.pending.pop_front().expect("data read with empty buffer"),
                _ => panic!("unexpected port {:#x}", port),
            }
        }

        fn write_u8(&mut self, port: u16, _value: u8) {
            panic!("unexpected write to {:#x}", port);
        }

        fn read_u16(&mut self, port: u16) -> u16 {
            panic!("unexpected word read from {:#x}", port);
        }

        fn write_u16(&mut self, port: u16, _value: u16) {
            panic!("unexpected word write to {:#x}", port);
        }
    }

    fn row(display: &DisplayWriter<TextBuffer<'_>>, r: usize) -> String {
        let mut bytes = [0u8; COLUMNS];
        display.sink().row_text(r, &mut bytes);
        String::from_utf8_lossy(&bytes).trim_end_matches(['\0', ' ']).into()
    }

    #[test]
    fn classify_keys() {
        assert_eq!(classify(0x1E), KeyEvent::Echo(b'A'));
        assert_eq!(classify(0x30), KeyEvent::Echo(b'B'));
        assert_eq!(classify(0x2E), KeyEvent::Echo(b'C'));
        assert_eq!(classify(0x1C), KeyEvent::Submit);
        assert_eq!(classify(0x9E), KeyEvent::Ignored);
        assert_eq!(classify(0x10), KeyEvent::Ignored);
    }

    #[test]
    fn keys_echo_and_submit_reprints_prompt() {
        let mut cells = [0u16; CELLS];
        let mut display = DisplayWriter::new(TextBuffer::new(HardwareRegion::from_slice(&mut cells)));
        let mut input = InputLoop::new(ScriptedKeyboard::new(&[0x1E, 0x9E, 0x30, 0xB0, 0x1C]), &mut display);
        input.show_prompt();

        let mut events = alloc::vec::Vec::new();
        while let Some(event) = input.poll_once() {
            events.push(event);
        }

        assert_eq!(
            events,
            [
                KeyEvent::Echo(b'A'),
                KeyEvent::Ignored,
                KeyEvent::Echo(b'B'),
                KeyEvent::Ignored,
                KeyEvent::Submit,
            ]
        );
        assert_eq!(row(input.display(), 0), "EmberOS> AB");
        assert_eq!(row(input.display(), 1), "EmberOS>");
        assert_eq!(input.display().cursor(), COLUMNS + PROMPT.len());
        assert_eq!(input.display().sink().glyph_at(PROMPT.len()).1, ECHO_ATTR);
    }

    #[test]
    fn empty_controller_reads_no_data() {
        let mut cells = [0u16; CELLS];
        let mut display = DisplayWriter::new(TextBuffer::new(HardwareRegion::from_slice(&mut cells)));
        let mut input = InputLoop::new(ScriptedKeyboard::new(&[]), &mut display);

        assert_eq!(input.poll_once(), None);
        assert_eq!(input.poll_once(), None);
        assert_eq!(input.ports().status_reads, 2);
        assert_eq!(input.display().cursor(), 0);
    }

    #[test]
    fn unmapped_make_code_draws_nothing() {
        let mut cells = [0u16; CELLS];
        let mut display = DisplayWriter::new(TextBuffer::new(HardwareRegion::from_slice(&mut cells)));
        let mut input = InputLoop::new(ScriptedKeyboard::new(&[0x10]), &mut display);

        assert_eq!(input.poll_once(), Some(KeyEvent::Ignored));
        assert_eq!(input.display().cursor(), 0);
    }
}
