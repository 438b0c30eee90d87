//! Joypad input controller.

use crate::{
    consts::P1_ADDR,
    error::Error,
    mmu::BusComponent,
    state::{read_bool, write_bool, StateComponent, StateFormat},
    warnln,
};

pub struct Pad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,
    selection: PadSelection,
    int_pad: bool,
}

#[derive(Clone, Copy, PartialEq)]
pub enum PadSelection {
    Action,
    Direction,
}

pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            selection: PadSelection::Action,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        self.down = false;
        self.up = false;
        self.left = false;
        self.right = false;
        self.start = false;
        self.select = false;
        self.b = false;
        self.a = false;
        self.selection = PadSelection::Action;
        self.int_pad = false;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            P1_ADDR => {
                let mut value = match self.selection {
                    PadSelection::Action => {
                        (if self.a { 0x00 } else { 0x01 })
                            | if self.b { 0x00 } else { 0x02 }
                            | if self.select { 0x00 } else { 0x04 }
                            | if self.start { 0x00 } else { 0x08 }
                    }
                    PadSelection::Direction => {
                        (if self.right { 0x00 } else { 0x01 })
                            | if self.left { 0x00 } else { 0x02 }
                            | if self.up { 0x00 } else { 0x04 }
                            | if self.down { 0x00 } else { 0x08 }
                    }
                };
                value |= if self.selection == PadSelection::Direction {
                    0x10
                } else {
                    0x00
                } | if self.selection == PadSelection::Action {
                    0x20
                } else {
                    0x00
                };
                value | 0xc0
            }
            addr => {
                warnln!("Reading from unknown Pad location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            P1_ADDR => {
                self.selection = if value & 0x10 == 0x00 {
                    PadSelection::Direction
                } else {
                    PadSelection::Action
                }
            }
            addr => warnln!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    /// Whether the given key belongs to the currently selected column,
    /// used to gate the joypad interrupt the way real hardware does.
    fn selected(&self, key: &PadKey) -> bool {
        match self.selection {
            PadSelection::Action => {
                matches!(key, PadKey::A | PadKey::B | PadKey::Start | PadKey::Select)
            }
            PadSelection::Direction => {
                matches!(key, PadKey::Up | PadKey::Down | PadKey::Left | PadKey::Right)
            }
        }
    }

    /// Presses the given key. The joypad interrupt is requested only on
    /// the released-to-pressed transition of a key in the currently
    /// selected column.
    pub fn key_press(&mut self, key: PadKey) {
        let was_pressed = self.is_pressed(&key);
        self.set_pressed(&key, true);
        if !was_pressed && self.selected(&key) {
            self.int_pad = true;
        }
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.set_pressed(&key, false);
    }

    fn is_pressed(&self, key: &PadKey) -> bool {
        match key {
            PadKey::Up => self.up,
            PadKey::Down => self.down,
            PadKey::Left => self.left,
            PadKey::Right => self.right,
            PadKey::Start => self.start,
            PadKey::Select => self.select,
            PadKey::A => self.a,
            PadKey::B => self.b,
        }
    }

    fn set_pressed(&mut self, key: &PadKey, pressed: bool) {
        match key {
            PadKey::Up => self.up = pressed,
            PadKey::Down => self.down = pressed,
            PadKey::Left => self.left = pressed,
            PadKey::Right => self.right = pressed,
            PadKey::Start => self.start = pressed,
            PadKey::Select => self.select = pressed,
            PadKey::A => self.a = pressed,
            PadKey::B => self.b = pressed,
        }
    }

    #[inline(always)]
    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    #[inline(always)]
    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    #[inline(always)]
    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }
}

impl BusComponent for Pad {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Pad {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        write_bool(&mut buffer, self.down);
        write_bool(&mut buffer, self.up);
        write_bool(&mut buffer, self.left);
        write_bool(&mut buffer, self.right);
        write_bool(&mut buffer, self.start);
        write_bool(&mut buffer, self.select);
        write_bool(&mut buffer, self.b);
        write_bool(&mut buffer, self.a);
        write_bool(&mut buffer, self.selection == PadSelection::Direction);
        write_bool(&mut buffer, self.int_pad);
        Ok(buffer)
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = std::io::Cursor::new(data);
        self.down = read_bool(&mut cursor)?;
        self.up = read_bool(&mut cursor)?;
        self.left = read_bool(&mut cursor)?;
        self.right = read_bool(&mut cursor)?;
        self.start = read_bool(&mut cursor)?;
        self.select = read_bool(&mut cursor)?;
        self.b = read_bool(&mut cursor)?;
        self.a = read_bool(&mut cursor)?;
        self.selection = if read_bool(&mut cursor)? {
            PadSelection::Direction
        } else {
            PadSelection::Action
        };
        self.int_pad = read_bool(&mut cursor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Pad, PadKey};
    use crate::consts::P1_ADDR;

    #[test]
    fn test_press_raises_interrupt_only_for_selected_column() {
        let mut pad = Pad::new();
        pad.write(P1_ADDR, 0x00); // select direction keys (bit4 low)
        pad.key_press(PadKey::A);
        assert!(!pad.int_pad());
        pad.key_press(PadKey::Up);
        assert!(pad.int_pad());
    }

    #[test]
    fn test_no_interrupt_on_held_key() {
        let mut pad = Pad::new();
        pad.write(P1_ADDR, 0x20); // select action keys
        pad.key_press(PadKey::A);
        pad.ack_pad();
        pad.key_press(PadKey::A);
        assert!(!pad.int_pad());
    }
}
