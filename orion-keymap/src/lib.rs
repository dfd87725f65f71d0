//! Shared keymap definitions for Orion's Hands.
//!
//! This crate is `no_std`-compatible so it can be used by both the firmware
//! and the native CLI tool.

#![no_std]

/// Number of rows in the matrix.
pub const ROWS: usize = 5;
/// Number of columns per half.
pub const COLS_PER_HALF: usize = 7;
/// Total number of columns.
pub const COLS: usize = COLS_PER_HALF * 2;

/// Row of the function key.
pub const FN_ROW: usize = 4;
/// Column of the function key.
pub const FN_COL: usize = 10;

/// USB HID keycodes.
/// See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Keycode {
    /// No key. On the function layer: fall through to the base layer.
    Trans = 0x00,

    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    LBracket = 0x2F,
    RBracket = 0x30,
    Backslash = 0x31,
    /// Non-US # and ~ (ISO key left of Enter)
    NonUsHash = 0x32,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Dot = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    /// Non-US \ and | (ISO key left of Z)
    NonUsBackslash = 0x64,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation
    Delete = 0x4C,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    // Modifiers (used in the modifier byte, not in keycode array)
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,

    // Not real HID keycodes, resolved by the firmware.
    /// Momentary function layer.
    Fn = 0xF1,
    /// Escape, or Grave while Shift or GUI is held.
    GraveEscape = 0xF2,

    // Consumer page keys, sent in the consumer control report.
    MediaPlayPause = 0xF3,
    MediaNext = 0xF4,
    MediaPrev = 0xF5,
    VolumeUp = 0xF6,
    VolumeDown = 0xF7,
}

impl Keycode {
    /// Check if this keycode is a modifier (LCtrl..RGui).
    pub fn is_modifier(self) -> bool {
        let v = self as u8;
        (0xE0..=0xE7).contains(&v)
    }

    /// Get the modifier bit mask (bit 0 = LCtrl, bit 7 = RGui).
    pub fn modifier_bit(self) -> u8 {
        if self.is_modifier() {
            1 << (self as u8 - 0xE0)
        } else {
            0
        }
    }

    /// Check if this is the function layer key.
    pub fn is_function(self) -> bool {
        self == Keycode::Fn
    }

    /// Consumer page usage (HID Usage Tables, Section 15) for media keys.
    pub fn consumer_usage(self) -> Option<u16> {
        match self {
            Keycode::MediaPlayPause => Some(0x00CD),
            Keycode::MediaNext => Some(0x00B5),
            Keycode::MediaPrev => Some(0x00B6),
            Keycode::VolumeUp => Some(0x00E9),
            Keycode::VolumeDown => Some(0x00EA),
            _ => None,
        }
    }

    pub fn is_consumer(self) -> bool {
        self.consumer_usage().is_some()
    }

    /// Check if this is a transparent key.
    pub fn is_transparent(self) -> bool {
        self as u8 == 0x00
    }

    /// Display name for use in layout visualizations.
    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::Trans => "",
            Keycode::A => "A",
            Keycode::B => "B",
            Keycode::C => "C",
            Keycode::D => "D",
            Keycode::E => "E",
            Keycode::F => "F",
            Keycode::G => "G",
            Keycode::H => "H",
            Keycode::I => "I",
            Keycode::J => "J",
            Keycode::K => "K",
            Keycode::L => "L",
            Keycode::M => "M",
            Keycode::N => "N",
            Keycode::O => "O",
            Keycode::P => "P",
            Keycode::Q => "Q",
            Keycode::R => "R",
            Keycode::S => "S",
            Keycode::T => "T",
            Keycode::U => "U",
            Keycode::V => "V",
            Keycode::W => "W",
            Keycode::X => "X",
            Keycode::Y => "Y",
            Keycode::Z => "Z",
            Keycode::N1 => "1",
            Keycode::N2 => "2",
            Keycode::N3 => "3",
            Keycode::N4 => "4",
            Keycode::N5 => "5",
            Keycode::N6 => "6",
            Keycode::N7 => "7",
            Keycode::N8 => "8",
            Keycode::N9 => "9",
            Keycode::N0 => "0",
            Keycode::Enter => "Ent",
            Keycode::Escape => "Esc",
            Keycode::Backspace => "Bksp",
            Keycode::Tab => "Tab",
            Keycode::Space => "Spc",
            Keycode::Minus => "-",
            Keycode::Equal => "=",
            Keycode::LBracket => "[",
            Keycode::RBracket => "]",
            Keycode::Backslash => "\\",
            Keycode::NonUsHash => "#~",
            Keycode::Semicolon => ";",
            Keycode::Quote => "'",
            Keycode::Grave => "`",
            Keycode::Comma => ",",
            Keycode::Dot => ".",
            Keycode::Slash => "/",
            Keycode::CapsLock => "Caps",
            Keycode::NonUsBackslash => "\\|",
            Keycode::F1 => "F1",
            Keycode::F2 => "F2",
            Keycode::F3 => "F3",
            Keycode::F4 => "F4",
            Keycode::F5 => "F5",
            Keycode::F6 => "F6",
            Keycode::F7 => "F7",
            Keycode::F8 => "F8",
            Keycode::F9 => "F9",
            Keycode::F10 => "F10",
            Keycode::F11 => "F11",
            Keycode::F12 => "F12",
            Keycode::Delete => "Del",
            Keycode::Right => "\u{2192}",
            Keycode::Left => "\u{2190}",
            Keycode::Down => "\u{2193}",
            Keycode::Up => "\u{2191}",
            Keycode::LCtrl => "Ctrl",
            Keycode::LShift => "Shft",
            Keycode::LAlt => "Alt",
            Keycode::LGui => "Gui",
            Keycode::RCtrl => "RCtl",
            Keycode::RShift => "RSft",
            Keycode::RAlt => "RAlt",
            Keycode::RGui => "RGui",
            Keycode::Fn => "Fn",
            Keycode::GraveEscape => "Esc`",
            Keycode::MediaPlayPause => "Play",
            Keycode::MediaNext => "Next",
            Keycode::MediaPrev => "Prev",
            Keycode::VolumeUp => "Vol+",
            Keycode::VolumeDown => "Vol-",
        }
    }
}

/// The two keymap layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layer {
    Base,
    Function,
}

/// Number of layers.
pub const NUM_LAYERS: usize = 2;

/// Layers in display order.
pub const ALL_LAYERS: [Layer; NUM_LAYERS] = [Layer::Base, Layer::Function];

impl Layer {
    /// The static table backing this layer.
    pub fn table(self) -> &'static [[Keycode; COLS]; ROWS] {
        match self {
            Layer::Base => &BASE_LAYER,
            Layer::Function => &FN_LAYER,
        }
    }
}

/// Key is unused in the matrix position.
const ___: Keycode = Keycode::Trans;

/// Shorthand aliases for readability.
const GESC: Keycode = Keycode::GraveEscape;
const ENT: Keycode = Keycode::Enter;
const BSP: Keycode = Keycode::Backspace;
const TAB: Keycode = Keycode::Tab;
const SPC: Keycode = Keycode::Space;
const DEL: Keycode = Keycode::Delete;
const CAPS: Keycode = Keycode::CapsLock;
const LCTL: Keycode = Keycode::LCtrl;
const LSFT: Keycode = Keycode::LShift;
const LALT: Keycode = Keycode::LAlt;
const LGUI: Keycode = Keycode::LGui;
const RALT: Keycode = Keycode::RAlt;
const NUBS: Keycode = Keycode::NonUsBackslash;
const NUHS: Keycode = Keycode::NonUsHash;
const FN: Keycode = Keycode::Fn;
const MPLY: Keycode = Keycode::MediaPlayPause;
const MNXT: Keycode = Keycode::MediaNext;
const MPRV: Keycode = Keycode::MediaPrev;
const VOLU: Keycode = Keycode::VolumeUp;
const VOLD: Keycode = Keycode::VolumeDown;

/// Base layer.
/// Columns 0-6 = left half, columns 7-13 = right half.
pub static BASE_LAYER: [[Keycode; COLS]; ROWS] = [
    // Row 0: number row
    [GESC, Keycode::N1, Keycode::N2, Keycode::N3, Keycode::N4, Keycode::N5, Keycode::N6,
     Keycode::N7, Keycode::N8, Keycode::N9, Keycode::N0, Keycode::Minus, Keycode::Equal, BSP],

    // Row 1: top letter row. (1,13) is the encoder push.
    [TAB, Keycode::Q, Keycode::W, Keycode::E, Keycode::R, Keycode::T, Keycode::Y,
     Keycode::U, Keycode::I, Keycode::O, Keycode::P, Keycode::LBracket, Keycode::RBracket, MPLY],

    // Row 2: home row
    [CAPS, Keycode::A, Keycode::S, Keycode::D, Keycode::F, Keycode::G, Keycode::H,
     Keycode::J, Keycode::K, Keycode::L, Keycode::Semicolon, Keycode::Quote, ENT, DEL],

    // Row 3: bottom row
    [LSFT, NUBS, Keycode::Z, Keycode::X, Keycode::C, Keycode::V, Keycode::B,
     Keycode::N, Keycode::M, Keycode::Comma, Keycode::Dot, Keycode::Slash, NUHS, Keycode::Up],

    // Row 4: modifiers, space and arrows
    [LCTL, LGUI, LALT, ___, ___, ___, SPC,
     ___, ___, RALT, FN, Keycode::Left, Keycode::Down, Keycode::Right],
];

/// Function layer, active while the function key is held.
pub static FN_LAYER: [[Keycode; COLS]; ROWS] = [
    // Row 0
    [Keycode::Grave, Keycode::F1, Keycode::F2, Keycode::F3, Keycode::F4, Keycode::F5, Keycode::F6,
     Keycode::F7, Keycode::F8, Keycode::F9, Keycode::F10, Keycode::F11, Keycode::F12, ___],

    // Row 1
    [___, ___, ___, ___, ___, ___, ___,
     ___, ___, ___, ___, ___, ___, ___],

    // Row 2
    [___, ___, ___, ___, ___, ___, ___,
     ___, ___, ___, ___, ___, ___, ___],

    // Row 3: volume on the up arrow
    [___, ___, ___, ___, ___, ___, ___,
     ___, ___, ___, ___, ___, ___, VOLU],

    // Row 4: track skip and volume on the arrows
    [___, ___, ___, ___, ___, ___, ___,
     ___, ___, ___, ___, MPRV, VOLD, MNXT],
];

/// Check whether a matrix position is the function key.
pub fn is_function_cell(row: usize, col: usize) -> bool {
    row == FN_ROW && col == FN_COL
}

/// Resolve which layer is active: the function layer while the
/// function key is held.
pub fn resolve_layer(keys: &[[bool; COLS]; ROWS]) -> Layer {
    if keys[FN_ROW][FN_COL] {
        Layer::Function
    } else {
        Layer::Base
    }
}

/// Look up the keycode for a matrix position. Transparent keys on the
/// function layer fall through to the base layer.
pub fn lookup(layer: Layer, row: usize, col: usize) -> Keycode {
    let kc = layer.table()[row][col];
    if kc.is_transparent() && layer != Layer::Base {
        return BASE_LAYER[row][col];
    }
    kc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_key_location() {
        assert!(BASE_LAYER[FN_ROW][FN_COL].is_function());
        assert!(is_function_cell(4, 10));
        assert!(!is_function_cell(4, 9));
    }

    #[test]
    fn test_number_row_codes() {
        assert_eq!(lookup(Layer::Base, 0, 1) as u8, 0x1E);
        assert_eq!(lookup(Layer::Base, 0, 10) as u8, 0x27);
        assert_eq!(lookup(Layer::Function, 0, 1), Keycode::F1);
        assert_eq!(lookup(Layer::Function, 0, 12), Keycode::F12);
    }

    #[test]
    fn test_transparent_falls_through() {
        assert_eq!(FN_LAYER[1][1], Keycode::Trans);
        assert_eq!(lookup(Layer::Function, 1, 1), Keycode::Q);
        assert_eq!(lookup(Layer::Function, 0, 13), Keycode::Backspace);
    }

    #[test]
    fn test_resolve_layer() {
        let mut keys = [[false; COLS]; ROWS];
        assert_eq!(resolve_layer(&keys), Layer::Base);
        keys[0][0] = true;
        assert_eq!(resolve_layer(&keys), Layer::Base);
        keys[FN_ROW][FN_COL] = true;
        assert_eq!(resolve_layer(&keys), Layer::Function);
    }

    #[test]
    fn test_media_keys() {
        assert_eq!(lookup(Layer::Base, 1, 13), Keycode::MediaPlayPause);
        assert_eq!(lookup(Layer::Function, 1, 13), Keycode::MediaPlayPause);
        assert_eq!(lookup(Layer::Function, 3, 13), Keycode::VolumeUp);
        assert_eq!(lookup(Layer::Base, 3, 13), Keycode::Up);
        assert_eq!(Keycode::MediaPlayPause.consumer_usage(), Some(0x00CD));
        assert_eq!(Keycode::VolumeDown.consumer_usage(), Some(0x00EA));
        assert!(!Keycode::A.is_consumer());
        assert!(!Keycode::MediaNext.is_modifier());
    }

    #[test]
    fn test_modifier_bits() {
        assert_eq!(Keycode::LCtrl.modifier_bit(), 0x01);
        assert_eq!(Keycode::LShift.modifier_bit(), 0x02);
        assert_eq!(Keycode::RGui.modifier_bit(), 0x80);
        assert_eq!(Keycode::A.modifier_bit(), 0);
        assert!(!Keycode::Fn.is_modifier());
    }
}
