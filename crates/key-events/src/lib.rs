//! key-events: logical key model and Vim-style key notation.
//!
//! A [`KeyEvent`] is the unit the resolution engine consumes: a logical key
//! identity plus a modifier mask. Sequences are written in the familiar
//! angle-bracket notation (`jj`, `<Esc>`, `<C-w>k`), which is also the format
//! mappings and command tables are registered in.
//!
//! Parsing is infallible: an unmatched `<` or an unrecognized special name is
//! taken literally, character by character, matching Vim's behavior for
//! malformed notation.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier mask attached to a key.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Mods: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
        const META  = 0b0000_1000;
    }
}

/// Normalized logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

/// One discrete key press: identity plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: Mods,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: Mods) -> Self {
        Self { code, mods }
    }

    /// Plain printable key with no modifiers.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), Mods::empty())
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), Mods::CTRL)
    }

    pub fn esc() -> Self {
        Self::new(KeyCode::Esc, Mods::empty())
    }
}

// Special key names, shared by the parser and Display. Lookup is
// case-sensitive on the canonical spelling below.
const SPECIAL: &[(&str, KeyCode)] = &[
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("BS", KeyCode::Backspace),
    ("Tab", KeyCode::Tab),
    ("Del", KeyCode::Delete),
    ("Ins", KeyCode::Insert),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
];

const MOD_PREFIXES: &[(&str, Mods)] = &[
    ("C", Mods::CTRL),
    ("A", Mods::ALT),
    ("S", Mods::SHIFT),
    ("M", Mods::META),
];

fn special_name(code: KeyCode) -> Option<&'static str> {
    if let KeyCode::F(_) = code {
        return None; // formatted inline
    }
    SPECIAL
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Plain printable characters render bare; everything else goes
        // through the angle-bracket form.
        if self.mods.is_empty()
            && let KeyCode::Char(c) = self.code
        {
            return write!(f, "{c}");
        }
        write!(f, "<")?;
        for (name, m) in MOD_PREFIXES {
            if self.mods.contains(*m) {
                write!(f, "{name}-")?;
            }
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}")?,
            KeyCode::F(n) => write!(f, "F{n}")?,
            code => write!(f, "{}", special_name(code).unwrap_or("?"))?,
        }
        write!(f, ">")
    }
}

/// Render a key sequence back into notation form.
pub fn keys_to_string(keys: &[KeyEvent]) -> String {
    use fmt::Write;
    let mut out = String::new();
    for key in keys {
        let _ = write!(out, "{key}");
    }
    out
}

/// Parse notation into a key sequence. Never fails: malformed angle-bracket
/// groups fall back to their literal characters.
pub fn parse_keys(input: &str) -> Vec<KeyEvent> {
    let mut keys = Vec::new();
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c == '<'
            && let Some((key, remaining)) = parse_angle(rest)
        {
            keys.push(key);
            rest = remaining;
            continue;
        }
        keys.push(KeyEvent::char(c));
        rest = &rest[c.len_utf8()..];
    }
    keys
}

/// Parse one `<...>` group from the front of `input`. Returns `None` when the
/// group is unterminated or its body is not recognizable notation.
fn parse_angle(input: &str) -> Option<(KeyEvent, &str)> {
    let close = input.find('>')?;
    let body = &input[1..close];
    if body.is_empty() {
        return None;
    }
    let mut mods = Mods::empty();
    let mut name = body;
    // Strip "X-" modifier prefixes. At least one character must remain for
    // the key itself, so `<C-->` resolves to Ctrl+'-'.
    loop {
        let Some((prefix, m)) = MOD_PREFIXES.iter().find(|(p, _)| {
            name.len() > p.len() + 1
                && name.starts_with(p)
                && name.as_bytes()[p.len()] == b'-'
        }) else {
            break;
        };
        mods |= *m;
        name = &name[prefix.len() + 1..];
    }
    let code = if name.chars().count() == 1 {
        KeyCode::Char(name.chars().next().unwrap())
    } else if let Some((_, code)) = SPECIAL.iter().find(|(n, _)| *n == name) {
        *code
    } else if let Some(num) = name.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        KeyCode::F(num)
    } else {
        // A bare `<...>` with no modifiers and an unknown name is literal
        // text; with modifiers it is unsalvageable either way.
        return None;
    };
    // Shift is implicit in the character itself for printable keys.
    if let KeyCode::Char(_) = code {
        mods.remove(Mods::SHIFT);
    }
    Some((KeyEvent::new(code, mods), &input[close + 1..]))
}
