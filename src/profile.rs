//! Per-core configuration tables.
//!
//! Emulator cores identify themselves with a free-form string such as
//! `"SNES9x Next"` or `"Genesis Plus GX"`. Tables here are matched against
//! that string by case-sensitive substring, first row wins.

use std::fmt;

/// ROM extensions accepted by each family of cores.
static ROM_EXTENSIONS: &[(&[&str], &str)] = &[
    (
        &["SNES"],
        "smc|fig|sfc|gd3|gd7|dx2|bsx|swc|zip|SMC|FIG|SFC|BSX|GD3|GD7|DX2|SWC|ZIP",
    ),
    (&["FCEU"], "fds|FDS|zip|ZIP|nes|NES|unif|UNIF"),
    (&["VBA", "Meteor"], "gb|gbc|gba|GBA|GB|GBC|zip|ZIP"),
    (&["gambatte"], "gb|gbc|GB|GBC|zip|ZIP"),
    (&["FB Alpha"], "zip|ZIP"),
    (
        &["Genesis Plus GX"],
        "md|smd|bin|gen|zip|MD|SMD|bin|GEN|ZIP|sms|SMS|gg|GG|sg|SG",
    ),
];

/// Resolves the ROM extension list for a core.
#[derive(Debug, Clone, Default)]
pub struct RomExtensions {
    custom: String,
}

impl RomExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback list used for cores missing from the built-in table.
    pub fn set_custom(&mut self, extensions: impl Into<String>) {
        self.custom = extensions.into();
    }

    /// Pipe-separated extensions for `core_id`, e.g. `"gb|gbc|zip"`.
    pub fn lookup<'a>(&'a self, core_id: &str) -> Option<&'a str> {
        rom_extensions(core_id)
            .or_else(|| (!self.custom.is_empty()).then_some(self.custom.as_str()))
    }
}

/// Built-in ROM extension list for `core_id`, without a custom fallback.
pub fn rom_extensions(core_id: &str) -> Option<&'static str> {
    ROM_EXTENSIONS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| core_id.contains(needle)))
        .map(|(_, extensions)| *extensions)
}

/// Joypad buttons, in libsnes device id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoypadButton {
    B,
    Y,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
    A,
    X,
    L,
    R,
}

impl JoypadButton {
    pub const ALL: [JoypadButton; 12] = [
        JoypadButton::B,
        JoypadButton::Y,
        JoypadButton::Select,
        JoypadButton::Start,
        JoypadButton::Up,
        JoypadButton::Down,
        JoypadButton::Left,
        JoypadButton::Right,
        JoypadButton::A,
        JoypadButton::X,
        JoypadButton::L,
        JoypadButton::R,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            JoypadButton::B => "B button",
            JoypadButton::Y => "Y button",
            JoypadButton::Select => "Select button",
            JoypadButton::Start => "Start button",
            JoypadButton::Up => "D-Pad Up",
            JoypadButton::Down => "D-Pad Down",
            JoypadButton::Left => "D-Pad Left",
            JoypadButton::Right => "D-Pad Right",
            JoypadButton::A => "A button",
            JoypadButton::X => "X button",
            JoypadButton::L => "L button",
            JoypadButton::R => "R button",
        }
    }
}

/// Keybind label overrides per core.
static KEYBIND_OVERRIDES: &[(&str, &[(JoypadButton, &str)])] = &[(
    "Genesis Plus GX",
    &[
        (JoypadButton::B, "B button"),
        (JoypadButton::A, "C button"),
        (JoypadButton::X, "Y button"),
        (JoypadButton::Y, "A button"),
        (JoypadButton::L, "X button"),
        (JoypadButton::R, "Z button"),
        (JoypadButton::Select, "Mode button"),
    ],
)];

/// Display names of every joypad button for one core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindNames {
    names: [&'static str; 12],
}

impl KeybindNames {
    pub fn get(&self, button: JoypadButton) -> &'static str {
        self.names[button as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (JoypadButton, &'static str)> + '_ {
        JoypadButton::ALL.iter().map(|&button| (button, self.get(button)))
    }
}

impl Default for KeybindNames {
    fn default() -> Self {
        Self {
            names: JoypadButton::ALL.map(JoypadButton::default_name),
        }
    }
}

impl fmt::Display for KeybindNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (button, name) in self.iter() {
            writeln!(f, "{:<8} {}", format!("{:?}", button), name)?;
        }
        Ok(())
    }
}

/// Keybind display names for `core_id`.
pub fn keybind_names(core_id: &str) -> KeybindNames {
    let mut names = KeybindNames::default();
    if let Some((_, overrides)) = KEYBIND_OVERRIDES
        .iter()
        .find(|(needle, _)| core_id.contains(needle))
    {
        for &(button, name) in overrides.iter() {
            names.names[button as usize] = name;
        }
    }
    names
}

/// Filesystem-friendly name for a core: lowercased, whitespace as `_`.
///
/// Returns an empty string when the identity needs `capacity` bytes or more.
pub fn core_name_from_id(core_id: &str, capacity: usize) -> String {
    if core_id.len() >= capacity {
        return String::new();
    }

    core_id
        .chars()
        .map(|c| {
            // Vertical tab is whitespace too, unlike in is_ascii_whitespace
            if c.is_ascii_whitespace() || c == '\x0b' {
                '_'
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}
