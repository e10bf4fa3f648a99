//! Editing settings shared by every caret of a buffer.
//!
//! Settings are passed explicitly to the tracker, broadcaster and engine; nothing here is global.
//! They can be built in code, loaded from TOML, or updated with Vim `:set` style option strings.
//!
//! ```rust
//! use vim_multicaret::{KeyModelOptions, SelectModeOptions, SelectionKind, Settings};
//!
//! let mut settings = Settings::from_toml_str(
//!     r#"
//!     selection = "exclusive"
//!     select_mode = "MOUSE | KEYBOARD"
//!     "#,
//! )
//! .unwrap();
//! settings.apply_option("keymodel=startsel").unwrap();
//!
//! assert_eq!(settings.selection, SelectionKind::Exclusive);
//! assert!(settings.select_mode.contains(SelectModeOptions::KEYBOARD));
//! assert!(settings.key_model.contains(KeyModelOptions::START_SELECTION));
//! ```

use crate::error::SettingsError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Whether the character under the end of a selection belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    /// The last selected character is the one under the caret.
    #[default]
    Inclusive,
    /// The selection ends just before the caret.
    Exclusive,
}

bitflags! {
    /// Triggers that start Select mode instead of Visual mode (`'selectmode'`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SelectModeOptions: u8 {
        /// Selecting with the mouse.
        const MOUSE = 0b001;
        /// Shifted special keys (when `keymodel` contains `startsel`).
        const KEYBOARD = 0b010;
        /// Commands such as `v`, `V`.
        const COMMAND = 0b100;
    }
}

bitflags! {
    /// Registers standing in for the unnamed register (`'clipboard'`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ClipboardOptions: u8 {
        /// The `*` register.
        const UNNAMED = 0b01;
        /// The `+` register.
        const UNNAMED_PLUS = 0b10;
    }
}

bitflags! {
    /// Behaviour of special keys around selections (`'keymodel'`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct KeyModelOptions: u8 {
        /// Shifted special keys start a selection.
        const START_SELECTION = 0b01;
        /// Unshifted special keys stop a selection.
        const STOP_SELECTION = 0b10;
    }
}

/// Buffer-wide editing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Inclusive or exclusive selection endpoints.
    pub selection: SelectionKind,
    /// When Select mode is used instead of Visual mode.
    pub select_mode: SelectModeOptions,
    /// How shifted special keys interact with selections.
    pub key_model: KeyModelOptions,
    /// Whether line jumps move the caret to the first non-blank character.
    pub start_of_line: bool,
    /// Display width of a tab character.
    pub tab_stop: usize,
    /// Clipboard registers used in place of the unnamed register.
    pub clipboard: ClipboardOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selection: SelectionKind::Inclusive,
            select_mode: SelectModeOptions::empty(),
            key_model: KeyModelOptions::empty(),
            start_of_line: true,
            tab_stop: 8,
            clipboard: ClipboardOptions::empty(),
        }
    }
}

impl Settings {
    /// Returns `true` if selections include the character under their end.
    pub fn is_inclusive(&self) -> bool {
        self.selection == SelectionKind::Inclusive
    }

    /// Returns `true` if shifted special keys start a selection.
    pub fn starts_selection(&self) -> bool {
        self.key_model.contains(KeyModelOptions::START_SELECTION)
    }

    /// Returns `true` if a keyboard-started selection enters Select mode.
    pub fn selects_from_keyboard(&self) -> bool {
        self.starts_selection() && self.select_mode.contains(SelectModeOptions::KEYBOARD)
    }

    /// Returns `true` if unshifted special keys end a selection.
    pub fn stops_selection(&self) -> bool {
        self.key_model.contains(KeyModelOptions::STOP_SELECTION)
    }

    /// Returns `true` if selecting with the mouse enters Select mode.
    pub fn selects_from_mouse(&self) -> bool {
        self.select_mode.contains(SelectModeOptions::MOUSE)
    }

    /// Returns `true` if `v`, `V` and `<C-v>` enter Select mode.
    pub fn selects_from_command(&self) -> bool {
        self.select_mode.contains(SelectModeOptions::COMMAND)
    }

    /// Returns `true` if yanks, deletes and puts go through the clipboard register.
    pub fn uses_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    /// Parse settings from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(source)?)
    }

    /// Serialize the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string(self)?)
    }

    /// Apply a single Vim option assignment such as `selection=exclusive`, `nostartofline` or
    /// `ts=4`. Long and short option names are accepted.
    pub fn apply_option(&mut self, option: &str) -> Result<(), SettingsError> {
        let option = option.trim();
        match option.split_once('=') {
            Some((name, value)) => self.set_option(name.trim(), Some(value.trim())),
            None => self.set_option(option, None),
        }
    }

    /// Set option `name` to `value` (`None` for boolean toggles).
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), SettingsError> {
        let invalid = |value: &str| SettingsError::InvalidValue {
            option: name.to_string(),
            value: value.to_string(),
        };

        match (name, value) {
            ("selection" | "sel", Some(value)) => {
                self.selection = match value {
                    "inclusive" => SelectionKind::Inclusive,
                    "exclusive" => SelectionKind::Exclusive,
                    other => return Err(invalid(other)),
                };
            }
            ("selectmode" | "slm", Some(value)) => {
                let mut options = SelectModeOptions::empty();
                for item in value.split(',').filter(|item| !item.is_empty()) {
                    options |= match item {
                        "mouse" => SelectModeOptions::MOUSE,
                        "key" => SelectModeOptions::KEYBOARD,
                        "cmd" => SelectModeOptions::COMMAND,
                        other => return Err(invalid(other)),
                    };
                }
                self.select_mode = options;
            }
            ("keymodel" | "km", Some(value)) => {
                let mut options = KeyModelOptions::empty();
                for item in value.split(',').filter(|item| !item.is_empty()) {
                    options |= match item {
                        "startsel" => KeyModelOptions::START_SELECTION,
                        "stopsel" => KeyModelOptions::STOP_SELECTION,
                        other => return Err(invalid(other)),
                    };
                }
                self.key_model = options;
            }
            ("clipboard" | "cb", Some(value)) => {
                let mut options = ClipboardOptions::empty();
                for item in value.split(',').filter(|item| !item.is_empty()) {
                    options |= match item {
                        "unnamed" => ClipboardOptions::UNNAMED,
                        "unnamedplus" => ClipboardOptions::UNNAMED_PLUS,
                        other => return Err(invalid(other)),
                    };
                }
                self.clipboard = options;
            }
            ("tabstop" | "ts", Some(value)) => {
                let width: usize = value.parse().map_err(|_| invalid(value))?;
                if width == 0 {
                    return Err(invalid(value));
                }
                self.tab_stop = width;
            }
            ("startofline" | "sol", None) => self.start_of_line = true,
            ("nostartofline" | "nosol", None) => self.start_of_line = false,
            _ => return Err(SettingsError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}
