use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CubismError, CubismResult};

/// Opaque RGB color as used by chart band palettes.
///
/// Serializes as the CSS hex string the wrapped runtime consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(input: &str) -> CubismResult<Self> {
        let digits = input.trim().strip_prefix('#').ok_or_else(|| {
            CubismError::InvalidConfig(format!("color `{input}` must start with `#`"))
        })?;
        if !digits.is_ascii() {
            return Err(CubismError::InvalidConfig(format!(
                "color `{input}` is not hex"
            )));
        }

        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16)
                .map_err(|_| CubismError::InvalidConfig(format!("color `{input}` is not hex")))
        };

        match digits.len() {
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |hex: &str| channel(hex).map(|v| v * 17);
                Ok(Self::rgb(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => Err(CubismError::InvalidConfig(format!(
                "color `{input}` must have 3 or 6 hex digits"
            ))),
        }
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = CubismError;

    fn from_str(input: &str) -> CubismResult<Self> {
        Self::from_hex(input)
    }
}

impl TryFrom<String> for Color {
    type Error = CubismError;

    fn try_from(value: String) -> CubismResult<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Parses a palette, failing on the first invalid entry.
pub fn palette(hex: &[&str]) -> CubismResult<Vec<Color>> {
    hex.iter().map(|value| Color::from_hex(value)).collect()
}

/// Default horizon palette: four negative blues followed by four positive greens.
#[must_use]
pub fn default_horizon_colors() -> Vec<Color> {
    vec![
        Color::rgb(0x08, 0x51, 0x9c),
        Color::rgb(0x31, 0x82, 0xbd),
        Color::rgb(0x6b, 0xae, 0xd6),
        Color::rgb(0xbd, 0xd7, 0xe7),
        Color::rgb(0xba, 0xe4, 0xb3),
        Color::rgb(0x74, 0xc4, 0x76),
        Color::rgb(0x31, 0xa3, 0x54),
        Color::rgb(0x00, 0x6d, 0x2c),
    ]
}

/// Default comparison palette: negative fill, negative stroke, positive fill, positive stroke.
#[must_use]
pub fn default_comparison_colors() -> Vec<Color> {
    vec![
        Color::rgb(0x9e, 0xca, 0xe1),
        Color::rgb(0x22, 0x5b, 0x84),
        Color::rgb(0xa1, 0xd9, 0x9b),
        Color::rgb(0x22, 0x72, 0x3a),
    ]
}
