//! Category color table shared by node and label rendering

use std::collections::HashMap;

use crate::config::{Config, ConfigError};

/// Packed 0xRRGGBB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Rgb)
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0)
    }

    pub fn channels(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }
}

#[derive(Debug, Clone)]
pub struct Palette {
    colors: HashMap<String, Rgb>,
    fallback: Rgb,
}

impl Palette {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let parse = |key: &str, value: &str| {
            Rgb::from_hex(value).ok_or_else(|| ConfigError::InvalidColor {
                key: key.to_string(),
                value: value.to_string(),
            })
        };

        let mut colors = HashMap::with_capacity(config.categories.len());
        for (tag, hex) in &config.categories {
            colors.insert(tag.clone(), parse(tag, hex)?);
        }
        let fallback = parse("fallback_color", &config.fallback_color)?;

        Ok(Self { colors, fallback })
    }

    /// Color for a theme tag; unknown tags get the fallback
    pub fn color_for(&self, tag: &str) -> Rgb {
        self.colors.get(tag).copied().unwrap_or(self.fallback)
    }

    /// Color of an item keyed by its first theme
    pub fn primary_color(&self, themes: &[String]) -> Rgb {
        themes
            .first()
            .map(|t| self.color_for(t))
            .unwrap_or(self.fallback)
    }
}
