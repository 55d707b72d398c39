//! Aim colours

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB colour, shown as `#rrggbb`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Neutral grey given to freshly created aims
    pub const NEUTRAL: Self = Self([122, 122, 122]);

    /// Channel values
    #[inline]
    #[must_use]
    pub fn channels(self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_hex() {
        assert_eq!(Rgb::NEUTRAL.to_string(), "#7a7a7a");
        assert_eq!(Rgb([0, 15, 255]).to_string(), "#000fff");
    }

    #[test]
    fn parses_hex() {
        assert_eq!("#7a7a7a".parse::<Rgb>().unwrap(), Rgb::NEUTRAL);
        assert_eq!("000fff".parse::<Rgb>().unwrap(), Rgb([0, 15, 255]));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zz0000".parse::<Rgb>().is_err());
    }
}
