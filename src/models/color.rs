use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// Stroke color of a metroline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl FromStr for Rgb {
    type Err = MapError;

    /// Parse the `rgb(r, g, b)` triple format
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MapError::InvalidColor(s.to_string());

        let inner = s
            .trim()
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let components = inner
            .split(',')
            .map(|part| part.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match components.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_triple() {
        assert_eq!("rgb(255, 0, 12)".parse::<Rgb>(), Ok(Rgb::new(255, 0, 12)));
        assert_eq!(" rgb(1,2,3) ".parse::<Rgb>(), Ok(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_reject_malformed_colors() {
        for bad in ["#ff0000", "rgb(256, 0, 0)", "rgb(1, 2)", "rgb(1, 2, 3, 4)", "rgb(a, b, c)", "rgb(1, 2, 3"] {
            assert!(
                matches!(bad.parse::<Rgb>(), Err(MapError::InvalidColor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_matches_parse_format() {
        let color = Rgb::new(10, 20, 30);
        assert_eq!(color.to_string(), "rgb(10, 20, 30)");
        assert_eq!(color.to_string().parse::<Rgb>(), Ok(color));
    }
}
