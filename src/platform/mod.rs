//! Target boards
//!
//! Build-time data for the supported boards. The board decides the input
//! clock of the PLL and where the bitstream ends in flash, which is where
//! the font tables may start.

mod pll;

pub use pll::PllParams;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// UPduino v3 with the 12 MHz oscillator
    #[default]
    Upduino,
    /// TinyFPGA BX
    Tinyfpga,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Upduino, Platform::Tinyfpga];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Upduino => "upduino",
            Platform::Tinyfpga => "tinyfpga",
        }
    }

    /// Board oscillator feeding the PLL
    pub fn clock_hz(self) -> f64 {
        match self {
            Platform::Upduino => 12e6,
            Platform::Tinyfpga => 16e6,
        }
    }

    /// First flash byte past the bitstream
    pub fn flash_start(self) -> u32 {
        match self {
            Platform::Upduino => 0x2_0000,
            Platform::Tinyfpga => 0x5_0000,
        }
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| BuildError::UnknownPlatform(s.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("upduino".parse::<Platform>(), Ok(Platform::Upduino));
        assert_eq!("tinyfpga".parse::<Platform>(), Ok(Platform::Tinyfpga));
        assert_eq!(
            "icebreaker".parse::<Platform>(),
            Err(BuildError::UnknownPlatform("icebreaker".into()))
        );
    }

    #[test]
    fn test_every_board_can_clock_vga() {
        for p in Platform::ALL {
            assert!(PllParams::solve(p.clock_hz(), 25.175e6).is_ok(), "{}", p);
        }
    }
}
