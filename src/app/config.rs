//! Build configuration for the terminal

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result as BuildResult};
use crate::flash::{FlashLayout, ReaderWidth};
use crate::platform::{Platform, PllParams};
use crate::serial::BAUD;
use crate::signals::CursorShape;
use crate::video::{Rgb, Timings};

/// Terminal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target board name
    pub platform: String,
    /// Display timing profile name
    pub resolution: String,
    /// Flash data lines used by the reader (1, 2 or 4)
    pub reader_width: u8,
    pub cursor: CursorConfig,
    /// Text colour
    pub foreground: Rgb,
    /// Background colour
    pub background: Rgb,
    /// UART line rate
    pub baud: u32,
    /// Flash chip size in MiB
    pub flash_mib: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: Platform::Upduino.name().to_string(),
            resolution: "640x480".to_string(),
            reader_width: 4,
            cursor: CursorConfig::default(),
            foreground: Rgb::WHITE,
            background: Rgb::BLACK,
            baud: BAUD,
            flash_mib: 4,
        }
    }
}

/// Cursor appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub shape: CursorShape,
    pub blink: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            shape: CursorShape::Box,
            blink: true,
        }
    }
}

/// Everything the simulator needs, resolved from a [`Config`]
#[derive(Debug, Clone)]
pub struct BuildParams {
    pub platform: Platform,
    pub timings: Timings,
    pub pll: PllParams,
    pub reader_width: ReaderWidth,
    pub cursor: CursorConfig,
    pub foreground: Rgb,
    pub background: Rgb,
    /// UART clocks per bit at the PLL output frequency
    pub divisor: u32,
    /// Flash chip size in bytes
    pub flash_size: u32,
}

impl BuildParams {
    /// Pack the font tables behind the bitstream of this board
    pub fn allocate_layout(&self, font1_size: u32, font2_size: u32) -> BuildResult<FlashLayout> {
        FlashLayout::allocate(
            self.platform.flash_start(),
            self.flash_size,
            font1_size,
            font2_size,
        )
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        if let Some(config_dir) = dirs_config_path() {
            let config_path = config_dir.join("config.json");
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("ignoring {}: {}", config_path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Resolve names and solve the clocking. Fails on anything the hardware
    /// could not be built with.
    pub fn build(&self) -> BuildResult<BuildParams> {
        let platform: Platform = self.platform.parse()?;
        let timings = Timings::profile(&self.resolution)?;
        let reader_width = ReaderWidth::try_from(self.reader_width)?;
        let pll = PllParams::solve(platform.clock_hz(), timings.pclk_hz())?;

        if !self.flash_mib.is_power_of_two() || self.flash_mib > 16 {
            return Err(BuildError::UnsupportedFlashSize(self.flash_mib));
        }

        if self.baud == 0 {
            return Err(BuildError::ZeroBaud);
        }
        let divisor = (pll.f_out / f64::from(self.baud)) as u32;
        if divisor < 2 {
            return Err(BuildError::BaudTooFast {
                baud: self.baud,
                clock_hz: pll.f_out as u32,
            });
        }

        tracing::info!(
            "building for {} with {} ({}-bit flash)",
            platform,
            self.resolution,
            reader_width.bits()
        );

        Ok(BuildParams {
            platform,
            timings,
            pll,
            reader_width,
            cursor: self.cursor,
            foreground: self.foreground,
            background: self.background,
            divisor,
            flash_size: self.flash_mib << 20,
        })
    }
}

/// Get the configuration directory path
fn dirs_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config").join("uniterm"))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}
