use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Device-tree node present on boards running a PYNQ image.
pub const BOARD_MARKER: &str = "/proc/device-tree/chosen/pynq_board";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Embedded Zynq-class board running the full image.
    Edge,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Edge => f.write_str("edge"),
        }
    }
}

pub fn get_platform() -> Result<Platform> {
    let board = std::env::var("BOARD").ok();
    detect_platform(Path::new(BOARD_MARKER), board.as_deref())
}

pub fn detect_platform(marker: &Path, board: Option<&str>) -> Result<Platform> {
    let on_target = marker.is_file();
    let board_set = board.map(|b| !b.is_empty()).unwrap_or(false);

    if on_target || board_set {
        Ok(Platform::Edge)
    } else {
        Err(Error::UnsupportedPlatform {
            arch: std::env::consts::ARCH.to_string(),
        })
    }
}
