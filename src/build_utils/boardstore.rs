// Copyright (C) 2025 Nuwaira
// All Rights Reserved.
//
// NOTICE: All information contained herein is, and remains
// the property of Nuwaira.
// The intellectual and technical concepts contained
// herein are proprietary to Nuwaira
// and are protected by trade secret or copyright law.
// Dissemination of this information or reproduction of this material
// is strictly forbidden unless prior written permission is obtained
// from Nuwaira.

//! Reader for a board repository checkout laid out as
//! `boards/<manufacturer>/<board>/<version>/board.xml`.

use crate::error::{Error, Result};
use crate::fileutil::{ensure_dir, scan_files, ScanOptions};
use lazy_static::lazy_static;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANUFACTURERS: &[&str] = &["Avnet", "Digilent", "TUL", "Xilinx"];

lazy_static! {
    static ref RFSOC_PARTS: HashSet<&'static str> = [
        "xczu21dr", "xczu25dr", "xczu27dr", "xczu28dr", "xczu29dr", "xczu39dr", "xczu42dr",
        "xczu43dr", "xczu46dr", "xczu47dr", "xczu48dr", "xczu49dr", "xczu65dr", "xczu67dr",
    ]
    .into_iter()
    .collect();
    static ref PRESET_KEYS: HashSet<&'static str> = [
        "PSU__DDRC__CL",
        "PSU__DDRC__BUS_WIDTH",
        "PSU__CRL_APB__CPU_R5_CTRL__FREQMHZ",
        "PSU__CRF_APB__ACPU_CTRL__FREQMHZ",
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Zynq7000,
    ZynqUltraScale,
    ZynqRFSoC,
    Versal,
    Unknown,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Family::Zynq7000 => "Zynq7000",
            Family::ZynqUltraScale => "ZynqUltraScale",
            Family::ZynqRFSoC => "ZynqRFSoC",
            Family::Versal => "Versal",
            Family::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Zynq7000" => Ok(Family::Zynq7000),
            "ZynqUltraScale" => Ok(Family::ZynqUltraScale),
            "ZynqRFSoC" => Ok(Family::ZynqRFSoC),
            "Versal" => Ok(Family::Versal),
            "Unknown" => Ok(Family::Unknown),
            other => Err(format!("unknown board family '{}'", other)),
        }
    }
}

// -----------------------------
// XML documents
// -----------------------------

#[derive(Debug, Deserialize)]
struct BoardXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@display_name", default)]
    display_name: Option<String>,
    #[serde(rename = "@vendor", default)]
    vendor: String,
    #[serde(rename = "@preset_file", default)]
    preset_file: Option<String>,
    #[serde(default)]
    file_version: String,
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    #[serde(rename = "component", default)]
    component: Vec<Component>,
}

#[derive(Debug, Deserialize)]
struct Component {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@part_name", default)]
    part_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IpPresets {
    #[serde(rename = "ip_preset", default)]
    ip_preset: Vec<IpPreset>,
}

#[derive(Debug, Deserialize)]
struct IpPreset {
    #[serde(rename = "@preset_proc_name", default)]
    preset_proc_name: Option<String>,
    #[serde(rename = "ip", default)]
    ip: Vec<PresetIp>,
}

#[derive(Debug, Deserialize)]
struct PresetIp {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(default)]
    user_parameters: Option<UserParameters>,
}

#[derive(Debug, Default, Deserialize)]
struct UserParameters {
    #[serde(rename = "user_parameter", default)]
    user_parameter: Vec<UserParameter>,
}

#[derive(Debug, Deserialize)]
struct UserParameter {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@value", default)]
    value: String,
}

fn read_xml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    from_str(&content).map_err(|e| Error::Xml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// -----------------------------
// Board
// -----------------------------

#[derive(Debug, Clone)]
pub struct Board {
    pub name: String,
    pub display_name: String,
    pub vendor: String,
    pub part_name: Option<String>,
    pub file_version: String,
    pub current_version: String,
    pub available_versions: Vec<String>,
    pub board_xml_path: PathBuf,
    pub preset_path: Option<PathBuf>,
}

impl Board {
    /// Load the newest `board.xml` found below `board_dir`. Versions are the
    /// names of the directories holding each `board.xml`; the greatest one
    /// in string order wins.
    pub fn load(board_dir: impl AsRef<Path>) -> Result<Board> {
        let board_dir = board_dir.as_ref();
        let versions = resolve_paths(board_dir)?;
        let (current_version, board_xml_path) = versions
            .iter()
            .next_back()
            .map(|(v, p)| (v.clone(), p.clone()))
            .ok_or_else(|| Error::not_found(board_dir.join("board.xml")))?;

        let xml: BoardXml = read_xml(&board_xml_path)?;
        let part_name = xml
            .components
            .component
            .iter()
            .find(|c| c.name == "part0")
            .and_then(|c| c.part_name.clone());
        let preset_path = xml
            .preset_file
            .as_ref()
            .and_then(|f| board_xml_path.parent().map(|dir| dir.join(f)));

        Ok(Board {
            display_name: xml.display_name.unwrap_or_else(|| xml.name.clone()),
            name: xml.name,
            vendor: xml.vendor,
            part_name,
            file_version: xml.file_version.trim().to_string(),
            current_version,
            available_versions: versions.keys().cloned().collect(),
            board_xml_path,
            preset_path,
        })
    }

    /// VLNV-style identifier: `vendor:name:part0:file_version`.
    pub fn typestring(&self) -> String {
        format!("{}:{}:part0:{}", self.vendor, self.name, self.file_version)
    }

    /// Device family, derived from the processor presets in `preset.xml`.
    pub fn family(&self) -> Family {
        let Some(presets) = self.read_presets() else {
            return Family::Unknown;
        };
        let has_proc = |proc_name: &str| {
            presets
                .ip_preset
                .iter()
                .any(|p| p.preset_proc_name.as_deref() == Some(proc_name))
        };

        if has_proc("zynq_ultra_ps_e_preset") {
            let part = self.part_name.as_deref().unwrap_or("");
            let prefix = part.split('-').next().unwrap_or("");
            if RFSOC_PARTS.contains(prefix) {
                Family::ZynqRFSoC
            } else {
                Family::ZynqUltraScale
            }
        } else if has_proc("ps7_preset") {
            Family::Zynq7000
        } else if presets
            .ip_preset
            .iter()
            .any(|p| p.ip.iter().any(|ip| ip.name.as_deref() == Some("versal_cips")))
        {
            Family::Versal
        } else {
            Family::Unknown
        }
    }

    /// Processor presets that override the PS configuration of a design:
    /// DDR timing and CPU clocks, keyed without the `CONFIG.` prefix.
    pub fn preset_dict(&self) -> Result<BTreeMap<String, String>> {
        let path = self
            .preset_path
            .as_ref()
            .ok_or_else(|| Error::not_found(self.board_xml_path.with_file_name("preset.xml")))?;
        let presets: IpPresets = read_xml(path)?;

        let mut result = BTreeMap::new();
        let params = presets
            .ip_preset
            .iter()
            .flat_map(|p| p.ip.iter())
            .filter_map(|ip| ip.user_parameters.as_ref())
            .flat_map(|up| up.user_parameter.iter());
        for param in params {
            if let Some(key) = param.name.split('.').nth(1) {
                if PRESET_KEYS.contains(key) {
                    result.insert(key.to_string(), param.value.clone());
                }
            }
        }
        Ok(result)
    }

    fn read_presets(&self) -> Option<IpPresets> {
        let path = self.preset_path.as_ref()?;
        match read_xml(path) {
            Ok(presets) => Some(presets),
            Err(e) => {
                tracing::debug!("No usable preset for board {}: {}", self.name, e);
                None
            }
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// All `board.xml` files below `board_dir`, keyed by their parent directory
/// name.
fn resolve_paths(board_dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut versions = BTreeMap::new();
    for rel in scan_files(board_dir, &ScanOptions::default())? {
        if rel.file_name().and_then(|n| n.to_str()) != Some("board.xml") {
            continue;
        }
        let path = board_dir.join(&rel);
        let version = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        versions.insert(version, path);
    }
    Ok(versions)
}

// -----------------------------
// BoardStore
// -----------------------------

#[derive(Debug, Clone)]
pub struct BoardStore {
    repo_path: PathBuf,
    boards: Vec<Board>,
}

impl BoardStore {
    /// Scan an existing checkout. `families` restricts the result to the
    /// listed device families; `manufacturers` defaults to
    /// [`DEFAULT_MANUFACTURERS`].
    pub fn open(
        repo_path: impl AsRef<Path>,
        families: Option<&[Family]>,
        manufacturers: Option<&[&str]>,
    ) -> Result<BoardStore> {
        let repo_path = repo_path.as_ref().to_path_buf();
        let boards_dir = repo_path.join("boards");
        ensure_dir(&boards_dir)?;
        let manufacturers = manufacturers.unwrap_or(DEFAULT_MANUFACTURERS);

        let mut boards = Vec::new();
        for manufacturer in sorted_subdirs(&boards_dir)? {
            let Some(name) = manufacturer.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !manufacturers.contains(&name) {
                continue;
            }

            for board_dir in sorted_subdirs(&manufacturer)? {
                let board = match Board::load(&board_dir) {
                    Ok(board) => board,
                    Err(e) => {
                        tracing::warn!("Skipping board {:?}: {}", board_dir, e);
                        continue;
                    }
                };
                if board.part_name.is_none() {
                    continue;
                }
                if let Some(families) = families {
                    if !families.contains(&board.family()) {
                        continue;
                    }
                }
                boards.push(board);
            }
        }

        tracing::info!("Loaded {} board(s) from {:?}", boards.len(), repo_path);
        Ok(BoardStore { repo_path, boards })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Board> {
        self.boards.iter()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

impl<'a> IntoIterator for &'a BoardStore {
    type Item = &'a Board;
    type IntoIter = std::slice::Iter<'a, Board>;

    fn into_iter(self) -> Self::IntoIter {
        self.boards.iter()
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
