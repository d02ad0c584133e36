//! Reader for Vivado hardware export archives (`.xsa`).
//!
//! An XSA is a zip file. `sysdef.xml` inside it lists the bitstreams and
//! hardware handoff (HWH) files of the design; members are pulled out on
//! demand into a caller-provided directory.

use crate::error::{Error, Result};
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const SYSDEF: &str = "sysdef.xml";
const XSA_JSON: &str = "xsa.json";
const PYNQ_JSON: &str = "pynq.json";
const BDC_METADATA_SUFFIX: &str = "_pynq_bdc_metadata.json";

#[derive(Debug, Default, Deserialize)]
struct SysDef {
    #[serde(rename = "File", default)]
    files: Vec<SysDefFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct SysDefFile {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@Type", default)]
    file_type: Option<String>,
    #[serde(rename = "@BD_TYPE", default)]
    bd_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct XsaParser {
    archive: PathBuf,
    members: BTreeSet<String>,
    json: Value,
    sysdef_files: Vec<SysDefFile>,
}

impl XsaParser {
    pub fn open(path: impl AsRef<Path>) -> Result<XsaParser> {
        let archive = path.as_ref().to_path_buf();
        if !archive.is_file() {
            return Err(Error::not_found(&archive));
        }

        let mut zip = ZipArchive::new(fs::File::open(&archive)?)?;
        let members: BTreeSet<String> = zip.file_names().map(str::to_string).collect();

        let json_text = read_member(&mut zip, &archive, &members, XSA_JSON)?;
        let json: Value = serde_json::from_str(&json_text)?;

        let sysdef_text = read_member(&mut zip, &archive, &members, SYSDEF)?;
        let sysdef: SysDef = from_str(&sysdef_text).map_err(|e| Error::Xml {
            path: archive.join(SYSDEF),
            message: e.to_string(),
        })?;

        tracing::debug!(
            "Opened {:?}: {} member(s), {} sysdef file(s)",
            archive,
            members.len(),
            sysdef.files.len()
        );
        Ok(XsaParser {
            archive,
            members,
            json,
            sysdef_files: sysdef.files,
        })
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Contents of `xsa.json`.
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// Bitstreams, i.e. sysdef entries with `Type="BIT"`.
    pub fn bitstream_members(&self) -> Vec<String> {
        self.sysdef_names(|f| f.file_type.as_deref() == Some("BIT"))
    }

    /// Every hardware handoff listed in sysdef.
    pub fn hwh_members(&self) -> Vec<String> {
        self.sysdef_names(|f| f.file_type.as_deref() == Some("HW_HANDOFF"))
    }

    /// HWH of the top-level block design (`BD_TYPE="DEFAULT_BD"`).
    pub fn default_hwh_members(&self) -> Vec<String> {
        self.sysdef_names(|f| f.bd_type.as_deref() == Some("DEFAULT_BD"))
    }

    /// HWHs of block design containers (`BD_TYPE="REFERENCE_BD"`).
    pub fn reference_hwh_members(&self) -> Vec<String> {
        self.sysdef_names(|f| f.bd_type.as_deref() == Some("REFERENCE_BD"))
    }

    /// Metadata JSON written alongside each reference HWH.
    pub fn reference_bdc_json_members(&self) -> Vec<String> {
        self.reference_hwh_members()
            .iter()
            .map(|name| {
                let stem = Path::new(name).with_extension("");
                format!("{}{}", stem.to_string_lossy(), BDC_METADATA_SUFFIX)
            })
            .collect()
    }

    /// Modifications recorded in `pynq.json`, empty when the archive has
    /// none or the file is unreadable.
    pub fn pynq_modifications(&self) -> BTreeMap<String, String> {
        if !self.members.contains(PYNQ_JSON) {
            return BTreeMap::new();
        }
        let parsed: Result<BTreeMap<String, String>> = self
            .open_zip()
            .and_then(|mut zip| read_member(&mut zip, &self.archive, &self.members, PYNQ_JSON))
            .and_then(|text| Ok(serde_json::from_str(&text)?));
        match parsed {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {} in {:?}: {}", PYNQ_JSON, self.archive, e);
                BTreeMap::new()
            }
        }
    }

    /// Extract `members` under `dest` and return their paths, in order.
    /// Fails before writing anything if one of them is not in the archive.
    pub fn extract(&self, members: &[String], dest: &Path) -> Result<Vec<PathBuf>> {
        if let Some(missing) = members.iter().find(|m| !self.members.contains(*m)) {
            return Err(Error::MissingMember {
                archive: self.archive.clone(),
                member: missing.clone(),
            });
        }

        let mut zip = self.open_zip()?;
        let mut paths = Vec::with_capacity(members.len());
        for member in members {
            let mut file = zip.by_name(member)?;
            let rel = file.enclosed_name().ok_or_else(|| Error::MissingMember {
                archive: self.archive.clone(),
                member: member.clone(),
            })?;
            let out_path = dest.join(rel);
            if !out_path.exists() {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = fs::File::create(&out_path)?;
                io::copy(&mut file, &mut out)?;
            }
            paths.push(out_path);
        }
        Ok(paths)
    }

    pub fn bitstream_paths(&self, dest: &Path) -> Result<Vec<PathBuf>> {
        self.extract(&self.bitstream_members(), dest)
    }

    pub fn default_hwh_paths(&self, dest: &Path) -> Result<Vec<PathBuf>> {
        self.extract(&self.default_hwh_members(), dest)
    }

    pub fn reference_hwh_paths(&self, dest: &Path) -> Result<Vec<PathBuf>> {
        self.extract(&self.reference_hwh_members(), dest)
    }

    fn sysdef_names(&self, keep: impl Fn(&SysDefFile) -> bool) -> Vec<String> {
        self.sysdef_files
            .iter()
            .filter(|f| keep(f))
            .map(|f| f.name.clone())
            .collect()
    }

    fn open_zip(&self) -> Result<ZipArchive<fs::File>> {
        Ok(ZipArchive::new(fs::File::open(&self.archive)?)?)
    }
}

fn read_member(
    zip: &mut ZipArchive<fs::File>,
    archive: &Path,
    members: &BTreeSet<String>,
    member: &str,
) -> Result<String> {
    if !members.contains(member) {
        return Err(Error::MissingMember {
            archive: archive.to_path_buf(),
            member: member.to_string(),
        });
    }
    let mut content = String::new();
    zip.by_name(member)?.read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const SYSDEF_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Project Name="base" DEVICE="xc7z020">
  <File Type="BIT" Name="base.bit"/>
  <File Type="HW_HANDOFF" Name="base.hwh" BD_TYPE="DEFAULT_BD"/>
  <File Type="HW_HANDOFF" Name="bdc/mb.hwh" BD_TYPE="REFERENCE_BD"/>
  <File Type="MMI" Name="base.mmi"/>
</Project>"#;

    fn write_xsa(dir: &Path, members: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("base.xsa");
        let mut zip = ZipWriter::new(fs::File::create(&path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn base_xsa(dir: &Path) -> PathBuf {
        write_xsa(
            dir,
            &[
                ("xsa.json", r#"{"name": "base", "platformState": "impl"}"#),
                ("sysdef.xml", SYSDEF_XML),
                ("base.bit", "BITSTREAM"),
                ("base.hwh", "<hwh/>"),
                ("bdc/mb.hwh", "<bdc/>"),
                ("pynq.json", r#"{"mb": "bdc/mb_pynq_bdc_metadata.json"}"#),
            ],
        )
    }

    #[test]
    fn test_member_lists() {
        let temp = TempDir::new().unwrap();
        let xsa = XsaParser::open(base_xsa(temp.path())).unwrap();

        assert_eq!(xsa.bitstream_members(), vec!["base.bit"]);
        assert_eq!(xsa.hwh_members(), vec!["base.hwh", "bdc/mb.hwh"]);
        assert_eq!(xsa.default_hwh_members(), vec!["base.hwh"]);
        assert_eq!(xsa.reference_hwh_members(), vec!["bdc/mb.hwh"]);
        assert_eq!(
            xsa.reference_bdc_json_members(),
            vec!["bdc/mb_pynq_bdc_metadata.json"]
        );
        assert_eq!(xsa.json()["name"], "base");
        assert_eq!(
            xsa.pynq_modifications().get("mb").map(String::as_str),
            Some("bdc/mb_pynq_bdc_metadata.json")
        );
    }

    #[test]
    fn test_extract_paths() {
        let temp = TempDir::new().unwrap();
        let xsa = XsaParser::open(base_xsa(temp.path())).unwrap();
        let dest = temp.path().join("extracted");

        let bits = xsa.bitstream_paths(&dest).unwrap();
        assert_eq!(bits, vec![dest.join("base.bit")]);
        assert_eq!(fs::read_to_string(&bits[0]).unwrap(), "BITSTREAM");

        let refs = xsa.reference_hwh_paths(&dest).unwrap();
        assert_eq!(refs, vec![dest.join("bdc/mb.hwh")]);
        assert_eq!(fs::read_to_string(&refs[0]).unwrap(), "<bdc/>");

        assert_eq!(xsa.default_hwh_paths(&dest).unwrap(), vec![dest.join("base.hwh")]);
    }

    #[test]
    fn test_extract_missing_member() {
        let temp = TempDir::new().unwrap();
        let path = write_xsa(
            temp.path(),
            &[("xsa.json", "{}"), ("sysdef.xml", SYSDEF_XML)],
        );
        let xsa = XsaParser::open(path).unwrap();
        let dest = temp.path().join("out");

        let err = xsa.bitstream_paths(&dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("base.bit not found"));
        assert!(!dest.exists());
        assert!(xsa.pynq_modifications().is_empty());
    }

    #[test]
    fn test_open_requires_sysdef_and_archive() {
        let temp = TempDir::new().unwrap();
        let path = write_xsa(temp.path(), &[("xsa.json", "{}")]);
        assert!(matches!(
            XsaParser::open(path),
            Err(Error::MissingMember { member, .. }) if member == "sysdef.xml"
        ));

        let err = XsaParser::open(temp.path().join("nope.xsa")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
