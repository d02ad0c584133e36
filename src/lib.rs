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

pub mod build_utils;
pub mod config;
pub mod error;
pub mod fileutil;
pub mod manifest;
pub mod runtime;
pub mod serdeutil;
pub mod setup_utils;
pub mod stringutil;

pub use error::{Error, ErrorKind, Result};
pub use manifest::{DataFileEntry, DataFileManifest, ManifestFormat};
pub use setup_utils::{extend_package, extend_package_with, ExtendOptions, PermissionPolicy};
