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
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::exit;

use pynq_utils::build_utils::{BoardStore, Family, XsaParser};
use pynq_utils::config::Config;
use pynq_utils::runtime::init_logging;
use pynq_utils::setup_utils::{
    collect_package_files, extend_package_with, find_version, get_board, get_platform,
    read_version_txt,
};
use pynq_utils::{DataFileManifest, ManifestFormat};

#[derive(Parser, Debug)]
#[command(name = "pynq-utils")]
#[command(about = "Packaging and board helpers for PYNQ-style projects")]
#[command(author, version, long_about=None)]
struct Args {
    /// Config file (default: pynq-utils.toml if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level: critical, error, warning, info, debug
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CommandEnum,
}

/// Enum of subcommands
#[derive(Subcommand, Debug)]
enum CommandEnum {
    /// Build a package-data manifest from one or more directory trees.
    Extend {
        /// Directories to scan (default: `roots` from the config)
        roots: Vec<PathBuf>,
        #[arg(short, long, help = "Installed package name prefix")]
        prefix: Option<String>,
        #[arg(short, long, help = "Output format: json, toml or python")]
        format: Option<ManifestFormat>,
        #[arg(short, long, help = "Write the manifest to a file instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, help = "Skip files and directories starting with '.'")]
        skip_hidden: bool,
        #[arg(long, help = "Follow symbolic links")]
        follow_links: bool,
        #[arg(long, help = "Fail on unreadable files instead of skipping them")]
        strict: bool,
        #[arg(short, long, help = "Glob pattern to leave out, may be repeated")]
        exclude: Vec<String>,
    },
    /// List package files as `../<path>` entries, one per line.
    Files { paths: Vec<PathBuf> },
    /// Print the version declared in a source file.
    FindVersion {
        file: PathBuf,
        #[arg(long, help = "Read the first line of a version.txt instead")]
        txt: bool,
    },
    /// Print the detected install platform.
    Platform,
    /// Print the target board from the BOARD variable.
    Board {
        #[arg(short, long, help = "Supported board name, may be repeated")]
        compatible: Vec<String>,
    },
    /// List boards from a board repository checkout.
    Boards {
        repo: PathBuf,
        #[arg(short, long, help = "Device family to keep, may be repeated")]
        family: Vec<Family>,
        #[arg(short, long, help = "Manufacturer to scan, may be repeated")]
        manufacturer: Vec<String>,
    },
    /// List the bitstreams and HWH files of a Vivado XSA archive.
    Xsa {
        file: PathBuf,
        #[arg(short, long, help = "Extract the listed files into this directory")]
        extract: Option<PathBuf>,
    },
    /// Print version info
    Version,
}

fn parse_args() -> (Args, Config) {
    dotenv::dotenv().ok();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).unwrap_or_else(|err| {
        eprintln!(
            "Error reading config file {}: {}",
            args.config.as_deref().unwrap_or(pynq_utils::config::DEFAULT_CONFIG_FILE),
            err
        );
        exit(1);
    });

    (args, config)
}

fn main() {
    let (args, config) = parse_args();

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "warning".to_string());
    if let Err(e) = init_logging(&level) {
        eprintln!("Error: {}", e);
        exit(1);
    }

    if let Err(e) = run(args.command, config) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn run(command: CommandEnum, mut config: Config) -> Result<()> {
    match command {
        CommandEnum::Extend {
            roots,
            prefix,
            format,
            output,
            skip_hidden,
            follow_links,
            strict,
            exclude,
        } => {
            config.skip_hidden |= skip_hidden;
            config.follow_links |= follow_links;
            config.strict |= strict;
            config.exclude.extend(exclude);

            let roots: Vec<PathBuf> = if roots.is_empty() {
                config.roots.iter().map(PathBuf::from).collect()
            } else {
                roots
            };
            if roots.is_empty() {
                bail!("no root directory given on the command line or in the config");
            }

            let prefix = prefix.unwrap_or_else(|| config.package_name.clone());
            let format = match format {
                Some(f) => f,
                None => config.manifest_format().map_err(|e| anyhow!(e))?,
            };
            let options = config.scan_options();

            let mut manifest = DataFileManifest::new();
            for root in &roots {
                extend_package_with(root, &mut manifest, &prefix, &options)
                    .with_context(|| format!("cannot extend package from {}", root.display()))?;
            }
            tracing::info!("Manifest has {} entries", manifest.len());

            let rendered = manifest.render(format)?;
            match output {
                Some(path) => std::fs::write(&path, rendered + "\n")
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => println!("{}", rendered),
            }
        }
        CommandEnum::Files { paths } => {
            let mut data_files = Vec::new();
            for path in &paths {
                collect_package_files(path, &mut data_files)
                    .with_context(|| format!("cannot collect files from {}", path.display()))?;
            }
            for file in data_files {
                println!("{}", file);
            }
        }
        CommandEnum::FindVersion { file, txt } => {
            let version = if txt {
                read_version_txt(&file)?
            } else {
                find_version(&file)?
            };
            println!("{}", version);
        }
        CommandEnum::Platform => {
            println!("{}", get_platform()?);
        }
        CommandEnum::Board { compatible } => {
            let compatible: Vec<&str> = compatible.iter().map(String::as_str).collect();
            let compatible = if compatible.is_empty() {
                None
            } else {
                Some(compatible.as_slice())
            };
            println!("{}", get_board(compatible)?);
        }
        CommandEnum::Boards {
            repo,
            family,
            manufacturer,
        } => {
            let manufacturers: Vec<&str> = manufacturer.iter().map(String::as_str).collect();
            let store = BoardStore::open(
                &repo,
                (!family.is_empty()).then_some(family.as_slice()),
                (!manufacturers.is_empty()).then_some(manufacturers.as_slice()),
            )?;
            for board in &store {
                println!(
                    "{}\t{}\t{}\t{}",
                    board.typestring(),
                    board.part_name.as_deref().unwrap_or(""),
                    board.family(),
                    board
                );
            }
        }
        CommandEnum::Xsa { file, extract } => {
            let xsa = XsaParser::open(&file)?;
            let mut members = xsa.bitstream_members();
            members.extend(xsa.hwh_members());
            match extract {
                Some(dest) => {
                    for path in xsa.extract(&members, &dest)? {
                        println!("{}", path.display());
                    }
                }
                None => {
                    for member in members {
                        println!("{}", member);
                    }
                }
            }
        }
        CommandEnum::Version => {
            println!("Version {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}
