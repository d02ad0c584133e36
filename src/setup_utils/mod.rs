mod extend_package;
mod find_version;
mod get_board;
mod get_platform;

pub use extend_package::{
    collect_package_files, extend_package, extend_package_with, ExtendOptions, PermissionPolicy,
};
pub use find_version::{find_version, read_version_txt};
pub use get_board::{get_board, resolve_board};
pub use get_platform::{detect_platform, get_platform, Platform, BOARD_MARKER};
