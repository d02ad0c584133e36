use crate::error::{Error, Result};
use crate::stringutil::normalize_board_name;

/// Read the target board from the `BOARD` environment variable.
///
/// Without a `compatible` list the variable is returned as is (normalized,
/// or empty when unset). With one, the board must be listed or the call fails.
pub fn get_board(compatible: Option<&[&str]>) -> Result<String> {
    let board = std::env::var("BOARD").ok();
    resolve_board(board.as_deref(), compatible)
}

pub fn resolve_board(board: Option<&str>, compatible: Option<&[&str]>) -> Result<String> {
    if let Some(compatible) = compatible {
        let listed = board.map(|b| compatible.contains(&b)).unwrap_or(false);
        if !listed {
            return Err(Error::BoardNotSupported {
                board: board.unwrap_or("None").to_string(),
            });
        }
    }

    Ok(board.map(normalize_board_name).unwrap_or_default())
}
