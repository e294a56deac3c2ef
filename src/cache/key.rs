//! Cache Key Naming
//!
//! Keys double as file names in the file tier: `<key>.<extension>`.

use crate::error::{Error, Result};

use super::MAX_FILE_NAME_LEN;

/// Check that `key` can be used as a file name component next to `extension`
pub fn validate_key(key: &str, extension: &str) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key == "." || key == ".." {
        Some("key is a relative path component")
    } else if key.contains(['/', '\\']) {
        Some("key contains a path separator")
    } else if key.contains('\0') {
        Some("key contains a NUL byte")
    } else if key.len() + extension.len() + 1 > MAX_FILE_NAME_LEN {
        Some("file name would exceed 255 bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// File name persisting `key`
#[inline]
pub fn file_name(key: &str, extension: &str) -> String {
    format!("{key}.{extension}")
}

/// Recover the key from a persisted file name, if it follows the naming convention
pub fn key_from_file_name<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let key = name.strip_suffix(extension)?.strip_suffix('.')?;
    validate_key(key, extension).ok()?;
    Some(key)
}
