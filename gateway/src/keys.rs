//! Object key generation

use rand::{rngs::OsRng, RngCore};

/// Number of random bytes in a key prefix (hex-encoded to 64 characters)
pub const KEY_PREFIX_BYTES: usize = 32;

/// Fallback used when an upload carries no usable filename
const DEFAULT_FILE_NAME: &str = "image";

/// Returns `byte_len` bytes from the OS CSPRNG, hex-encoded in lowercase
///
/// # Panics
///
/// Panics if the operating system random source is unavailable
#[must_use]
pub fn random_hex(byte_len: usize) -> String {
    let mut buf = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Generates a new object key of the form `<64 hex chars>-<file name>`
///
/// The key doubles as the capability for reading and deleting the object,
/// so the prefix must come from [`OsRng`].
#[must_use]
pub fn generate(original_name: &str) -> String {
    format!(
        "{}-{}",
        random_hex(KEY_PREFIX_BYTES),
        sanitize_file_name(original_name)
    )
}

/// Reduces an uploaded file name to a single, printable path component
#[must_use]
pub fn sanitize_file_name(original_name: &str) -> String {
    let last_segment = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last_segment.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    match cleaned {
        "" | "." | ".." => DEFAULT_FILE_NAME.to_string(),
        name => name.to_string(),
    }
}
