//! Content fingerprinting for content-addressed destination names.
//!
//! A fingerprint is derived solely from a file's bytes, never from its
//! path or modification time, so a fresh checkout with identical content
//! produces identical destination names and a fully-skipped rebuild.
//! Text-like formats are normalized to LF before hashing so that
//! line-ending differences across platforms do not invalidate the cache.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Extensions whose content is normalized to LF newlines before hashing.
///
/// These are the formats that converters treat as text; everything else
/// is hashed byte-for-byte.
const TEXT_EXTENSIONS: &[&str] = &[
    ".json", ".js", ".dae", ".txt", ".mtl", ".cgfx", ".xml", ".csv", ".html", ".css",
];

/// Digest length in bytes (160 bits, 27 base64 characters).
const DIGEST_LEN: usize = 20;

/// A 160-bit content fingerprint (truncated blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    /// Create a fingerprint from raw digest bytes.
    #[inline]
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Compute the fingerprint of a file.
    ///
    /// `extension` is the lower-cased extension with leading dot; it only
    /// selects the newline-normalization path, it is never hashed.
    pub fn of_file(path: &Path, extension: &str) -> Result<Self> {
        let hash = if is_text_like(extension) {
            let content = std::fs::read(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            hash_bytes(&normalize_newlines(&content))
        } else {
            hash_stream(path)?
        };

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&hash.as_bytes()[..DIGEST_LEN]);
        Ok(Self(digest))
    }

    /// Render as a URL-safe, unpadded base64 string.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Hex form for debug output.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Whether files with this extension are hashed with newline normalization.
pub fn is_text_like(extension: &str) -> bool {
    TEXT_EXTENSIONS.contains(&extension)
}

/// Streaming blake3 hash of a file's raw bytes.
fn hash_stream(path: &Path) -> Result<blake3::Hash> {
    let file =
        File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read `{}`", path.display()));
            }
        }
    }

    Ok(hasher.finalize())
}

/// Blake3 hash of an in-memory buffer.
fn hash_bytes(bytes: &[u8]) -> blake3::Hash {
    blake3::hash(bytes)
}

/// Collapse CRLF and lone CR to LF.
fn normalize_newlines(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'\r' => {
                out.push(b'\n');
                if content.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}
