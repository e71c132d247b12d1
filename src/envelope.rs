//! Container header codec
//!
//! The on-disk layout (all format constants are fixed; the digest is pinned
//! little-endian for cross-platform compatibility):
//!
//! - signature tag: 10 bytes, `By_NullYex`
//! - salt: 8 bytes, ASCII alphanumeric, cleartext
//! - verification digest: 8 bytes, u64 LE, djb2 over passphrase ++ salt
//! - hidden extension: 1 length byte XOR-keyed at index 0, then that many
//!   bytes XOR-keyed at indices 1..=N
//!
//! The keystream index continues from the extension field into the body
//! segments (see [`crate::transform`]); it is never reset between the two.
//!
//! Reading is anchored: [`Container::open`] records the stream position just
//! past the signature tag, and every [`Container::verify`] call re-seeks to
//! it. That makes verification repeatable, so callers can own whatever
//! retry/abort policy they want without the codec caring.

use std::io::{self, Read, Seek, SeekFrom, Write};

use rand::RngExt;
use rand::distr::Alphanumeric;

use crate::digest;
use crate::error::{ErrorCategory, ErrorKind, NullboxError, Result};
use crate::keystream::Keystream;

/// Signature tag marking the container start and every body segment.
pub const MAGIC: &[u8; 10] = b"By_NullYex";

/// Length of the cleartext salt in bytes.
pub const SALT_LEN: usize = 8;

/// Length of the stored verification digest in bytes.
pub const DIGEST_LEN: usize = 8;

/// File extension given to freshly written containers.
pub const CONTAINER_EXTENSION: &str = "NullYex";

/// Generates a fresh salt of uniformly random ASCII-alphanumeric bytes.
///
/// The salt is not secret; it is stored in cleartext and only serves to make
/// the stored digest file-specific.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut rng = rand::rng();
    std::array::from_fn(|_| rng.sample(Alphanumeric))
}

/// Writes the container header and returns the keystream positioned where
/// body encoding must continue.
///
/// Fails with `EmptyPassphrase` before anything is written if the passphrase
/// is empty, and with `ExtensionTooLong` if the extension exceeds the
/// one-byte length prefix.
pub fn write_header<W: Write>(
    out: &mut W,
    passphrase: &[u8],
    extension: &[u8],
) -> Result<Keystream> {
    write_header_with_salt(out, passphrase, extension, &generate_salt())
}

/// Like [`write_header`] but with a caller-provided salt.
///
/// This exists to make output deterministic for compatibility testing.
/// Production callers should use [`write_header`], which draws a fresh
/// random salt per container.
pub fn write_header_with_salt<W: Write>(
    out: &mut W,
    passphrase: &[u8],
    extension: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<Keystream> {
    let mut ks = Keystream::new(passphrase)?;
    if extension.len() > u8::MAX as usize {
        return Err(NullboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::ExtensionTooLong,
            format!(
                "file extension is {} bytes; the container format allows at most 255",
                extension.len()
            ),
        ));
    }

    out.write_all(MAGIC).map_err(write_error)?;
    out.write_all(salt).map_err(write_error)?;
    let stored = digest::passphrase_digest(passphrase, salt);
    out.write_all(&stored.to_le_bytes()).map_err(write_error)?;

    let mut hidden = Vec::with_capacity(1 + extension.len());
    hidden.push(extension.len() as u8);
    hidden.extend_from_slice(extension);
    ks.apply(&mut hidden);
    out.write_all(&hidden).map_err(write_error)?;

    Ok(ks)
}

/// A container opened for reading, anchored just past the signature tag.
#[derive(Debug)]
pub struct Container<R> {
    reader: R,
    anchor: u64,
}

impl<R: Read + Seek> Container<R> {
    /// Checks the signature tag and records the authentication anchor.
    pub fn open(mut reader: R) -> Result<Self> {
        let mut tag = [0u8; MAGIC.len()];
        reader.read_exact(&mut tag).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                NullboxError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::TruncatedInput,
                    "input is too short to be a container",
                )
            } else {
                read_error(e)
            }
        })?;
        if &tag != MAGIC {
            return Err(NullboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::MagicMismatch,
                "input is not a recognized container (signature tag missing)",
            ));
        }
        let anchor = reader.stream_position().map_err(read_error)?;
        Ok(Self { reader, anchor })
    }

    /// Checks a candidate passphrase against the stored salt and digest.
    ///
    /// Re-seeks to the anchor first, so the call may be repeated with new
    /// candidates after a rejection. An empty candidate is rejected locally
    /// without consuming the stream.
    pub fn verify(&mut self, passphrase: &[u8]) -> Result<bool> {
        if passphrase.is_empty() {
            return Err(NullboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::EmptyPassphrase,
                "passphrase must not be empty",
            ));
        }

        self.reader
            .seek(SeekFrom::Start(self.anchor))
            .map_err(read_error)?;

        let mut salt = [0u8; SALT_LEN];
        let mut stored = [0u8; DIGEST_LEN];
        self.reader
            .read_exact(&mut salt)
            .map_err(|e| truncated(e, "salt"))?;
        self.reader
            .read_exact(&mut stored)
            .map_err(|e| truncated(e, "verification digest"))?;

        Ok(digest::verify(
            passphrase,
            &salt,
            u64::from_le_bytes(stored),
        ))
    }

    /// Decodes the hidden extension field.
    ///
    /// Must follow a successful [`Container::verify`] (the stream cursor sits
    /// just past the digest) with a keystream at index 0; the keystream is
    /// left positioned where body decoding continues.
    pub fn read_extension(&mut self, ks: &mut Keystream) -> Result<Vec<u8>> {
        if ks.index() != 0 {
            return Err(NullboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "extension field must be decoded with a fresh keystream",
            ));
        }

        let mut len_byte = [0u8; 1];
        self.reader
            .read_exact(&mut len_byte)
            .map_err(|e| truncated(e, "extension length"))?;
        let ext_len = len_byte[0] ^ ks.next_byte();

        let mut extension = vec![0u8; ext_len as usize];
        self.reader
            .read_exact(&mut extension)
            .map_err(|e| truncated(e, "hidden extension"))?;
        ks.apply(&mut extension);
        Ok(extension)
    }

    /// Consumes the container, returning the underlying reader positioned at
    /// the first body segment.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn truncated(err: io::Error, what: &str) -> NullboxError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        NullboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedInput,
            format!("container truncated while reading {}", what),
        )
    } else {
        read_error(err)
    }
}

fn read_error(err: io::Error) -> NullboxError {
    NullboxError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        "failed to read container",
        err,
    )
}

fn write_error(err: io::Error) -> NullboxError {
    NullboxError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        "failed to write container header",
        err,
    )
}
