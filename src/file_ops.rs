//! File encryption/decryption operations
//!
//! High-level operations that stream a file through the envelope codec and
//! the segment transform. Output is always written through a tempfile in the
//! destination directory and atomically persisted, so a failure part-way
//! (including an authentication failure) never leaves a truncated or corrupt
//! destination file behind.

use crate::envelope::{self, CONTAINER_EXTENSION, Container, MAGIC};
use crate::error::{ErrorCategory, ErrorKind, NullboxError, Result};
use crate::keystream::Keystream;
use crate::passphrase::PassphraseReader;
use crate::transform::{self, SEGMENT_SIZE};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Encrypt a file with a passphrase
///
/// Streams `input_path` into a fresh container. When `output_path` is None
/// the destination is the input path with its extension replaced by
/// `NullYex` (the original extension is hidden inside the container).
///
/// Returns the path written. The output file is created with mode 0o600
/// (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<PathBuf> {
    let passphrase = passphrase_reader.read_passphrase()?;
    let extension = file_extension(input_path);

    let src = File::open(input_path).map_err(|e| read_error(input_path, e))?;
    let mut src = BufReader::new(src);

    let out_path = match output_path {
        Some(p) => p.to_path_buf(),
        None => input_path.with_extension(CONTAINER_EXTENSION),
    };

    write_container(&out_path, |dst| {
        let mut ks = envelope::write_header(dst, &passphrase, &extension)?;
        transform::encode_body(&mut src, dst, &mut ks, SEGMENT_SIZE)?;
        Ok(())
    })?;

    Ok(out_path)
}

/// Decrypt a container with a passphrase
///
/// Verifies the passphrase against the stored salt and digest before any
/// output exists; an incorrect candidate fails with `AuthenticationFailed`
/// and the destination is untouched. When `output_path` is None the
/// destination is the input path with the restored hidden extension.
///
/// Returns the path written.
pub fn decrypt_file(
    input_path: &Path,
    output_path: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<PathBuf> {
    let file = File::open(input_path).map_err(|e| read_error(input_path, e))?;
    let mut container = Container::open(BufReader::new(file))?;

    let passphrase = passphrase_reader.read_passphrase()?;
    if !container.verify(&passphrase)? {
        return Err(NullboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            format!("incorrect passphrase for {}", input_path.display()),
        ));
    }

    let mut ks = Keystream::new(&passphrase)?;
    let extension = container.read_extension(&mut ks)?;

    let out_path = match output_path {
        Some(p) => p.to_path_buf(),
        None => restored_path(input_path, &extension),
    };

    let mut src = container.into_inner();
    write_container(&out_path, |dst| {
        transform::decode_body(&mut src, dst, &mut ks, SEGMENT_SIZE)?;
        Ok(())
    })?;

    Ok(out_path)
}

/// Checks whether a file begins with the container signature tag.
///
/// This is the mode auto-detection used by the CLI: tag present means
/// decrypt, absent means encrypt. A file shorter than the tag is not a
/// container.
pub fn is_container(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|e| read_error(path, e))?;
    let mut tag = [0u8; MAGIC.len()];
    match file.read_exact(&mut tag) {
        Ok(()) => Ok(&tag == MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(read_error(path, e)),
    }
}

/// The input's extension with its leading dot (e.g. `.png`), or empty.
///
/// Follows `Path::extension` semantics: dotfiles like `.bashrc` have no
/// extension. Non-UTF-8 extensions are stored lossily.
fn file_extension(path: &Path) -> Vec<u8> {
    match path.extension() {
        Some(ext) => {
            let mut bytes = vec![b'.'];
            bytes.extend_from_slice(ext.to_string_lossy().as_bytes());
            bytes
        }
        None => Vec::new(),
    }
}

/// Input path with the restored extension in place of `.NullYex`.
fn restored_path(input_path: &Path, extension: &[u8]) -> PathBuf {
    let ext = String::from_utf8_lossy(extension);
    input_path.with_extension(ext.strip_prefix('.').unwrap_or(&ext))
}

/// Streams `write_body` into a tempfile next to `path`, fsyncs, applies
/// restrictive permissions, and atomically renames into place.
fn write_container<F>(path: &Path, write_body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        NullboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;

    {
        let mut dst = BufWriter::new(temp_file.as_file_mut());
        write_body(&mut dst)
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))?;
        dst.flush().map_err(|e| {
            NullboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to flush tempfile",
                e,
            )
        })?;
    }

    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.as_file().sync_all().map_err(|e| {
        NullboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                NullboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            NullboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        NullboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> NullboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    NullboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
