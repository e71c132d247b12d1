//! Segmented body transform
//!
//! The file body is processed in fixed-size segments. Each segment is
//! written as the signature tag (verbatim, unkeyed, not counted in the
//! keystream index) followed by the XOR-keyed chunk. Because XOR with the
//! keystream is self-inverse, encode and decode share the same per-byte
//! operation; only the tag handling differs (insert vs positional skip).
//!
//! The segment size determines tag placement and must therefore be identical
//! between the encode and decode of a given container. The decoder does not
//! search for tag content - a body whose raw bytes happen to equal the tag
//! still round-trips - and it terminates on a short tag-skip read rather
//! than on byte arithmetic, so a final partial segment needs no length
//! bookkeeping.

use std::io::{self, Read, Write};

use crate::envelope::MAGIC;
use crate::error::{ErrorCategory, ErrorKind, NullboxError, Result};
use crate::keystream::Keystream;

/// Production segment size: 1 MiB of body bytes between signature tags.
pub const SEGMENT_SIZE: usize = 1024 * 1024;

/// Encodes the remainder of `src` into tagged, keyed segments on `dst`.
///
/// The keystream must be positioned where the header phase left it. Returns
/// the number of body bytes processed. A zero-length body writes no
/// segments at all.
pub fn encode_body<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    ks: &mut Keystream,
    segment_size: usize,
) -> Result<u64> {
    let mut buf = segment_buffer(segment_size)?;
    let mut total = 0u64;

    loop {
        let n = fill(src, &mut buf).map_err(|e| read_error("source file", e))?;
        if n == 0 {
            break;
        }
        dst.write_all(MAGIC).map_err(write_error)?;
        ks.apply(&mut buf[..n]);
        dst.write_all(&buf[..n]).map_err(write_error)?;
        total += n as u64;
        if n < segment_size {
            break;
        }
    }

    Ok(total)
}

/// Decodes tagged, keyed segments from `src`, writing plaintext to `dst`.
///
/// Mirror of [`encode_body`]: per iteration, exactly one tag-length skip
/// followed by up to one segment of ciphertext. A tag-skip read that cannot
/// be satisfied is end of stream, not an error - that is how the final
/// segment boundary naturally ends.
pub fn decode_body<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    ks: &mut Keystream,
    segment_size: usize,
) -> Result<u64> {
    let mut buf = segment_buffer(segment_size)?;
    let mut tag_skip = [0u8; MAGIC.len()];
    let mut total = 0u64;

    loop {
        // Positional skip; the tag content is deliberately not inspected.
        let skipped = fill(src, &mut tag_skip).map_err(|e| read_error("container body", e))?;
        if skipped < tag_skip.len() {
            break;
        }

        let n = fill(src, &mut buf).map_err(|e| read_error("container body", e))?;
        if n > 0 {
            ks.apply(&mut buf[..n]);
            dst.write_all(&buf[..n]).map_err(write_error)?;
            total += n as u64;
        }
        if n < segment_size {
            break;
        }
    }

    Ok(total)
}

fn segment_buffer(segment_size: usize) -> Result<Vec<u8>> {
    if segment_size == 0 {
        return Err(NullboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "segment size must be non-zero",
        ));
    }
    Ok(vec![0u8; segment_size])
}

/// Reads until `buf` is full or the stream ends, returning the byte count.
///
/// Plain `Read::read` may return short reads at arbitrary points; segment
/// boundaries must not depend on that, so reads are refilled here.
fn fill<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_error(what: &str, err: io::Error) -> NullboxError {
    NullboxError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        format!("failed to read {}", what),
        err,
    )
}

fn write_error(err: io::Error) -> NullboxError {
    NullboxError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        "failed to write output",
        err,
    )
}
