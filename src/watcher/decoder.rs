//! Parser for the packed `inotify_event` records returned by a channel read.
//!
//! Each record is a fixed 16-byte header followed by a NUL-padded name:
//!
//! ```text
//! offset  0: wd     i32
//! offset  4: mask   u32
//! offset  8: cookie u32
//! offset 12: len    u32   (length of the name field, padding included)
//! offset 16: name   [u8; len]
//! ```
//!
//! Records are packed back to back. Fields are read at fixed offsets in
//! native byte order; the buffer is never reinterpreted as a struct.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use super::table::WatchId;
use crate::error::DecodeError;

/// Size of the fixed record header.
pub const HEADER_SIZE: usize = 16;

/// One undecorated record as the kernel reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEventRecord {
    pub mask: u32,
    pub watch_id: WatchId,
    /// Links the two halves of a rename. Not interpreted.
    pub cookie: u32,
    /// Entry name relative to the watched directory; empty for events on the directory itself.
    pub name: OsString,
}

/// Decode every record in `buf`.
///
/// `buf` must be exactly the span filled by the last read.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if a header or name runs past the end
/// of `buf`. Nothing is returned for the records before the bad one.
pub fn decode(buf: &[u8]) -> Result<Vec<RawEventRecord>, DecodeError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let available = buf.len() - offset;
        if available < HEADER_SIZE {
            return Err(DecodeError::Malformed {
                offset,
                needed: HEADER_SIZE,
                available,
            });
        }

        let header = &buf[offset..offset + HEADER_SIZE];
        let wd = i32::from_ne_bytes(field(header, 0));
        let mask = u32::from_ne_bytes(field(header, 4));
        let cookie = u32::from_ne_bytes(field(header, 8));
        let name_len = u32::from_ne_bytes(field(header, 12)) as usize;

        let needed = HEADER_SIZE.saturating_add(name_len);
        if needed > available {
            return Err(DecodeError::Malformed {
                offset,
                needed,
                available,
            });
        }

        let name_field = &buf[offset + HEADER_SIZE..offset + needed];
        records.push(RawEventRecord {
            mask,
            watch_id: WatchId::new(wd),
            cookie,
            name: trim_name(name_field),
        });

        offset += needed;
    }

    Ok(records)
}

fn field(header: &[u8], at: usize) -> [u8; 4] {
    [header[at], header[at + 1], header[at + 2], header[at + 3]]
}

/// Strip the NUL terminator and alignment padding.
fn trim_name(raw: &[u8]) -> OsString {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    OsString::from_vec(raw[..end].to_vec())
}

/// Encode a record the way the kernel lays it out, padding the name to
/// `HEADER_SIZE` alignment. Used by tests and benchmarks.
#[doc(hidden)]
#[must_use]
pub fn encode_record(wd: i32, mask: u32, cookie: u32, name: &str) -> Vec<u8> {
    let name_len = if name.is_empty() {
        0
    } else {
        (name.len() + 1).next_multiple_of(HEADER_SIZE)
    };

    let mut out = Vec::with_capacity(HEADER_SIZE + name_len);
    out.extend_from_slice(&wd.to_ne_bytes());
    out.extend_from_slice(&mask.to_ne_bytes());
    out.extend_from_slice(&cookie.to_ne_bytes());
    out.extend_from_slice(&u32::try_from(name_len).unwrap_or(u32::MAX).to_ne_bytes());
    out.extend_from_slice(name.as_bytes());
    out.resize(HEADER_SIZE + name_len, 0);
    out
}
