//! Non-blocking inotify channel and the read step that drains it.

#![allow(unsafe_code)]

use std::ffi::CString;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::decoder::{decode, RawEventRecord};
use super::table::WatchId;
use crate::error::ChannelError;
use crate::Result;

/// Bytes requested per read. Larger bursts stay queued in the kernel and are
/// picked up on the following ticks.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Primitives the watcher needs from a notification channel.
pub trait NotifySource {
    /// Register `path` for the events in `mask`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the kernel refuses the watch.
    fn add_watch(&mut self, path: &Path, mask: u32) -> io::Result<WatchId>;

    /// Drop the watch `id`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the kernel refuses, e.g. for an unknown id.
    fn rm_watch(&mut self, id: WatchId) -> io::Result<()>;

    /// Read raw record bytes into `buf` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::WouldBlock`] when nothing is queued, or any
    /// other OS error.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Owned inotify descriptor opened with `IN_NONBLOCK | IN_CLOEXEC`.
#[derive(Debug)]
pub struct InotifyChannel {
    fd: OwnedFd,
}

impl InotifyChannel {
    /// Open a new channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Init`] if the kernel cannot allocate an
    /// instance (e.g. `EMFILE`, or the per-user instance limit).
    pub fn open() -> Result<Self> {
        // SAFETY: inotify_init1 takes no pointers; a negative return is handled below.
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(ChannelError::Init(io::Error::last_os_error()).into());
        }

        // SAFETY: `fd` was just returned by inotify_init1 and nothing else owns it.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        tracing::debug!(fd = fd.as_raw_fd(), "Opened inotify channel");

        Ok(Self { fd })
    }
}

impl AsFd for InotifyChannel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl NotifySource for InotifyChannel {
    fn add_watch(&mut self, path: &Path, mask: u32) -> io::Result<WatchId> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `c_path` is a NUL-terminated string that outlives the call,
        // and `self.fd` is an open inotify descriptor owned by `self`.
        let wd = unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask) };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(WatchId::new(wd))
    }

    fn rm_watch(&mut self, id: WatchId) -> io::Result<()> {
        // SAFETY: plain integer arguments on a descriptor owned by `self`; an
        // unknown `id` is reported as EINVAL, not undefined behavior.
        let rv = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), id.get()) };
        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes for the whole call.
        let rv = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        #[allow(clippy::cast_sign_loss)]
        Ok(rv as usize)
    }
}

/// Read once from `source` and decode whatever arrived.
///
/// "Nothing queued" and an interrupted read both yield an empty batch.
///
/// # Errors
///
/// - [`ChannelError::ProtocolViolation`] for a zero-length read
/// - [`ChannelError::Read`] for any other OS error
/// - [`crate::error::DecodeError::Malformed`] if the bytes do not parse
pub fn drain_available<S: NotifySource + ?Sized>(
    source: &mut S,
    buf: &mut [u8],
) -> Result<Vec<RawEventRecord>> {
    match source.read(buf) {
        Ok(0) => Err(ChannelError::ProtocolViolation(
            "read() on a non-blocking inotify channel returned 0 bytes".to_string(),
        )
        .into()),
        Ok(n) => {
            let records = decode(&buf[..n])?;
            tracing::trace!(bytes = n, records = records.len(), "Drained channel");
            Ok(records)
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Vec::new()),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => {
            tracing::debug!("Channel read interrupted, retrying next tick");
            Ok(Vec::new())
        }
        Err(e) => Err(ChannelError::Read(e).into()),
    }
}
