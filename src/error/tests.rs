//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("poll interval cannot be 0");
        assert_eq!(
            err.to_string(),
            "configuration error: poll interval cannot be 0"
        );
    }

    #[test]
    fn test_channel_init_display() {
        let io_err = io::Error::from_raw_os_error(libc::EMFILE);
        let err = ChannelError::Init(io_err);
        assert!(err
            .to_string()
            .starts_with("failed to open notification channel:"));
    }

    #[test]
    fn test_channel_error_conversion() {
        let err: Error = ChannelError::ProtocolViolation("zero-length read".to_string()).into();
        assert!(matches!(
            err,
            Error::Channel(ChannelError::ProtocolViolation(_))
        ));
        assert_eq!(
            err.to_string(),
            "channel error: protocol violation: zero-length read"
        );
    }

    #[test]
    fn test_channel_read_keeps_source() {
        use std::error::Error as _;

        let err = ChannelError::Read(io::Error::from_raw_os_error(libc::EBADF));
        let source = err.source().expect("read error should carry its io::Error");
        assert!(source.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::Malformed {
            offset: 32,
            needed: 16,
            available: 8,
        };
        assert_eq!(
            err.to_string(),
            "malformed record at offset 32: needs 16 bytes, 8 available"
        );

        let err: Error = err.into();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_watcher_error_watch_failed() {
        let err = WatcherError::watch_failed("/tmp/test", "permission denied");
        assert_eq!(
            err.to_string(),
            "failed to watch path '/tmp/test': permission denied"
        );
    }

    #[test]
    fn test_watcher_error_unwatch_failed() {
        let err = WatcherError::unwatch_failed(WatchId::new(7), "invalid argument");
        assert_eq!(err.to_string(), "failed to remove watch 7: invalid argument");
    }

    #[test]
    fn test_unknown_watch_display() {
        let err: Error = WatcherError::UnknownWatch(WatchId::new(3)).into();
        assert_eq!(
            err.to_string(),
            "watcher error: no directory registered for watch 3"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        let watch: Error = WatcherError::watch_failed("/a", "ENOSPC").into();
        let unwatch: Error = WatcherError::unwatch_failed(WatchId::new(1), "EINVAL").into();
        assert!(watch.is_recoverable());
        assert!(unwatch.is_recoverable());
    }

    #[test]
    fn test_fatal_errors() {
        let unknown: Error = WatcherError::UnknownWatch(WatchId::new(1)).into();
        let protocol: Error = ChannelError::ProtocolViolation("closed".to_string()).into();
        let decode: Error = DecodeError::Malformed {
            offset: 0,
            needed: 16,
            available: 4,
        }
        .into();

        assert!(!unknown.is_recoverable());
        assert!(!protocol.is_recoverable());
        assert!(!decode.is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> std::result::Result<(), ChannelError> {
            Err(ChannelError::ProtocolViolation("inner error".to_string()))
        }

        fn outer() -> Result<i32> {
            inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "channel error: protocol violation: inner error"
        );
    }
}
