//! Stream slots shared by both backends.

use std::io::{Read, Write};
use std::sync::{Mutex, PoisonError};

use termlink_core::{Error, Result};

use crate::Utf8Reader;

type BoxedReader = Utf8Reader<Box<dyn Read + Send>>;

/// Input and output handles of a connected backend.
///
/// Both slots are empty until [`bind`](Self::bind) and after
/// [`clear`](Self::clear).
#[derive(Default)]
pub(crate) struct Streams {
    reader: Mutex<Option<BoxedReader>>,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

impl Streams {
    pub(crate) fn bind(&self, input: Box<dyn Read + Send>, output: Box<dyn Write + Send>) {
        *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utf8Reader::new(input));
        *self.writer.lock().unwrap_or_else(PoisonError::into_inner) = Some(output);
    }

    pub(crate) fn read(&self, buf: &mut [char]) -> Result<usize> {
        let mut reader_lock = self
            .reader
            .lock()
            .map_err(|e| Error::Other(format!("Reader lock error: {e}")))?;

        let reader = reader_lock.as_mut().ok_or(Error::NotConnected)?;
        reader.read_chars(buf).map_err(Error::Io)
    }

    pub(crate) fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer_lock = self
            .writer
            .lock()
            .map_err(|e| Error::Other(format!("Writer lock error: {e}")))?;

        // Not connected yet
        let Some(writer) = writer_lock.as_mut() else {
            return Ok(());
        };

        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| Error::Stream(format!("write failed: {e}")))
    }

    /// Drop the output handle, then the input handle.
    ///
    /// Taking the input waits for an in-flight read to return.
    pub(crate) fn clear(&self) {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for Streams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streams")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_before_bind_is_noop() {
        let streams = Streams::default();
        assert!(streams.write(b"ignored").is_ok());
        assert!(!streams.is_bound());
    }

    #[test]
    fn test_read_before_bind_fails() {
        let streams = Streams::default();
        let mut buf = ['\0'; 4];
        assert!(matches!(streams.read(&mut buf), Err(Error::NotConnected)));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_is_stream_error() {
        let streams = Streams::default();
        streams.bind(Box::new(Cursor::new(Vec::new())), Box::new(Broken));
        match streams.write(b"ls\n") {
            Err(Error::Stream(message)) => assert!(message.starts_with("write failed")),
            other => panic!("expected stream error, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_read_write_clear() {
        let streams = Streams::default();
        let sink = Sink::default();
        streams.bind(Box::new(Cursor::new(b"hi".to_vec())), Box::new(sink.clone()));
        assert!(streams.is_bound());

        streams.write(b"ls\n").unwrap();
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"ls\n");

        let mut buf = ['\0'; 4];
        assert_eq!(streams.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &['h', 'i']);

        streams.clear();
        assert!(!streams.is_bound());
        assert!(streams.write(b"after").is_ok());
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"ls\n");
    }
}
