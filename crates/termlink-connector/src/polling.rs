//! Blocking reads and writes on top of a non-blocking stream.
//!
//! Transport libraries that guard a whole session with one lock hold it for
//! the duration of a blocking read. Driving the stream in non-blocking mode
//! and sleeping between attempts releases that lock, so writes and status
//! queries on the same session are never parked behind a pending read.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retries `WouldBlock` until data moves or the stream is closed.
///
/// Once the shared `closed` flag is set, reads report end of stream and
/// writes fail with `BrokenPipe`.
pub struct PollingStream<S> {
    inner: S,
    interval: Duration,
    closed: Arc<AtomicBool>,
}

impl<S> PollingStream<S> {
    /// Wrap `inner`, sleeping `interval` between attempts.
    pub fn new(inner: S, interval: Duration, closed: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            interval,
            closed,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn retry<T>(&mut self, mut op: impl FnMut(&mut S) -> io::Result<T>) -> io::Result<T> {
        loop {
            if self.is_closed() {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            match op(&mut self.inner) {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(self.interval)
                }
                result => return result,
            }
        }
    }
}

impl<S: Read> Read for PollingStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.retry(|inner| inner.read(buf)) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe && self.is_closed() => Ok(0),
            result => result,
        }
    }
}

impl<S: Write> Write for PollingStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.retry(|inner| inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.retry(|inner| inner.flush())
    }
}

impl<S> std::fmt::Debug for PollingStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingStream")
            .field("interval", &self.interval)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::thread;

    const INTERVAL: Duration = Duration::from_millis(2);

    /// Non-blocking stream that takes a session-wide lock for every call.
    #[derive(Clone, Default)]
    struct SharedSession {
        lock: Arc<Mutex<()>>,
        incoming: Arc<Mutex<VecDeque<u8>>>,
        outgoing: Arc<Mutex<Vec<u8>>>,
    }

    impl Read for SharedSession {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let _session = self.lock.lock().unwrap();
            let mut incoming = self.incoming.lock().unwrap();
            if incoming.is_empty() {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(incoming.len());
            for (slot, byte) in buf.iter_mut().zip(incoming.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for SharedSession {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let _session = self.lock.lock().unwrap();
            self.outgoing.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_proceeds_while_read_pending() {
        let session = SharedSession::default();
        let closed = Arc::new(AtomicBool::new(false));

        let reader = {
            let mut stream = PollingStream::new(session.clone(), INTERVAL, Arc::clone(&closed));
            thread::spawn(move || {
                let mut buf = [0u8; 8];
                let n = stream.read(&mut buf).unwrap();
                buf[..n].to_vec()
            })
        };
        thread::sleep(Duration::from_millis(30));
        assert!(!reader.is_finished());

        let mut writer = PollingStream::new(session.clone(), INTERVAL, closed);
        writer.write_all(b"ls\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(session.outgoing.lock().unwrap().as_slice(), b"ls\n");
        assert!(!reader.is_finished());

        session.incoming.lock().unwrap().extend(b"out");
        assert_eq!(reader.join().unwrap(), b"out");
    }

    #[test]
    fn test_close_ends_pending_read() {
        let session = SharedSession::default();
        let closed = Arc::new(AtomicBool::new(false));

        let reader = {
            let mut stream = PollingStream::new(session.clone(), INTERVAL, Arc::clone(&closed));
            thread::spawn(move || stream.read(&mut [0u8; 8]))
        };
        thread::sleep(Duration::from_millis(20));
        closed.store(true, Ordering::SeqCst);
        assert_eq!(reader.join().unwrap().unwrap(), 0);

        let mut writer = PollingStream::new(session, INTERVAL, closed);
        let err = writer.write(b"late").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_other_errors_pass_through() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::ConnectionReset.into())
            }
        }

        let mut stream = PollingStream::new(Failing, INTERVAL, Arc::new(AtomicBool::new(false)));
        let err = stream.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
