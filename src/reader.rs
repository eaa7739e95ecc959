//! Accumulates response bytes from the transport until a full frame arrives.

use std::io::{self, Read};
use std::time;

use crate::frame;
use crate::{Error, Result};

/// Default number of transport reads allowed for one response frame.
pub const MAX_READ_ATTEMPTS: usize = 1_050;

const READ_CHUNK: usize = 256;

/// Reads complete, unvalidated response frames from a transport.
///
/// Each call issues at most `max_attempts` reads. A read that times out, or
/// returns no bytes, still counts as an attempt, so a silent device surfaces
/// as [Error::RetryExhausted] instead of blocking forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseReader {
    max_attempts: usize,
    deadline: Option<time::Duration>,
}

impl Default for ResponseReader {
    fn default() -> Self {
        Self::new(MAX_READ_ATTEMPTS)
    }
}

impl ResponseReader {
    /// Creates a new [ResponseReader] with the given attempt budget.
    pub const fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            deadline: None,
        }
    }

    /// Sets a wall-clock limit on reading a whole frame.
    pub fn with_deadline(mut self, deadline: Option<time::Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub const fn deadline(&self) -> Option<time::Duration> {
        self.deadline
    }

    /// Reads from `transport` until [frame::is_complete] holds for the accumulated bytes.
    pub fn read_frame<R: Read + ?Sized>(&self, transport: &mut R) -> Result<Vec<u8>> {
        let now = time::Instant::now();
        let mut buf = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        for attempt in 1..=self.max_attempts {
            if let Some(deadline) = self.deadline {
                if now.elapsed() >= deadline {
                    return Err(Error::Timeout(format!(
                        "waiting for response after {}ms",
                        deadline.as_millis()
                    )));
                }
            }

            let read = match transport.read(&mut chunk) {
                Ok(n) => n,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    log::trace!("Read attempt #{attempt} returned no data: {err}");
                    0
                }
                Err(err) => return Err(err.into()),
            };

            buf.extend_from_slice(&chunk[..read]);

            if frame::is_complete(&buf) {
                log::trace!("Received complete frame after {attempt} attempt(s)");
                return Ok(buf);
            }
        }

        log::warn!(
            "Incomplete response after {} attempts, buffered: {buf:02x?}",
            self.max_attempts
        );

        Err(Error::RetryExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Hands out one scripted chunk per read call, and counts the calls.
    struct Chunked {
        chunks: VecDeque<io::Result<Vec<u8>>>,
        reads: usize,
    }

    impl Chunked {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
                reads: 0,
            }
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(err)) => Err(err),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
            }
        }
    }

    const ACK_FRAME: [u8; 6] = [0x02, 0x03, 0x06, 0x00, 0xc2, 0x82];

    #[test]
    fn test_read_single_chunk() -> Result<()> {
        let mut transport = Chunked::new(vec![Ok(ACK_FRAME.to_vec())]);

        assert_eq!(ResponseReader::new(5).read_frame(&mut transport)?, ACK_FRAME);
        assert_eq!(transport.reads, 1);

        Ok(())
    }

    #[test]
    fn test_read_partial_chunks() -> Result<()> {
        let mut transport = Chunked::new(vec![
            Ok(ACK_FRAME[..2].to_vec()),
            Err(io::Error::new(io::ErrorKind::TimedOut, "slow device")),
            Ok(ACK_FRAME[2..5].to_vec()),
            Ok(ACK_FRAME[5..].to_vec()),
        ]);

        assert_eq!(ResponseReader::new(5).read_frame(&mut transport)?, ACK_FRAME);
        assert_eq!(transport.reads, 4);

        Ok(())
    }

    #[test]
    fn test_read_waits_for_declared_length() -> Result<()> {
        // length byte says 8, first six bytes are not enough
        let frame = [0x02, 0x03, 0x08, 0x33, 0x14, 0x00, 0xaa, 0xbb];
        let mut transport = Chunked::new(vec![Ok(frame[..6].to_vec()), Ok(frame[6..].to_vec())]);

        assert_eq!(ResponseReader::new(5).read_frame(&mut transport)?, frame);
        assert_eq!(transport.reads, 2);

        Ok(())
    }

    #[test]
    fn test_read_zero_length_is_unconstrained() -> Result<()> {
        let frame = [0x02, 0x03, 0x00, 0x33, 0x14, 0x00, 0x01];
        let mut transport = Chunked::new(vec![Ok(frame.to_vec())]);

        assert_eq!(ResponseReader::new(5).read_frame(&mut transport)?, frame);

        Ok(())
    }

    #[test]
    fn test_read_retry_exhausted() {
        let mut transport = Chunked::new(vec![Ok(vec![0x02, 0x03, 0x09])]);

        let res = ResponseReader::new(7).read_frame(&mut transport);

        assert!(matches!(res, Err(Error::RetryExhausted(7))));
        assert_eq!(transport.reads, 7);
    }

    #[test]
    fn test_read_transport_error() {
        let mut transport = Chunked::new(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "unplugged",
        ))]);

        let res = ResponseReader::new(5).read_frame(&mut transport);

        assert!(matches!(res, Err(Error::Transport(_))));
        assert_eq!(transport.reads, 1);
    }

    #[test]
    fn test_read_deadline() {
        let mut transport = Chunked::new(vec![]);

        let reader = ResponseReader::new(usize::MAX).with_deadline(Some(time::Duration::ZERO));

        assert!(matches!(
            reader.read_frame(&mut transport),
            Err(Error::Timeout(_))
        ));
        assert_eq!(transport.reads, 0);
    }
}
