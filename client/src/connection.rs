use crate::common::{Error, Result};
use crate::observer::{Event, Observer};
use mockall::automock;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

/// The capability surface the consumer and producers need from the transport. They hold a `Box<dyn Transport>`
/// instead of extending a shared connection base class, so the full [Connection] API (connect/disconnect) stays out
/// of their reach and tests can swap in [MockTransport] without touching a socket.
#[automock]
pub trait Transport: Send {
    /// Blocks until exactly `length` bytes have been assembled, across possibly-partial receives.
    fn read(&mut self, length: usize) -> Result<Vec<u8>>;
    /// Transmits the whole buffer, connecting first if necessary, and returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    fn reconnect(&mut self) -> Result<()>;
}

/// Owns one blocking TCP socket to the broker. A connection is not safe for concurrent use from multiple threads;
/// every client holds its own.
pub struct Connection {
    host: String,
    port: u16,
    read_timeout: Option<Duration>,
    stream: Option<TcpStream>,
    observer: Arc<dyn Observer>,
}

impl Connection {
    pub fn new(host: impl Into<String>, port: u16, read_timeout: Option<Duration>, observer: Arc<dyn Observer>) -> Self {
        Self { host: host.into(), port, read_timeout, stream: None, observer }
    }

    /// Opens a fresh connection to the broker, replacing any existing one.
    pub fn connect(&mut self) -> Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_read_timeout(self.read_timeout)?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Closes the current socket if there is one, swallowing close-time errors, and clears the state so that a
    /// later write implicitly reconnects.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Probes for a reset after a send. The broker never sends unsolicited bytes on a healthy stream, so the only
    /// time a non-blocking peek finds anything (data or an orderly close) is when the broker dropped us; would-block
    /// is the healthy case and is swallowed.
    fn check_reset(&self) -> Result<()> {
        // invariant: only called from write, which connects first
        let stream = self.stream.as_ref().unwrap();

        stream.set_nonblocking(true)?;
        let mut probe = [0u8; 1];
        let outcome = stream.peek(&mut probe);
        stream.set_nonblocking(false)?;

        match outcome {
            Ok(_) => {
                self.observer.handle(Event::ResetDetected { host: self.host.clone(), port: self.port });
                Err(Error::ConnectionReset)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => {
                self.observer.handle(Event::PeekFailed { message: e.to_string() });
                Err(Error::Io(e))
            }
        }
    }
}

impl Transport for Connection {
    fn read(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length];

        let outcome = match self.stream.as_mut() {
            None => return Err(Error::Io(io::Error::new(ErrorKind::NotConnected, "read on a disconnected socket"))),
            Some(stream) => fill_exact(stream, &mut buf),
        };

        match outcome {
            Ok(()) => Ok(buf),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                // partial data is discarded; the next write will reconnect
                self.disconnect();
                Err(Error::Timeout)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.stream.is_none() {
            self.connect()?;
        }

        let mut written = 0;
        while written < data.len() {
            // Write is implemented for &TcpStream; invariant: connected above and nothing in this loop disconnects
            let mut stream: &TcpStream = self.stream.as_ref().unwrap();
            match stream.write(&data[written..]) {
                Ok(0) => return Err(Error::Io(io::Error::new(ErrorKind::WriteZero, "socket accepted zero bytes"))),
                Ok(n) => written += n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => continue,
                Err(e) => return Err(Error::Io(e)),
            }
            self.check_reset()?;
        }

        Ok(written)
    }

    fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        self.connect()
    }
}

fn fill_exact(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;

    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(io::Error::new(ErrorKind::UnexpectedEof, "socket closed mid-read")),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
