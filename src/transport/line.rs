use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use super::{Reply, Transport, TransportResult};
use crate::error::TransportError;

/// Where the robot is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Serial device node, already configured for the robot's line settings.
    Device(PathBuf),
    /// `host:port` of a serial bridge or emulator.
    Tcp(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Device(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Newline-framed transport over a device node or TCP stream.
///
/// Replies are read on a background thread and handed over a channel so
/// `poll_reply` can honour its timeout on either kind of endpoint.
pub struct LineTransport {
    endpoint: Endpoint,
    link: Option<Link>,
}

struct Link {
    writer: Box<dyn Write + Send>,
    replies: Receiver<io::Result<String>>,
    socket: Option<TcpStream>,
}

impl LineTransport {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            link: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    fn unavailable(&self, source: io::Error) -> TransportError {
        TransportError::Unavailable {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }

    fn connect(&self) -> io::Result<Link> {
        match &self.endpoint {
            Endpoint::Device(path) => {
                let device = OpenOptions::new().read(true).write(true).open(path)?;
                let reader = device.try_clone()?;
                Ok(Link {
                    writer: Box::new(device),
                    replies: spawn_reader(reader)?,
                    socket: None,
                })
            }
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())?;
                stream.set_nodelay(true).ok();
                let reader = stream.try_clone()?;
                let socket = stream.try_clone()?;
                Ok(Link {
                    writer: Box::new(stream),
                    replies: spawn_reader(reader)?,
                    socket: Some(socket),
                })
            }
        }
    }
}

impl Transport for LineTransport {
    fn describe(&self) -> String {
        self.endpoint.to_string()
    }

    fn open(&mut self) -> TransportResult<()> {
        if self.link.is_some() {
            return Ok(());
        }
        let link = self.connect().map_err(|err| self.unavailable(err))?;
        self.link = Some(link);
        Ok(())
    }

    fn send(&mut self, line: &str) -> TransportResult<()> {
        let link = self.link.as_mut().ok_or(TransportError::NotOpen)?;
        link.writer.write_all(line.as_bytes())?;
        link.writer.write_all(b"\n")?;
        link.writer.flush()?;
        Ok(())
    }

    fn poll_reply(&mut self, timeout: Duration) -> TransportResult<Option<Reply>> {
        let link = self.link.as_ref().ok_or(TransportError::NotOpen)?;
        match link.replies.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(Some(Reply::parse(&line))),
            Ok(Err(err)) => Err(TransportError::Io(err)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "robot closed the link",
            ))),
        }
    }

    fn close(&mut self) {
        if let Some(link) = self.link.take() {
            if let Some(socket) = link.socket {
                socket.shutdown(Shutdown::Both).ok();
            }
        }
    }
}

impl Drop for LineTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// The thread ends at EOF, on a read error, or once the receiver is dropped
// and the next line arrives.
fn spawn_reader<R>(reader: R) -> io::Result<Receiver<io::Result<String>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("robo-writer-replies".to_string())
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        if tx.send(Ok(line)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}
