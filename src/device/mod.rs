//! Device abstraction: `open/write/read_status/identify/close` over
//! pluggable transports, selected by URI scheme.

mod file;
mod socket;
mod uri;

pub use file::FileDevice;
pub use socket::SocketDevice;
pub use uri::DeviceUri;

use std::collections::HashMap;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no device factory registered for scheme {0:?}")]
    NotFound(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("operation timed out")]
    Timeout,
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("malformed device uri: {0:?}")]
    BadUri(String),
}

/// A single open connection to a physical or virtual print device.
pub trait Device: Send {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DeviceError>;
    /// Bitset of `printer-state-reasons` keywords the transport itself can
    /// detect (e.g. `media-empty-warning` for a socket device that got
    /// `ENOSPC`-like backpressure). Most transports report nothing.
    fn read_status(&mut self) -> Result<Vec<String>, DeviceError> {
        Ok(Vec::new())
    }
    fn identify(&mut self, _message: Option<&str>) -> Result<(), DeviceError> {
        Ok(())
    }
    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// A factory that opens a [`Device`] for URIs under one scheme.
pub trait DeviceFactory: Send + Sync {
    fn open(&self, uri: &DeviceUri) -> Result<Box<dyn Device>, DeviceError>;
}

/// Maps a URI scheme to the factory that can open it. Scheme matching is
/// exact-match over the whole scheme token, which is what "longest-prefix
/// URI-scheme match" reduces to once schemes are taken as atomic (they
/// don't nest: there is no transport whose scheme is itself a prefix of
/// another registered scheme in this core).
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, Box<dyn DeviceFactory>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut r = Self::default();
        r.register("file", Box::new(file::FileDeviceFactory));
        r.register("socket", Box::new(socket::SocketDeviceFactory));
        r
    }

    pub fn register(&mut self, scheme: &str, factory: Box<dyn DeviceFactory>) {
        self.factories.insert(scheme.to_string(), factory);
    }

    pub fn open(&self, uri_str: &str) -> Result<Box<dyn Device>, DeviceError> {
        let uri = DeviceUri::parse(uri_str)?;
        match self.factories.get(uri.scheme.as_str()) {
            Some(factory) => factory.open(&uri),
            None => Err(DeviceError::NotFound(uri.scheme)),
        }
    }
}
