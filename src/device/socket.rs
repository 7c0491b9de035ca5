use super::{Device, DeviceError, DeviceFactory, DeviceUri};
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

/// `socket://host:port` — raw AppSocket/JetDirect transport (TCP, port 9100
/// by convention, but the authority's port always wins).
pub struct SocketDevice {
    stream: TcpStream,
}

impl Device for SocketDevice {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        self.stream.write_all(buf)?;
        Ok(buf.len())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.stream.shutdown(std::net::Shutdown::Both).ok();
        Ok(())
    }
}

pub(super) struct SocketDeviceFactory;

impl DeviceFactory for SocketDeviceFactory {
    fn open(&self, uri: &DeviceUri) -> Result<Box<dyn Device>, DeviceError> {
        let authority = if uri.authority.contains(':') {
            uri.authority.clone()
        } else {
            format!("{}:9100", uri.authority)
        };
        let stream = TcpStream::connect(&authority).map_err(DeviceError::Io)?;
        stream
            .set_write_timeout(Some(Duration::from_secs(30)))
            .ok();
        Ok(Box::new(SocketDevice { stream }))
    }
}
