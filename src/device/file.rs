use super::{Device, DeviceError, DeviceFactory, DeviceUri};
use std::fs::{File, OpenOptions};
use std::io::Write;

/// `file://` transport. Exists for testing: writes the device-native stream
/// to a regular file instead of real hardware. `?ext=` picks the output
/// file's suffix.
pub struct FileDevice {
    file: File,
}

impl Device for FileDevice {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DeviceError> {
        Ok(self.file.write(buf)?)
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(self.file.flush()?)
    }
}

pub(super) struct FileDeviceFactory;

impl DeviceFactory for FileDeviceFactory {
    fn open(&self, uri: &DeviceUri) -> Result<Box<dyn Device>, DeviceError> {
        let mut path = uri.authority.clone();
        if let Some(ext) = uri.param("ext") {
            path = format!("{path}.{ext}");
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(DeviceError::Io)?;
        Ok(Box::new(FileDevice { file }))
    }
}
