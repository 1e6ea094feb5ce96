/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

use crate::transport::{Adapter, BoardInfo, Transport};
use std::io;

#[cfg(any(target_os = "linux", target_os = "android"))]
use i2cdev::{core::I2CDevice, linux::LinuxI2CDevice};
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::path::{Path, PathBuf};

// i2cdev_read/i2cdev_write in drivers/i2c/i2c-dev.c truncate to this.
const I2C_DEV_MAX_XFER: usize = 8192;

pub(crate) fn dev_path(bus: u32) -> String {
    format!("/dev/i2c-{bus}")
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) struct I2cAdapter {
    bus: u32,
    path: PathBuf,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) struct I2cTransport {
    dev: LinuxI2CDevice,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn open_i2c(path: &Path, addr: u16) -> io::Result<LinuxI2CDevice> {
    if let Ok(dev) = LinuxI2CDevice::new(path, addr) {
        return Ok(dev);
    }
    // The address is usually held by the kernel at24 driver.
    log::info!("Safely opening failed ==> Forcefully opening device...");
    unsafe { LinuxI2CDevice::force_new(path, addr) }.map_err(io::Error::from)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl I2cAdapter {
    pub(crate) fn get(bus: u32) -> Option<Self> {
        let path = PathBuf::from(dev_path(bus));
        if !path.exists() {
            return None;
        }
        Some(Self { bus, path })
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Adapter for I2cAdapter {
    type Client = I2cTransport;

    fn number(&self) -> u32 {
        self.bus
    }

    fn new_client(&self, info: &BoardInfo) -> io::Result<I2cTransport> {
        Ok(I2cTransport {
            dev: open_i2c(&self.path, info.addr)?,
        })
    }
}

/// Bytes a single i2c-dev read or write can move. Anything past this is
/// left for the caller to see as a short transfer.
pub(crate) fn xfer_len(len: usize) -> usize {
    len.min(I2C_DEV_MAX_XFER)
}

// i2cdev drops the byte count, so each call is kept within one kernel
// message and reports the capped length.
#[cfg(any(target_os = "linux", target_os = "android"))]
impl Transport for I2cTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = xfer_len(data.len());
        self.dev.write(&data[..n]).map_err(io::Error::from)?;
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = xfer_len(buf.len());
        self.dev.read(&mut buf[..n]).map_err(io::Error::from)?;
        Ok(n)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) struct I2cAdapter;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) struct I2cTransport;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl I2cAdapter {
    pub(crate) fn get(_bus: u32) -> Option<Self> {
        None
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl Adapter for I2cAdapter {
    type Client = I2cTransport;

    fn number(&self) -> u32 {
        0
    }

    fn new_client(&self, _info: &BoardInfo) -> io::Result<I2cTransport> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "i2c transport is linux-only"))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl Transport for I2cTransport {
    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "i2c transport is linux-only"))
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "i2c transport is linux-only"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_path_names_i2c_dev_node() {
        assert_eq!(dev_path(2), "/dev/i2c-2");
        assert_eq!(dev_path(10), "/dev/i2c-10");
    }

    #[test]
    fn transfers_are_capped_at_one_kernel_message() {
        assert_eq!(xfer_len(0), 0);
        assert_eq!(xfer_len(64), 64);
        assert_eq!(xfer_len(I2C_DEV_MAX_XFER), I2C_DEV_MAX_XFER);
        assert_eq!(xfer_len(9000), I2C_DEV_MAX_XFER);
        // a full AT24C256 dump does not fit one message
        assert_eq!(xfer_len(32 * 1024), 8192);
    }

    #[test]
    fn missing_bus_has_no_adapter() {
        assert!(I2cAdapter::get(u32::MAX).is_none());
    }
}
