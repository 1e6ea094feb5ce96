/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

use crate::transport::{Adapter, BoardInfo, Transport};
use crate::{Error, Result};
use log::{debug, info};
use std::{io, sync::Mutex};

pub(crate) const I2C_BUS_AVAILABLE: u32 = 2;
pub(crate) const SLAVE_DEVICE_NAME: &str = "AT24C256";
pub(crate) const EEPROM_SLAVE_ADDR: u16 = 0x50;

pub(crate) const AT24C256: BoardInfo = BoardInfo::new(SLAVE_DEVICE_NAME, EEPROM_SLAVE_ADDR);

// Linux i2c fault codes, see Documentation/i2c/fault-codes.rst.
const ENXIO: i32 = 6;
const EAGAIN: i32 = 11;
const EIO: i32 = 5;
const ETIMEDOUT: i32 = 110;
const EREMOTEIO: i32 = 121;

#[derive(Debug, thiserror::Error)]
pub(crate) enum TransferError {
    #[error("bus timeout")]
    Timeout,
    #[error("no acknowledgment from peer")]
    Nack,
    #[error("bus arbitration lost")]
    ArbitrationLost,
    #[error("short transfer: {transferred} of {requested} bytes")]
    ShortTransfer { requested: usize, transferred: usize },
    #[error("bus error: {0}")]
    Bus(#[source] io::Error),
}

impl TransferError {
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ArbitrationLost | Self::ShortTransfer { .. }
        )
    }

    /// Negative errno, as the kernel i2c_master_send/recv would return it.
    pub(crate) fn errno(&self) -> i32 {
        -match self {
            Self::Timeout => ETIMEDOUT,
            Self::Nack => EREMOTEIO,
            Self::ArbitrationLost => EAGAIN,
            Self::ShortTransfer { .. } => EIO,
            Self::Bus(e) => e.raw_os_error().unwrap_or(EIO),
        }
    }
}

impl From<io::Error> for TransferError {
    fn from(e: io::Error) -> Self {
        match e.raw_os_error() {
            Some(ENXIO) | Some(EREMOTEIO) => Self::Nack,
            Some(ETIMEDOUT) => Self::Timeout,
            Some(EAGAIN) => Self::ArbitrationLost,
            _ if e.kind() == io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Bus(e),
        }
    }
}

pub(crate) struct Eeprom<T: Transport> {
    info: BoardInfo,
    client: Mutex<T>,
}

impl<T: Transport> Eeprom<T> {
    /// The adapter reference is released before returning on every path;
    /// the client keeps the bus open on its own.
    pub(crate) fn bind<A, F>(bus: u32, info: BoardInfo, get_adapter: F) -> Result<Self>
    where
        A: Adapter<Client = T>,
        F: FnOnce(u32) -> Option<A>,
    {
        let Some(adapter) = get_adapter(bus) else {
            info!("I2C bus adapter {bus} not available");
            return Err(Error::Adapter);
        };

        let client = match adapter.new_client(&info) {
            Ok(client) => client,
            Err(e) => {
                info!(
                    "{} client not found at 0x{:02x} on bus {}: {e}",
                    info.name,
                    info.addr,
                    adapter.number()
                );
                return Err(Error::Client(e));
            }
        };
        drop(adapter);

        let eeprom = Self {
            info,
            client: Mutex::new(client),
        };
        eeprom.probe();
        info!("driver added");
        Ok(eeprom)
    }

    fn probe(&self) {
        info!("{} probed", self.info.name);
    }

    fn remove(&self) {
        info!("{} removed", self.info.name);
    }

    #[cfg(test)]
    pub(crate) fn info(&self) -> &BoardInfo {
        &self.info
    }

    pub(crate) fn write(&self, data: &[u8]) -> std::result::Result<usize, TransferError> {
        let mut client = self.client.lock().map_err(|_| poisoned())?;
        let n = client.write(data)?;
        debug!("write {}/{} bytes to 0x{:02x}", n, data.len(), self.info.addr);
        complete(data.len(), n)
    }

    pub(crate) fn read(&self, buf: &mut [u8]) -> std::result::Result<usize, TransferError> {
        let mut client = self.client.lock().map_err(|_| poisoned())?;
        let n = client.read(buf)?;
        debug!("read {}/{} bytes from 0x{:02x}", n, buf.len(), self.info.addr);
        complete(buf.len(), n)
    }
}

impl<T: Transport> Drop for Eeprom<T> {
    fn drop(&mut self) {
        self.remove();
        info!("driver removed");
    }
}

fn complete(requested: usize, transferred: usize) -> std::result::Result<usize, TransferError> {
    if transferred < requested {
        return Err(TransferError::ShortTransfer {
            requested,
            transferred,
        });
    }
    // A transport may never report more than it was handed.
    Ok(requested)
}

fn poisoned() -> TransferError {
    TransferError::Bus(io::Error::new(io::ErrorKind::Other, "client lock poisoned"))
}
