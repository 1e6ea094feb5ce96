/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

pub mod i2c;

use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardInfo {
    pub name: &'static str,
    pub addr: u16,
}

impl BoardInfo {
    pub const fn new(name: &'static str, addr: u16) -> Self {
        Self { name, addr }
    }
}

/// A bound client on the bus. Each call is one blocking bus transfer and
/// returns the number of bytes it moved, which may be less than asked for
/// when the bus limits message size.
pub trait Transport {
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

pub trait Adapter {
    type Client: Transport;

    fn number(&self) -> u32;
    fn new_client(&self, info: &BoardInfo) -> io::Result<Self::Client>;
}
