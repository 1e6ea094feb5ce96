/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */


#![cfg_attr(not(any(target_os = "linux", target_os = "android")), allow(dead_code, unused_imports))]
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn main() {
    eprintln!("at24tool currently supports Linux only.");
}

pub mod eeprom;
pub mod transport;

use eeprom::{Eeprom, TransferError};
use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;
use transport::{i2c::I2cAdapter, BoardInfo};

#[derive(Debug)]
#[allow(dead_code)]
enum Error {
    Adapter,
    Client(std::io::Error),
    InvalidArgument,
    Transfer(TransferError),
    Parse(std::num::ParseIntError),
    Hex(hex::FromHexError),
}

type Result<T> = std::result::Result<T, Error>;

fn parse_address(addr_str: &str) -> Result<u16> {
    let addr = if let Some(stripped) = addr_str.strip_prefix("0x") {
        u16::from_str_radix(stripped, 16).map_err(Error::Parse)?
    } else {
        addr_str.parse::<u16>().map_err(Error::Parse)?
    };
    if addr > 0x7f {
        error!("Address 0x{addr:x} does not fit in 7 bits");
        return Err(Error::InvalidArgument);
    }
    Ok(addr)
}

fn at24tool() -> Result<()> {
    let matches = clap::command!()
        .arg(
            clap::arg!(-b --bus [BUS] "i2c bus number the EEPROM is wired to.")
                .default_value(eeprom::I2C_BUS_AVAILABLE.to_string()),
        )
        .arg(
            clap::arg!(-a --address [ADDRESS] "i2c slave address of the EEPROM.")
                .default_value(format!("0x{:02x}", eeprom::EEPROM_SLAVE_ADDR)),
        )
        .subcommand(clap::Command::new("probe").about("bind the EEPROM and release it again"))
        .subcommand(
            clap::Command::new("read")
                .about("read LEN raw bytes from the EEPROM")
                .arg(clap::arg!(<LEN> "number of bytes to read")),
        )
        .subcommand(
            clap::Command::new("write")
                .about("write raw bytes to the EEPROM")
                .arg(clap::arg!(<HEX> "bytes to send, hex encoded")),
        )
        .arg_required_else_help(true)
        .get_matches();

    let bus = matches
        .get_one::<String>("bus")
        .ok_or(Error::InvalidArgument)?
        .parse::<u32>()
        .map_err(Error::Parse)?;
    let addr = parse_address(
        matches
            .get_one::<String>("address")
            .ok_or(Error::InvalidArgument)?,
    )?;

    let info = BoardInfo {
        addr,
        ..eeprom::AT24C256
    };
    let device = Eeprom::bind(bus, info, I2cAdapter::get)?;

    match matches.subcommand() {
        Some(("probe", _)) => {}
        Some(("read", args)) => {
            let len = args
                .get_one::<String>("LEN")
                .ok_or(Error::InvalidArgument)?
                .parse::<usize>()
                .map_err(Error::Parse)?;
            let mut buf = vec![0u8; len];
            let n = device.read(&mut buf).map_err(Error::Transfer)?;
            println!("{}", hex::encode(&buf[..n]));
        }
        Some(("write", args)) => {
            let data = hex::decode(args.get_one::<String>("HEX").ok_or(Error::InvalidArgument)?)
                .map_err(Error::Hex)?;
            let n = device.write(&data).map_err(Error::Transfer)?;
            info!("Wrote {n} bytes");
        }
        _ => {}
    }
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match at24tool() {
        Ok(_) => ExitCode::SUCCESS,
        Err(Error::Transfer(e)) => {
            error!("at24tool: {e} (errno {}, retryable: {})", e.errno(), e.is_retryable());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("at24tool: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
