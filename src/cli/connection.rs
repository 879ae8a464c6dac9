use clap::{ArgAction, Parser, builder::BoolishValueParser};

use crate::api::modbus::ConnectionSettings;

#[derive(Parser)]
pub struct ConnectionArgs {
    /// Venus OS (GX device) host name or IP address.
    #[clap(long = "venus-host", env = "VENUS_HOST", default_value = "192.168.41.101")]
    host: String,

    #[clap(long = "venus-port", env = "VENUS_PORT", default_value = "502")]
    port: u16,

    /// Timeout for connecting and for every single request.
    #[clap(long = "modbus-timeout", env = "MODBUS_TIMEOUT", default_value = "2s")]
    timeout: humantime::Duration,

    /// Added to every register address.
    #[clap(
        long = "addr-offset",
        env = "ADDR_OFFSET",
        default_value = "0",
        allow_negative_numbers = true
    )]
    address_offset: i32,

    /// Log the writes instead of performing them.
    #[clap(
        long = "dry-run",
        env = "DRY_RUN",
        default_value = "false",
        default_missing_value = "true",
        num_args = 0..=1,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
    )]
    is_dry_run: bool,
}

impl ConnectionArgs {
    pub fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            timeout: self.timeout.into(),
            address_offset: self.address_offset,
            is_dry_run: self.is_dry_run,
        }
    }
}
