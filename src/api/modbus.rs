//! Register transport.

mod client;
#[cfg(test)]
pub mod testing;

use std::time::Duration;

use tokio_modbus::{Address, ExceptionCode, SlaveId};

pub use self::client::{Client, ConnectionSettings};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to `{endpoint}`")]
    Connect {
        endpoint: String,

        #[source]
        source: std::io::Error,
    },

    #[error("not connected")]
    NotConnected,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("Modbus request failed")]
    Request(#[from] tokio_modbus::Error),

    #[error("the device replied with exception `{0:?}`")]
    Exception(ExceptionCode),

    #[error("register #{register} is out of range with the address offset {offset}")]
    Address { register: Address, offset: i32 },
}

/// Synchronous-in-spirit register access: every call completes (or fails) before the next one
/// is issued, there are no retries inside.
#[allow(async_fn_in_trait)]
pub trait RegisterPort {
    /// Connect to the device, unless already connected.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Drop the connection, the next [`Self::connect`] establishes a new one.
    async fn close(&mut self);

    async fn read_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
    ) -> Result<u16, TransportError>;

    /// Read `count` contiguous holding registers, the result always contains exactly `count` words.
    async fn read_block(
        &mut self,
        unit_id: SlaveId,
        base: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    async fn write_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
        value: u16,
    ) -> Result<(), TransportError>;
}
