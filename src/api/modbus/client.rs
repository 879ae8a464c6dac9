use std::time::Duration;

use tokio::{net::TcpStream, time::timeout};
use tokio_modbus::{
    Address,
    ExceptionCode,
    Slave,
    SlaveId,
    client::{Client as _, Context, Reader, Writer, tcp::attach_slave},
    slave::SlaveContext,
};

use crate::{
    api::modbus::{RegisterPort, TransportError},
    prelude::*,
};

#[must_use]
#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,

    /// Applies to connecting and to every single request.
    pub timeout: Duration,

    /// Added to every register address to compensate for off-by-one register maps.
    pub address_offset: i32,

    /// Log the writes instead of performing them.
    pub is_dry_run: bool,
}

/// Modbus TCP client with a single connection shared by all the units.
///
/// The unit (slave) ID is switched for each request.
pub struct Client {
    settings: ConnectionSettings,
    context: Option<Context>,
}

impl Client {
    pub const fn new(settings: ConnectionSettings) -> Self {
        Self { settings, context: None }
    }

    fn address(&self, register: Address) -> Result<Address, TransportError> {
        let offset = self.settings.address_offset;
        Address::try_from(i32::from(register) + offset)
            .map_err(|_| TransportError::Address { register, offset })
    }

    /// Address of the register `offset` words into the block starting at `base`.
    fn block_address(&self, base: Address, offset: u16) -> Result<Address, TransportError> {
        let register = base.checked_add(offset).ok_or(TransportError::Address {
            register: base,
            offset: i32::from(offset) + self.settings.address_offset,
        })?;
        self.address(register)
    }

    fn context(&mut self, unit_id: SlaveId) -> Result<&mut Context, TransportError> {
        let context = self.context.as_mut().ok_or(TransportError::NotConnected)?;
        context.set_slave(Slave(unit_id));
        Ok(context)
    }
}

/// Await the request with the timeout and flatten the nested results.
async fn request<T>(
    duration: Duration,
    request: impl Future<Output = tokio_modbus::Result<T>>,
) -> Result<T, TransportError> {
    let response =
        timeout(duration, request).await.map_err(|_| TransportError::Timeout(duration))??;
    response.map_err(TransportError::Exception)
}

impl RegisterPort for Client {
    #[instrument(skip_all, fields(host = %self.settings.host, port = self.settings.port))]
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.context.is_some() {
            return Ok(());
        }
        info!("connecting…");
        let endpoint = (self.settings.host.as_str(), self.settings.port);
        let connect_error = |source| TransportError::Connect {
            endpoint: format!("{}:{}", self.settings.host, self.settings.port),
            source,
        };
        let tcp_stream = timeout(self.settings.timeout, TcpStream::connect(endpoint))
            .await
            .map_err(|_| TransportError::Timeout(self.settings.timeout))?
            .map_err(connect_error)?;
        tcp_stream.set_nodelay(true).map_err(connect_error)?;

        // The unit ID gets overridden by each request anyway:
        self.context = Some(attach_slave(tcp_stream, Slave(0xFF)));
        info!("connected");
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(error) = context.disconnect().await {
                debug!("failed to disconnect gracefully: {error:#}");
            }
            info!("disconnected");
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
    ) -> Result<u16, TransportError> {
        let mut words = self.read_block(unit_id, register, 1).await?;
        Ok(words.swap_remove(0))
    }

    #[instrument(skip(self), level = "debug")]
    async fn read_block(
        &mut self,
        unit_id: SlaveId,
        base: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let duration = self.settings.timeout;
        let address = self.address(base)?;
        let mut words =
            request(duration, self.context(unit_id)?.read_holding_registers(address, count))
                .await?;
        debug!(?words, "read");

        if words.len() < usize::from(count) {
            // Some devices silently truncate the block, fall back to reading one by one:
            warn!(n_words = words.len(), "short block, reading the registers one by one…");
            words.clear();
            for offset in 0..count {
                let address = self.block_address(base, offset)?;
                let word =
                    request(duration, self.context(unit_id)?.read_holding_registers(address, 1))
                        .await?
                        .first()
                        .copied()
                        .ok_or(TransportError::Exception(ExceptionCode::IllegalDataAddress))?;
                words.push(word);
            }
        }
        words.truncate(usize::from(count));
        Ok(words)
    }

    #[instrument(skip(self))]
    async fn write_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
        value: u16,
    ) -> Result<(), TransportError> {
        if self.settings.is_dry_run {
            warn!("dry run: not writing");
            return Ok(());
        }
        let duration = self.settings.timeout;
        let address = self.address(register)?;
        request(duration, self.context(unit_id)?.write_single_register(address, value)).await?;
        info!("written");
        Ok(())
    }
}
