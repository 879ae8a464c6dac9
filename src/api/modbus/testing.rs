//! In-memory register port for the tests.

use std::collections::{HashMap, HashSet};

use tokio_modbus::{Address, ExceptionCode, SlaveId};

use crate::api::modbus::{RegisterPort, TransportError};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Write {
    pub unit_id: SlaveId,
    pub register: Address,
    pub value: u16,
}

/// Fake device: a register table, a write log, and failure injection.
///
/// Successful writes are reflected in the register table, as a real device would do.
#[derive(Default)]
pub struct FakePort {
    registers: HashMap<(SlaveId, Address), u16>,
    failing_reads: HashSet<(SlaveId, Address)>,
    pub writes: Vec<Write>,
    pub fail_writes: bool,
    pub fail_connect: bool,
    pub is_connected: bool,
    pub n_closes: usize,

    /// Moments of the [`RegisterPort::close`] calls, on the Tokio clock.
    pub closed_at: Vec<tokio::time::Instant>,
}

impl FakePort {
    /// Fake that behaves as if [`RegisterPort::connect`] has already succeeded.
    pub fn connected() -> Self {
        Self { is_connected: true, ..Self::default() }
    }

    /// Fake that refuses every connection attempt.
    pub fn failing_connect() -> Self {
        Self { fail_connect: true, ..Self::default() }
    }

    #[must_use]
    pub fn with(mut self, unit_id: SlaveId, register: Address, value: u16) -> Self {
        self.set(unit_id, register, value);
        self
    }

    pub fn set(&mut self, unit_id: SlaveId, register: Address, value: u16) {
        self.registers.insert((unit_id, register), value);
    }

    pub fn get(&self, unit_id: SlaveId, register: Address) -> Option<u16> {
        self.registers.get(&(unit_id, register)).copied()
    }

    pub fn fail_reads(&mut self, unit_id: SlaveId, register: Address) {
        self.failing_reads.insert((unit_id, register));
    }
}

impl RegisterPort for FakePort {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::Connect {
                endpoint: "fake:502".to_owned(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            });
        }
        self.is_connected = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.is_connected = false;
        self.n_closes += 1;
        self.closed_at.push(tokio::time::Instant::now());
    }

    async fn read_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
    ) -> Result<u16, TransportError> {
        if !self.is_connected {
            return Err(TransportError::NotConnected);
        }
        if self.failing_reads.contains(&(unit_id, register)) {
            return Err(TransportError::Exception(ExceptionCode::ServerDeviceFailure));
        }
        self.get(unit_id, register)
            .ok_or(TransportError::Exception(ExceptionCode::IllegalDataAddress))
    }

    async fn read_block(
        &mut self,
        unit_id: SlaveId,
        base: Address,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let mut words = Vec::with_capacity(usize::from(count));
        for offset in 0..count {
            words.push(self.read_u16(unit_id, base + offset).await?);
        }
        Ok(words)
    }

    async fn write_u16(
        &mut self,
        unit_id: SlaveId,
        register: Address,
        value: u16,
    ) -> Result<(), TransportError> {
        if !self.is_connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_writes {
            return Err(TransportError::Exception(ExceptionCode::ServerDeviceBusy));
        }
        self.writes.push(Write { unit_id, register, value });
        self.set(unit_id, register, value);
        Ok(())
    }
}
