use std::time::{Duration, Instant};

use bon::Builder;
use tokio::time::sleep;

use crate::{
    api::{modbus::RegisterPort, multiplus::Device},
    core::controller::{Controller, Sample, State},
    prelude::*,
};

/// Value of the enable flag that lets the controller act.
const ENABLED: u16 = 1;

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cycle {
    /// The enable flag is off, the controller has been reset and nothing was written.
    Disabled,

    Stepped(State),
}

#[derive(Builder)]
pub struct PollLoop<P> {
    device: Device<P>,
    controller: Controller,

    #[builder(into)]
    poll_interval: Duration,

    /// Sleep after a failed cycle.
    #[builder(into, default = Duration::from_secs(2))]
    error_backoff: Duration,
}

impl<P: RegisterPort> PollLoop<P> {
    /// Run the cycles until the shutdown future resolves, and hand the closed device back.
    ///
    /// The shutdown is only honoured between the cycles, a started cycle always runs to the end.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Device<P> {
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            let pause = match self.run_cycle(Instant::now()).await {
                Ok(_) => self.poll_interval,
                Err(error) => {
                    error!("cycle failed: {error:#}");
                    self.device.close().await;
                    self.error_backoff
                }
            };
            tokio::select! {
                () = sleep(pause) => {}
                () = &mut shutdown => {
                    info!("shutting down…");
                    break;
                }
            }
        }
        self.device.close().await;
        self.device
    }

    #[instrument(skip_all)]
    pub async fn run_cycle(&mut self, now: Instant) -> Result<Cycle> {
        self.device.connect().await?;

        let enable_flag = self.device.read_enable_flag().await?;
        if enable_flag != ENABLED {
            if self.controller.state().is_some() {
                warn!(enable_flag, "disabled, resetting");
            } else {
                debug!(enable_flag, "disabled");
            }
            self.controller.disable();
            return Ok(Cycle::Disabled);
        }

        let sample = Sample {
            measurement: self.device.read_measurement().await?,
            operating_mode: self.device.read_operating_mode().await,
            energy_mode: self.device.read_energy_mode().await,
        };
        let state = self.controller.step(&mut self.device, now, &sample).await?;
        Ok(Cycle::Stepped(state))
    }

    #[cfg(test)]
    const fn device_mut(&mut self) -> &mut Device<P> {
        &mut self.device
    }
}
