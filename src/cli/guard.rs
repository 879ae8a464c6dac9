use clap::Parser;

use crate::{
    api::{modbus, multiplus::Device},
    cli::{connection::ConnectionArgs, control::ControlArgs, registers::RegisterArgs},
    core::{controller::Controller, poll_loop::PollLoop},
    prelude::*,
};

#[derive(Parser)]
pub struct GuardArgs {
    #[clap(flatten)]
    connection: ConnectionArgs,

    #[clap(flatten)]
    registers: RegisterArgs,

    #[clap(flatten)]
    control: ControlArgs,
}

impl GuardArgs {
    pub async fn run(self) -> Result {
        let connection = self.connection.settings();
        let registers = self.registers.register_map()?;
        let settings = self.control.settings()?;
        let poll_interval = self.control.poll_interval()?;

        info!(
            host = %connection.host,
            port = connection.port,
            is_dry_run = connection.is_dry_run,
            address_offset = connection.address_offset,
            ?poll_interval,
            "guarding…",
        );
        info!("registers: {}", registers.summary());
        debug!(?settings);

        let shutdown = shutdown_signal()?;
        PollLoop::builder()
            .device(Device::new(modbus::Client::new(connection), registers))
            .controller(Controller::new(settings))
            .poll_interval(poll_interval)
            .build()
            .run(shutdown)
            .await;
        Ok(())
    }
}

/// Install the handlers right away and return the future that resolves on SIGINT or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install the SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install the SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("interrupted"),
            _ = terminate.recv() => info!("terminated"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {error:#}");
            std::future::pending::<()>().await;
        }
    })
}
