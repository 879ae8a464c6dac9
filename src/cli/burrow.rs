use clap::{Parser, Subcommand};

use crate::{
    api::{modbus, multiplus::Device},
    cli::{connection::ConnectionArgs, registers::RegisterArgs},
    prelude::*,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::Measure(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
pub enum BurrowCommand {
    /// Read everything the controller reads once, without writing anything.
    Measure(BurrowMeasureArgs),
}

#[derive(Parser)]
pub struct BurrowMeasureArgs {
    #[clap(flatten)]
    connection: ConnectionArgs,

    #[clap(flatten)]
    registers: RegisterArgs,
}

impl BurrowMeasureArgs {
    #[instrument(skip_all)]
    async fn run(self) -> Result {
        let registers = self.registers.register_map()?;
        info!("registers: {}", registers.summary());

        let mut device = Device::new(modbus::Client::new(self.connection.settings()), registers);
        device.connect().await?;
        let result = async {
            let enable_flag = device.read_enable_flag().await?;
            let measurement = device.read_measurement().await?;
            let operating_mode = device.read_operating_mode().await;
            let energy_mode = device.read_energy_mode().await;
            info!(
                enable_flag,
                soc = %measurement.state_of_charge,
                load = %measurement.load,
                pv = %measurement.pv,
                mode = %operating_mode,
                energy_mode = %energy_mode,
                "gotcha",
            );
            Ok::<_, Error>(())
        }
        .await;
        device.close().await;
        result
    }
}
