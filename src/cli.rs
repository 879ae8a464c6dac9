mod burrow;
mod connection;
mod control;
mod error;
mod guard;
mod registers;

use clap::{Parser, Subcommand};

use crate::cli::{burrow::BurrowArgs, guard::GuardArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: watch the system and steer the MultiPlus modes until terminated.
    #[clap(name = "guard")]
    Guard(Box<GuardArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}
