use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Badge check-in service recording student attendance."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Create missing tables, add the attendance time column and backfill it.
    CreateTables,

    /// Register a student so their badge can check in.
    AddStudent {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Badge/card serial code, must be unique.
        #[arg(long = "serial-id", value_name = "SERIAL")]
        serial_id: String,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
