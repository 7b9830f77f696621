use clap::{Parser, Subcommand};

/// Waymark — route planning and sharing API server
#[derive(Parser)]
#[command(name = "waymark", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind; falls back to WAYMARK_PORT when omitted
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account directly in the store
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}
