#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the BasuRANT toolchain.
//!
//! ```text
//! basurant serve
//! basurant fetch [--combined]
//! basurant stats
//! basurant export [--out reports_export.csv]
//! basurant map [--zoom 13] [--plain] [--status pending|verified | --heat]
//! basurant show <id>
//! basurant submit <form.json>
//! ```
//!
//! Running `basurant` with no subcommand asks which tool to run.

mod commands;

use std::path::PathBuf;

use basurant_map::StatusFilter;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};

#[derive(Parser)]
#[command(name = "basurant", about = "Waste dumpsite report toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the report API server
    Serve,
    /// Fetch reports through the source chain and list them
    Fetch {
        /// Append locally stored reports to the remote list
        #[arg(long)]
        combined: bool,
    },
    /// Print dashboard statistics
    Stats,
    /// Export fetched reports as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the map markers and clusters at a zoom level
    Map {
        /// Map zoom level
        #[arg(long, default_value_t = basurant_map::DEFAULT_ZOOM)]
        zoom: f64,
        /// Disable clustering
        #[arg(long)]
        plain: bool,
        /// Only draw reports with this raw status (all, pending, verified)
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Draw remote and local reports together in the heat style
        #[arg(long, conflicts_with = "status")]
        heat: bool,
    },
    /// Show one report by id
    Show {
        /// Report id (`R-<sequence><MMDDYYYY>`)
        id: String,
    },
    /// Submit a report from a JSON form file
    Submit {
        /// Path to the form (camelCase report fields)
        form: PathBuf,
    },
}

/// Tools offered when no subcommand is given.
enum Tool {
    Server,
    Fetch,
    Stats,
    Map,
    Show,
}

impl Tool {
    const ALL: &[Self] = &[Self::Server, Self::Fetch, Self::Stats, Self::Map, Self::Show];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Server => "Start server",
            Self::Fetch => "Fetch reports",
            Self::Stats => "Dashboard statistics",
            Self::Map => "Map markers",
            Self::Show => "Show a report",
        }
    }
}

fn interactive() -> Result<Commands, Box<dyn std::error::Error>> {
    println!("BasuRANT Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Tool::ALL[idx] {
        Tool::Server => Commands::Serve,
        Tool::Fetch => Commands::Fetch { combined: false },
        Tool::Stats => Commands::Stats,
        Tool::Map => Commands::Map {
            zoom: basurant_map::DEFAULT_ZOOM,
            plain: false,
            status: StatusFilter::All,
            heat: false,
        },
        Tool::Show => Commands::Show {
            id: Input::new().with_prompt("Report id").interact_text()?,
        },
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => interactive()?,
    };

    match command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(basurant_server::interactive::run())
            })
            .await??;
        }
        Commands::Fetch { combined } => commands::fetch(combined).await?,
        Commands::Stats => commands::stats().await?,
        Commands::Export { out } => commands::export(out.as_deref()).await?,
        Commands::Map {
            zoom,
            plain,
            status,
            heat,
        } => commands::map(zoom, plain, status, heat).await?,
        Commands::Show { id } => {
            if !commands::show(&id).await? {
                eprintln!("Report not found: {id}");
                std::process::exit(1);
            }
        }
        Commands::Submit { form } => commands::submit(&form).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_accepts_status_filter_or_heat() {
        let cli = Cli::try_parse_from(["basurant", "map", "--status", "verified"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Map {
                status: StatusFilter::Verified,
                heat: false,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["basurant", "map", "--heat"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Map {
                status: StatusFilter::All,
                heat: true,
                ..
            })
        ));

        assert!(Cli::try_parse_from(["basurant", "map", "--status", "pending", "--heat"]).is_err());
        assert!(Cli::try_parse_from(["basurant", "map", "--status", "cleaned"]).is_err());
    }
}
