use clap::Parser;
use std::path::PathBuf;

mod io;
pub use io::*;

mod config;
pub use config::{AppConfig, SolverConfig, SolverLib};

mod commands;
pub use commands::*;

// The top-level arguments: run settings shared by every subcommand, and which subcommand to execute
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    /// TOML file with run settings (solver, tolerances, scan, weights)
    #[arg(short, long, global = true, env = "PEM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        let mut config = AppConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Solve { io, lib } => {
                if let Some(lib) = lib {
                    config.solver.method = lib;
                }
                let (params, source) = io.params();
                let report = solve::SolveReport::build(params, source, &config)?;
                io.emit(&report)?;
            }
            Commands::Scan { io, lib, step } => {
                if let Some(lib) = lib {
                    config.solver.method = lib;
                }
                if let Some(step) = step {
                    config.scan.step = step;
                }
                let (params, source) = io.params();
                let report = scan::ScanReport::build(params, source, &config)?;
                io.emit(&report)?;
            }
            Commands::Markets { io, points } => {
                if points < 2 {
                    return Err(CliError::TooFewPoints(points))?;
                }
                let (params, source) = io.params();
                let report = markets::MarketsReport::build(params, source, &config, points)?;
                io.emit(&report)?;
            }
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Config file {} does not exist", .0.display())]
    MissingConfig(PathBuf),
    #[error("A market schedule needs at least 2 points, got {0}")]
    TooFewPoints(usize),
}
