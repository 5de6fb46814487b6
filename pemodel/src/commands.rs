use super::{IOArgs, SolverLib};
use clap::Subcommand;

pub mod markets;
pub mod scan;
pub mod solve;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve the no-trade, free-trade and tariff equilibria and report the welfare effects
    Solve {
        #[command(flatten)]
        io: IOArgs,

        /// Request a specific root-finder (overrides the config)
        #[arg(short, long)]
        lib: Option<SolverLib>,
    },

    /// Sweep the tariff from zero to prohibitive and report the optimal tariff
    Scan {
        #[command(flatten)]
        io: IOArgs,

        /// Request a specific root-finder (overrides the config)
        #[arg(short, long)]
        lib: Option<SolverLib>,

        /// The tariff increment between steps (overrides the config)
        #[arg(short, long)]
        step: Option<f64>,
    },

    /// Tabulate supply and demand over a price range, for plotting
    Markets {
        #[command(flatten)]
        io: IOArgs,

        /// The number of prices in the table
        #[arg(short, long, default_value_t = 20)]
        points: usize,
    },
}
