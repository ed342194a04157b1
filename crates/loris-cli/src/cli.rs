//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Compute the labeled transition system of a pi-calculus process term.\n\n\
    A source file holds process-constant definitions followed by the root\n\
    process, e.g.:\n\n  \
    Relay(c,d) = c(x).d'<x>.0\n  \
    Relay(a,b) | a'<m>.0\n\n\
    `loris explore` walks every reachable configuration breadth-first and\n\
    prints the resulting graph as text, GraphViz dot, dot2tex/TikZ, or JSON.";

#[derive(Parser)]
#[command(name = "loris")]
#[command(about = "Labeled transition systems for pi-calculus process terms")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Explore the configuration space and print the LTS
    #[command(display_order = 10)]
    Explore {
        /// Path to the process source file
        file: PathBuf,

        /// Budget on the number of states expanded
        #[arg(long, default_value_t = 1000)]
        max_states: usize,

        /// Register capacity; branches that fill it are pruned and flagged
        #[arg(long, default_value_t = loris_engine::DEFAULT_REGISTER_SIZE)]
        register_size: usize,

        /// Output format: pretty | dot | tex | json
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Label graph vertices sN instead of full configurations
        #[arg(long, default_value_t = false)]
        state_numbers: bool,

        /// Emit the A4 page layout block in graph output
        #[arg(long, default_value_t = false)]
        a4: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a source file, run the static checks, and print the root term
    #[command(display_order = 11)]
    Check {
        /// Path to the process source file
        file: PathBuf,
    },
}
