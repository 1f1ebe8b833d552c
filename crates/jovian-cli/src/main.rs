//! Jovian command-line driver
//!
//! Compiles Jovian source to IR text, runs it in the reference VM, or dumps
//! class layouts.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::Input;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jovian")]
#[command(about = "Jovian compiler toolchain", long_about = None)]
#[command(version)]
struct Cli {
    /// Log compiler internals (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile to IR, print it and write it to a file
    Build {
        #[command(flatten)]
        input: Input,
        /// Output file
        #[arg(short, long, default_value = "./out.ll")]
        output: PathBuf,
        /// Do not print the module
        #[arg(short, long)]
        quiet: bool,
    },

    /// Compile and execute in the VM; exits with main's result
    Run {
        #[command(flatten)]
        input: Input,
    },

    /// Print class field and method slots as JSON
    Layout {
        #[command(flatten)]
        input: Input,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Build {
            input,
            output,
            quiet,
        } => commands::build::execute(input, output, quiet, color),
        Commands::Run { input } => {
            let code = commands::run::execute(input, color)?;
            std::process::exit(code);
        }
        Commands::Layout { input } => commands::layout::execute(input, color),
    }
}
