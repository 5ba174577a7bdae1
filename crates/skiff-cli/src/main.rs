#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use commands::bundle::BundleAction;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "skiff")]
#[command(author, version, about = "A plugin-driven web bundler", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Only log errors and suppress informational output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Bundle entry inputs into an output directory
    Bundle {
        /// Entry inputs (paths or URLs)
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory root
        #[arg(long, default_value = "dist", value_name = "DIR")]
        out_dir: PathBuf,

        /// Run optimizer plugins over emitted bundles
        #[arg(long)]
        optimize: bool,

        /// Force rebuild: bare for everything, or a comma-separated input list
        #[arg(long, num_args = 0..=1, default_missing_value = "", value_name = "INPUTS")]
        reload: Option<String>,

        /// Import map JSON file
        #[arg(long, value_name = "FILE")]
        import_map: Option<PathBuf>,

        /// Output override as input=path (repeatable)
        #[arg(long = "output", value_name = "INPUT=PATH")]
        outputs: Vec<String>,

        /// Banner text prepended to script/style bundles (with --optimize)
        #[arg(long, value_name = "TEXT")]
        banner: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json, cli.quiet);

    match cli.command {
        Commands::Version => {
            println!("skiff {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Bundle {
            inputs,
            out_dir,
            optimize,
            reload,
            import_map,
            outputs,
            banner,
        } => commands::bundle::run(
            BundleAction {
                inputs,
                out_dir,
                optimize,
                reload,
                import_map,
                outputs,
                banner,
                quiet: cli.quiet,
            },
            cli.json,
        ),
    }
}
