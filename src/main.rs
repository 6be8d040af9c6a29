use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use gaitforge::config::Config;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; explicit flags override its values.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run(cmd::run::RunArgs),
    Replay(cmd::replay::ReplayArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    info!("🚀 Initializing GaitForge...");

    let (cli_config, sub_name) = match &cli.command {
        Commands::Run(args) => (&args.config, "run"),
        Commands::Replay(args) => (&args.config, "replay"),
    };

    let Some(sub_matches) = matches.subcommand_matches(sub_name) else {
        error!("❌ missing {} arguments", sub_name);
        process::exit(1);
    };

    let config = match &cli.config {
        Some(path) => {
            info!("📂 Loading config: {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            file_config.merge_from_cli(cli_config, sub_matches);
            file_config
        }
        None => cli_config.clone(),
    };

    let result = match cli.command {
        Commands::Run(args) => cmd::run::run(args, config, cli.debug),
        Commands::Replay(args) => cmd::replay::run(args, config, sub_matches),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
