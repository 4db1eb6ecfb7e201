use clap::Parser;
use flatmove::cli::{Cli, run_cli};
use flatmove::logging::init_logger;
use flatmove::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run_cli(&cli) {
        OutputFormatter::error(&e);
        std::process::exit(1);
    }
}
