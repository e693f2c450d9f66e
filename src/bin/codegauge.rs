use clap::Parser;
use colored::Colorize;
use codegauge_core::cli::{self, Cli};
use codegauge_core::exit::GaugeExit;
use codegauge_core::logging;

fn main() -> GaugeExit {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd)
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(GaugeExit::Success)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            GaugeExit::Error
        }
    }
}
