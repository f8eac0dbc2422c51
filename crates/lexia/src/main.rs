use std::process::ExitCode;

use clap::Parser;
use console::style;
use lexia::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    lexia::logging::init(cli.verbose);

    match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}
