use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use minish::config::ConfigLoader;
use minish::error::ShellError;
use minish::logging;
use minish::repl::Repl;

#[derive(Debug, Parser)]
#[command(name = "minish", version, about = "A small command interpreter built on fork and exec")]
struct Cli {
    /// Run a single command line and exit with its status
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,

    /// Read settings from this file instead of $MINISH_CONFIG or ~/.minishrc
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the parsed tree of each line instead of running it
    #[arg(long)]
    dump_ast: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let err = ShellError::from(e);
            eprintln!("minish: {}", err);
            process::exit(err.status());
        }
    };
    logging::init_logger(&config);
    log::debug!("loaded {:?}", config);

    let mut repl = Repl::new(config).dump_ast(cli.dump_ast);
    let status = match cli.command {
        Some(line) => repl.run_line(&line).code(),
        None => repl.run(),
    };

    let _ = io::stdout().flush();
    process::exit(status);
}
