use clap::Parser;
use taskboard::cli::commands::Cli;
use taskboard::cli::handlers;
use taskboard::io::logging;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        None => {
            // No subcommand → launch TUI
            if let Err(e) = taskboard::tui::run(cli.config.as_deref(), cli.api_url.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            logging::init_stderr();
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
