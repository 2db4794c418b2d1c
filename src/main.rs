use clap::Parser;
use issue_desk::cli::commands;
use issue_desk::cli::{Cli, Commands};
use issue_desk::config;
use issue_desk::logging::init_logging;
use issue_desk::{DeskError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, None) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let result = match &cli.command {
        Commands::Init { force } => commands::init::execute(*force, None, cli.json),
        Commands::Create(args) => commands::create::execute(args, cli.json, &overrides),
        Commands::List(args) => commands::list::execute(args, cli.json, &overrides),
        Commands::Update(args) => commands::update::execute(args, cli.json, &overrides),
        Commands::Delete(args) => commands::delete::execute(args, cli.json, &overrides),
        Commands::Serve(args) => commands::serve::execute(args, &overrides),
        Commands::Projects => commands::projects::execute(cli.json, &overrides),
        Commands::Version => commands::version::execute(cli.json),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// Business errors in `--json` mode print the same `{"error": ...}` body the
/// HTTP API returns, on stdout. Other errors print structured JSON to stderr
/// when --json is set or stdout is not a TTY, and a human line otherwise.
fn handle_error(err: &DeskError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    if json_mode && err.is_business() {
        println!("{}", serde_json::json!({ "error": err.to_string() }));
        std::process::exit(exit_code);
    }

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        db: cli.db.clone(),
        lock_timeout: cli.lock_timeout,
        ..config::CliOverrides::default()
    }
}
