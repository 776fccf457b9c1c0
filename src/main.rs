use sup::commands::{create_cli_commands, execute_command, PARAMETER_VERBOSE};
use sup::exit_codes::SupExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main entry point for the program
#[tokio::main]
async fn main() {
    let matches = create_cli_commands();
    init_logging(matches.get_flag(PARAMETER_VERBOSE));

    match execute_command(&matches).await {
        Ok(()) => std::process::exit(SupExitCode::Success.code()),
        Err(e) => {
            let code = e.exit_code();
            debug!("Exiting with {} ({})", code.code(), code.message());
            eprintln!("Error: {}", e);
            std::process::exit(code.code());
        }
    }
}
