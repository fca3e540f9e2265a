pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "concierge",
    about = "WhatsApp concierge operator CLI",
    long_about = "Inspect configuration, check readiness, and run the reply generator locally.",
    after_help = "Examples:\n  concierge doctor --json\n  concierge config\n  concierge simulate \"Do you offer onboarding?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print effective runtime and agent configuration with secrets redacted")]
    Config,
    #[command(about = "Check config, agent profile, model credential, and webhook secret")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Generate one reply for a message and print it as JSON")]
    Simulate {
        #[arg(help = "Inbound message text")]
        message: String,
        #[arg(long, help = "Sender id", default_value = commands::simulate::DEFAULT_SENDER)]
        from: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Simulate { message, from } => commands::simulate::run(&message, &from),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
