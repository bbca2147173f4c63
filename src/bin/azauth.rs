use azure_authorizer::telemetry::{OutputFormat, SubscriberConfig, init_subscriber};
use azure_authorizer::{Authorizer, AuthorizerSelector, EnvVarNames};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Show which Azure auth method the environment selects, and optionally use it.
#[derive(Debug, Parser)]
#[command(name = "azauth", version, about)]
struct Cli {
    /// Which spelling of the credential variables to read
    #[arg(long, value_enum, default_value_t = Prefix::Arm, env = "AZAUTH_PREFIX")]
    prefix: Prefix,

    /// Build the authorizer and print an access token to stdout
    #[arg(long)]
    token: bool,

    #[arg(long, default_value = "warn", env = "AZAUTH_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Prefix {
    /// ARM_CLIENT_ID, ARM_AUTH_LOCATION, ...
    Arm,
    /// AZURE_CLIENT_ID, AZURE_AUTH_LOCATION, ...
    Azure,
}

impl Prefix {
    fn names(self) -> EnvVarNames {
        match self {
            Prefix::Arm => EnvVarNames::arm(),
            Prefix::Azure => EnvVarNames::azure(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match SubscriberConfig::builder().log_level_str(&cli.log_level) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("fatal: {e}");
            return ExitCode::from(2);
        }
    };
    if cli.json_logs {
        config = config.output_format(OutputFormat::Json);
    }
    if let Some(path) = cli.log_file.clone() {
        config = config.log_file(path);
    }
    let _guard = match init_subscriber(config.build()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("fatal: {e}");
            return ExitCode::from(2);
        }
    };

    let selector = AuthorizerSelector::builder()
        .names(cli.prefix.names())
        .build();
    let method = selector.method();

    if !cli.token {
        println!("{method}");
        return ExitCode::SUCCESS;
    }

    match selector.select().and_then(|auth| auth.token()) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(method = %method, error = %e, "failed to acquire token");
            eprintln!("error ({method}): {e}");
            ExitCode::FAILURE
        }
    }
}
