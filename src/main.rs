use anyhow::Context;
use clap::{Parser, Subcommand};
use ncsend::{
    default_config_path, init_logging, read_program, validate, validation_message,
    CancellationToken, ProgramSender, TransferConfig, TransferOutcome, TransferSession,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ncsend")]
#[command(version = ncsend::VERSION)]
#[command(long_version = ncsend::LONG_VERSION)]
#[command(about = "Send NC programs to a CNC controller over TCP", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Config file (.toml or .json); defaults to the platform config directory
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a program file (e.g. O1234.NC) to the controller
    Send {
        /// Program file to send
        file: PathBuf,

        /// Controller hostname or IP address
        #[arg(short, long)]
        address: Option<String>,

        /// Controller TCP port
        #[arg(short, long)]
        port: Option<u16>,

        /// Controller variant (A00 uses LF line endings, others CRLF)
        #[arg(long, value_name = "VARIANT")]
        controller: Option<String>,

        /// Connect and reply timeout
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Show the effective configuration
    Config {
        /// Only print the config file path
        #[arg(long)]
        path: bool,
    },
}

/// Load the config file if one was given or exists at the default path.
///
/// An explicitly requested file must exist; a missing default file just
/// means defaults. Validation happens after flags are merged in, so a file
/// without an address is fine when `--address` is given.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<TransferConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(TransferConfig::default()),
        },
    };

    TransferConfig::read_from_file(&path)
        .with_context(|| format!("Failed to load config file {}", path.display()))
}

async fn send(sender: ProgramSender, file: &Path) -> anyhow::Result<ExitCode> {
    // Reject bad names before touching the file
    if let Err(err) = validate(file) {
        eprintln!("{}", validation_message(&err));
        return Ok(ExitCode::FAILURE);
    }
    let text = read_program(file)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupt received, cancelling transfer");
            trigger.cancel();
        }
    });

    let request = sender
        .prepare(file, &text, cancel)
        .context("Unable to send file")?;

    println!(
        "Sending file {} to {}...",
        request.frame().program_name(),
        request.target()
    );
    let mut session = TransferSession::new(request);
    let outcome = session.run().await;

    match outcome {
        TransferOutcome::Success => {
            println!("Sent.");
            Ok(ExitCode::SUCCESS)
        }
        other => {
            if let Some(message) = other.user_message() {
                eprintln!("{}", message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Send {
            file,
            address,
            port,
            controller,
            timeout_ms,
        } => {
            if let Some(address) = address {
                config.address = address;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(controller) = controller {
                config.controller = Some(controller);
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }

            let sender = ProgramSender::new(config).context("Invalid transfer settings")?;
            send(sender, &file).await
        }
        Commands::Config { path } => {
            if path {
                let path = match cli.config {
                    Some(path) => path,
                    None => default_config_path()?,
                };
                println!("{}", path.display());
            } else {
                println!("{}", config.to_toml_string()?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
