// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossforge::{Artifact, Config, HttpClient, state, toolchain};
use tracing::info;

#[derive(Parser)]
#[command(name = "crossforge")]
#[command(author, version, about = "Toolchain installer and build driver for MIPS-class device firmware", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and install the SDK and the stdlib bundle for the active rustc
    Install,
    /// Cross-compile a binary for the device target
    Build {
        /// Name of the binary target to build
        name: String,
    },
    /// Pack a built binary into an uncompressed tar next to it
    Bundle {
        /// Name of the built binary
        name: String,
    },
    /// Report install state of the SDK and stdlib bundle
    Status,
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    match cli.command {
        Commands::Install => {
            let client = HttpClient::new()?;
            let rustc_version = toolchain::active_rustc_version()?;

            // The two artifacts target disjoint install roots and are
            // independent transactions.
            let sdk = Artifact::sdk(&config)?;
            crossforge::ensure_installed(&client, &sdk)?;

            let rustlib = Artifact::rustlib(&config, &rustc_version);
            crossforge::ensure_installed(&client, &rustlib)?;
            Ok(())
        }
        Commands::Build { name } => {
            let build_config = toolchain::resolve_build_config(&config)?;
            crossforge::builder::build(&build_config, &name)?;
            Ok(())
        }
        Commands::Bundle { name } => {
            let build_config = toolchain::resolve_build_config(&config)?;
            let out = crossforge::builder::bundle(&build_config, &name)?;
            println!("Bundle written to {}", out.display());
            Ok(())
        }
        Commands::Status => {
            let sdk = Artifact::sdk(&config)?;
            report_state("sdk", &state::check(&sdk, None));

            match toolchain::active_rustc_version() {
                Ok(version) => {
                    let rustlib = Artifact::rustlib(&config, &version);
                    report_state(&format!("rustlib {version}"), &state::check(&rustlib, None));
                }
                Err(e) => println!("rustlib: unknown ({e})"),
            }
            Ok(())
        }
    }
}

fn report_state(name: &str, state: &state::InstallState) {
    if state.exists {
        println!("{name}: installed at {}", state.path.display());
    } else {
        println!("{name}: not installed");
    }
}

/// Process exit code for a boundary error: build-tool failures mirror the
/// child's status, everything else is 1.
fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<crossforge::Error>()
        .map(crossforge::Error::exit_code)
        .unwrap_or(1)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // The one place errors become process exits
        info!("Exiting with error: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(exit_code_of(&e));
    }
}
