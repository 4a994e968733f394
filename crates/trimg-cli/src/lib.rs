//! trimg command line
//!
//! - `trimg replace <filepath>`: print the manifest with every container
//!   image rewritten to the ECR registry
//! - `trimg transfer [<image>...] [-f <manifest>]`: pull each image, create
//!   its ECR repository and push it there
//!
//! The region is read from `AWS_DEFAULT_REGION`. Without `--account-id`,
//! the account is looked up with `aws sts get-caller-identity`.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod config;
pub mod progress;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;
use trimg_transfer::{AwsCliIdentity, DockerCliRegistry, DEFAULT_MAX_CONCURRENCY};

pub use config::{AppConfig, CliError, ImageSource, TransferConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("trimg")
        .version(VERSION)
        .about("Move Kubernetes workload images into a private ECR registry")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        )
        .subcommand(
            Command::new("replace")
                .about("Replace manifest image paths with ECR paths")
                .arg(
                    Arg::new("filepath")
                        .num_args(0..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Kubernetes manifest file"),
                )
                .arg(account_id_arg()),
        )
        .subcommand(
            Command::new("transfer")
                .about("Pull images, create ECR repositories and push the images into them")
                .arg(
                    Arg::new("images")
                        .num_args(0..)
                        .help("Image references, e.g. nginx:latest redis golang:1.13.5"),
                )
                .arg(
                    Arg::new("filename")
                        .short('f')
                        .long("filename")
                        .value_parser(value_parser!(PathBuf))
                        .help("Take images from this Kubernetes manifest"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Only print the images that would be transferred"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Transfers to run at once"),
                )
                .arg(account_id_arg()),
        )
}

/// Parse `argv`, or report why not and the exit code to leave with
///
/// Help and version output exit successfully; every other usage error,
/// including a missing subcommand, is a failure.
///
/// # Errors
/// The exit code when the process should stop without running a command.
pub fn parse_args<I, T>(argv: I) -> Result<ArgMatches, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli().try_get_matches_from(argv).map_err(|err| {
        // Usage goes to stderr, help and version to stdout.
        let _ = err.print();
        if usage_succeeded(err.kind()) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    })
}

fn usage_succeeded(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn account_id_arg() -> Arg {
    Arg::new("account-id")
        .long("account-id")
        .help("Destination account id, default: the caller's account")
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` takes precedence; otherwise `warn`, or `debug` when `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the parsed command, writing results to `out`
///
/// # Errors
/// Any fatal precondition, parse or I/O failure.
pub async fn run(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("replace", args)) => {
            let paths: Vec<&PathBuf> = args
                .get_many::<PathBuf>("filepath")
                .map(Iterator::collect)
                .unwrap_or_default();
            let [path] = paths.as_slice() else {
                return Err(CliError::ArgumentCount.into());
            };

            let config = app_config(args)?;
            let host = config.registry_host(&AwsCliIdentity::default()).await?;
            let output = commands::replace::execute(path, &host)?;
            write!(out, "{output}")?;
            Ok(())
        }
        Some(("transfer", args)) => {
            let jobs = args
                .get_one::<usize>("jobs")
                .copied()
                .unwrap_or(DEFAULT_MAX_CONCURRENCY);
            let config = app_config(args)?.with_max_concurrency(jobs);
            let host = config.registry_host(&AwsCliIdentity::default()).await?;

            let images: Vec<String> = args
                .get_many::<String>("images")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let source = ImageSource::resolve(images, args.get_one::<PathBuf>("filename").cloned())?;
            let transfer = TransferConfig::new(source)
                .with_dry_run(args.get_flag("dry-run"))
                .with_max_concurrency(config.max_concurrency);

            let registry = Arc::new(DockerCliRegistry::new(config.region.clone(), host.clone()));
            commands::transfer::execute(&transfer, &host, registry, out).await
        }
        _ => Ok(()),
    }
}

fn app_config(args: &ArgMatches) -> Result<AppConfig, CliError> {
    Ok(AppConfig::from_env()?.with_account_id(args.get_one::<String>("account-id").cloned()))
}
