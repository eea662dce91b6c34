//! IAM Policy Attachments CLI - declaratively manage the managed policies attached to a role, user or group.

mod commands;
mod error;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use iam_policy_attachments_reconciler::AwsOptions;

const DEFAULT_STATE_FILE: &str = "iam-policy-attachments.state.json";

#[derive(Parser, Debug)]
#[command(name = "iam-policy-attachments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile the IAM managed policies attached to a role, user or group", long_about = None)]
struct Cli {
    /// Sets the level of verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// AWS region for IAM requests
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Named AWS profile to load credentials from
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// State file recording the observed attachments of each managed principal
    #[arg(
        long,
        value_name = "FILE",
        global = true,
        env = "IAM_POLICY_ATTACHMENTS_STATE",
        default_value = DEFAULT_STATE_FILE
    )]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the attach/detach changes apply would make, without calling AWS
    Plan {
        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// Attach and detach policies so the principal matches the configuration
    Apply {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Re-read the attached policies of a recorded principal and update the state file
    Refresh {
        /// Resource identity, `{type}/{name}`
        #[arg(long, value_name = "TYPE/NAME")]
        id: String,
    },

    /// Detach every recorded policy from a principal and forget it
    Destroy {
        /// Resource identity, `{type}/{name}`
        #[arg(long, value_name = "TYPE/NAME")]
        id: String,

        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Desired attachments, from a JSON file or from flags
#[derive(Args, Debug)]
struct ResourceArgs {
    /// JSON file with `name`, `type` and `policy_arns`
    #[arg(long, value_name = "FILE", conflicts_with_all = ["name", "kind", "policy_arns"])]
    config: Option<PathBuf>,

    /// Name of the role, user or group
    #[arg(long, required_unless_present = "config")]
    name: Option<String>,

    /// Principal type: role, user or group
    #[arg(long = "type", value_name = "TYPE", required_unless_present = "config")]
    kind: Option<String>,

    /// Managed policy ARN to attach; repeat for each policy
    #[arg(long = "policy-arn", value_name = "ARN")]
    policy_arns: Vec<String>,
}

/// Settings shared by every subcommand
pub(crate) struct Settings {
    pub state_path: PathBuf,
    pub aws: AwsOptions,
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings {
        state_path: cli.state,
        aws: AwsOptions {
            region: cli.region,
            profile: cli.profile,
        },
    };

    let result = match cli.command {
        Commands::Plan { resource } => commands::plan(&settings, &resource),
        Commands::Apply { resource, yes } => commands::apply(&settings, &resource, yes).await,
        Commands::Refresh { id } => commands::refresh(&settings, &id).await,
        Commands::Destroy { id, yes } => commands::destroy(&settings, &id, yes).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(error::exit_code(&e))
        }
    }
}
