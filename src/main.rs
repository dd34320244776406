use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use ucprov::config::Config;
use ucprov::databricks::auth;
use ucprov::databricks::client::WorkspaceClient;
use ucprov::databricks::http::format_api_error;
use ucprov::error::ProvisionError;
use ucprov::report::{ConsoleReporter, DetailLevel};
use ucprov::resource::manifest::Manifest;
use ucprov::resource::{
    build_credential_payload, ExistencePolicy, Outcome, Provisioner, ResourceSpec,
};

/// Create Unity Catalog objects if they do not already exist
#[derive(Parser, Debug)]
#[command(name = "ucprov", version = ucprov::VERSION, about, long_about = None)]
struct Args {
    /// Workspace host (overrides DATABRICKS_HOST and the profile)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Profile in ~/.databrickscfg
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Treat any lookup failure as "does not exist" and attempt creation
    #[arg(long, global = true)]
    lenient_lookup: bool,

    /// Console output detail
    #[arg(long, value_enum, default_value = "detailed", global = true)]
    output: DetailLevel,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a catalog
    Catalog {
        name: String,
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Create a metastore
    Metastore {
        name: String,
        /// Cloud region, e.g. 'uksouth' or 'us-east-1'
        #[arg(short, long)]
        region: String,
        /// Default storage root for managed tables
        #[arg(long)]
        storage_root: Option<String>,
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Register a storage credential
    StorageCredential(StorageCredentialArgs),

    /// Register an external location
    ExternalLocation {
        name: String,
        /// Storage URL, e.g. abfss://container@account.dfs.core.windows.net/path or s3://bucket/path
        #[arg(long)]
        url: String,
        /// Name of the storage credential granting access to the URL
        #[arg(long)]
        credential_name: String,
        #[arg(long)]
        read_only: bool,
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Provision every object listed in a YAML manifest, in order
    Apply {
        manifest: PathBuf,
        /// Continue with later entries after a failure
        #[arg(long)]
        keep_going: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct StorageCredentialArgs {
    name: String,

    /// Credential type: azure_managed_identity, azure_service_principal or aws_iam_role
    #[arg(long = "type")]
    credential_type: String,

    #[arg(long)]
    managed_identity_id: Option<String>,

    /// Azure AD tenant of the service principal
    #[arg(long)]
    directory_id: Option<String>,

    #[arg(long)]
    application_id: Option<String>,

    #[arg(long, env = "UCPROV_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[arg(long)]
    role_arn: Option<String>,

    #[arg(long)]
    read_only: bool,

    #[arg(short, long)]
    comment: Option<String>,
}

impl StorageCredentialArgs {
    /// Collect the detail flags that were given, keyed by payload field name
    fn details(&self) -> HashMap<String, String> {
        [
            ("managed_identity_id", &self.managed_identity_id),
            ("directory_id", &self.directory_id),
            ("application_id", &self.application_id),
            ("client_secret", &self.client_secret),
            ("role_arn", &self.role_arn),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ucprov {} started with log level: {:?}", ucprov::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ucprov").join("ucprov.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ucprov").join("ucprov.log");
    }
    PathBuf::from("ucprov.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("\nError: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

/// Build the spec for a single-object command
fn spec_for(command: Command) -> Result<ResourceSpec> {
    let spec = match command {
        Command::Catalog { name, comment } => ResourceSpec::catalog(name, comment)?,
        Command::Metastore {
            name,
            region,
            storage_root,
            comment,
        } => ResourceSpec::metastore(name, region, storage_root, comment)?,
        Command::StorageCredential(args) => {
            let credential = build_credential_payload(&args.credential_type, &args.details())?;
            ResourceSpec::storage_credential(args.name, credential, args.read_only, args.comment)?
        }
        Command::ExternalLocation {
            name,
            url,
            credential_name,
            read_only,
            comment,
        } => ResourceSpec::external_location(name, url, credential_name, read_only, comment)?,
        Command::Apply { .. } => {
            return Err(anyhow::anyhow!("apply takes a manifest, not a single object"))
        }
    };
    Ok(spec)
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    let reporter = ConsoleReporter::new(args.output);
    let policy = if args.lenient_lookup || config.lenient_lookup {
        ExistencePolicy::Lenient
    } else {
        ExistencePolicy::Strict
    };

    // Validate everything local before touching credentials or the network
    let work = match args.command {
        Command::Apply {
            manifest,
            keep_going,
        } => Work::Batch(Manifest::load(&manifest)?, keep_going),
        command => Work::Single(spec_for(command)?),
    };

    let credentials = auth::resolve_credentials(args.host.as_deref(), args.profile.as_deref(), &config)?;
    let client = WorkspaceClient::new(&credentials, config.http_options(args.timeout))
        .context("Failed to initialize workspace client")?;
    let provisioner = Provisioner::new(&client, &reporter).with_policy(policy);

    match work {
        Work::Single(spec) => {
            let provisioned = provisioner.ensure_exists(&spec).await?;
            let verb = match provisioned.outcome {
                Outcome::Created => spec.kind().past_tense(),
                Outcome::AlreadyExisted => "already present",
            };
            println!(
                "\n{} {}: {}",
                spec.kind().title(),
                verb,
                provisioned.descriptor.name()
            );
            Ok(())
        }
        Work::Batch(manifest, keep_going) => {
            tracing::info!("Applying manifest with {} entries", manifest.len());
            let summary = provisioner.provision_all(&manifest.specs, keep_going).await;
            reporter.summary(&summary);
            if summary.is_success() {
                Ok(())
            } else {
                Err(anyhow::anyhow!("{}", summary.headline()))
            }
        }
    }
}

enum Work {
    Single(ResourceSpec),
    Batch(Manifest, bool),
}

/// Short message for the terminal; API failures get a friendly hint
fn describe_error(err: &anyhow::Error) -> String {
    let provision_error = err.chain().find_map(|e| e.downcast_ref::<ProvisionError>());

    match provision_error.and_then(|e| e.api_error()) {
        Some(api_error) => format!("{}\n{}", err, format_api_error(api_error)),
        None => format!("{:#}", err),
    }
}
