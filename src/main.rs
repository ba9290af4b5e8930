use std::error::Error as _;
use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ebi_jobs::cli::{self, GeneralArgs, Invocation};
use ebi_jobs::config::ClientConfig;
use ebi_jobs::job::PollOptions;
use ebi_jobs::lifecycle::AsyncJobClient;
use ebi_jobs::runner::{Action, Runner};
use ebi_jobs::schema::SchemaRegistry;
use ebi_jobs::service::{RestTransport, http_client, user_agent};
use ebi_jobs::{JobError, ui};

fn main() -> ExitCode {
    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let registry = match load_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let matches = match cli::build_command(&registry).try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };
    let invocation = match cli::invocation(&registry, &matches) {
        Ok(invocation) => invocation,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    let (tool, args, raw) = match invocation {
        Invocation::ListTools => {
            let tools = registry
                .iter()
                .map(|s| (s.name.as_str(), s.description.as_str()));
            return match ui::print_tools(&mut io::stdout().lock(), tools) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::from(3)
                }
            };
        }
        Invocation::Tool { tool, args, raw } => (tool, args, raw),
    };

    init_tracing(&args);

    let Some(action) = Action::resolve(&args) else {
        eprintln!(
            "Error: unrecognised argument combination; see `ebi-jobs {tool} --help`"
        );
        return ExitCode::from(2);
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(3);
        }
    };

    match runtime.block_on(run(&registry, &config, &tool, &args, &raw, action)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, args.debug_level);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(
    registry: &SchemaRegistry,
    config: &ClientConfig,
    tool: &str,
    args: &GeneralArgs,
    raw: &[(String, String)],
    action: Action,
) -> ebi_jobs::Result<()> {
    let schema = registry
        .get(tool)
        .cloned()
        .ok_or_else(|| JobError::Schema(format!("unknown tool {tool}")))?;

    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| schema.endpoint(&config.base_url));
    let http = http_client(
        &user_agent(&schema.name),
        config.connect_timeout(),
        config.request_timeout(),
    )?;
    debug!(%endpoint, "using service endpoint");
    let transport = RestTransport::new(http, endpoint);

    let cancel = CancellationToken::new();

    let deadline = args
        .timeout
        .map(std::time::Duration::from_secs)
        .or(config.poll_timeout());
    let poll = PollOptions::new(config.poll_schedule())
        .with_deadline(deadline)
        .with_cancellation(cancel.clone());

    let runner = Runner::new(
        AsyncJobClient::new(transport, schema),
        poll,
        args.output_level(),
    );
    let mut stdout = io::stdout().lock();
    tokio::select! {
        result = runner.execute(action, args, raw, config.email.as_deref(), &mut stdout) => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            cancel.cancel();
            warn!("interrupted, stopping");
            Err(JobError::Interrupted)
        }
    }
}

fn load_registry(config: &ClientConfig) -> anyhow::Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::builtin()?;
    if let Some(dir) = &config.schema_dir {
        registry
            .load_dir(dir)
            .with_context(|| format!("loading schemas from {}", dir.display()))?;
    }
    Ok(registry)
}

/// Log filter: `RUST_LOG` when set, otherwise derived from the output and
/// debug levels.
fn init_tracing(args: &GeneralArgs) {
    let level = match (args.debug_level, args.output_level()) {
        (11.., _) => "trace",
        (1.., _) => "debug",
        (0, 0) => "warn",
        (0, 1) => "info",
        (0, _) => "debug",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ebi_jobs={level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(args.debug_level > 0),
        )
        .init();
}

fn report(error: &JobError, debug_level: u8) {
    eprintln!("Error: {error}");
    if debug_level > 0 {
        let mut source = error.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
    }
}
