//! Command-line interface built with clap.
//!
//! The general options are a derived [`GeneralArgs`]; each tool becomes a
//! subcommand whose extra `--<flag>` options come from its schema at
//! runtime.

use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches};

use crate::schema::{ParamKind, ParamSpec, SchemaRegistry, ToolSchema};

/// Options shared by every tool subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GeneralArgs {
    /// E-mail address, required to submit a job.
    #[arg(long)]
    pub email: Option<String>,

    /// Title for the job.
    #[arg(long)]
    pub title: Option<String>,

    /// Submit and print the job identifier without waiting for results.
    #[arg(long = "async")]
    pub async_mode: bool,

    /// Job identifier.
    #[arg(long)]
    pub jobid: Option<String>,

    /// Get the status of a job.
    #[arg(long)]
    pub status: bool,

    /// List the result formats of a finished job.
    #[arg(long = "resultTypes")]
    pub result_types: bool,

    /// Wait for a job and fetch its results.
    #[arg(long)]
    pub polljob: bool,

    /// Comma-separated result type identifiers to fetch (see --resultTypes).
    #[arg(long)]
    pub outformat: Option<String>,

    /// Base name for result files; "-" writes to standard output.
    #[arg(long)]
    pub outfile: Option<String>,

    /// List the tool's parameters.
    #[arg(long)]
    pub params: bool,

    /// Describe one tool parameter.
    #[arg(long = "paramDetail", value_name = "NAME")]
    pub param_detail: Option<String>,

    /// Decrease output.
    #[arg(long)]
    pub quiet: bool,

    /// Increase output.
    #[arg(long)]
    pub verbose: bool,

    /// Debug output level.
    #[arg(long = "debugLevel", default_value_t = 0)]
    pub debug_level: u8,

    /// Alternative service endpoint for this tool.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Treat the input as FASTA and submit one job per sequence.
    #[arg(long)]
    pub multifasta: bool,

    /// Give up waiting for a job after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Input data: a file, "-" for standard input, "@file" for a list of
    /// entry identifiers, or the raw sequence / identifier.
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,
}

impl GeneralArgs {
    /// 1 by default, raised by --verbose and lowered by --quiet.
    pub fn output_level(&self) -> u8 {
        let mut level: u8 = 1;
        if self.verbose {
            level += 1;
        }
        if self.quiet {
            level -= 1;
        }
        level
    }
}

/// What the user asked for, after parsing.
#[derive(Debug, Clone)]
pub enum Invocation {
    ListTools,
    Tool {
        tool: String,
        args: GeneralArgs,
        /// Raw tool parameter values keyed by parameter name.
        raw: Vec<(String, String)>,
    },
}

const INPUT_ARG: &str = "tool-input";

fn param_id(spec: &ParamSpec) -> String {
    format!("param:{}", spec.name)
}

fn param_arg(spec: &ParamSpec) -> Arg {
    let mut help = spec.help.clone();
    if spec.required {
        help.push_str(" [required]");
    }
    if let Some(default) = &spec.default {
        help.push_str(&format!(" [default: {default}]"));
    }

    let arg = Arg::new(param_id(spec))
        .long(spec.flag().to_string())
        .help(help);
    match spec.kind {
        ParamKind::Boolean => arg
            .value_name("BOOL")
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        ParamKind::List => arg.value_name("LIST").action(ArgAction::Append),
        ParamKind::Integer => arg.value_name("N"),
        ParamKind::String => arg.value_name("VALUE"),
    }
}

fn tool_command(schema: &ToolSchema) -> Command {
    let mut cmd = GeneralArgs::augment_args(
        Command::new(schema.name.clone()).about(schema.description.clone()),
    )
    .arg(
        Arg::new(INPUT_ARG)
            .long(schema.input.clone())
            .value_name("DATA")
            .help("Input data, as an alternative to the INPUT argument")
            .conflicts_with("input"),
    );
    for spec in &schema.params {
        cmd = cmd.arg(param_arg(spec));
    }
    cmd
}

/// Builds the full command tree for the tools in `registry`.
pub fn build_command(registry: &SchemaRegistry) -> Command {
    let mut cmd = Command::new("ebi-jobs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit jobs to EMBL-EBI tool services and fetch their results")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("tools").about("List the available tools"));
    for schema in registry.iter() {
        cmd = cmd.subcommand(tool_command(schema));
    }
    cmd
}

/// Extracts an [`Invocation`] from parsed matches.
pub fn invocation(
    registry: &SchemaRegistry,
    matches: &ArgMatches,
) -> Result<Invocation, clap::Error> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(clap::Error::new(clap::error::ErrorKind::MissingSubcommand));
    };
    if name == "tools" {
        return Ok(Invocation::ListTools);
    }
    let Some(schema) = registry.get(name) else {
        return Err(clap::Error::new(clap::error::ErrorKind::InvalidSubcommand));
    };

    let mut args = GeneralArgs::from_arg_matches(sub)?;
    if let Some(data) = sub.get_one::<String>(INPUT_ARG) {
        args.input = Some(data.clone());
    }

    let mut raw = Vec::new();
    for spec in &schema.params {
        let values: Vec<&String> = sub
            .get_many::<String>(&param_id(spec))
            .map(|v| v.collect())
            .unwrap_or_default();
        if !values.is_empty() {
            let joined: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
            raw.push((spec.name.clone(), joined.join(",")));
        }
    }

    Ok(Invocation::Tool {
        tool: name.to_string(),
        args,
        raw,
    })
}
