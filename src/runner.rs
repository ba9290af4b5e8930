//! Turns one parsed command line into calls on an [`AsyncJobClient`].
//!
//! The action is chosen from the general flags in a fixed order: parameter
//! listing, parameter details, submission (when input is given), then the
//! job-id actions `--status`, `--resultTypes` and `--polljob`.

use std::io::Write;

use tracing::{debug, info};

use crate::cli::GeneralArgs;
use crate::error::{JobError, Result};
use crate::input::{fasta_records, identifiers, load_data};
use crate::job::{JobHandle, JobStatus, PollOptions};
use crate::lifecycle::{AsyncJobClient, OutputTarget};
use crate::params::SubmissionParameters;
use crate::service::JobService;
use crate::ui::{self, PollProgress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListParams,
    ParamDetail(String),
    Submit(String),
    Status(JobHandle),
    ResultTypes(JobHandle),
    PollJob(JobHandle),
}

impl Action {
    /// Picks the action requested by `args`, or `None` when the flags do not
    /// name one.
    pub fn resolve(args: &GeneralArgs) -> Option<Self> {
        if args.params {
            return Some(Action::ListParams);
        }
        if let Some(name) = &args.param_detail {
            return Some(Action::ParamDetail(name.clone()));
        }
        if let Some(input) = &args.input {
            return Some(Action::Submit(input.clone()));
        }

        let handle = args.jobid.as_deref().and_then(JobHandle::new)?;
        if args.status {
            Some(Action::Status(handle))
        } else if args.result_types {
            Some(Action::ResultTypes(handle))
        } else if args.polljob {
            Some(Action::PollJob(handle))
        } else {
            None
        }
    }
}

/// Executes actions for one tool.
pub struct Runner<S> {
    client: AsyncJobClient<S>,
    poll: PollOptions,
    output_level: u8,
}

impl<S: JobService> Runner<S> {
    pub fn new(client: AsyncJobClient<S>, poll: PollOptions, output_level: u8) -> Self {
        Self {
            client,
            poll,
            output_level,
        }
    }

    /// Runs `action`. Listings, job ids and results written to standard
    /// output go to `out`.
    ///
    /// `email` is the address to submit with when `--email` is absent.
    pub async fn execute(
        &self,
        action: Action,
        args: &GeneralArgs,
        raw: &[(String, String)],
        email: Option<&str>,
        out: &mut impl Write,
    ) -> Result<()> {
        debug!(?action, tool = %self.client.schema().name, "executing");
        match action {
            Action::ListParams => {
                let names = self.client.parameters().await?;
                ui::print_parameters(out, &names)?;
            }
            Action::ParamDetail(name) => {
                let details = self.client.parameter_details(&name).await?;
                ui::print_parameter_details(out, &details)?;
            }
            Action::Status(handle) => {
                let status = self.client.status(&handle).await?;
                writeln!(out, "{status}")?;
            }
            Action::ResultTypes(handle) => {
                self.wait(&handle).await?;
                let types = self.client.list_result_types(&handle).await?;
                ui::print_result_types(out, &types)?;
            }
            Action::PollJob(handle) => {
                self.wait(&handle).await?;
                let target = OutputTarget::new(args.outfile.as_deref(), &handle);
                self.fetch(&handle, &target, args.outformat.as_deref(), out)
                    .await?;
            }
            Action::Submit(input) => {
                let email = args.email.as_deref().or(email).unwrap_or_default();
                self.submit_all(&input, email, args, raw, out).await?;
            }
        }
        Ok(())
    }

    async fn submit_all(
        &self,
        input: &str,
        email: &str,
        args: &GeneralArgs,
        raw: &[(String, String)],
        out: &mut impl Write,
    ) -> Result<()> {
        let inputs = split_inputs(input, args.multifasta)?;
        let batch = inputs.len() > 1;
        let schema = self.client.schema();
        let base = SubmissionParameters::from_raw(
            schema,
            email,
            args.title.as_deref(),
            &inputs[0],
            raw,
        )?;

        for (index, data) in inputs.iter().enumerate() {
            if self.interrupted() {
                info!(tool = %schema.name, submitted = index, "stopping before next submission");
                return Err(JobError::Interrupted);
            }
            let params = base.with_input(&schema.input, data);
            let handle = self.client.submit(&params).await?;

            if args.async_mode {
                writeln!(out, "{handle}")?;
                if self.output_level > 0 {
                    eprintln!(
                        "To check status: ebi-jobs {} --status --jobid {handle}",
                        schema.name
                    );
                }
                continue;
            }

            self.wait(&handle).await?;
            let target = match OutputTarget::new(args.outfile.as_deref(), &handle) {
                OutputTarget::Files { base } if batch && args.outfile.is_some() => {
                    OutputTarget::Files {
                        base: format!("{base}.{}", index + 1),
                    }
                }
                target => target,
            };
            self.fetch(&handle, &target, args.outformat.as_deref(), out)
                .await?;
        }

        if batch {
            info!(tool = %schema.name, jobs = inputs.len(), "processed all inputs");
        }
        Ok(())
    }

    fn interrupted(&self) -> bool {
        self.poll.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    async fn wait(&self, handle: &JobHandle) -> Result<JobStatus> {
        let mut progress = PollProgress::start(handle, self.output_level);
        let status = self
            .client
            .poll_with_progress(handle, &self.poll, |status| progress.update(handle, status))
            .await;
        progress.finish();
        status
    }

    async fn fetch(
        &self,
        handle: &JobHandle,
        target: &OutputTarget,
        outformat: Option<&str>,
        out: &mut impl Write,
    ) -> Result<()> {
        let written = self.client.materialize(handle, target, outformat, out).await?;
        for path in written {
            writeln!(out, "Wrote file: {}", path.display())?;
        }
        Ok(())
    }
}

/// Expands the input argument into one payload per job.
///
/// `@path` reads an identifier list; `multifasta` splits FASTA records.
fn split_inputs(input: &str, multifasta: bool) -> Result<Vec<String>> {
    let inputs = if let Some(list) = input.strip_prefix('@') {
        identifiers(&load_data(list)?)
    } else if multifasta {
        fasta_records(&load_data(input)?)
    } else {
        vec![load_data(input)?]
    };
    if inputs.is_empty() {
        return Err(JobError::InvalidParameters(format!(
            "no input records found in {input}"
        )));
    }
    Ok(inputs)
}
