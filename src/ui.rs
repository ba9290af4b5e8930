//! Interface de terminal: spinner de polling e linhas de status coloridas.
//!
//! Usa `indicatif` para o spinner e `console` para as cores. As listagens
//! (parâmetros, tipos de resultado) escrevem em qualquer `Write`, o que
//! permite capturá-las nos testes.

use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::job::{JobHandle, JobStatus, ResultDescriptor};
use crate::service::ParameterDetails;

/// Spinner exibido no stderr enquanto um job é consultado.
///
/// Fica oculto quando o stderr não é um terminal ou a saída é silenciosa;
/// nesse caso as mudanças de status viram linhas simples.
pub struct PollProgress {
    // Spinner do indicatif, ausente fora de um terminal.
    pb: Option<ProgressBar>,
    // Verde para FINISHED.
    green: Style,
    // Vermelho para FAILURE, ERROR e NOT_FOUND.
    red: Style,
    // Amarelo para status ainda em andamento.
    yellow: Style,
    // Último status exibido, para não repetir linhas.
    last: Option<JobStatus>,
    // Imprime cada mudança de status quando não há spinner.
    print_changes: bool,
}

impl PollProgress {
    pub fn start(handle: &JobHandle, output_level: u8) -> Self {
        let interactive = output_level > 0 && Term::stderr().is_term();
        let pb = interactive.then(|| {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb.set_message(format!("{handle}: submitted"));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            last: None,
            print_changes: !interactive && output_level > 0,
        }
    }

    /// Registra um status recebido do serviço.
    pub fn update(&mut self, handle: &JobHandle, status: JobStatus) {
        if self.last == Some(status) {
            return;
        }
        self.last = Some(status);
        match &self.pb {
            Some(pb) => pb.set_message(format!("{handle}: {}", self.styled(status))),
            None if self.print_changes => {
                eprintln!("{}", status_line(&handle.to_string(), &self.styled(status)));
            }
            None => {}
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }

    fn styled(&self, status: JobStatus) -> String {
        let style = match status {
            JobStatus::Finished => &self.green,
            JobStatus::Failure | JobStatus::Error | JobStatus::NotFound => &self.red,
            JobStatus::Pending | JobStatus::Running => &self.yellow,
        };
        style.apply_to(status).to_string()
    }
}

impl Drop for PollProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// `[HH:MM:SS] subject: message`
pub fn status_line(subject: &str, message: &str) -> String {
    format!("[{}] {subject}: {message}", Local::now().format("%H:%M:%S"))
}

pub fn print_tools<'a>(
    out: &mut impl Write,
    tools: impl Iterator<Item = (&'a str, &'a str)>,
) -> io::Result<()> {
    for (name, description) in tools {
        if description.is_empty() {
            writeln!(out, "{name}")?;
        } else {
            writeln!(out, "{name:<12} {description}")?;
        }
    }
    Ok(())
}

pub fn print_result_types(out: &mut impl Write, types: &[ResultDescriptor]) -> io::Result<()> {
    for descriptor in types {
        writeln!(out, "{}", descriptor.identifier)?;
        if let Some(label) = &descriptor.label {
            writeln!(out, "\t{label}")?;
        }
        if let Some(description) = &descriptor.description {
            writeln!(out, "\t{description}")?;
        }
        writeln!(out, "\t{}", descriptor.media_type)?;
        writeln!(out, "\t{}", descriptor.file_suffix)?;
    }
    Ok(())
}

pub fn print_parameters(out: &mut impl Write, names: &[String]) -> io::Result<()> {
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub fn print_parameter_details(out: &mut impl Write, details: &ParameterDetails) -> io::Result<()> {
    match &details.kind {
        Some(kind) => writeln!(out, "{}\t{kind}", details.name)?,
        None => writeln!(out, "{}", details.name)?,
    }
    if let Some(description) = &details.description {
        writeln!(out, "{description}")?;
    }
    for value in &details.values {
        write!(out, "{}", value.value)?;
        if let Some(label) = &value.label {
            write!(out, "\t{label}")?;
        }
        if value.default_value {
            write!(out, "\tdefault")?;
        }
        writeln!(out)?;
        for property in &value.properties {
            writeln!(
                out,
                "\t{}\t{}",
                property.key,
                property.value.as_deref().unwrap_or("")
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ParameterProperty, ParameterValue};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn result_types_listing() {
        let types = vec![ResultDescriptor {
            identifier: "out".into(),
            label: Some("Tool Output".into()),
            description: None,
            media_type: "text/plain".into(),
            file_suffix: "txt".into(),
        }];
        let text = render(|out| print_result_types(out, &types));
        assert_eq!(text, "out\n\tTool Output\n\ttext/plain\n\ttxt\n");
    }

    #[test]
    fn parameter_details_listing() {
        let details = ParameterDetails {
            name: "stype".into(),
            description: Some("Sequence type".into()),
            kind: Some("STRING".into()),
            values: vec![ParameterValue {
                label: Some("Protein".into()),
                value: "protein".into(),
                default_value: true,
                properties: vec![ParameterProperty {
                    key: "alphabet".into(),
                    value: None,
                }],
            }],
        };
        let text = render(|out| print_parameter_details(out, &details));
        assert_eq!(
            text,
            "stype\tSTRING\nSequence type\nprotein\tProtein\tdefault\n\talphabet\t\n"
        );
    }

    #[test]
    fn tools_listing_pads_names() {
        let text = render(|out| {
            print_tools(out, [("clustalo", "Multiple alignment"), ("x", "")].into_iter())
        });
        assert_eq!(text, "clustalo     Multiple alignment\nx\n");
    }

    #[test]
    fn status_line_has_timestamp_prefix() {
        let line = status_line("job-1", "RUNNING");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] job-1: RUNNING"));
    }

    #[test]
    fn quiet_progress_has_no_spinner() {
        let handle = JobHandle::new("job-1").unwrap();
        let mut progress = PollProgress::start(&handle, 0);
        assert!(progress.pb.is_none());
        progress.update(&handle, JobStatus::Running);
        assert_eq!(progress.last, Some(JobStatus::Running));
    }
}
