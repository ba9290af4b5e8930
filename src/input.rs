//! Job input loading.
//!
//! The input argument is a file path, `-` for standard input, or the raw
//! data itself (a sequence or an entry identifier such as `UNIPROT:WAP_RAT`).

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Resolves an input argument to the data to submit.
pub fn load_data(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut data = String::new();
        std::io::stdin().read_to_string(&mut data)?;
        debug!(len = data.len(), "read input from stdin");
        return Ok(data);
    }
    let path = Path::new(arg);
    if path.is_file() {
        let data = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), len = data.len(), "read input file");
        return Ok(data);
    }
    Ok(arg.to_string())
}

/// Splits FASTA text into one record per `>` header, each ending in a
/// newline. Text before the first header is ignored.
pub fn fasta_records(data: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current: Option<String> = None;

    for line in data.lines() {
        if line.starts_with('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(format!("{line}\n"));
        } else if let Some(record) = current.as_mut()
            && !line.trim().is_empty()
        {
            record.push_str(line);
            record.push('\n');
        }
    }
    records.extend(current);
    records
}

/// Entry identifiers (`DB:ID`) from an identifier list, one per line.
/// Lines without a `:` after the first character are skipped.
pub fn identifiers(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| line.find(':').is_some_and(|pos| pos > 0))
        .map(str::to_string)
        .collect()
}
