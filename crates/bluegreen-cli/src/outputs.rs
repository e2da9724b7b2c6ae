//! Named outputs and failure reporting back to the orchestrator.
//!
//! Outputs are `name=value` lines appended to the file named by
//! `GITHUB_OUTPUT`; without one (local runs) they go to stdout. Failures
//! use the `::error::` workflow command so the orchestrator surfaces the
//! message on the run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use bluegreen_core::{Action, Outcome};

pub struct OutputSink {
    file: Option<PathBuf>,
}

impl OutputSink {
    pub fn from_env() -> Self {
        let file = std::env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { file }
    }

    #[cfg(test)]
    fn to_file(path: PathBuf) -> Self {
        Self { file: Some(path) }
    }

    /// Emit the named outputs for one completed action.
    pub fn emit(&self, action: Action, outcome: &Outcome) -> anyhow::Result<()> {
        let mut pairs = vec![
            ("active-color", outcome.active.to_string()),
            ("inactive-color", outcome.inactive.to_string()),
        ];
        if let Some(previous) = outcome.previous {
            pairs.push(("previous-color", previous.to_string()));
        }
        if action == Action::Init {
            if let Some(created) = outcome.table_created {
                pairs.push(("table-created", created.to_string()));
            }
        }
        self.write(&pairs)
    }

    fn write(&self, pairs: &[(&str, String)]) -> anyhow::Result<()> {
        match &self.file {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening output file {}", path.display()))?;
                for (name, value) in pairs {
                    writeln!(file, "{name}={value}")?;
                }
            }
            None => {
                for (name, value) in pairs {
                    println!("{name}={value}");
                }
            }
        }
        Ok(())
    }
}

/// Surface a fatal error to the orchestrator and mark the step failed.
pub fn report_failure(message: &str) {
    println!("::error::{message}");
}
