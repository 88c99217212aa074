use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::{Section, SectionExt};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// What to do when an external tool fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum FailurePolicy {
    /// Stop the pipeline with an error.
    #[default]
    Fatal,
    /// Log the failure and let the caller decide.
    Tolerant,
}

/// The result of running a [`ToolCommand`] that did not error.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolStatus {
    Success,
    /// Only returned under [`FailurePolicy::Tolerant`].
    Failed(String),
}

/// An external program invocation and its contract.
///
/// ## Examples
///
/// ```rust
/// use clockroot::pipeline::ToolCommand;
/// let command = ToolCommand::new("usher_to_taxonium")
///     .arg("--title")
///     .arg("Treetime-rerooted trees/hiv");
/// assert_eq!(command.command_line(), "usher_to_taxonium --title 'Treetime-rerooted trees/hiv'");
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Files the tool must produce.
    pub outputs: Vec<PathBuf>,
    /// Where captured stdout/stderr and a status line are written.
    pub log: Option<PathBuf>,
    pub policy: FailurePolicy,
}

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        ToolCommand { program: program.to_string(), ..Default::default() }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn output(mut self, path: PathBuf) -> Self {
        self.outputs.push(path);
        self
    }

    pub fn log(mut self, path: PathBuf) -> Self {
        self.log = Some(path);
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The shell-quoted command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|arg| {
                let plain = !arg.is_empty()
                    && arg.chars().all(|c| c.is_ascii_alphanumeric() || "-_./,:=+@%".contains(c));
                match plain {
                    true => arg.to_string(),
                    false => format!("'{}'", arg.replace('\'', r"'\''")),
                }
            })
            .join(" ")
    }

    /// Run the tool to completion, capturing its output.
    ///
    /// - On success, every declared output must exist.
    /// - On failure, a [`FailurePolicy::Fatal`] command returns an error with the
    ///   command line, exit code and captured output. A [`FailurePolicy::Tolerant`]
    ///   command logs the same and returns [`ToolStatus::Failed`].
    pub fn run(&self) -> Result<ToolStatus, Report> {
        let command_line = self.command_line();
        info!("Running {}", self.program);
        debug!("{command_line}");

        let (captured, failure) = match Command::new(&self.program).args(&self.args).output() {
            Ok(output) => {
                let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
                captured.push_str(&String::from_utf8_lossy(&output.stderr));
                let failure = match output.status.code() {
                    _ if output.status.success() => None,
                    Some(code) => Some(format!("failed with return code {code}")),
                    None => Some("was terminated by a signal".to_string()),
                };
                (captured, failure)
            }
            Err(e) => (String::new(), Some(format!("failed to start: {e}"))),
        };

        if let Some(log) = &self.log {
            let status = match &failure {
                Some(reason) => format!("[ERROR] {command_line} {reason}"),
                None => format!("[OK] {command_line}"),
            };
            let mut file = File::create(log).wrap_err_with(|| eyre!("Unable to create log: {log:?}"))?;
            write!(file, "{captured}")
                .and_then(|_| writeln!(file, "{status}"))
                .wrap_err_with(|| eyre!("Unable to write log: {log:?}"))?;
        }

        if let Some(reason) = failure {
            let message = format!("{} {reason}: {command_line}", self.program);
            return match self.policy {
                FailurePolicy::Fatal => Err(eyre!(message).section(captured.trim().to_string().header("Output:"))),
                FailurePolicy::Tolerant => {
                    warn!("{message}");
                    warn!("Output:\n{}", captured.trim());
                    Ok(ToolStatus::Failed(message))
                }
            };
        }

        let missing = self.outputs.iter().filter(|path| !path.exists()).collect_vec();
        if !missing.is_empty() {
            return Err(eyre!("{} did not produce {missing:?}", self.program)
                .section(command_line.header("Command:")));
        }

        Ok(ToolStatus::Success)
    }
}
