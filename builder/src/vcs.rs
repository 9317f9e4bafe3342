use std::fmt;
use std::path::Path;

use crate::error::BuildError;

/// What a finished process printed, and whether it exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// How a destination path is recorded in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    Add,
    Remove,
    /// Any other verb, passed through to the tool untouched.
    Other(String),
}

impl StageAction {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "add" => StageAction::Add,
            "remove" | "rm" | "delete" => StageAction::Remove,
            _ => StageAction::Other(value.trim().to_string()),
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, StageAction::Add)
    }
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageAction::Add => write!(f, "add"),
            StageAction::Remove => write!(f, "rm"),
            StageAction::Other(verb) => write!(f, "{}", verb),
        }
    }
}

/// Seconds since the Unix epoch, used as author and committer date.
pub type Timestamp = i64;

/// The version-control tool, driven one call at a time. Every call runs
/// with `dir` (the repository root) as working directory.
///
/// `Err` means the tool could not be started at all. A command that ran
/// and failed is an `Ok` output with `success == false`.
pub trait VersionControl {
    fn init(&mut self, dir: &Path) -> Result<CommandOutput, BuildError>;

    fn stage(
        &mut self,
        dir: &Path,
        path: &str,
        action: &StageAction,
    ) -> Result<CommandOutput, BuildError>;

    fn commit(
        &mut self,
        dir: &Path,
        message: &str,
        when: Timestamp,
    ) -> Result<CommandOutput, BuildError>;

    fn tag(
        &mut self,
        dir: &Path,
        name: &str,
        message: &str,
        when: Timestamp,
    ) -> Result<CommandOutput, BuildError>;

    /// Diff of the working tree against `since`, with `context` lines of
    /// context when given.
    fn diff(
        &mut self,
        dir: &Path,
        since: &str,
        context: Option<u32>,
    ) -> Result<CommandOutput, BuildError>;

    /// Run an arbitrary program with an argument vector.
    fn run(&mut self, dir: &Path, argv: &[String]) -> Result<CommandOutput, BuildError>;

    /// Run a line through the platform shell.
    fn run_shell(&mut self, dir: &Path, line: &str) -> Result<CommandOutput, BuildError>;
}
