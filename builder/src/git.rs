//! The git command-line tool as a [`VersionControl`] implementation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::config::GitConfig;
use crate::error::BuildError;
use crate::vcs::{CommandOutput, StageAction, Timestamp, VersionControl};

pub struct GitCli {
    program: String,
    author_name: Option<String>,
    author_email: Option<String>,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        GitCli {
            program: program.into(),
            author_name: None,
            author_email: None,
        }
    }

    pub fn from_config(config: &GitConfig) -> Self {
        GitCli {
            program: config.program.clone(),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        }
    }

    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self.author_email = Some(email.into());
        self
    }

    fn git<I, S>(&self, dir: &Path, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(dir);
        if let Some(name) = &self.author_name {
            cmd.env("GIT_AUTHOR_NAME", name).env("GIT_COMMITTER_NAME", name);
        }
        if let Some(email) = &self.author_email {
            cmd.env("GIT_AUTHOR_EMAIL", email)
                .env("GIT_COMMITTER_EMAIL", email);
        }
        cmd
    }

    fn dated(mut cmd: Command, when: Timestamp) -> Command {
        let date = format!("@{when} +0000");
        cmd.env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date);
        cmd
    }
}

fn output(mut cmd: Command) -> Result<CommandOutput, BuildError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!(
        "running {} {}",
        program,
        cmd.get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    cmd.output()
        .map(CommandOutput::from)
        .map_err(|source| BuildError::Spawn { program, source })
}

impl VersionControl for GitCli {
    fn init(&mut self, dir: &Path) -> Result<CommandOutput, BuildError> {
        output(self.git(dir, ["init"]))
    }

    fn stage(
        &mut self,
        dir: &Path,
        path: &str,
        action: &StageAction,
    ) -> Result<CommandOutput, BuildError> {
        let cmd = match action {
            StageAction::Add => self.git(dir, ["add", "--", path]),
            StageAction::Remove => self.git(dir, ["rm", "--", path]),
            StageAction::Other(verb) => self.git(dir, [verb.as_str(), path]),
        };
        output(cmd)
    }

    fn commit(
        &mut self,
        dir: &Path,
        message: &str,
        when: Timestamp,
    ) -> Result<CommandOutput, BuildError> {
        let cmd = if message.is_empty() {
            self.git(dir, ["commit", "--allow-empty-message", "-m", ""])
        } else {
            self.git(dir, ["commit", "-m", message])
        };
        output(Self::dated(cmd, when))
    }

    fn tag(
        &mut self,
        dir: &Path,
        name: &str,
        message: &str,
        when: Timestamp,
    ) -> Result<CommandOutput, BuildError> {
        let cmd = self.git(dir, ["tag", "-a", name, "-m", message]);
        output(Self::dated(cmd, when))
    }

    fn diff(
        &mut self,
        dir: &Path,
        since: &str,
        context: Option<u32>,
    ) -> Result<CommandOutput, BuildError> {
        let mut args = vec!["diff".to_string(), "--no-prefix".to_string()];
        if let Some(lines) = context {
            args.push(format!("-U{lines}"));
        }
        args.push(since.to_string());
        output(self.git(dir, args))
    }

    fn run(&mut self, dir: &Path, argv: &[String]) -> Result<CommandOutput, BuildError> {
        let Some((program, args)) = argv.split_first() else {
            return Ok(CommandOutput::failed("empty command"));
        };
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        output(cmd)
    }

    fn run_shell(&mut self, dir: &Path, line: &str) -> Result<CommandOutput, BuildError> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", line]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", line]);
            cmd
        };
        cmd.current_dir(dir);
        output(cmd)
    }
}
