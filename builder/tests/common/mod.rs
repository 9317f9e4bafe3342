#![allow(dead_code)]

use std::path::{Path, PathBuf};

use builder::clock::CommitClock;
use builder::vcs::Timestamp;
use builder::{
    BuildConfig, BuildError, BuildOptions, CommandOutput, RepositoryBuilder, StageAction,
    VersionControl,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(String),
    Stage {
        repo: String,
        path: String,
        action: StageAction,
    },
    Commit {
        repo: String,
        message: String,
        when: Timestamp,
    },
    Tag {
        repo: String,
        name: String,
    },
    Diff {
        repo: String,
        context: Option<u32>,
    },
    Shell {
        repo: String,
        line: String,
    },
}

/// Records every call instead of running git. `init` creates an empty
/// `.git` directory so the repository looks initialized afterwards.
#[derive(Default)]
pub struct RecordingVcs {
    pub calls: Vec<Call>,
    /// Output of `diff`: compact rendering, then full rendering.
    pub diffs: Option<(CommandOutput, CommandOutput)>,
}

fn repo_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl RecordingVcs {
    pub fn commits(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Commit { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn tags(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Tag { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Calls reduced to a short label, e.g. `stage foo.rb` or `commit M1`.
    pub fn timeline(&self) -> Vec<String> {
        self.calls
            .iter()
            .map(|c| match c {
                Call::Init(repo) => format!("init {repo}"),
                Call::Stage { path, action, .. } => format!("{action} {path}"),
                Call::Commit { message, .. } => format!("commit {message}"),
                Call::Tag { name, .. } => format!("tag {name}"),
                Call::Diff { context, .. } => format!("diff {context:?}"),
                Call::Shell { line, .. } => format!("sh {line}"),
            })
            .collect()
    }
}

impl VersionControl for RecordingVcs {
    fn init(&mut self, dir: &Path) -> Result<CommandOutput, BuildError> {
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        self.calls.push(Call::Init(repo_name(dir)));
        Ok(CommandOutput::ok(""))
    }

    fn stage(
        &mut self,
        dir: &Path,
        path: &str,
        action: &StageAction,
    ) -> Result<CommandOutput, BuildError> {
        self.calls.push(Call::Stage {
            repo: repo_name(dir),
            path: path.to_string(),
            action: action.clone(),
        });
        Ok(CommandOutput::ok(""))
    }

    fn commit(
        &mut self,
        dir: &Path,
        message: &str,
        when: Timestamp,
    ) -> Result<CommandOutput, BuildError> {
        self.calls.push(Call::Commit {
            repo: repo_name(dir),
            message: message.to_string(),
            when,
        });
        Ok(CommandOutput::ok(""))
    }

    fn tag(
        &mut self,
        dir: &Path,
        name: &str,
        _message: &str,
        _when: Timestamp,
    ) -> Result<CommandOutput, BuildError> {
        self.calls.push(Call::Tag {
            repo: repo_name(dir),
            name: name.to_string(),
        });
        Ok(CommandOutput::ok(""))
    }

    fn diff(
        &mut self,
        dir: &Path,
        _since: &str,
        context: Option<u32>,
    ) -> Result<CommandOutput, BuildError> {
        self.calls.push(Call::Diff {
            repo: repo_name(dir),
            context,
        });
        Ok(match (&self.diffs, context) {
            (Some((compact, _)), None) => compact.clone(),
            (Some((_, full)), Some(_)) => full.clone(),
            (None, _) => CommandOutput::failed("fatal: ambiguous argument 'HEAD~1'"),
        })
    }

    fn run(&mut self, dir: &Path, argv: &[String]) -> Result<CommandOutput, BuildError> {
        self.run_shell(dir, &argv.join(" "))
    }

    fn run_shell(&mut self, dir: &Path, line: &str) -> Result<CommandOutput, BuildError> {
        self.calls.push(Call::Shell {
            repo: repo_name(dir),
            line: line.to_string(),
        });
        Ok(CommandOutput::ok(""))
    }
}

/// A scratch book directory and repositories directory.
pub struct Book {
    _dir: tempfile::TempDir,
    pub book_dir: PathBuf,
    pub repos_dir: PathBuf,
}

impl Book {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let book_dir = dir.path().join("book");
        let repos_dir = dir.path().join("repos");
        std::fs::create_dir_all(&book_dir).unwrap();
        std::fs::create_dir_all(&repos_dir).unwrap();
        Book {
            _dir: dir,
            book_dir,
            repos_dir,
        }
    }

    pub fn write(&self, path: &str, contents: &str) -> &Self {
        let path = self.book_dir.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions::new(&self.book_dir, &self.repos_dir)
    }

    pub fn builder(&self, options: BuildOptions) -> RepositoryBuilder {
        RepositoryBuilder::new(BuildConfig::default(), options)
            .with_clock(CommitClock::starting_at(1_000))
    }

    pub fn repo_file(&self, repo: &str, path: &str) -> String {
        std::fs::read_to_string(self.repos_dir.join(repo).join(path)).unwrap()
    }
}

/// A marked directive line.
pub fn directive(source: &str, attributes: &[(&str, &str)]) -> String {
    let list = attributes
        .iter()
        .map(|(k, v)| format!("bdd-{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",");
    format!("include::{source}[{list}]\n")
}
