use std::collections::HashSet;
use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use tracing::{debug, error, info, warn};

use adoc::{Directive, ParseError, Parser};

use crate::clock::CommitClock;
use crate::config::{BuildConfig, BuildOptions};
use crate::diff::{DiffEmitter, DiffOutcome, write_creating_parents};
use crate::error::BuildError;
use crate::plan::{self, CommitGroup, Operation, Plan, Rules, Step, TagGroup};
use crate::vcs::{CommandOutput, VersionControl};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str, default: bool) -> bool;
}

/// Answers every question with its default.
pub struct AssumeDefault;

impl Confirm for AssumeDefault {
    fn confirm(&mut self, _question: &str, default: bool) -> bool {
        default
    }
}

/// What a build did.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub commits: usize,
    pub tags: Vec<String>,
    pub diffs: Vec<PathBuf>,
    /// Commands that ran but failed, as `<repo>: <what>`.
    pub failed_commands: Vec<String>,
    /// Skipped directives and tolerated source problems.
    pub warnings: Vec<ParseError>,
}

/// A target repository of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub root: PathBuf,
}

/// State of one replay, owned by [`RepositoryBuilder::build`].
struct RunState {
    prepared: HashSet<String>,
    first_repository: bool,
    clock: CommitClock,
    report: BuildReport,
}

/// Replays the directives of a book into its repositories.
pub struct RepositoryBuilder {
    config: BuildConfig,
    options: BuildOptions,
    clock: CommitClock,
    /// Every documentation and fragment file read, for diagnostics.
    files: SimpleFiles<String, String>,
}

impl RepositoryBuilder {
    pub fn new(config: BuildConfig, options: BuildOptions) -> Self {
        RepositoryBuilder {
            config,
            options,
            clock: CommitClock::new(),
            files: SimpleFiles::new(),
        }
    }

    pub fn with_clock(mut self, clock: CommitClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn files(&self) -> &SimpleFiles<String, String> {
        &self.files
    }

    /// Documentation files matching the configured pattern, sorted.
    pub fn documentation_files(&self) -> Result<Vec<PathBuf>, BuildError> {
        let book_dir = &self.options.book_dir;
        if !book_dir.is_dir() {
            return Err(BuildError::MissingDirectory(book_dir.clone()));
        }

        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&book_dir.to_string_lossy()),
            self.config.pattern
        );
        let paths = glob::glob(&pattern).map_err(|source| BuildError::Pattern {
            pattern: self.config.pattern.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => Some(path),
                Ok(_) => None,
                Err(err) => {
                    warn!("skipping {}: {}", err.path().display(), err.error());
                    None
                }
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Read every documentation file and collect its directives, in file
    /// order then text order.
    pub fn scan(&mut self) -> Result<Vec<Directive>, BuildError> {
        let mut directives = Vec::new();
        let mut errors = Vec::new();

        for path in self.documentation_files()? {
            let source = std::fs::read_to_string(&path).map_err(BuildError::read(&path))?;
            let name = self.display_name(&path);
            let file_id = self.files.add(name, source.clone());

            let parser = Parser::new(source, file_id).with_marker(self.config.marker.clone());
            match parser.parse() {
                Ok(found) => {
                    debug!("{} directive(s) in {}", found.len(), path.display());
                    directives.extend(found);
                }
                Err(mut errs) => errors.append(&mut errs),
            }
        }

        if errors.is_empty() {
            Ok(directives)
        } else {
            Err(BuildError::Parse(errors))
        }
    }

    pub fn plan(&mut self) -> Result<Plan, BuildError> {
        let directives = self.scan()?;
        let rules = Rules::from_config(&self.config, self.options.repo_filter.clone());
        Ok(plan::plan(&directives, &rules))
    }

    /// Scan, group and replay the whole book.
    pub fn build(
        &mut self,
        vcs: &mut dyn VersionControl,
        confirm: &mut dyn Confirm,
    ) -> Result<BuildReport, BuildError> {
        let plan = self.plan()?;
        for warning in &plan.warnings {
            warn!("{}", warning);
        }

        let mut state = RunState {
            prepared: HashSet::new(),
            first_repository: true,
            clock: self.clock.clone(),
            report: BuildReport {
                warnings: plan.warnings,
                ..BuildReport::default()
            },
        };

        for group in &plan.groups {
            self.replay_tag_group(group, vcs, confirm, &mut state)?;
        }

        Ok(state.report)
    }

    fn replay_tag_group(
        &mut self,
        group: &TagGroup,
        vcs: &mut dyn VersionControl,
        confirm: &mut dyn Confirm,
        state: &mut RunState,
    ) -> Result<(), BuildError> {
        for commit in &group.commits {
            let repo = self.repository(&commit.repo);
            self.replay_commit_group(&repo, commit, vcs, confirm, state)?;
        }

        // Each repository's HEAD is now its last commit of the group.
        if let Some(tag) = &group.tag {
            for name in group.repositories() {
                let repo = self.repository(name);
                let when = state.clock.next();
                let output = vcs.tag(&repo.root, tag, tag, when)?;
                if check(state, &repo, &format!("tag {tag}"), &output) {
                    info!("Tag {} created in {}", tag, repo.name);
                    state.report.tags.push(tag.clone());
                }
            }
        }
        Ok(())
    }

    fn replay_commit_group(
        &mut self,
        repo: &Repository,
        commit: &CommitGroup,
        vcs: &mut dyn VersionControl,
        confirm: &mut dyn Confirm,
        state: &mut RunState,
    ) -> Result<(), BuildError> {
        for step in &commit.steps {
            self.ensure_repository(repo, vcs, confirm, state)?;
            self.apply_step(repo, step, vcs, state)?;
        }

        let filenames: Vec<&str> = commit
            .steps
            .iter()
            .filter_map(|step| match &step.operation {
                Operation::Write { filename, .. } => Some(filename.as_str()),
                Operation::Command(_) => None,
            })
            .collect();
        info!(
            "Committing {} with commit message {}",
            filenames.join(", "),
            commit.message
        );
        let when = state.clock.next();
        let output = vcs.commit(&repo.root, &commit.message, when)?;
        if !check(state, repo, &format!("commit '{}'", commit.message), &output) {
            return Ok(());
        }
        state.report.commits += 1;

        if self.options.generate_diffs {
            let emitter = DiffEmitter::new(&self.options.book_dir, &self.config.diff);
            for step in &commit.steps {
                if let Operation::Write { .. } = step.operation {
                    match emitter.emit(vcs, &repo.root, &step.source_path)? {
                        DiffOutcome::Written { full, compact } => {
                            info!("Wrote diffs {} and {}", full.display(), compact.display());
                            state.report.diffs.push(full);
                            state.report.diffs.push(compact);
                        }
                        outcome => debug!("no diff for {}: {:?}", step.source_path, outcome),
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_step(
        &mut self,
        repo: &Repository,
        step: &Step,
        vcs: &mut dyn VersionControl,
        state: &mut RunState,
    ) -> Result<(), BuildError> {
        match &step.operation {
            Operation::Command(line) => {
                info!("Executing {}", line);
                let output = vcs.run_shell(&repo.root, line)?;
                check(state, repo, line, &output);
            }
            Operation::Write {
                filename,
                action,
                regions,
            } => {
                if action.is_add() {
                    self.materialize(repo, step, filename, regions, state)?;
                }
                let output = vcs.stage(&repo.root, filename, action)?;
                check(state, repo, &format!("{action} {filename}"), &output);
            }
        }
        Ok(())
    }

    /// Copy the fragment, filtered by region when asked, into the repository.
    fn materialize(
        &mut self,
        repo: &Repository,
        step: &Step,
        filename: &str,
        regions: &[String],
        state: &mut RunState,
    ) -> Result<(), BuildError> {
        let source_path = self.options.book_dir.join(&step.source_path);
        let destination = repo.root.join(filename);

        if regions.is_empty() {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(BuildError::write(parent))?;
            }
            std::fs::copy(&source_path, &destination).map_err(BuildError::read(&source_path))?;
            return Ok(());
        }

        let source = std::fs::read_to_string(&source_path).map_err(BuildError::read(&source_path))?;
        let file_id = self.files.add(step.source_path.clone(), source.clone());
        let (extraction, warning) = adoc::region::extract_with_warnings(&source, file_id, regions)?;
        if let Some(warning) = warning {
            warn!("{}: {}", step.source_path, warning);
            state.report.warnings.push(warning);
        }
        write_creating_parents(&destination, &extraction.into_content(&source))
    }

    /// Create and initialize the repository the first time it is used.
    /// Only the first repository of the run may be dropped and rebuilt.
    fn ensure_repository(
        &self,
        repo: &Repository,
        vcs: &mut dyn VersionControl,
        confirm: &mut dyn Confirm,
        state: &mut RunState,
    ) -> Result<(), BuildError> {
        if state.prepared.contains(&repo.name) {
            return Ok(());
        }

        std::fs::create_dir_all(&repo.root).map_err(BuildError::write(&repo.root))?;
        if !repo.root.join(".git").exists() {
            info!("Initializing repository {}", repo.name);
            let output = vcs.init(&repo.root)?;
            check(state, repo, "init", &output);
        } else if state.first_repository {
            warn!("{} repository already initialized.", repo.name);
            if self.options.drop || confirm.confirm("Drop repo and build again?", false) {
                info!("Dropping repository {}", repo.name);
                std::fs::remove_dir_all(&repo.root).map_err(BuildError::write(&repo.root))?;
                std::fs::create_dir_all(&repo.root).map_err(BuildError::write(&repo.root))?;
                let output = vcs.init(&repo.root)?;
                check(state, repo, "init", &output);
            }
        }

        state.first_repository = false;
        state.prepared.insert(repo.name.clone());
        Ok(())
    }

    fn repository(&self, name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            root: self.options.repos_dir.join(name),
        }
    }

    fn display_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.options.book_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Log a finished command. Returns whether it succeeded.
fn check(state: &mut RunState, repo: &Repository, what: &str, output: &CommandOutput) -> bool {
    if !output.stdout.trim().is_empty() {
        debug!("{}", output.stdout.trim_end());
    }
    if !output.success {
        error!("{}: {} failed: {}", repo.name, what, output.stderr.trim_end());
        state
            .report
            .failed_commands
            .push(format!("{}: {}", repo.name, what));
    } else if !output.stderr.trim().is_empty() {
        warn!("{}: {}", repo.name, output.stderr.trim_end());
    }
    output.success
}
