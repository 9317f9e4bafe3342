//! Grouping of directives into commits and tags.
//!
//! Consecutive steps that share a tag form a [`TagGroup`], whatever
//! repository they target; inside it, consecutive steps that share a
//! repository and a commit message form a [`CommitGroup`]. Replaying the
//! groups in order gives one commit per commit group and, for each tagged
//! group, one annotated tag per repository it touched, placed on that
//! repository's last commit of the group.

use std::ops::Range;

use adoc::{Directive, ParseError, ParseErrorKind};

use crate::config::BuildConfig;
use crate::vcs::StageAction;

/// Attribute read when `<marker>include-tags` is absent.
const REGION_ALIAS: &str = "tags";

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write the (filtered) fragment at `filename` and stage it.
    Write {
        filename: String,
        action: StageAction,
        regions: Vec<String>,
    },
    /// Run a shell line in the repository instead of writing a file.
    Command(String),
}

/// A directive that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub source_path: String,
    pub repo: String,
    pub operation: Operation,
    /// Commit message, chapter label included.
    pub message: Option<String>,
    pub tag: Option<String>,
    pub span: Range<usize>,
    pub file_id: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitGroup {
    pub repo: String,
    pub message: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagGroup {
    pub tag: Option<String>,
    pub commits: Vec<CommitGroup>,
}

impl TagGroup {
    /// Repositories committed to in this group, in order of first use.
    pub fn repositories(&self) -> Vec<&str> {
        let mut repos: Vec<&str> = Vec::new();
        for commit in &self.commits {
            if !repos.contains(&commit.repo.as_str()) {
                repos.push(&commit.repo);
            }
        }
        repos
    }
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub groups: Vec<TagGroup>,
    /// Directives that were skipped, and why.
    pub warnings: Vec<ParseError>,
}

impl Plan {
    pub fn commit_count(&self) -> usize {
        self.groups.iter().map(|g| g.commits.len()).sum()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|g| g.tag.as_deref())
    }

    /// Annotated tags the replay creates, one per tagged group and
    /// repository.
    pub fn tag_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.tag.is_some())
            .map(|g| g.repositories().len())
            .sum()
    }
}

/// The names and filters a directive is checked against.
#[derive(Debug, Clone)]
pub struct Rules {
    pub marker: String,
    pub chapter_prefix: String,
    pub chapter_label: String,
    pub repo_filter: Option<String>,
}

impl Rules {
    pub fn from_config(config: &BuildConfig, repo_filter: Option<String>) -> Self {
        Rules {
            marker: config.marker.clone(),
            chapter_prefix: config.chapter_prefix.clone(),
            chapter_label: config.chapter_label.clone(),
            repo_filter,
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.marker, name)
    }

    /// Prefix `message` with a chapter label when `tag` names a chapter.
    pub fn commit_message(&self, message: &str, tag: Option<&str>) -> String {
        match tag.and_then(|t| t.strip_prefix(self.chapter_prefix.as_str())) {
            Some(chapter) if !self.chapter_prefix.is_empty() => {
                format!("{}{} - {}", self.chapter_label, chapter, message)
            }
            _ => message.to_string(),
        }
    }

    /// Whether the repository filter lets this directive through.
    pub fn selects(&self, directive: &Directive) -> bool {
        match &self.repo_filter {
            Some(only) => directive.marked(&self.marker, "repo") == Some(only.as_str()),
            None => true,
        }
    }

    /// Check the required attributes and resolve defaults.
    pub fn validate(&self, directive: &Directive) -> Result<Step, ParseError> {
        let missing = |message: String| {
            ParseError::warning(
                ParseErrorKind::MissingRequiredAttribute(message),
                directive.span.clone(),
                directive.file_id,
            )
            .with_note("the directive is skipped")
        };
        let attr = |name: &str| directive.marked(&self.marker, name);

        let repo = attr("repo")
            .ok_or_else(|| missing(format!("no '{}' attribute", self.key("repo"))))?;
        if !is_plain_name(repo) {
            return Err(missing(format!(
                "'{}' must name a directory under the repositories root, got '{}'",
                self.key("repo"),
                repo
            )));
        }

        let operation = match (attr("filename"), attr("command")) {
            (Some(filename), None) => Operation::Write {
                filename: filename.to_string(),
                action: StageAction::parse(attr("action").unwrap_or("add")),
                regions: attr("include-tags")
                    .or_else(|| directive.attributes.get(REGION_ALIAS))
                    .map(adoc::region::parse_region_list)
                    .unwrap_or_default(),
            },
            (None, Some(command)) => Operation::Command(command.to_string()),
            (Some(_), Some(_)) => {
                return Err(missing(format!(
                    "both '{}' and '{}' are set; exactly one is allowed",
                    self.key("filename"),
                    self.key("command")
                )));
            }
            (None, None) => {
                return Err(missing(format!(
                    "no '{}' or '{}' attribute",
                    self.key("filename"),
                    self.key("command")
                )));
            }
        };

        let tag = attr("tag").map(str::to_string);
        let message = attr("commit-msg").map(|m| self.commit_message(m, tag.as_deref()));

        Ok(Step {
            source_path: directive.source_path.clone(),
            repo: repo.to_string(),
            operation,
            message,
            tag,
            span: directive.span.clone(),
            file_id: directive.file_id,
        })
    }
}

/// Accumulator of the grouping fold.
#[derive(Debug, Default)]
pub struct Grouping {
    groups: Vec<TagGroup>,
    warnings: Vec<ParseError>,
}

impl Grouping {
    pub fn push(mut self, directive: &Directive, rules: &Rules) -> Self {
        if !rules.selects(directive) {
            return self;
        }
        match rules.validate(directive) {
            Ok(step) => self.push_step(step),
            Err(warning) => self.warnings.push(warning),
        }
        self
    }

    fn push_step(&mut self, step: Step) {
        let open = self
            .groups
            .last_mut()
            .filter(|g| g.tag == step.tag);

        let Some(group) = open else {
            self.groups.push(TagGroup {
                tag: step.tag.clone(),
                commits: vec![CommitGroup::new(step)],
            });
            return;
        };

        // A step without a message joins whatever commit is open in its
        // repository.
        match group.commits.last_mut() {
            Some(commit)
                if commit.repo == step.repo
                    && step.message.as_ref().is_none_or(|m| *m == commit.message) =>
            {
                commit.steps.push(step)
            }
            _ => group.commits.push(CommitGroup::new(step)),
        }
    }

    pub fn finish(self) -> Plan {
        Plan {
            groups: self.groups,
            warnings: self.warnings,
        }
    }
}

impl CommitGroup {
    fn new(step: Step) -> Self {
        CommitGroup {
            repo: step.repo.clone(),
            message: step.message.clone().unwrap_or_default(),
            steps: vec![step],
        }
    }
}

/// A single non-empty path component that is neither `.` nor `..`.
fn is_plain_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !std::path::Path::new(name).has_root()
}

/// Group directives, in order, into tag groups of commit groups.
pub fn plan<'a>(directives: impl IntoIterator<Item = &'a Directive>, rules: &Rules) -> Plan {
    directives
        .into_iter()
        .fold(Grouping::default(), |grouping, directive| {
            grouping.push(directive, rules)
        })
        .finish()
}
