pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod executor;
pub mod git;
pub mod plan;
pub mod vcs;

pub use config::{BuildConfig, BuildOptions};
pub use error::BuildError;
pub use executor::{AssumeDefault, BuildReport, Confirm, Repository, RepositoryBuilder};
pub use git::GitCli;
pub use plan::{Plan, Rules};
pub use vcs::{CommandOutput, StageAction, VersionControl};
