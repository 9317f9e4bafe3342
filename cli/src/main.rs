mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use adoc::ParseError;
use builder::plan::Operation;
use builder::{BuildConfig, BuildError, BuildOptions, BuildReport, GitCli, Plan, RepositoryBuilder};

use output::{Output, TerminalConfirm};

#[derive(Parser)]
#[command(
    name = "bookrepo",
    version,
    about = "Build example git repositories from an AsciiDoc book"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log progress (info level); otherwise RUST_LOG applies
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay the book's directives into git repositories
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Directory holding the documentation files
    bookdir: PathBuf,

    /// Directory the repositories are created in
    reposdir: PathBuf,

    /// Only build this repository
    #[arg(long)]
    reponame: Option<String>,

    /// Drop an existing repository without asking
    #[arg(long)]
    drop: bool,

    /// Write Full/Compact diffs of each commit back into the book
    #[arg(long)]
    generate_diffs: bool,

    /// Configuration file (default: <bookdir>/bookrepo.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the commits and tags that would be made, then exit
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    let output = Output::new(cli.no_color);
    let exit_code = match cli.command {
        Command::Build(args) => do_build(args, cli.no_color, &output),
    };
    process::exit(exit_code);
}

fn do_build(args: BuildArgs, no_color: bool, output: &Output) -> i32 {
    let config = match &args.config {
        Some(path) => BuildConfig::load(path),
        None => BuildConfig::discover(&args.bookdir),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            output.error(&format!("error: {err}"));
            return 1;
        }
    };
    debug!("{:?}", config);

    let mut vcs = GitCli::from_config(&config.git);
    let options = BuildOptions {
        book_dir: args.bookdir,
        repos_dir: args.reposdir,
        repo_filter: args.reponame,
        drop: args.drop,
        generate_diffs: args.generate_diffs,
    };
    let mut builder = RepositoryBuilder::new(config, options);

    let diagnostics = Diagnostics::new(no_color);

    if args.dry_run {
        return match builder.plan() {
            Ok(plan) => {
                diagnostics.emit(builder.files(), &plan.warnings);
                print_plan(&plan, output);
                0
            }
            Err(err) => fail(&err, &diagnostics, builder.files(), output),
        };
    }

    match builder.build(&mut vcs, &mut TerminalConfirm::new()) {
        Ok(report) => {
            diagnostics.emit(builder.files(), &report.warnings);
            print_summary(&report, output);
            0
        }
        Err(err) => fail(&err, &diagnostics, builder.files(), output),
    }
}

fn fail(
    err: &BuildError,
    diagnostics: &Diagnostics,
    files: &SimpleFiles<String, String>,
    output: &Output,
) -> i32 {
    match err {
        BuildError::Parse(errors) => diagnostics.emit(files, errors),
        other => output.error(&format!("error: {other}")),
    }
    1
}

struct Diagnostics {
    writer: StandardStream,
    config: term::Config,
}

impl Diagnostics {
    fn new(no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Diagnostics {
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
        }
    }

    fn emit(&self, files: &SimpleFiles<String, String>, errors: &[ParseError]) {
        for error in errors {
            let diagnostic = error.to_diagnostic();
            let _ = term::emit_to_write_style(&mut self.writer.lock(), &self.config, files, &diagnostic);
        }
    }
}

fn print_plan(plan: &Plan, output: &Output) {
    for group in &plan.groups {
        let tag = group.tag.as_deref().unwrap_or("(untagged)");
        output.heading(&format!("{} ({})", tag, group.repositories().join(", ")));
        for commit in &group.commits {
            output.info(&format!("  {}: commit {:?}", commit.repo, commit.message));
            for step in &commit.steps {
                match &step.operation {
                    Operation::Write {
                        filename,
                        action,
                        regions,
                    } => {
                        let regions = if regions.is_empty() {
                            String::new()
                        } else {
                            format!(" [{}]", regions.join(";"))
                        };
                        output.info(&format!(
                            "    {} {} <- {}{}",
                            action, filename, step.source_path, regions
                        ));
                    }
                    Operation::Command(line) => output.info(&format!("    $ {line}")),
                }
            }
        }
    }
    output.info(&format!(
        "{} commit(s), {} tag(s) planned",
        plan.commit_count(),
        plan.tag_count()
    ));
}

fn print_summary(report: &BuildReport, output: &Output) {
    let summary = format!(
        "{} commit(s), {} tag(s), {} diff file(s), {} warning(s)",
        report.commits,
        report.tags.len(),
        report.diffs.len(),
        report.warnings.len()
    );
    if report.failed_commands.is_empty() {
        output.success(&format!("build result: ok. {summary}"));
        return;
    }

    output.warning(&format!(
        "build result: {} failed command(s). {summary}",
        report.failed_commands.len()
    ));
    for failed in &report.failed_commands {
        output.warning(&format!("  {failed}"));
    }
}
