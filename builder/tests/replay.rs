mod common;

use pretty_assertions::assert_eq;

use builder::{AssumeDefault, BuildError, CommandOutput, Confirm};

use common::{Book, Call, RecordingVcs, directive};

struct Answer(bool, Vec<String>);

impl Confirm for Answer {
    fn confirm(&mut self, question: &str, _default: bool) -> bool {
        self.1.push(question.to_string());
        self.0
    }
}

fn step(file: &str, msg: &str, tag: &str) -> String {
    directive(
        &format!("Code/{file}"),
        &[("repo", "demo"), ("filename", file), ("commit-msg", msg), ("tag", tag)],
    )
}

#[test]
fn single_directive_scenario() {
    let book = Book::new();
    book.write("Code/src/foo.rb", "puts 'foo'\n").write(
        "ch1.adoc",
        "include::Code/src/foo.rb[bdd-repo=\"demo\",bdd-filename=\"foo.rb\",bdd-commit-msg=\"add foo\",bdd-tag=\"v1\"]\n",
    );

    let mut vcs = RecordingVcs::default();
    let report = book
        .builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        vcs.timeline(),
        vec!["init demo", "add foo.rb", "commit add foo", "tag v1"]
    );
    assert_eq!(book.repo_file("demo", "foo.rb"), "puts 'foo'\n");
    assert_eq!(report.commits, 1);
    assert_eq!(report.tags, vec!["v1"]);
    assert!(report.failed_commands.is_empty());
}

#[test]
fn grouping_commits_after_the_second_directive_and_tags_at_the_end() {
    let book = Book::new();
    for f in ["a", "b", "c"] {
        book.write(&format!("Code/{f}"), f);
    }
    book.write(
        "ch1.adoc",
        &[step("a", "M1", "T1"), step("b", "M1", "T1"), step("c", "M2", "T1")].concat(),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        vcs.timeline(),
        vec![
            "init demo",
            "add a",
            "add b",
            "commit M1",
            "add c",
            "commit M2",
            "tag T1",
        ]
    );
    assert_eq!(vcs.tags(), vec!["T1"]);
}

#[test]
fn tags_land_after_their_commits_and_before_the_next_group() {
    let book = Book::new();
    for f in ["a", "b", "c"] {
        book.write(&format!("Code/{f}"), f);
    }
    book.write(
        "ch1.adoc",
        &[step("a", "M1", "T1"), step("b", "M2", "T1"), step("c", "M3", "T2")].concat(),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        vcs.timeline(),
        vec![
            "init demo",
            "add a",
            "commit M1",
            "add b",
            "commit M2",
            "tag T1",
            "add c",
            "commit M3",
            "tag T2",
        ]
    );
}

#[test]
fn commit_dates_strictly_increase() {
    let book = Book::new();
    for f in ["a", "b", "c"] {
        book.write(&format!("Code/{f}"), f);
    }
    book.write(
        "ch1.adoc",
        &[step("a", "M1", "T1"), step("b", "M2", "T1"), step("c", "M3", "T1")].concat(),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    let dates: Vec<i64> = vcs
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Commit { when, .. } => Some(*when),
            _ => None,
        })
        .collect();
    assert_eq!(dates, vec![1_000, 1_001, 1_002]);
}

#[test]
fn documentation_files_are_read_in_name_order() {
    let book = Book::new();
    book.write("Code/a", "a").write("Code/b", "b");
    book.write("02-second.adoc", &step("b", "second", "T"));
    book.write("01-first.adoc", &step("a", "first", "T"));
    book.write("notes.txt", &step("a", "ignored", "T"));

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(vcs.commits(), vec!["first", "second"]);
}

#[test]
fn regions_are_filtered_into_the_repository() {
    let book = Book::new();
    book.write(
        "Code/greeter.rb",
        "class Greeter\n  # tag::greet::\n  def greet; end\n  # end::greet::\n  # tag::other::\n  def other; end\n  # end::other::\nend\n",
    );
    book.write(
        "ch1.adoc",
        &directive(
            "Code/greeter.rb",
            &[
                ("repo", "demo"),
                ("filename", "lib/greeter.rb"),
                ("commit-msg", "greet"),
                ("include-tags", "greet"),
            ],
        ),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        book.repo_file("demo", "lib/greeter.rb"),
        "class Greeter\n  def greet; end\nend\n"
    );
}

#[test]
fn nested_region_aborts_the_run() {
    let book = Book::new();
    book.write("Code/x.rb", "# tag::a::\n# tag::b::\n# end::b::\n# end::a::\n");
    book.write(
        "ch1.adoc",
        &directive(
            "Code/x.rb",
            &[("repo", "demo"), ("filename", "x.rb"), ("commit-msg", "x"), ("include-tags", "a")],
        ),
    );

    let mut vcs = RecordingVcs::default();
    let mut builder = book.builder(book.options());
    let err = builder.build(&mut vcs, &mut AssumeDefault).unwrap_err();

    let errors = match err {
        BuildError::Parse(errors) => errors,
        other => panic!("expected a parse error, got {other:?}"),
    };
    assert_eq!(
        errors[0].kind,
        adoc::ParseErrorKind::UnclosedRegion("a".to_string())
    );
    assert!(vcs.commits().is_empty());
}

#[test]
fn unterminated_region_is_a_warning() {
    let book = Book::new();
    book.write("Code/x.rb", "keep\n# tag::a::\nhidden\n");
    book.write(
        "ch1.adoc",
        &directive(
            "Code/x.rb",
            &[("repo", "demo"), ("filename", "x.rb"), ("commit-msg", "x"), ("include-tags", "b")],
        ),
    );

    let mut vcs = RecordingVcs::default();
    let report = book
        .builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(book.repo_file("demo", "x.rb"), "keep\n");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0].kind,
        adoc::ParseErrorKind::UnterminatedRegion("a".to_string())
    );
}

#[test]
fn malformed_attributes_abort_before_any_side_effect() {
    let book = Book::new();
    book.write("ch1.adoc", "include::Code/a[bdd-repo=\"demo\",broken]\n");

    let mut vcs = RecordingVcs::default();
    let err = book
        .builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap_err();

    assert!(matches!(err, BuildError::Parse(ref errors) if errors.len() == 1));
    assert!(vcs.calls.is_empty());
    assert!(!book.repos_dir.join("demo").exists());
}

#[test]
fn commands_run_in_the_repository_instead_of_copying() {
    let book = Book::new();
    book.write(
        "ch1.adoc",
        &directive(
            "Code/Gemfile",
            &[("repo", "demo"), ("command", "bundle init"), ("commit-msg", "bundle"), ("tag", "v1")],
        ),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        vcs.timeline(),
        vec!["init demo", "sh bundle init", "commit bundle", "tag v1"]
    );
}

#[test]
fn remove_actions_stage_without_copying() {
    let book = Book::new();
    book.write("Code/old.rb", "old\n");
    book.write(
        "ch1.adoc",
        &directive(
            "Code/old.rb",
            &[("repo", "demo"), ("filename", "old.rb"), ("action", "rm"), ("commit-msg", "drop old")],
        ),
    );

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(vcs.timeline(), vec!["init demo", "rm old.rb", "commit drop old"]);
    assert!(!book.repos_dir.join("demo/old.rb").exists());
}

#[test]
fn skipped_directives_do_not_stop_the_run() {
    let book = Book::new();
    book.write("Code/a", "a");
    book.write(
        "ch1.adoc",
        &[
            directive("Code/a", &[("repo", "demo"), ("commit-msg", "nothing")]),
            step("a", "M1", "T1"),
        ]
        .concat(),
    );

    let mut vcs = RecordingVcs::default();
    let report = book
        .builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(vcs.commits(), vec!["M1"]);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn repository_filter_has_no_side_effects_on_other_repositories() {
    let book = Book::new();
    book.write("Code/a", "a").write("Code/b", "b");
    book.write(
        "ch1.adoc",
        &[
            step("a", "M1", "T1"),
            directive("Code/b", &[("repo", "other"), ("filename", "b"), ("commit-msg", "M2")]),
        ]
        .concat(),
    );

    let mut options = book.options();
    options.repo_filter = Some("other".to_string());
    let mut vcs = RecordingVcs::default();
    book.builder(options)
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(vcs.timeline(), vec!["init other", "add b", "commit M2"]);
    assert!(!book.repos_dir.join("demo").exists());
}

#[test]
fn existing_first_repository_is_kept_when_declined() {
    let book = Book::new();
    book.write("Code/a", "a");
    book.write("ch1.adoc", &step("a", "M1", "T1"));
    std::fs::create_dir_all(book.repos_dir.join("demo/.git")).unwrap();
    std::fs::write(book.repos_dir.join("demo/keep.txt"), "kept").unwrap();

    let mut vcs = RecordingVcs::default();
    let mut answer = Answer(false, Vec::new());
    book.builder(book.options()).build(&mut vcs, &mut answer).unwrap();

    assert_eq!(answer.1, vec!["Drop repo and build again?"]);
    assert_eq!(vcs.timeline(), vec!["add a", "commit M1", "tag T1"]);
    assert!(book.repos_dir.join("demo/keep.txt").exists());
}

#[test]
fn existing_first_repository_is_rebuilt_when_confirmed() {
    let book = Book::new();
    book.write("Code/a", "a");
    book.write("ch1.adoc", &step("a", "M1", "T1"));
    std::fs::create_dir_all(book.repos_dir.join("demo/.git")).unwrap();
    std::fs::write(book.repos_dir.join("demo/stale.txt"), "stale").unwrap();

    let mut vcs = RecordingVcs::default();
    book.builder(book.options())
        .build(&mut vcs, &mut Answer(true, Vec::new()))
        .unwrap();

    assert_eq!(vcs.timeline(), vec!["init demo", "add a", "commit M1", "tag T1"]);
    assert!(!book.repos_dir.join("demo/stale.txt").exists());
}

#[test]
fn drop_option_rebuilds_without_asking() {
    let book = Book::new();
    book.write("Code/a", "a");
    book.write("ch1.adoc", &step("a", "M1", "T1"));
    std::fs::create_dir_all(book.repos_dir.join("demo/.git")).unwrap();

    let mut options = book.options();
    options.drop = true;
    let mut vcs = RecordingVcs::default();
    let mut answer = Answer(false, Vec::new());
    book.builder(options).build(&mut vcs, &mut answer).unwrap();

    assert!(answer.1.is_empty());
    assert_eq!(vcs.timeline()[0], "init demo");
}

#[test]
fn only_the_first_repository_may_be_dropped() {
    let book = Book::new();
    book.write("Code/a", "a").write("Code/b", "b");
    book.write(
        "ch1.adoc",
        &[
            step("a", "M1", "T1"),
            directive("Code/b", &[("repo", "second"), ("filename", "b"), ("commit-msg", "M2")]),
        ]
        .concat(),
    );
    std::fs::create_dir_all(book.repos_dir.join("second/.git")).unwrap();

    let mut vcs = RecordingVcs::default();
    let mut answer = Answer(true, Vec::new());
    book.builder(book.options()).build(&mut vcs, &mut answer).unwrap();

    assert!(answer.1.is_empty());
    assert_eq!(
        vcs.timeline(),
        vec!["init demo", "add a", "commit M1", "tag T1", "add b", "commit M2"]
    );
}

#[test]
fn diffs_are_written_next_to_the_fragment() {
    let book = Book::new();
    book.write("Code/ch1/a.rb", "a2\n");
    book.write("ch1.adoc", &step("ch1/a.rb", "M1", "T1"));

    let compact = "diff --git a.rb a.rb\n--- a.rb\n+++ a.rb\n@@ -1 +1 @@\n-a1\n+a2\n";
    let full = "diff --git a.rb a.rb\n--- a.rb\n+++ a.rb\n@@ -1,1 +1,1 @@\n-a1\n+a2\n";
    let mut vcs = RecordingVcs {
        diffs: Some((CommandOutput::ok(compact), CommandOutput::ok(full))),
        ..RecordingVcs::default()
    };
    let mut options = book.options();
    options.generate_diffs = true;
    let report = book.builder(options).build(&mut vcs, &mut AssumeDefault).unwrap();

    let read = |p: &str| std::fs::read_to_string(book.book_dir.join(p)).unwrap();
    assert_eq!(read("Compact/ch1/a.rb"), compact);
    assert_eq!(read("Full/ch1/a.rb"), full);
    assert_eq!(report.diffs.len(), 2);
    assert!(vcs.calls.contains(&Call::Diff {
        repo: "demo".to_string(),
        context: Some(1000)
    }));
}

#[test]
fn new_files_and_missing_history_produce_no_diff() {
    let book = Book::new();
    book.write("Code/a.rb", "a\n");
    book.write("ch1.adoc", &step("a.rb", "M1", "T1"));

    let new_file = "diff --git a.rb a.rb\nnew file mode 100644\n--- /dev/null\n+++ a.rb\n";
    let mut options = book.options();
    options.generate_diffs = true;

    let mut vcs = RecordingVcs {
        diffs: Some((CommandOutput::ok(new_file), CommandOutput::ok(new_file))),
        ..RecordingVcs::default()
    };
    let report = book
        .builder(options.clone())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();
    assert!(report.diffs.is_empty());

    let mut vcs = RecordingVcs::default();
    let report = book.builder(options).build(&mut vcs, &mut AssumeDefault).unwrap();
    assert!(report.diffs.is_empty());
    assert!(!book.book_dir.join("Full").exists());
}

#[test]
fn missing_book_directory_is_an_error() {
    let book = Book::new();
    let mut options = book.options();
    options.book_dir = book.book_dir.join("nope");
    let err = book
        .builder(options)
        .build(&mut RecordingVcs::default(), &mut AssumeDefault)
        .unwrap_err();
    assert!(matches!(err, BuildError::MissingDirectory(_)));
}

#[test]
fn shared_tag_lands_on_each_repository_after_its_last_commit() {
    let book = Book::new();
    book.write("Code/a", "a").write("Code/b", "b").write("Code/c", "c");
    let step = |repo: &str, file: &str, msg: &str| {
        directive(
            &format!("Code/{file}"),
            &[("repo", repo), ("filename", file), ("commit-msg", msg), ("tag", "chapter-1")],
        )
    };
    book.write(
        "ch1.adoc",
        &[step("api", "a", "M1"), step("web", "b", "M2"), step("api", "c", "M3")].concat(),
    );

    let mut vcs = RecordingVcs::default();
    let report = book
        .builder(book.options())
        .build(&mut vcs, &mut AssumeDefault)
        .unwrap();

    assert_eq!(
        vcs.timeline(),
        vec![
            "init api",
            "add a",
            "commit Chapter 1 - M1",
            "init web",
            "add b",
            "commit Chapter 1 - M2",
            "add c",
            "commit Chapter 1 - M3",
            "tag chapter-1",
            "tag chapter-1",
        ]
    );
    let tagged: Vec<&str> = vcs
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Tag { repo, .. } => Some(repo.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(tagged, vec!["api", "web"]);
    assert_eq!(report.tags, vec!["chapter-1", "chapter-1"]);
}
