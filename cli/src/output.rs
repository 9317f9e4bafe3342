//! Colored terminal output for the build summary and prompts.

use console::{Style, Term};

use builder::Confirm;

pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    bold: Style,
}

impl Output {
    pub(crate) fn new(no_color: bool) -> Self {
        if no_color {
            console::set_colors_enabled_stderr(false);
        }
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            bold: Style::new().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    pub(crate) fn heading(&self, msg: &str) {
        let _ = self.term.write_line(&self.bold.apply_to(msg).to_string());
    }
}

/// Asks on the terminal. Without one (piped input, CI) every question
/// gets its default answer.
pub(crate) struct TerminalConfirm {
    term: Term,
}

impl TerminalConfirm {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, question: &str, default: bool) -> bool {
        if !self.term.is_term() {
            return default;
        }
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        if self.term.write_str(&format!("{question} {hint} ")).is_err() {
            return default;
        }
        match self.term.read_line() {
            Ok(answer) => match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => true,
                "n" | "no" => false,
                _ => default,
            },
            Err(_) => default,
        }
    }
}
