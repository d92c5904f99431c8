use std::io::{self, Write};

use crate::client::{Outcome, Submission};
use crate::deploy::Tally;

const RULE_WIDTH: usize = 70;
const ERROR_PREVIEW_CHARS: usize = 50;

/// Console rendering of a deployment run.
pub struct Reporter<W: Write> {
    out: W,
    preview_width: usize,
    total: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, preview_width: usize) -> Self {
        Self {
            out,
            preview_width,
            total: 0,
        }
    }

    pub fn banner(&mut self, project_ref: Option<&str>, total: usize) -> io::Result<()> {
        self.total = total;
        writeln!(self.out, "🚀 Schema Deployment")?;
        if let Some(project) = project_ref {
            writeln!(self.out, "📍 Project: {project}")?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "📝 {total} SQL statements found")?;
        writeln!(self.out)?;
        self.rule()
    }

    /// Writes the progress prefix; the glyph follows once the request completes.
    pub fn progress(&mut self, index: usize, statement: &str) -> io::Result<()> {
        let width = self.preview_width;
        write!(
            self.out,
            "[{index:>2}/{total}] {preview:<width$} ",
            total = self.total,
            preview = preview(statement, width),
        )?;
        self.out.flush()
    }

    pub fn result(&mut self, submission: &Submission) -> io::Result<()> {
        match submission.outcome {
            Outcome::Success => writeln!(self.out, "✅"),
            Outcome::AlreadyExists => writeln!(self.out, "⚠️  (exists)"),
            Outcome::Failure => {
                writeln!(self.out, "❌")?;
                if submission.status.is_server_error() {
                    writeln!(self.out, "       Server error: {}", submission.status.as_u16())
                } else {
                    writeln!(
                        self.out,
                        "       Error: {}",
                        truncate_chars(&submission.body, ERROR_PREVIEW_CHARS)
                    )
                }
            }
        }
    }

    pub fn summary(&mut self, tally: &Tally) -> io::Result<()> {
        self.rule()?;
        writeln!(self.out)?;
        writeln!(self.out, "✅ Success: {}/{}", tally.successes(), tally.total)?;
        if tally.failed > 0 {
            writeln!(self.out, "❌ Failed: {}", tally.failed)?;
            writeln!(
                self.out,
                "⚠️  Some statements failed. This might be due to existing objects."
            )?;
        }
        writeln!(self.out, "🎉 Schema deployment completed!")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn rule(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))
    }
}

/// First line of the statement, cut to `width` characters.
pub fn preview(statement: &str, width: usize) -> &str {
    let first = statement.lines().next().unwrap_or("");
    truncate_chars(first, width)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
