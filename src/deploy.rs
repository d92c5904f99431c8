use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::client::{ClientError, Outcome, SqlClient};
use crate::config::Config;
use crate::report::Reporter;
use crate::splitter::split_statements;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub succeeded: usize,
    pub already_existed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::AlreadyExists => self.already_existed += 1,
            Outcome::Failure => self.failed += 1,
        }
    }

    /// Applied statements, counting tolerated "already exists" responses.
    pub fn successes(&self) -> usize {
        self.succeeded + self.already_existed
    }
}

pub async fn load_schema(path: &Path) -> Result<String, DeployError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(DeployError::SchemaNotFound(path.to_path_buf()))
        }
        Err(source) => Err(DeployError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads, splits and submits the configured schema file, writing progress to `out`.
pub async fn run<W: Write>(config: &Config, out: W) -> Result<Tally, DeployError> {
    let schema = load_schema(&config.schema_path).await?;
    let statements = split_statements(&schema, config.split_mode);
    info!(
        path = %config.schema_path.display(),
        statements = statements.len(),
        mode = ?config.split_mode,
        "schema loaded"
    );

    let client = SqlClient::new(config)?;
    info!(url = client.url(), "submitting statements");

    let mut reporter = Reporter::new(out, config.preview_width);
    reporter.banner(config.project_ref().as_deref(), statements.len())?;
    let tally = submit_all(&client, &statements, &mut reporter).await?;
    reporter.summary(&tally)?;

    info!(
        succeeded = tally.succeeded,
        already_existed = tally.already_existed,
        failed = tally.failed,
        "deployment finished"
    );
    Ok(tally)
}

/// Process exit status of a run: 0 once the loop has run, whatever the
/// statement outcomes; 1 when the run aborted (missing schema, unreadable
/// file, client setup, broken output).
pub async fn run_for_exit_status<W: Write>(config: &Config, out: W) -> u8 {
    match run(config, out).await {
        Ok(_) => 0,
        Err(err) => {
            error!(error = %err, "deployment aborted");
            eprintln!("❌ {err}");
            1
        }
    }
}

/// Submits statements strictly in order, one request at a time. Failures are
/// recorded and never stop the loop.
pub async fn submit_all<W: Write>(
    client: &SqlClient,
    statements: &[String],
    reporter: &mut Reporter<W>,
) -> io::Result<Tally> {
    let mut tally = Tally::default();

    for (idx, stmt) in statements.iter().enumerate() {
        reporter.progress(idx + 1, stmt)?;
        let submission = client.submit(stmt).await;
        if submission.outcome == Outcome::Failure {
            warn!(
                index = idx + 1,
                status = submission.status.as_u16(),
                "statement failed"
            );
        }
        reporter.result(&submission)?;
        tally.record(submission.outcome);
    }

    Ok(tally)
}
