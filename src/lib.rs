pub mod client;
pub mod config;
pub mod deploy;
pub mod logging;
pub mod report;
pub mod splitter;

pub use client::{classify, EndpointStrategy, Outcome, SqlClient, Submission};
pub use config::{Config, ConfigError};
pub use deploy::{run, DeployError, Tally};
pub use splitter::{split_statements, LineStatements, SplitMode};
