use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use schema_deploy::config::Config;
use schema_deploy::{deploy, logging};

#[derive(Parser, Debug)]
#[command(name = "schema-deploy")]
#[command(version)]
#[command(about = "Split a SQL schema file and execute each statement through the database REST API")]
#[command(long_about = "Split a SQL schema file and execute each statement through the database REST API.

Connection settings come from the environment (or a .env file):
  SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY, SUPABASE_API_KEY,
  DEPLOY_ENDPOINT (rpc|rest), DEPLOY_RPC_FUNCTION, DEPLOY_SQL_FIELD,
  DEPLOY_TIMEOUT_MS, SQL_SPLIT_MODE (line|quoted), PREVIEW_WIDTH,
  RUST_LOG, ENABLE_FILE_LOGS, LOG_DIR

Failed statements are reported but do not change the exit status.")]
struct Args {
    /// Schema file to deploy (overrides SCHEMA_FILE, default schema.sql)
    #[arg(value_name = "SCHEMA_FILE")]
    schema_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _ = dotenvy::dotenv();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = args.schema_file {
        config.schema_path = path;
    }

    let _log_guard = logging::init_tracing(&config);
    tracing::debug!(?config, "configuration loaded");

    ExitCode::from(deploy::run_for_exit_status(&config, std::io::stdout()).await)
}
