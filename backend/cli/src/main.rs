use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tracing::debug;

use sentinel::{config::parse_level, kv, Config, Logger, RequestContext};

#[derive(Parser, Debug, Default)]
#[command(name = "sentinel-demo")]
#[command(about = "Emit a sample of structured log records through Sentinel")]
#[command(version)]
struct Cli {
    /// YAML config file; SENTINEL_* environment variables are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum level (debug, info, warn, error)
    #[arg(short, long)]
    level: Option<String>,

    /// Emit JSON lines instead of key=value text
    #[arg(long)]
    json: bool,

    /// stdout, stderr or a file path
    #[arg(short, long)]
    output: Option<String>,

    /// Service name attached to every record
    #[arg(short, long)]
    service: Option<String>,

    /// Number of concurrent request tasks
    #[arg(short, long, default_value_t = 1)]
    workers: usize,
}

/// Defaults, then the config file or environment, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load logging config: {}", path.display()))?,
        None => Config::from_env(),
    };

    if let Some(level) = &cli.level {
        config.level = parse_level(level)?;
    }
    if cli.json {
        config.json_output = true;
    }
    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    }
    if let Some(service) = &cli.service {
        config.service_name = service.clone();
    }
    Ok(config)
}

/// Log one request per worker, each under its own trace id.
async fn run_requests(log: &Logger, workers: usize) -> Result<usize> {
    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        let log = log.clone();
        tasks.spawn(async move {
            let ctx = RequestContext::new().with_trace_id(uuid::Uuid::new_v4().to_string());
            let log = log.with_context(&ctx).with(&kv!["worker", worker]);
            log.debug("Request received", &[]);
            log.info("Processing request", &kv!["items", worker * 10]);
        });
    }

    let mut completed = 0;
    while let Some(joined) = tasks.join_next().await {
        joined.context("Request task panicked")?;
        completed += 1;
    }
    Ok(completed)
}

#[tokio::main]
async fn main() -> Result<()> {
    sentinel::init_tracing("warn", false);

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let log = Logger::new(config).context("Failed to build logger")?;

    log.info("Server starting", &kv!["port", 8080]);

    let log = log.with(&kv!["environment", "production", "version", env!("CARGO_PKG_VERSION")]);

    let err = std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "database connection failed",
    );
    log.with_error(Some(&err)).error("Failed to connect to database", &[]);

    let completed = run_requests(&log, cli.workers.max(1)).await?;
    debug!(completed, "Demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> PathBuf {
        std::env::temp_dir().join(format!("sentinel-demo-{}.log", uuid::Uuid::new_v4()))
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli {
            level: Some("debug".to_string()),
            json: true,
            output: Some("stderr".to_string()),
            service: Some("svc".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.level, sentinel::Level::DEBUG);
        assert!(config.json_output);
        assert_eq!(config.output_path, "stderr");
        assert_eq!(config.service_name, "svc");
    }

    #[test]
    fn bad_level_flag_is_rejected() {
        let cli = Cli {
            level: Some("chatty".to_string()),
            ..Default::default()
        };
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli {
            config: Some(temp_log().with_extension("yaml")),
            ..Default::default()
        };
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to load logging config"));
    }

    #[tokio::test]
    async fn each_worker_logs_with_its_own_trace_id() {
        let path = temp_log();
        let log = Logger::new(Config {
            json_output: true,
            output_path: path.to_string_lossy().into_owned(),
            service_name: "demo".to_string(),
            ..Config::default()
        })
        .unwrap();

        let completed = run_requests(&log, 4).await.unwrap();
        assert_eq!(completed, 4);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        // debug lines are filtered at the default info level
        assert_eq!(lines.len(), 4);
        let mut trace_ids: Vec<&str> = lines
            .iter()
            .map(|l| l["trace_id"].as_str().unwrap())
            .collect();
        trace_ids.sort();
        trace_ids.dedup();
        assert_eq!(trace_ids.len(), 4);
        assert!(lines.iter().all(|l| l["service"] == "demo"));
        let _ = std::fs::remove_file(path);
    }
}
