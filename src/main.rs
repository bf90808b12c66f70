//! txn-risk entrypoint: offline feature build, one-off scoring, or the HTTP service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};
use txn_risk::{
    AppContext, Artifacts, OfflineFeatureBuilder, RawRecord, ServiceConfig, StructuredLogger,
};

#[derive(Parser)]
#[command(name = "txn-risk")]
#[command(about = "Transaction fraud scoring", version)]
struct Cli {
    /// Service configuration (JSON); defaults apply when the file is absent
    #[arg(long, env = "TXN_RISK_CONFIG", default_value = "config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build train/val/test partitions, scaler and schema from raw labeled history
    Prepare {
        /// Raw transaction CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for partitions and artifacts
        #[arg(short, long, default_value = "data/processed")]
        out_dir: PathBuf,
    },

    /// Score one complete transaction record (JSON object; `-` reads stdin)
    Score {
        #[arg(short, long, default_value = "-")]
        record: String,
    },

    /// Run the HTTP service
    Serve,
}

#[derive(Serialize)]
struct ScoreOutput {
    probability: f64,
    label: u8,
    message: &'static str,
}

fn read_record(source: &str) -> Result<RawRecord> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading record from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading record from {source}"))?
    };
    serde_json::from_str(&text).context("record must be a JSON object of field → value")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = match ServiceConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (ServiceConfig::default(), Some(e)),
    };
    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = config_error {
        warn!(config = %cli.config.display(), error = %e, "invalid config; using defaults");
    }
    info!(config = %cli.config.display(), "txn-risk starting");

    match cli.command {
        Commands::Prepare { input, out_dir } => {
            let builder = OfflineFeatureBuilder::new(config.split.clone());
            let output = builder
                .build_csv(&input, &out_dir)
                .with_context(|| format!("building features from {}", input.display()))?;
            info!(
                train = output.train.len(),
                validation = output.validation.len(),
                test = output.test.len(),
                columns = output.schema.width(),
                layout_hash = %format!("{:08x}", output.schema.layout_hash()),
                "offline build complete"
            );
        }
        Commands::Score { record } => {
            let artifacts = Artifacts::load(&config.artifacts).context("loading artifacts")?;
            let record = read_record(&record)?;
            let verdict = artifacts.predict_record(&record).context("scoring record")?;
            let out = ScoreOutput {
                probability: verdict.probability,
                label: verdict.label.into(),
                message: verdict.message(),
            };
            StructuredLogger::emit_json(&out, &mut std::io::stdout().lock())
                .context("writing result")?;
        }
        Commands::Serve => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting tokio runtime")?;
            let ctx = AppContext::load(&config);
            runtime
                .block_on(txn_risk::server::serve(ctx, &config.server))
                .with_context(|| {
                    format!("serving on {}:{}", config.server.host, config.server.port)
                })?;
        }
    }
    Ok(())
}
