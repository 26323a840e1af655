use clap::{Parser, Subcommand};
use smart_asset_scheduler::{
    analytics::{AssetFilter, DashboardExporter, DashboardProvider, ExportFormat},
    config::{Config, ObservabilityConfig},
    error::Result,
    pipeline::{export_metrics, init_pipeline_metrics, Pipeline},
    scheduler::{init_scheduler_metrics, maintenance_pipeline_job, SchedulerService},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "smart-scheduler")]
#[command(version, about = "Predictive maintenance scheduler", long_about = None)]
struct Cli {
    /// Override file layered over the built-in defaults
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config/local.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every reading once and rewrite the schedule (default)
    Run {
        /// Sensor readings CSV
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Schedule CSV to replace
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-run the pipeline on the configured cron schedule until Ctrl+C
    Schedule,

    /// Build the dashboard from the readings and the latest schedule
    Dashboard {
        /// json or html
        #[arg(short, long)]
        format: Option<String>,

        /// Comma-separated asset ids (default: all)
        #[arg(short, long, value_delimiter = ',')]
        assets: Option<Vec<String>>,

        /// Report path (default: configured path with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::load_from(&cli.config);
    init_tracing(
        config
            .as_ref()
            .map(|c| &c.observability)
            .unwrap_or(&ObservabilityConfig::default()),
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting smart-scheduler v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        init_pipeline_metrics();
        init_scheduler_metrics();
    }

    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        output: None,
    });

    let result = match command {
        Commands::Run { input, output } => run_once(config.clone(), input, output),
        Commands::Schedule => run_scheduler(&config).await,
        Commands::Dashboard {
            format,
            assets,
            output,
        } => build_dashboard(&config, format, assets, output),
    };

    if let Some(path) = &config.observability.metrics_path {
        if let Err(e) = export_metrics(path) {
            tracing::warn!(error = %e, "Failed to export metrics");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("smart_asset_scheduler={}", observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn run_once(mut config: Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    if let Some(input) = input {
        config.pipeline.input_path = input;
    }
    if let Some(output) = output {
        config.pipeline.output_path = output;
    }

    let report = Pipeline::from_config(&config).run()?;

    tracing::info!(
        rows = report.rows,
        urgent = report.priority_counts.urgent,
        medium = report.priority_counts.medium,
        low = report.priority_counts.low,
        output = %report.output_path.display(),
        "Maintenance schedule written"
    );

    Ok(())
}

async fn run_scheduler(config: &Config) -> Result<()> {
    let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
    let job_id = scheduler.add_job(maintenance_pipeline_job(config)).await?;

    scheduler.start().await?;
    if !scheduler.is_running().await {
        tracing::warn!("Scheduler is disabled; nothing to do");
        return Ok(());
    }

    if config.scheduler.run_on_start {
        // A failed first run is logged and counted; the schedule keeps going
        if let Err(e) = scheduler.run_job_now(&job_id).await {
            tracing::warn!(error = %e, "Initial pipeline run failed");
        }
    }

    tracing::info!(schedule = %config.scheduler.schedule, "Waiting for triggers (Ctrl+C to stop)");
    tokio::signal::ctrl_c().await?;

    let stats = scheduler.get_stats().await;
    tracing::info!(
        executions = stats.total_executions,
        failures = stats.total_failures,
        "Stopping scheduler"
    );
    scheduler.shutdown().await?;

    Ok(())
}

fn build_dashboard(
    config: &Config,
    format: Option<String>,
    assets: Option<Vec<String>>,
    output: Option<PathBuf>,
) -> Result<()> {
    let format = ExportFormat::parse(format.as_deref().unwrap_or(&config.dashboard.format))?;
    let filter = assets.map(AssetFilter::only).unwrap_or_default();
    let output = output.unwrap_or_else(|| {
        config
            .dashboard
            .output_path
            .with_extension(format.extension())
    });

    let data = DashboardProvider::new(config.dashboard.top_explanations).from_files(
        &config.pipeline.input_path,
        &config.pipeline.output_path,
        &filter,
    )?;
    DashboardExporter::export(&data, format, &output)?;

    tracing::info!(
        path = %output.display(),
        format = %format,
        assets = data.assets.len(),
        "Dashboard written"
    );

    Ok(())
}
