use clap::{Parser, Subcommand};
use kopi_core::config::DEFAULT_CONFIG_FILE;
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod analyze;
mod calibrate;
mod render;

#[derive(Parser)]
#[command(name = "kopi")]
#[command(
    about = "Fears/frustrations/optimism sentiment trends: calibration, momentum and velocity alerts."
)]
struct Cli {
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analytics report from a directory of period reports.
    Analyze {
        #[arg(long, value_name = "MODE", default_value = "daily")]
        mode: String,
        #[arg(long, value_name = "DIR")]
        data_dir: PathBuf,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Recompute intensity z-scores from daily reports.
    Calibrate {
        #[arg(long, value_name = "DIR")]
        data_dir: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Render an analytics report as Markdown.
    Render {
        #[arg(value_name = "REPORT")]
        report: PathBuf,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },
    ValidateConfig,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{}", err.message());
        process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> AppResult<()> {
    validate_log_level(&cli.log_level)?;
    validate_log_format(&cli.log_format)?;
    init_tracing(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Analyze {
            mode,
            data_dir,
            out,
            overwrite,
        } => {
            let config = AnalyticsConfig::load(cli.config.as_deref())?;
            analyze::analyze_command(&config, &mode, &data_dir, out, overwrite)
        }
        Commands::Calibrate { data_dir, dry_run } => {
            let config_path = cli
                .config
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            calibrate::calibrate_command(&data_dir, &config_path, dry_run)
        }
        Commands::Render {
            report,
            out,
            overwrite,
        } => render::render_command(&report, out, overwrite),
        Commands::ValidateConfig => {
            let config = AnalyticsConfig::load(cli.config.as_deref())?;
            println!("config ok (config_hash {})", config.config_hash()?);
            Ok(())
        }
    }
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let result = match format {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    if let Err(err) = result {
        eprintln!("tracing already initialized: {err}");
    }
}

fn validate_log_level(value: &str) -> AppResult<()> {
    match value {
        "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
        _ => Err(AppError::usage(format!(
            "invalid --log-level '{value}'; expected error|warn|info|debug|trace"
        ))),
    }
}

fn validate_log_format(value: &str) -> AppResult<()> {
    match value {
        "text" | "json" => Ok(()),
        _ => Err(AppError::usage(format!(
            "invalid --log-format '{value}'; expected text|json"
        ))),
    }
}
