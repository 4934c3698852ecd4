use clap::Parser;
use heel::LogLevel;
use heel::core::config::{self, CliOverrides, EnvOverrides};
use heel::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "heel", about = "AI dog training expert for the terminal")]
struct Args {
    /// Model to use (overrides HEEL_MODEL and the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Response creativity from 0.0 (factual) to 1.0 (creative)
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Attempts per question when a reply can't be read (1-5)
    #[arg(short, long)]
    retries: Option<u8>,

    /// Verbosity of heel.log
    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to heel.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("heel.log") {
        let _ = WriteLogger::init(LevelFilter::from(args.log_level), log_config, log_file);
    }

    let file_config = config::load_config().map_err(|e| {
        log::error!("{e}");
        std::io::Error::other(e)
    })?;
    let cli = CliOverrides {
        model: args.model,
        temperature: args.temperature,
        max_retries: args.retries,
    };
    let resolved = config::resolve(&file_config, &EnvOverrides::from_env(), &cli);

    log::info!("Heel starting up: {:?}", resolved);

    tui::run(resolved)
}
