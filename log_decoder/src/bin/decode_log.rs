use anyhow::Result;
use clap::Parser;
use log_decoder::app::{self, AppConfig, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    app::init_tracing();
    let config = AppConfig::from(args);
    let report = app::run(&config)?;
    println!("{}", report.render(config.report)?);
    Ok(())
}
