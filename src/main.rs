use anyhow::Result;
use console::{Term, style};
use frame_timeline::ProcessingOrchestrator;
use frame_timeline::config::{Config, DEFAULT_CONFIG_FILE, VariantFilter};
use frame_timeline::init;
use frame_timeline::menu::show_main_menu;
use frame_timeline::signal::setup_shutdown_signal;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal()?;

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
    let config = Config::load(&config_path)?;
    let orchestrator = ProcessingOrchestrator::new(config, Arc::clone(&shutdown_signal))?.with_progress();
    let mut filter = VariantFilter::default();

    loop {
        match show_main_menu(&term, &shutdown_signal, &orchestrator, &mut filter) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("Goodbye").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("Error:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
