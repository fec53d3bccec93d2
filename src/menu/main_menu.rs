use crate::component::ProcessingOrchestrator;
use crate::component::processing_orchestrator::RunOptions;
use crate::config::VariantFilter;
use crate::menu::handlers::{run_pipeline, run_single_video};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    orchestrator: &ProcessingOrchestrator,
    filter: &mut VariantFilter,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== Frame timeline preprocessing ===").cyan().bold());
    println!(
        "{}",
        style(format!(
            "{} videos configured, output to {}",
            orchestrator.config().videos.len(),
            orchestrator.config().output_root.display()
        ))
        .dim()
    );
    println!("{}", style("ESC to exit").dim());

    let options = vec![
        "Process all videos".to_string(),
        "Process one video".to_string(),
        "Force rebuild all videos".to_string(),
        "Validate existing artifacts".to_string(),
        format!("Variant filter: {filter}"),
        "Exit".to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select an action")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    let base = RunOptions {
        filter: *filter,
        ..RunOptions::default()
    };

    match selection {
        Some(0) => {
            run_pipeline(term, shutdown_signal, orchestrator, base)?;
            Ok(true)
        }
        Some(1) => {
            run_single_video(term, shutdown_signal, orchestrator, base)?;
            Ok(true)
        }
        Some(2) => {
            let options = RunOptions { force: true, ..base };
            run_pipeline(term, shutdown_signal, orchestrator, options)?;
            Ok(true)
        }
        Some(3) => {
            let options = RunOptions {
                validate_only: true,
                ..base
            };
            run_pipeline(term, shutdown_signal, orchestrator, options)?;
            Ok(true)
        }
        Some(4) => {
            show_filter_menu(term, filter)?;
            Ok(true)
        }
        Some(5) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// Choose which variant kinds later runs touch.
fn show_filter_menu(term: &Term, filter: &mut VariantFilter) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style("=== Variant filter ===").cyan().bold());
    println!("\n{} {}", style("Current:").dim(), filter);
    println!();

    let filters = [VariantFilter::All, VariantFilter::Full, VariantFilter::Clips];
    let items = [
        "All variants",
        "Full-length variants only",
        "Clips only",
    ];

    let default_index = filters.iter().position(|f| f == filter).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select variants to process")
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    // ESC keeps the current filter
    if let Some(selection) = selection {
        *filter = filters[selection];
    }

    Ok(())
}
