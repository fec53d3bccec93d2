use crate::component::ProcessingOrchestrator;
use crate::component::processing_orchestrator::{RunOptions, RunReport, StepOutcome};
use crate::pause;
use crate::signal::reset_shutdown_signal;
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_pipeline(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    orchestrator: &ProcessingOrchestrator,
    options: RunOptions,
) -> Result<()> {
    reset_shutdown_signal(shutdown_signal);
    let report = orchestrator.process_all(options);
    print_report(&report);

    pause(term)?;
    Ok(())
}

pub fn run_single_video(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    orchestrator: &ProcessingOrchestrator,
    options: RunOptions,
) -> Result<()> {
    let video_ids = orchestrator.config().video_ids();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a video")
        .items(&video_ids)
        .default(0)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    reset_shutdown_signal(shutdown_signal);
    match orchestrator.process_video(&video_ids[selection], options) {
        Ok(report) => print_report(&report),
        Err(e) => eprintln!("{} {}", style("Error:").red().bold(), e),
    }

    pause(term)?;
    Ok(())
}

pub fn print_report(report: &RunReport) {
    println!();
    println!("{}", style("=== Run summary ===").cyan().bold());

    for video in &report.videos {
        println!();
        println!(
            "{} (canonical: {})",
            style(&video.video_id).bold(),
            outcome_label(video.canonical)
        );
        if let Some(error) = &video.error {
            println!("  {} [{}] {}", style("failed").red(), error.kind, error.message);
        }
        for variant in &video.variants {
            match &variant.error {
                Some(error) => println!(
                    "  {:<24} {} [{}] {}",
                    variant.key,
                    outcome_label(variant.outcome),
                    error.kind,
                    error.message
                ),
                None => println!(
                    "  {:<24} {} {} frames, {:.3}s",
                    variant.key,
                    outcome_label(variant.outcome),
                    variant.frame_count.unwrap_or_default(),
                    variant.duration_seconds.unwrap_or_default()
                ),
            }
        }
    }

    let summary = report.summary();
    println!();
    println!("  Videos:    {}", summary.videos);
    println!("  Generated: {}", style(summary.generated).green());
    println!("  Skipped:   {}", style(summary.skipped).dim());
    if summary.validated > 0 {
        println!("  Validated: {}", style(summary.validated).green());
    }
    if summary.failed > 0 || summary.failed_videos > 0 {
        println!(
            "  Failed:    {} variants, {} videos",
            style(summary.failed).red(),
            style(summary.failed_videos).red()
        );
    }
    println!("  Elapsed:   {:.1}s", report.elapsed_seconds);
}

fn outcome_label(outcome: StepOutcome) -> String {
    let label = format!("{outcome:<9}");
    match outcome {
        StepOutcome::Generated | StepOutcome::Validated => style(label).green().to_string(),
        StepOutcome::Skipped => style(label).dim().to_string(),
        StepOutcome::Failed => style(label).red().to_string(),
    }
}
