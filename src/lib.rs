pub mod component;
pub mod config;
pub mod error;
pub mod init;
pub mod menu;
pub mod signal;
pub mod tools;

pub use component::processing_orchestrator::{
    ProcessingOrchestrator, RunOptions, RunReport, get_frame_timestamps, get_variant_metadata,
    map_canonical_to_variant, map_variant_to_canonical,
};
pub use config::{Config, VariantFilter};
pub use error::{PipelineError, PipelineResult};

use anyhow::Result;
use console::{Term, style};

pub fn pause(term: &Term) -> Result<()> {
    println!("\n{}", style("Press Enter to continue...").dim());
    term.read_line()?;
    Ok(())
}
