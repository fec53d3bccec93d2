//! Pipeline components, leaf first
//!
//! Each submodule owns one step and its dedicated helpers.

pub mod frame_extractor;
pub mod processing_orchestrator;
pub mod source_normalizer;
pub mod timeline_mapper;
pub mod variant_generator;

pub use frame_extractor::FrameExtractor;
pub use processing_orchestrator::ProcessingOrchestrator;
pub use source_normalizer::SourceNormalizer;
pub use variant_generator::VariantGenerator;
