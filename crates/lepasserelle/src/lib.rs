// lepasserelle - Bridge & Integration
//
// *La Passerelle* (The Bridge) - Engine orchestration, configuration and the leverbe CLI

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Orchestration layer of LeVerbe.
//!
//! [`LeVerbe`] loads a dataset through a collection store, keeps the derived
//! registry, pattern, annotation cache, indices and search documents in step
//! with it, and answers annotation, reference, lexicon and search requests.

/// Command-line interface.
pub mod cli;
/// Engine configuration.
pub mod config;
/// Error taxonomy.
pub mod errors;
/// Engine orchestration.
pub mod leverbe;

pub use config::{CacheConfig, EngineConfig, ReadingConfig};
pub use errors::{format_error, LeVerbeError, Result};
pub use leverbe::{ChapterReport, EngineStats, LeVerbe, LexiconReport, RefLookup, VerseReport, VerseView};

/// Bridge library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
