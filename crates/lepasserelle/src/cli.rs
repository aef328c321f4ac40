// CLI Interface
//
// This module provides the command-line interface for LeVerbe.

use crate::config::EngineConfig;
use crate::errors::format_error;
use crate::leverbe::{LeVerbe, RefLookup, VerseReport};
use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use lerecherche::{SearchFilter, TestamentFilter};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// LeVerbe - Scripture Reference Annotation and Search
#[derive(Parser, Debug)]
#[command(name = "leverbe")]
#[command(author = "LeVerbe Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Annotate notes with Scripture references, look up what cites a verse, and search", long_about = None)]
pub struct Cli {
    /// Path to the data directory
    #[arg(global = true, long = "data", short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(global = true, long = "json")]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the annotation of an entry
    Annotate {
        /// Entry id
        #[arg(value_name = "ENTRY_ID")]
        entry_id: String,
    },

    /// List entries citing a verse or chapter
    Refs {
        /// Verse key (500-3-16), chapter key (500-3) or citation (Joh 3,16)
        #[arg(value_name = "TARGET")]
        target: String,
    },

    /// Show a lexicon entry and its occurrences
    Lexicon {
        /// Lexicon id such as G26 or H430
        #[arg(value_name = "ID")]
        id: String,

        /// Restrict occurrences to one translation
        #[arg(long = "translation", short = 't')]
        translation: Option<String>,
    },

    /// Search verses and entries
    Search {
        /// Search query (`+required -excluded "a phrase" optional`)
        #[arg(value_name = "QUERY")]
        query: String,

        /// all, bible, or an entry type (note, journal, book_note, chapter_note, sermon)
        #[arg(long = "filter", default_value = "all")]
        filter: SearchFilter,

        /// Restrict Bible results to a testament (all, old, new)
        #[arg(long = "testament")]
        testament: Option<TestamentFilter>,

        /// Result page, starting at 1
        #[arg(long = "page", default_value = "1")]
        page: usize,
    },

    /// Print the verses of a citation list
    Verses {
        /// Citation list such as "Joh 3,16-18; Röm 8,1"
        #[arg(value_name = "CITATION")]
        citation: String,
    },

    /// Show dataset and index statistics
    Stats,

    /// Write the effective configuration to .leverbe/config.toml
    InitConfig,
}

impl Cli {
    /// Run the CLI
    pub fn run(self) -> AnyhowResult<()> {
        init_logging_impl(self.verbose);

        let data_dir = get_data_dir(self.data_dir)?;
        if let Commands::InitConfig = self.command {
            return cmd_init_config_impl(&data_dir);
        }

        info!("Opening data directory: {}", data_dir.display());
        let mut leverbe = LeVerbe::open(&data_dir)
            .map_err(|e| anyhow::anyhow!(format_error(&e)))
            .context("Failed to open data directory")?;

        let output = Output { json: self.json };
        match self.command {
            Commands::Annotate { entry_id } => cmd_annotate_impl(&mut leverbe, &entry_id, output),
            Commands::Refs { target } => cmd_refs_impl(&leverbe, &target, output),
            Commands::Lexicon { id, translation } => cmd_lexicon_impl(&leverbe, &id, translation.as_deref(), output),
            Commands::Search {
                query,
                filter,
                testament,
                page,
            } => cmd_search_impl(&leverbe, &query, effective_filter(filter, testament), page, output),
            Commands::Verses { citation } => cmd_verses_impl(&leverbe, &citation, output),
            Commands::Stats => cmd_stats_impl(&leverbe, output),
            Commands::InitConfig => Ok(()),
        }
    }
}

/// Combine `--filter` and `--testament`; a testament always implies a Bible search
pub fn effective_filter(filter: SearchFilter, testament: Option<TestamentFilter>) -> SearchFilter {
    match testament {
        Some(testament) => SearchFilter::Bible(testament),
        None => filter,
    }
}

/// Initialize logging implementation
fn init_logging_impl(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Get data directory from explicit path or current directory
fn get_data_dir(explicit: Option<PathBuf>) -> AnyhowResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Print as JSON, or fall back to the given text renderer
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> AnyhowResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
        } else {
            text(value);
        }
        Ok(())
    }
}

fn engine_error(e: crate::errors::LeVerbeError) -> anyhow::Error {
    anyhow::anyhow!(format_error(&e))
}

/// Annotate command implementation
fn cmd_annotate_impl(leverbe: &mut LeVerbe, entry_id: &str, output: Output) -> AnyhowResult<()> {
    let bundle = leverbe.annotate(entry_id).map_err(engine_error)?;
    output.emit(bundle.as_ref(), |bundle| {
        let annotation = &bundle.annotation;
        println!("\n{} ({})\n", bundle.label.reference, bundle.label.link);
        println!("{}\n", annotation.processed_content);
        println!("Verses: {}", annotation.internal_links.len());
        for link in &annotation.internal_links {
            println!("  {} <- \"{}\"", link.key, link.matched_text);
        }
        println!("Chapters: {}", annotation.chapter_links.len());
        for link in &annotation.chapter_links {
            println!("  {} <- \"{}\"", link.key, link.matched_text);
        }
        println!("Lexicon: {}", annotation.lexicon_mentions.len());
        for mention in &annotation.lexicon_mentions {
            println!("  {} <- \"{}\"", mention.id, mention.matched_text);
        }
        println!("Dictionary: {}", annotation.dictionary_mentions.len());
        for mention in &annotation.dictionary_mentions {
            println!("  {}/{} <- \"{}\"", mention.source, mention.topic, mention.matched_text);
        }
        println!("Media: {}, resources: {}", annotation.media.len(), annotation.resources.len());
    })
}

/// Refs command implementation
fn cmd_refs_impl(leverbe: &LeVerbe, target: &str, output: Output) -> AnyhowResult<()> {
    let lookup = leverbe.refs(target).map_err(engine_error)?;
    output.emit(&lookup, |lookup| match lookup {
        RefLookup::Verses { verses } => verses.iter().for_each(print_verse_report),
        RefLookup::Chapter(chapter) => {
            println!("\n{} ({} entries)", chapter.reference, chapter.entries.len());
            for record in &chapter.entries {
                println!("  {} [{}]  {}", record.reference, record.link, record.snippet);
            }
        }
    })
}

fn print_verse_report(report: &VerseReport) {
    println!("\n{}  {}", report.verse.reference, report.verse.text);
    println!("  Entries: {}", report.entries.len());
    for record in &report.entries {
        println!("    {} [{}]  {}", record.reference, record.link, record.snippet);
    }
    if !report.sermons.is_empty() {
        println!("  Sermons: {}", report.sermons.len());
        for record in &report.sermons {
            println!("    {} [{}]", record.reference, record.link);
        }
    }
}

/// Lexicon command implementation
fn cmd_lexicon_impl(leverbe: &LeVerbe, id: &str, translation: Option<&str>, output: Output) -> AnyhowResult<()> {
    let report = leverbe.lexicon(id, translation).map_err(engine_error)?;
    output.emit(&report, |report| {
        match &report.entry {
            Some(entry) => println!("\n{} {} ({})", report.id, entry.lexeme, entry.transliteration),
            None => println!("\n{} (no lexicon entry)", report.id),
        }
        if report.occurrences.is_empty() {
            println!("No occurrences");
        }
        for (translation, keys) in &report.occurrences {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            println!("  {translation}: {} verse(s): {}", keys.len(), keys.join(", "));
        }
    })
}

/// Search command implementation
fn cmd_search_impl(leverbe: &LeVerbe, query: &str, filter: SearchFilter, page: usize, output: Output) -> AnyhowResult<()> {
    let results = leverbe.search(query, filter, page).map_err(engine_error)?;
    output.emit(&results, |results| {
        if results.total == 0 {
            println!("No results found for: {}", query);
            return;
        }
        println!(
            "\nFound {} result(s) for: '{}' (page {} of {})\n",
            results.total,
            query,
            results.page,
            results.total_pages()
        );
        for (i, hit) in results.hits.iter().enumerate() {
            println!("{}. {} ({})", (results.page - 1) * results.page_size + i + 1, hit.reference, hit.link);
            println!("   {}", hit.snippet);
        }
    })
}

/// Verses command implementation
fn cmd_verses_impl(leverbe: &LeVerbe, citation: &str, output: Output) -> AnyhowResult<()> {
    let verses = leverbe.verses(citation).map_err(engine_error)?;
    output.emit(&verses, |verses| {
        for verse in verses {
            println!("{}  {}", verse.reference, verse.text);
        }
    })
}

/// Stats command implementation
fn cmd_stats_impl(leverbe: &LeVerbe, output: Output) -> AnyhowResult<()> {
    let stats = leverbe.stats();
    output.emit(&stats, |stats| {
        println!("\nLeVerbe Statistics\n");
        println!("Dataset:");
        println!("  Books: {}", stats.books);
        println!("  Translations: {}", stats.translations);
        println!("  Entries: {}", stats.entries);
        println!("  Search documents: {}", stats.search_documents);
        println!("\nIndex:");
        println!("  Indexed entries: {}", stats.index.entries);
        println!("  Verse buckets: {}", stats.index.verse_buckets);
        println!("  Chapter buckets: {}", stats.index.chapter_buckets);
        println!("  Sermon buckets: {}", stats.index.sermon_buckets);
        println!("  Lexicon ids: {} in {} translation(s)", stats.index.lexicon_ids, stats.index.lexicon_translations);
        println!("  Dictionary words: {}", stats.index.dictionary_words);
        println!("\nAnnotation Cache:");
        println!("  Entries: {} / {}", stats.cache.entries, stats.cache.capacity);
        println!("  Hits: {}, misses: {}", stats.cache.hits, stats.cache.misses);
    })
}

/// Init-config command implementation
fn cmd_init_config_impl(data_dir: &std::path::Path) -> AnyhowResult<()> {
    let config = EngineConfig::load(data_dir)?;
    config.save(data_dir)?;
    println!("Wrote {}", data_dir.join(crate::config::DEFAULT_CONFIG_FILE).display());
    Ok(())
}
