//! Roundmem CLI - inspect and update per-subject discussion memory
//!
//! The `roundmem` command works directly on a data directory of memory
//! records. It runs without a summarizer, so compression only trims old
//! rounds and key points use the local fallback.
//!
//! ## Commands
//!
//! - `list`: List subjects with stored memory
//! - `show`: Print a subject's memory record as JSON
//! - `context`: Print the context assembled for a query
//! - `record`: Record a finished discussion round
//! - `fact`: Add a fact to a subject
//! - `key-points`: Condense agent contributions into key points
//! - `delete`: Delete a subject's memory

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

use roundmem_core::{DiscussionInput, EntryKind, MemoryConfig, MemoryEntry, MemoryManager};

/// Keywords stored with a fact added from the command line.
const FACT_KEYWORDS: usize = 10;

#[derive(Parser)]
#[command(name = "roundmem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bounded conversational memory per discussion subject", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding memory records
    #[arg(long, global = true, env = "ROUNDMEM_DATA_DIR", default_value = ".roundmem")]
    data_dir: PathBuf,

    /// Rounds kept verbatim after compression
    #[arg(long, global = true, env = "ROUNDMEM_MAX_RECENT_ROUNDS", default_value_t = 3)]
    max_recent_rounds: usize,

    /// Facts kept per subject
    #[arg(long, global = true, env = "ROUNDMEM_MAX_KEY_FACTS", default_value_t = 20)]
    max_key_facts: usize,

    /// Character budget for the running summary
    #[arg(long, global = true, env = "ROUNDMEM_MAX_SUMMARY_LENGTH", default_value_t = 300)]
    max_summary_length: usize,

    /// Recent-round count that triggers compression
    #[arg(long, global = true, env = "ROUNDMEM_COMPRESS_THRESHOLD", default_value_t = 5)]
    compress_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> MemoryConfig {
        MemoryConfig::default()
            .with_max_recent_rounds(self.max_recent_rounds)
            .with_max_key_facts(self.max_key_facts)
            .with_max_summary_length(self.max_summary_length)
            .with_compress_threshold(self.compress_threshold)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List subjects with stored memory
    List,

    /// Print a subject's memory record as JSON
    Show {
        /// Subject code
        code: String,
    },

    /// Print the context assembled for a query
    Context {
        /// Subject code
        code: String,

        /// The new query
        query: String,
    },

    /// Record a finished discussion round
    Record {
        /// Subject code
        code: String,

        /// Display name used if the subject is new
        #[arg(short, long, default_value = "")]
        name: String,

        /// The question discussed
        #[arg(short, long)]
        query: String,

        /// Conclusion the round reached
        #[arg(short, long)]
        consensus: String,

        /// Key point (repeatable)
        #[arg(short, long = "point")]
        points: Vec<String>,
    },

    /// Add a fact to a subject
    Fact {
        /// Subject code
        code: String,

        /// Display name used if the subject is new
        #[arg(short, long, default_value = "")]
        name: String,

        /// Fact text
        #[arg(short, long)]
        content: String,

        /// Agent the fact came from
        #[arg(short, long, default_value = "user")]
        source: String,

        /// fact, opinion or decision
        #[arg(short, long, default_value = "fact")]
        kind: String,

        /// Importance between 0 and 1
        #[arg(short, long, default_value_t = 0.5)]
        weight: f64,
    },

    /// Condense agent contributions into key points
    KeyPoints {
        /// Contribution as `agent=content` (repeatable)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<String>,
    },

    /// Delete a subject's memory
    Delete {
        /// Subject code
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    roundmem_core::init_tracing(cli.json, level);

    let manager = MemoryManager::with_config(&cli.data_dir, cli.config())
        .with_context(|| format!("Failed to open memory store at {:?}", cli.data_dir))?;

    let result = match cli.command {
        Commands::List => cmd_list(&manager),
        Commands::Show { code } => cmd_show(&manager, &code),
        Commands::Context { code, query } => cmd_context(&manager, &code, &query),
        Commands::Record {
            code,
            name,
            query,
            consensus,
            points,
        } => cmd_record(&manager, &code, &name, &query, &consensus, points).await,
        Commands::Fact {
            code,
            name,
            content,
            source,
            kind,
            weight,
        } => cmd_fact(&manager, &code, &name, &content, &source, &kind, weight),
        Commands::KeyPoints { inputs } => cmd_key_points(&manager, &inputs).await,
        Commands::Delete { code } => cmd_delete(&manager, &code),
    };

    manager.close();
    roundmem_core::METRICS.flush();
    result
}

/// List subjects with stored memory
fn cmd_list(manager: &MemoryManager) -> Result<()> {
    let codes = manager.list_memories().context("Failed to list memories")?;

    if codes.is_empty() {
        println!("No memories stored.");
        return Ok(());
    }

    for code in codes {
        println!("{}", code);
    }

    Ok(())
}

/// Print a subject's memory record
fn cmd_show(manager: &MemoryManager, code: &str) -> Result<()> {
    let memory = manager.get_or_create(code, "");
    println!("{}", serde_json::to_string_pretty(&memory)?);
    Ok(())
}

/// Print the assembled context for a query
fn cmd_context(manager: &MemoryManager, code: &str, query: &str) -> Result<()> {
    let memory = manager.get_or_create(code, "");
    print!("{}", manager.build_context(&memory, query));
    Ok(())
}

/// Record a finished discussion round
async fn cmd_record(
    manager: &MemoryManager,
    code: &str,
    name: &str,
    query: &str,
    consensus: &str,
    points: Vec<String>,
) -> Result<()> {
    let mut memory = manager.get_or_create(code, name);
    manager
        .add_round(&mut memory, query, consensus, points)
        .await
        .with_context(|| format!("Failed to record round for '{}'", code))?;

    info!(code = %code, round = memory.total_rounds, "round recorded");
    println!(
        "Recorded round {} for '{}' ({} recent, {} total)",
        memory.total_rounds,
        code,
        memory.recent_rounds.len(),
        memory.total_rounds
    );

    Ok(())
}

/// Add a fact with tokenizer-derived keywords
fn cmd_fact(
    manager: &MemoryManager,
    code: &str,
    name: &str,
    content: &str,
    source: &str,
    kind: &str,
    weight: f64,
) -> Result<()> {
    let kind: EntryKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let keywords = manager.tokenizer().extract_keywords(content, FACT_KEYWORDS);
    let entry = MemoryEntry::new(kind, content, source, keywords, weight);

    let mut memory = manager.get_or_create(code, name);
    manager.add_facts(&mut memory, vec![entry]);
    manager
        .save(&mut memory)
        .with_context(|| format!("Failed to save memory for '{}'", code))?;

    println!("Added {} to '{}' ({} facts)", kind, code, memory.key_facts.len());

    Ok(())
}

/// Condense `agent=content` inputs into key points
async fn cmd_key_points(manager: &MemoryManager, inputs: &[String]) -> Result<()> {
    let discussions = inputs
        .iter()
        .map(|raw| parse_discussion(raw))
        .collect::<Result<Vec<_>>>()?;

    for point in manager.extract_key_points(&discussions).await? {
        println!("{}", point);
    }

    Ok(())
}

/// Delete a subject's memory
fn cmd_delete(manager: &MemoryManager, code: &str) -> Result<()> {
    manager
        .delete_memory(code)
        .with_context(|| format!("Failed to delete memory for '{}'", code))?;

    println!("Deleted memory for '{}'", code);

    Ok(())
}

fn parse_discussion(raw: &str) -> Result<DiscussionInput> {
    let (agent, content) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected agent=content, got {:?}", raw))?;
    let agent = agent.trim();
    if agent.is_empty() {
        return Err(anyhow!("agent name missing in {:?}", raw));
    }
    Ok(DiscussionInput::new(agent, content.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, MemoryManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = MemoryManager::new(dir.path()).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_parse_discussion() {
        let d = parse_discussion("bull = revenue keeps growing").unwrap();
        assert_eq!(d.agent_name, "bull");
        assert_eq!(d.content, "revenue keeps growing");

        let d = parse_discussion("bear=a=b").unwrap();
        assert_eq!(d.content, "a=b");

        assert!(parse_discussion("no separator").is_err());
        assert!(parse_discussion("=content").is_err());
    }

    #[test]
    fn test_cli_config_from_args() {
        let cli = Cli::parse_from([
            "roundmem",
            "--max-recent-rounds",
            "2",
            "--compress-threshold",
            "4",
            "list",
        ]);
        let config = cli.config();
        assert_eq!(config.max_recent_rounds, 2);
        assert_eq!(config.compress_threshold, 4);
        assert_eq!(config.max_key_facts, 20);
    }

    #[tokio::test]
    async fn test_record_then_delete() {
        let (_dir, manager) = manager();
        cmd_record(&manager, "AAA", "Alpha", "q", "c", vec!["p".into()])
            .await
            .unwrap();
        assert_eq!(manager.list_memories().unwrap(), vec!["AAA"]);

        let memory = manager.get_or_create("AAA", "");
        assert_eq!(memory.name, "Alpha");
        assert_eq!(memory.recent_rounds[0].key_points, vec!["p"]);

        cmd_delete(&manager, "AAA").unwrap();
        assert!(manager.list_memories().unwrap().is_empty());
        assert!(cmd_delete(&manager, "AAA").is_err());
    }

    #[test]
    fn test_fact_gets_keywords_and_kind() {
        let (_dir, manager) = manager();
        cmd_fact(
            &manager,
            "AAA",
            "Alpha",
            "dividend payout ratio raised",
            "analyst",
            "decision",
            0.9,
        )
        .unwrap();

        let memory = manager.get_or_create("AAA", "");
        let fact = &memory.key_facts[0];
        assert_eq!(fact.kind, EntryKind::Decision);
        assert!(fact.keywords.contains(&"dividend".to_string()));
        assert!(cmd_fact(&manager, "AAA", "", "x", "a", "rumor", 0.5).is_err());
    }

    #[tokio::test]
    async fn test_key_points_rejects_malformed_input() {
        let (_dir, manager) = manager();
        assert!(cmd_key_points(&manager, &["bull=up".to_string()]).await.is_ok());
        assert!(cmd_key_points(&manager, &["garbage".to_string()]).await.is_err());
    }
}
