use std::path::PathBuf;

use canon_types::{FactSource, FactStatus, FactType};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "canon", about = "Canon: authoritative fact store for story worlds", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import an export file and check every hash and chain link
    Verify(VerifyArgs),
    /// Show store metrics and the snapshot root
    Stats(StatsArgs),
    /// List facts matching a filter
    Query(QueryArgs),
    /// Show the audit trail
    Audit(AuditArgs),
    /// Add a fact and write the export file back
    Add(AddArgs),
}

#[derive(Args)]
pub struct VerifyArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct StatsArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct QueryArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub predicate: Option<String>,
    #[arg(long = "type")]
    pub fact_type: Option<FactType>,
    #[arg(long)]
    pub source: Option<FactSource>,
    /// ACTIVE by default
    #[arg(long)]
    pub status: Option<FactStatus>,
    /// Match every status
    #[arg(long, conflicts_with = "status")]
    pub all: bool,
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(Args)]
pub struct AuditArgs {
    pub file: PathBuf,
    /// Only entries for this fact id
    #[arg(long)]
    pub fact: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    pub file: PathBuf,
    #[arg(long = "type")]
    pub fact_type: FactType,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub predicate: String,
    #[arg(long)]
    pub value: String,
    #[arg(long)]
    pub source: FactSource,
    #[arg(long)]
    pub actor: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// TOML file with store limits
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["canon", "verify", "canon.json"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("canon.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_query_filters() {
        let cli = Cli::try_parse_from([
            "canon", "query", "c.json", "--subject", "Jean", "--type", "character", "--status",
            "archived", "--limit", "5",
        ])
        .unwrap();
        if let Command::Query(args) = cli.command {
            assert_eq!(args.subject.as_deref(), Some("Jean"));
            assert_eq!(args.fact_type, Some(FactType::Character));
            assert_eq!(args.status, Some(FactStatus::Archived));
            assert_eq!(args.limit, Some(5));
            assert!(!args.all);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn status_and_all_conflict() {
        assert!(Cli::try_parse_from(["canon", "query", "c.json", "--all", "--status", "active"]).is_err());
    }

    #[test]
    fn parse_add() {
        let cli = Cli::try_parse_from([
            "canon", "add", "c.json", "--type", "world-rule", "--subject", "Magic", "--predicate",
            "cost", "--value", "blood", "--source", "user", "--tag", "lore",
        ])
        .unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.fact_type, FactType::WorldRule);
            assert_eq!(args.source, FactSource::User);
            assert_eq!(args.tags, vec!["lore"]);
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn add_rejects_unknown_source() {
        assert!(Cli::try_parse_from([
            "canon", "add", "c.json", "--type", "character", "--subject", "a", "--predicate", "b",
            "--value", "c", "--source", "rumour",
        ])
        .is_err());
    }

    #[test]
    fn parse_audit_for_fact() {
        let cli = Cli::try_parse_from(["canon", "audit", "c.json", "--fact", "fact_000001_abcd1234"]).unwrap();
        if let Command::Audit(args) = cli.command {
            assert_eq!(args.fact.as_deref(), Some("fact_000001_abcd1234"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbosity_and_format() {
        let cli = Cli::try_parse_from(["canon", "-vv", "--format", "json", "stats", "c.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
