use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use canon_store::{CanonConfig, CanonStore, FactFilter, FileSink, StatusScope};
use canon_types::{CanonErrorCode, Fact, FactInput, FactStatus, SystemClock};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Verify(args) => cmd_verify(args, format),
        Command::Stats(args) => cmd_stats(args, format),
        Command::Query(args) => cmd_query(args, format),
        Command::Audit(args) => cmd_audit(args, format),
        Command::Add(args) => cmd_add(args, format),
    }
}

/// Load an export file. A missing file is an error.
fn open(path: &Path) -> anyhow::Result<CanonStore> {
    CanonStore::restore(&FileSink::new(path))?
        .with_context(|| format!("no export file at {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CanonConfig> {
    let Some(path) = path else {
        return Ok(CanonConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(CanonConfig::from_toml_str(&source)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = match open(&args.file) {
        Ok(store) => store,
        Err(err) => {
            if format == OutputFormat::Text {
                println!("{} {} rejected", "✗".red().bold(), args.file.display());
            }
            return Err(err);
        }
    };
    let report = store.verify_integrity();

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text if report.valid => {
            println!("{} Canon integrity verified", "✓".green().bold());
            println!("  Facts: {}", report.facts_checked.to_string().bold());
            println!("  Audit entries: {}", report.audit_entries_checked.to_string().bold());
            println!("  Fact chain tip: {}", store.last_hash().short().cyan());
        }
        OutputFormat::Text => {
            println!("{} Canon integrity check failed", "✗".red().bold());
            for error in &report.errors {
                println!("  {}", error.red());
            }
        }
    }

    if !report.valid {
        bail!("{} integrity errors", report.errors.len());
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(&args.file)?;
    let metrics = store.metrics();
    if format == OutputFormat::Json {
        return print_json(&metrics);
    }

    println!("Root: {}", metrics.current_root_hash.as_str().cyan());
    println!(
        "Facts: {} total, {} active, {} archived, {} deleted",
        metrics.total_facts.to_string().bold(),
        metrics.active_facts.to_string().green(),
        metrics.archived_facts,
        metrics.deleted_facts
    );
    println!("Pending conflicts: {}", metrics.conflicted);
    println!("Audit entries: {}", metrics.audit_entries);
    if let Some(at) = metrics.last_modified {
        println!("Last modified: {}", at.to_rfc3339());
    }
    println!("By type:");
    for (fact_type, n) in metrics.by_type.iter().filter(|(_, n)| **n > 0) {
        println!("  {:<12} {n}", fact_type.as_str());
    }
    println!("By source:");
    for (source, n) in metrics.by_source.iter().filter(|(_, n)| **n > 0) {
        println!("  {:<12} {n}", source.as_str());
    }
    Ok(())
}

fn filter_from(args: &QueryArgs) -> FactFilter {
    let status = match (args.all, args.status) {
        (true, _) => StatusScope::Any,
        (false, Some(status)) => StatusScope::Only(status),
        (false, None) => StatusScope::Active,
    };
    FactFilter {
        fact_type: args.fact_type,
        subject: args.subject.clone(),
        predicate: args.predicate.clone(),
        source: args.source,
        status,
        limit: args.limit,
        offset: args.offset,
        ..FactFilter::default()
    }
}

fn print_fact(fact: &Fact) {
    let status = match fact.status {
        FactStatus::Active => fact.status.as_str().green(),
        FactStatus::Archived => fact.status.as_str().dimmed(),
        FactStatus::Deleted => fact.status.as_str().red(),
    };
    println!(
        "{}  {}.{} = {}  [{} v{} {}]",
        fact.id.yellow(),
        fact.subject.bold(),
        fact.predicate,
        fact.value,
        fact.source,
        fact.version,
        status
    );
}

fn cmd_query(args: QueryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(&args.file)?;
    let facts = store.query(&filter_from(&args));
    if format == OutputFormat::Json {
        return print_json(&facts);
    }
    if facts.is_empty() {
        println!("No matching facts.");
    }
    for fact in facts {
        print_fact(fact);
    }
    Ok(())
}

fn cmd_audit(args: AuditArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(&args.file)?;
    let trail = store.audit_trail(args.fact.as_deref());
    if format == OutputFormat::Json {
        return print_json(&trail);
    }
    if trail.is_empty() {
        println!("Audit trail: no entries.");
    }
    for entry in trail {
        println!(
            "{} {} {} {} by {}",
            format!("#{}", entry.sequence).yellow(),
            entry.timestamp.to_rfc3339().dimmed(),
            entry.action.as_str().bold(),
            entry.fact_id,
            entry.actor
        );
    }
    Ok(())
}

fn cmd_add(args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let sink = FileSink::new(&args.file);
    let mut store = match CanonStore::restore_with(&sink, config.clone(), SystemClock)? {
        Some(store) => store,
        None => {
            tracing::info!(file = %args.file.display(), "starting a new store");
            CanonStore::with_config(config, SystemClock)
        }
    };

    let mut input = FactInput::new(args.fact_type, args.subject, args.predicate, args.value, args.source)
        .with_tags(args.tags);
    if let Some(actor) = args.actor {
        input = input.created_by(actor);
    }

    match store.add(input) {
        Ok(fact) => {
            store.persist(&sink)?;
            match format {
                OutputFormat::Json => print_json(&fact)?,
                OutputFormat::Text => {
                    print!("{} ", "✓".green().bold());
                    print_fact(&fact);
                }
            }
            Ok(())
        }
        Err(err) if err.code == CanonErrorCode::ConflictUnresolved => {
            // Keep the CONFLICT audit entry.
            store.persist(&sink)?;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
