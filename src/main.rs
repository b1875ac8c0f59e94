use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use code_match::config::load_from_path;
use code_match::ts::validate_rewrite;
use code_match::{
    Dialect, EditResult, FileRewrite, MatchRecord, Options, Session, SessionError, Value,
};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "code-match")]
#[command(about = "Structural find and replace for JavaScript and TypeScript", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Source dialect: javascript, typescript or tsx
    #[arg(long, global = true)]
    dialect: Option<String>,

    /// Placeholder prefix (default `$$`)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Print diagnostic tables and debug logs to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Include the whole source tree in debug output
    #[arg(long, global = true)]
    full_source: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every match of a pattern
    Find {
        /// Pattern snippet, e.g. 'console.log($$X)'
        pattern: String,

        /// Files or directories to search
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace every match of a pattern with a template
    Replace {
        /// Pattern snippet
        pattern: String,

        /// Template snippet, e.g. 'logger.debug($$X)'
        template: String,

        /// Files or directories to rewrite
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write changes instead of printing a diff
        #[arg(short, long)]
        write: bool,
    },

    /// Run every rule of a rules file
    Apply {
        /// Rules file (TOML)
        #[arg(short, long)]
        rules: PathBuf,

        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write changes instead of printing a diff
        #[arg(short, long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.common.debug);

    let failed = match cli.command {
        Commands::Find {
            pattern,
            paths,
            json,
        } => cmd_find(&cli.common, &pattern, &paths, json)?,

        Commands::Replace {
            pattern,
            template,
            paths,
            write,
        } => cmd_replace(&cli.common, &pattern, &template, &paths, write)?,

        Commands::Apply {
            rules,
            paths,
            write,
        } => cmd_apply(&cli.common, &rules, &paths, write)?,
    };

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "code_match=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Layer command-line flags over `base` options.
fn resolve_options(common: &CommonArgs, base: Options) -> Result<Options> {
    let mut options = base;
    if let Some(name) = &common.dialect {
        options.dialect = name.parse::<Dialect>()?;
    }
    if let Some(prefix) = &common.prefix {
        options.placeholder_prefix = prefix.clone();
    }
    options.debug |= common.debug;
    options.log_full_source |= common.full_source;
    options.validate()?;
    Ok(options)
}

/// Helper: Expand directories into the source files of `dialect`, sorted.
fn collect_files(paths: &[PathBuf], dialect: Dialect) -> Result<Vec<PathBuf>> {
    let extensions = dialect.extensions();
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("No such file or directory: {}", path.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            let matches_dialect = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| extensions.contains(&ext));
            if entry.file_type().is_file() && matches_dialect {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Helper: Read a file and open a session on it, reporting parse failures.
fn open_session(file: &Path, options: &Options) -> Result<Option<(String, Session)>> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    match Session::new(&source, options.clone()) {
        Ok(session) => Ok(Some((source, session))),
        Err(SessionError::Parse(e)) => {
            eprintln!("{} {}: {}", "✗".red(), file.display(), e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn preview_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_match(file: &Path, record: &MatchRecord) {
    let location = format!("{}:{}", file.display(), record.line_or_unknown());
    println!("{} {}", location.cyan(), record.source_text());
    for (name, value) in &record.values {
        println!("    {} = {}", name.yellow(), preview_text(value));
    }
}

fn cmd_find(common: &CommonArgs, pattern: &str, paths: &[PathBuf], json: bool) -> Result<usize> {
    let options = resolve_options(common, Options::default())?;
    let files = collect_files(paths, options.dialect)?;

    let mut failed = 0;
    let mut total = 0;
    let mut report = Vec::new();

    for file in &files {
        let Some((_, mut session)) = open_session(file, &options)? else {
            failed += 1;
            continue;
        };
        let records = session.find(pattern)?;
        if options.debug {
            session.log_find_results(&records);
        }
        total += records.len();

        if json {
            if !records.is_empty() {
                report.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "matches": records,
                }));
            }
        } else {
            for record in &records {
                print_match(file, record);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!(
            "{} in {} file(s)",
            format!("{total} match(es)").bold(),
            files.len()
        );
    }

    Ok(failed)
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Helper: Check, then diff or write, one rewritten file. Returns false on
/// failure.
fn finish_file(file: &Path, before: &str, after: &str, dialect: Dialect, write: bool) -> bool {
    if before == after {
        return true;
    }

    if let Err(e) = validate_rewrite(before, after, dialect) {
        eprintln!(
            "{} {}: rewrite produced invalid syntax ({}); left unchanged",
            "✗".red(),
            file.display(),
            e
        );
        return false;
    }

    if !write {
        display_diff(file, before, after);
        return true;
    }

    match FileRewrite::new(file, before, after).apply() {
        Ok(EditResult::Applied { file, .. }) => {
            println!("{} Rewrote {}", "✓".green(), file.display());
            true
        }
        Ok(EditResult::AlreadyApplied { file }) => {
            println!("{} Already rewritten {}", "⊙".yellow(), file.display());
            true
        }
        Err(e) => {
            eprintln!("{} {}: {}", "✗".red(), file.display(), e);
            false
        }
    }
}

fn cmd_replace(
    common: &CommonArgs,
    pattern: &str,
    template: &str,
    paths: &[PathBuf],
    write: bool,
) -> Result<usize> {
    let options = resolve_options(common, Options::default())?;
    let files = collect_files(paths, options.dialect)?;

    let mut failed = 0;
    let mut total = 0;

    for file in &files {
        let Some((source, mut session)) = open_session(file, &options)? else {
            failed += 1;
            continue;
        };
        total += session.replace(pattern, template)?;

        if !finish_file(file, &source, &session.to_source(), options.dialect, write) {
            failed += 1;
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} replaced", format!("{total}").green());
    println!("  {} failed", format!("{failed}").red());

    Ok(failed)
}

fn cmd_apply(common: &CommonArgs, rules: &Path, paths: &[PathBuf], write: bool) -> Result<usize> {
    let rules_file = load_from_path(rules)?;
    let options = resolve_options(common, rules_file.options.clone())?;
    let files = collect_files(paths, options.dialect)?;

    println!(
        "Loaded {} rule(s) from {}",
        rules_file.rules.len(),
        rules.display()
    );

    let mut failed = 0;

    for file in &files {
        let Some((source, mut session)) = open_session(file, &options)? else {
            failed += 1;
            continue;
        };

        for rule in &rules_file.rules {
            match &rule.template {
                Some(template) => {
                    let replaced = session
                        .replace(rule.pattern.as_str(), template.as_str())
                        .with_context(|| format!("rule '{}'", rule.id))?;
                    if replaced > 0 {
                        println!(
                            "{} {}: {} replacement(s) in {}",
                            "✓".green(),
                            rule.id,
                            replaced,
                            file.display()
                        );
                    }
                }
                None => {
                    let records = session
                        .find(rule.pattern.as_str())
                        .with_context(|| format!("rule '{}'", rule.id))?;
                    for record in &records {
                        print!("{} ", format!("[{}]", rule.id).dimmed());
                        print_match(file, record);
                    }
                }
            }
        }

        if !finish_file(file, &source, &session.to_source(), options.dialect, write) {
            failed += 1;
        }
    }

    Ok(failed)
}
