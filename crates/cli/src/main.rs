//! CLI tool for linting and rendering markdown slide decks.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use deck_core::{parse, validate, Deck, Renderer, RuleSet, ValidationReport};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Lint markdown slide decks and render them to static HTML.
#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check decks against structural rules; exits 1 if any error is found
    Lint {
        /// Input deck file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,

        /// Additional substring that must appear in the deck
        #[arg(long = "require", value_name = "TEXT")]
        required: Vec<String>,

        /// Additional substring that must not appear in the deck
        #[arg(long = "forbid", value_name = "TEXT")]
        forbidden: Vec<String>,

        /// Marker that must appear in order (repeat in sequence)
        #[arg(long = "order", value_name = "TEXT")]
        ordered: Vec<String>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Render decks to standalone HTML previews
    Render {
        /// Input deck file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print HTML to stdout instead of writing to file
        #[arg(short, long)]
        print: bool,
    },

    /// Print the parsed structure of a deck as JSON
    Inspect {
        /// Input deck file
        input: PathBuf,
    },
}

/// Options shared by commands that need a rule set.
#[derive(ClapArgs, Debug)]
struct RuleArgs {
    /// JSON rule set file
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Maximum non-blank lines per slide (default: 30)
    #[arg(short = 'l', long)]
    max_lines: Option<usize>,
}

impl RuleArgs {
    /// Load the rule file, if any, then apply flag overrides.
    fn load(&self) -> Result<RuleSet> {
        let mut rules = match &self.rules {
            Some(path) => RuleSet::load(path)
                .with_context(|| format!("Failed to load rules from {}", path.display()))?,
            None => RuleSet::default(),
        };

        if let Some(lines) = self.max_lines {
            rules = rules.with_max_content_lines(lines);
        }

        Ok(rules)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &cli.command {
        Command::Lint {
            input,
            rules,
            required,
            forbidden,
            ordered,
            format,
        } => {
            let mut rules = rules.load()?;
            for text in required {
                rules = rules.require(text.as_str());
            }
            for text in forbidden {
                rules = rules.forbid(text.as_str());
            }
            for marker in ordered {
                rules = rules.require_in_order(marker.as_str());
            }
            lint(input, &rules, *format)
        }
        Command::Render {
            input,
            rules,
            output,
            print,
        } => {
            let renderer = Renderer::new().with_rules(&rules.load()?);
            render(input, &renderer, output.as_ref(), *print, cli.verbose)
        }
        Command::Inspect { input } => {
            let deck = read_deck(input)?;
            println!("{}", serde_json::to_string_pretty(&deck)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Lint every input; a file that fails to load is reported and skipped.
fn lint(inputs: &[PathBuf], rules: &RuleSet, format: ReportFormat) -> Result<ExitCode> {
    let mut failed = false;

    for input_path in inputs {
        match read_deck(input_path) {
            Ok(deck) => {
                let report = validate(&deck, rules);
                print_report(input_path, &deck, &report, format)?;
                failed |= report.has_errors();
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_report(
    path: &Path,
    deck: &Deck,
    report: &ValidationReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let value = serde_json::json!({
                "file": path.display().to_string(),
                "slides": deck.len(),
                "errors": report.error_count(),
                "warnings": report.warning_count(),
                "findings": report.findings,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ReportFormat::Text => {
            for finding in &report.findings {
                println!("{}: {}", path.display(), finding);
            }
            println!(
                "{}: {} slides, {} errors, {} warnings",
                path.display(),
                deck.len(),
                report.error_count(),
                report.warning_count()
            );
        }
    }
    Ok(())
}

/// Render every input; a file that fails is reported and the rest continue.
fn render(
    inputs: &[PathBuf],
    renderer: &Renderer,
    output_dir: Option<&PathBuf>,
    print: bool,
    verbose: bool,
) -> Result<ExitCode> {
    let mut failed = false;

    for input_path in inputs {
        if verbose {
            eprintln!("Rendering: {}", input_path.display());
        }

        let result = read_deck(input_path).and_then(|deck| {
            let html = renderer.render(&deck);
            if print {
                print!("{}", html);
            } else {
                let output_path = get_output_path(input_path, output_dir)?;
                write_output(&output_path, &html)?;
                if verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
            Ok(())
        });

        if let Err(e) = result {
            eprintln!("Error processing {}: {:#}", input_path.display(), e);
            failed = true;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Read and parse a deck file.
fn read_deck(input_path: &Path) -> Result<Deck> {
    let text = std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let deck = parse(&text);
    log::debug!("Parsed {} slides from {}", deck.len(), input_path.display());
    Ok(deck)
}

/// Determine the output path for a rendered file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("slides");

    let output_filename = format!("{}.html", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
