mod recommendations;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use html::{parse_fragment, to_html};
use linenumbering::{
    LineNumbering, LineNumberingConfig, LineRange, NumberedDocument, line_anchors,
    strip_line_numbers_html,
};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Line numbers, line ranges and change recommendations for motion HTML
#[derive(Parser, Debug)]
#[command(name = "motion-lines")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the document with line markers
    Number(DocumentArgs),

    /// Print the first and last line of the numbered document as JSON
    Range(DocumentArgs),

    /// Print every line anchor with its text offset as JSON
    Anchors(DocumentArgs),

    /// Print the lines FROM..=TO of the numbered document
    Extract {
        #[command(flatten)]
        document: DocumentArgs,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
    },

    /// Render recommendations for review, with deletions and insertions marked
    Diff {
        #[command(flatten)]
        document: DocumentArgs,
        /// TOML file with [[recommendation]] entries
        #[arg(short, long)]
        recommendations: PathBuf,
    },

    /// Accept recommendations and print the renumbered document
    Apply {
        #[command(flatten)]
        document: DocumentArgs,
        /// TOML file with [[recommendation]] entries
        #[arg(short, long)]
        recommendations: PathBuf,
    },

    /// Remove all line markers
    Strip {
        /// Input HTML file, `-` for stdin
        input: PathBuf,
    },

    /// Print an indented node outline of the numbered document
    Outline(DocumentArgs),
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Input HTML file, `-` for stdin
    input: PathBuf,

    /// Numbering config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Characters per line, overrides the config
    #[arg(long)]
    max_line_length: Option<usize>,

    /// Number of the first line, overrides the config
    #[arg(long)]
    first_line: Option<u32>,
}

impl DocumentArgs {
    fn config(&self) -> Result<LineNumberingConfig> {
        let mut config = match &self.config {
            Some(path) => LineNumberingConfig::load(path)?,
            None => LineNumberingConfig::default(),
        };
        if let Some(max) = self.max_line_length {
            config.max_line_length = max;
        }
        if let Some(first) = self.first_line {
            config.first_line = first;
        }
        config.validate()?;
        Ok(config)
    }

    fn numbered(&self) -> Result<NumberedDocument> {
        let config = self.config()?;
        let input = read_input(&self.input)?;
        let doc = LineNumbering::new(config)
            .number_html(&input)
            .with_context(|| format!("numbering {}", self.input.display()))?;
        log::info!(
            "{}: {} units, lines {}..{}",
            self.input.display(),
            doc.units().len(),
            doc.first_line(),
            doc.next_line()
        );
        Ok(doc)
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("reading stdin")?;
        return Ok(input);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Number(document) => {
            println!("{}", document.numbered()?.to_html());
        }
        Command::Range(document) => {
            let doc = document.numbered()?;
            let range = LineRange::new(doc.first_line(), doc.next_line().saturating_sub(1))
                .context("document has no numbered lines")?;
            println!("{}", serde_json::to_string(&range)?);
        }
        Command::Anchors(document) => {
            let doc = document.numbered()?;
            let anchors: Vec<_> = doc.units().iter().map(line_anchors).collect();
            println!("{}", serde_json::to_string_pretty(&anchors)?);
        }
        Command::Extract { document, from, to } => {
            let doc = document.numbered()?;
            let lines = doc.extract_lines(LineRange::new(from, to)?)?;
            println!("{}", to_html(&lines));
        }
        Command::Diff {
            document,
            recommendations,
        } => {
            let recs = recommendations::load(&recommendations)?;
            let diff = document.numbered()?.build_diff(recs)?;
            println!("{}", to_html(&diff));
        }
        Command::Apply {
            document,
            recommendations,
        } => {
            let recs = recommendations::load(&recommendations)?;
            let merged = document.numbered()?.apply(recs)?;
            println!("{}", merged.to_html());
        }
        Command::Strip { input } => {
            let html = read_input(&input)?;
            println!("{}", strip_line_numbers_html(&html)?);
        }
        Command::Outline(document) => {
            let doc = document.numbered()?;
            let root = parse_fragment(&doc.to_html())?;
            for line in html::debug::outline_from_dom(&root, usize::MAX) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
