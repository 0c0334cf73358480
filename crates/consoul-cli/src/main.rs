//! consoul - render Markdown as styled text in the terminal

mod config;
mod logging;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use consoul_core::{lex, BlockRenderer, Document, RenderOptions};
use config::ColorMode;

/// Render Markdown as styled text in the terminal
#[derive(Parser, Debug)]
#[command(name = "consoul", version, about)]
struct Cli {
    /// Markdown file to render; `-` or nothing reads stdin
    file: Option<PathBuf>,

    /// Read the input as a JSON token document instead of markdown
    #[arg(long, conflicts_with = "dump_tokens")]
    tokens: bool,

    /// Print the lexed token document as JSON instead of rendering
    #[arg(long)]
    dump_tokens: bool,

    /// When to use color
    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    /// Original Markdown emphasis rules, html left untouched
    #[arg(long)]
    pedantic: bool,

    /// Render single newlines in paragraphs as line breaks
    #[arg(long)]
    breaks: bool,

    /// Disable GitHub Flavored Markdown extensions
    #[arg(long)]
    no_gfm: bool,

    /// Keep ASCII quotes, dashes and ellipses
    #[arg(long)]
    no_smartypants: bool,

    /// Show email autolinks as written
    #[arg(long)]
    no_mangle: bool,

    /// Disable syntax highlighting
    #[arg(long)]
    no_highlight: bool,

    /// Emit OSC 8 hyperlinks for links
    #[arg(long)]
    hyperlinks: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Apply flags on top of the configured options
    fn apply(&self, options: &mut RenderOptions) {
        if self.pedantic {
            options.pedantic = true;
        }
        if self.breaks {
            options.breaks = true;
        }
        if self.no_gfm {
            options.gfm = false;
        }
        if self.no_smartypants {
            options.smartypants = false;
        }
        if self.no_mangle {
            options.mangle = false;
        }
        if self.no_highlight {
            options.highlight = false;
        }
        if self.hyperlinks {
            options.hyperlinks = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    let mut options = config.render;
    cli.apply(&mut options);
    options.color = cli.color.unwrap_or(config.color).resolve();
    tracing::debug!(?options, "Resolved render options");

    let input = read_input(cli.file.as_deref())?;
    let output = if cli.dump_tokens {
        let mut json = lex(&input, &options)
            .to_json()
            .context("Failed to serialize tokens")?;
        json.push('\n');
        json
    } else {
        let renderer = BlockRenderer::new(options);
        let rendered = if cli.tokens {
            let doc = Document::from_json(&input).context("Failed to read token document")?;
            renderer.parse(doc.tokens, &doc.links)
        } else {
            renderer.render(&input)
        };
        rendered.context("Failed to render document")?
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("Failed to write output")?;
    stdout.flush().context("Failed to write output")?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_options() {
        let cli = Cli::try_parse_from([
            "consoul",
            "--no-gfm",
            "--no-mangle",
            "--hyperlinks",
            "-vv",
            "notes.md",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.file.as_deref(), Some(Path::new("notes.md")));

        let mut options = RenderOptions {
            smartypants: false,
            ..RenderOptions::default()
        };
        cli.apply(&mut options);
        assert!(!options.gfm);
        assert!(!options.mangle);
        assert!(options.hyperlinks);
        // unset flags keep configured values
        assert!(!options.smartypants);
        assert!(options.highlight);
    }

    #[test]
    fn test_color_flag() {
        let cli = Cli::try_parse_from(["consoul", "--color", "never"]).unwrap();
        assert_eq!(cli.color, Some(ColorMode::Never));
        assert!(Cli::try_parse_from(["consoul", "--color", "rainbow"]).is_err());
    }

    #[test]
    fn test_tokens_conflicts_with_dump() {
        assert!(Cli::try_parse_from(["consoul", "--tokens", "--dump-tokens"]).is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Hi\n").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "# Hi\n");

        let err = read_input(Some(&dir.path().join("missing.md"))).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
