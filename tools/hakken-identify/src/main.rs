//! Hakken Identify
//!
//! Identifies anime media filenames against a local JSON library and prints
//! one JSON object per line.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hakken::{
    IndexStats, Library, Recognizer, RecognizerConfig, ScanEntry, Scanner, TieBreak,
    TitleLanguage,
};
use serde::Serialize;
use tracing::{debug, info};

/// Default library location
fn default_library_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hakken")
        .join("library.json")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "hakken-identify")]
#[command(about = "Identify anime media filenames against a local library")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Library JSON file (array of anime entries)
    #[arg(short, long, env = "HAKKEN_LIBRARY")]
    library: Option<PathBuf>,

    /// Which anime wins when several share a title
    #[arg(short, long, value_enum)]
    tie_break: Option<TieBreakArg>,

    /// Recognizer configuration JSON
    #[arg(short, long, env = "HAKKEN_CONFIG")]
    config: Option<PathBuf>,

    /// Language of the anime title printed next to each result
    #[arg(long, value_enum, default_value_t = LanguageArg::Romaji)]
    language: LanguageArg,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify filenames read from stdin, one per line
    Stdin,
    /// Identify every file in a directory
    Scan {
        /// Directory to scan (not recursive)
        dir: PathBuf,
    },
    /// Show library and index statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TieBreakArg {
    /// Most reliable title kind wins
    Highest,
    /// Least reliable title kind wins
    Lowest,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::Highest => TieBreak::HighestScore,
            TieBreakArg::Lowest => TieBreak::LowestScore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    Romaji,
    English,
    Native,
}

impl From<LanguageArg> for TitleLanguage {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Romaji => TitleLanguage::Romaji,
            LanguageArg::English => TitleLanguage::English,
            LanguageArg::Native => TitleLanguage::Native,
        }
    }
}

/// One line of identify output
#[derive(Debug, Serialize)]
struct IdentifyOutput {
    #[serde(flatten)]
    entry: ScanEntry,
    anime_title: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    anime: usize,
    #[serde(flatten)]
    index: IndexStats,
}

/// Reads the recognizer configuration, then applies command line overrides.
fn load_config(path: Option<&Path>, tie_break: Option<TieBreakArg>) -> Result<RecognizerConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => RecognizerConfig::default(),
    };
    if let Some(tie_break) = tie_break {
        config = config.with_tie_break(tie_break.into());
    }
    Ok(config)
}

fn output(scanner: &Scanner, entry: ScanEntry, language: TitleLanguage) -> IdentifyOutput {
    let anime_title = entry
        .anime_id
        .and_then(|id| scanner.recognizer().store().get(id))
        .map(|anime| anime.display_title(language).to_string());
    IdentifyOutput { entry, anime_title }
}

fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let library_path = cli.library.unwrap_or_else(default_library_path);
    let config = load_config(cli.config.as_deref(), cli.tie_break)?;
    let language = TitleLanguage::from(cli.language);

    let library = Library::load(&library_path)
        .with_context(|| format!("Failed to load library {}", library_path.display()))?;
    info!(path = %library_path.display(), anime = library.len(), "Loaded library");
    debug!(?config, "Recognizer configuration");

    let recognizer =
        Recognizer::with_config(library, config).context("Failed to create recognizer")?;
    let scanner = Scanner::new(recognizer);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Stdin => {
            for line in io::stdin().lock().lines() {
                let line = line.context("Failed to read stdin")?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                for entry in scanner.scan(&[line]) {
                    write_line(&mut out, &output(&scanner, entry, language))?;
                }
            }
        }
        Commands::Scan { dir } => {
            let entries = scanner
                .scan_dir(&dir)
                .with_context(|| format!("Failed to scan {}", dir.display()))?;
            let identified = entries.iter().filter(|e| e.anime_id.is_some()).count();
            let total = entries.len();
            for entry in entries {
                write_line(&mut out, &output(&scanner, entry, language))?;
            }
            info!(dir = %dir.display(), total, identified, "Scan complete");
        }
        Commands::Stats => {
            let recognizer = scanner.recognizer();
            recognizer.index().init(recognizer.store());
            let stats = StatsOutput {
                anime: recognizer.store().len(),
                index: recognizer.index().stats(),
            };
            write_line(&mut out, &stats)?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use hakken::{AnimeEntry, AnimeId};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_library_path() {
        let path = default_library_path();
        assert!(path.to_string_lossy().contains("hakken"));
        assert!(path.ends_with("library.json"));
    }

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "hakken-identify",
            "--library",
            "lib.json",
            "--tie-break",
            "lowest",
            "scan",
            "/media/anime",
        ])
        .unwrap();
        assert_eq!(cli.library, Some(PathBuf::from("lib.json")));
        assert_eq!(cli.tie_break, Some(TieBreakArg::Lowest));
        assert!(matches!(cli.command, Commands::Scan { ref dir } if dir == Path::new("/media/anime")));
    }

    #[test]
    fn test_load_config_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "tie_break": "lowest_score", "weights": { "synonym": 0.2 } }"#)
            .unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.tie_break, TieBreak::LowestScore);
        assert_eq!(config.weights.synonym, 0.2);

        let config = load_config(Some(&path), Some(TieBreakArg::Highest)).unwrap();
        assert_eq!(config.tie_break, TieBreak::HighestScore);
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.json")), None).is_err());

        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_config(Some(&path), None).is_err());

        assert_eq!(load_config(None, None).unwrap(), RecognizerConfig::default());
    }

    #[test]
    fn test_output_line() {
        let library = Library::from_entries(vec![
            AnimeEntry::new(5, "Shingeki no Kyojin").with_english("Attack on Titan"),
        ])
        .unwrap();
        let scanner = Scanner::new(Recognizer::new(library).unwrap());
        let entry = scanner
            .scan(&["[Group] Shingeki no Kyojin - 01 [1080p].mkv"])
            .remove(0);
        assert_eq!(entry.anime_id, Some(AnimeId(5)));

        let line = output(&scanner, entry, TitleLanguage::English);
        let mut buf = Vec::new();
        write_line(&mut buf, &line).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["anime_id"], 5);
        assert_eq!(value["anime_title"], "Attack on Titan");
        assert_eq!(value["episode"], "01");
        assert!(buf.ends_with(b"\n"));
    }
}
