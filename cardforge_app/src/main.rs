//! CardForge command-line builder
//!
//! Builds the configured card with its label catalog and writes one export
//! file.
//!
//! ```text
//! cardforge [--config card.toml] [--format stl|stl-ascii|obj] [--out path]
//! ```

use std::path::PathBuf;

use card_engine::foundation::logging;
use card_engine::prelude::*;
use clap::Parser;
use thiserror::Error;

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Build a printable card and write one export file
#[derive(Parser, Debug)]
#[command(name = "cardforge", version)]
struct Args {
    /// Configuration file (.toml or .ron); defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Export format: stl, stl-ascii or obj
    #[arg(long, value_name = "FORMAT")]
    format: Option<ExportFormat>,

    /// Output path; defaults to the configured base name plus extension
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => ForgeConfig::load_from_file(path)?,
        None => ForgeConfig::default(),
    };

    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting CardForge");

    let mut engine = CardEngine::new(&config, BlockGlyphOutliner::new())?;
    pollster::block_on(engine.apply_catalog())?;

    let format = match args.format {
        Some(format) => format,
        None => engine.default_format()?,
    };
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(engine.export_file_name(format)));

    let bytes = engine.export(format)?;
    std::fs::write(&path, &bytes).map_err(|source| AppError::Write { path: path.clone(), source })?;
    log::info!("Wrote {} ({} bytes, {})", path.display(), bytes.len(), format);

    engine.teardown()?;
    Ok(())
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        log::error!("{err}");
        eprintln!("cardforge: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let parsed = Args::try_parse_from(["cardforge", "--format", "obj", "--out", "card.obj"]).expect("valid");
        assert_eq!(parsed.format, Some(ExportFormat::Obj));
        assert_eq!(parsed.out, Some(PathBuf::from("card.obj")));
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_format_keyword_validated() {
        let parsed = Args::try_parse_from(["cardforge", "--format", "stl-ascii"]).expect("valid");
        assert_eq!(parsed.format, Some(ExportFormat::StlAscii));
        assert!(Args::try_parse_from(["cardforge", "--format", "3mf"]).is_err());
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(Args::try_parse_from(["cardforge", "--out"]).is_err());
        assert!(Args::try_parse_from(["cardforge", "--verbose"]).is_err());
    }
}
