//! Shift caption timestamps from the command line.
//!
//! Reads a WebVTT or SubRip file, applies an offset, and prints the result
//! (or a `data:` URI a player can load directly). The offset comes from
//! `--offset-ms`, or from a title's stored `subtitleDelay` when `--catalog`
//! and `--movie` are given.
//!
//! ## Examples
//! - `recap-shift movie.srt --offset-ms 1500`
//! - `recap-shift movie.vtt --offset-ms -2000 --data-uri`
//! - `recap-shift movie.vtt --catalog movies.json --movie m42`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use recap::{SubtitleTrack, logging, parse_catalog, timestamps};

#[derive(Parser, Debug)]
#[command(name = "recap-shift", version, about = "Shift subtitle timestamps by a signed offset")]
struct Cli {
    /// Caption file (WebVTT or SubRip)
    file: PathBuf,

    /// Offset in milliseconds; positive delays captions, negative advances them
    #[arg(long, allow_negative_numbers = true, conflicts_with = "movie")]
    offset_ms: Option<i64>,

    /// Catalog JSON to read a title's stored delay from
    #[arg(long, requires = "movie")]
    catalog: Option<PathBuf>,

    /// Title id whose `subtitleDelay` to apply
    #[arg(long, requires = "catalog")]
    movie: Option<String>,

    /// Print a base64 `data:` URI instead of the shifted text
    #[arg(long)]
    data_uri: bool,
}

fn resolve_offset(cli: &Cli) -> Result<i64> {
    let (Some(catalog), Some(movie_id)) = (&cli.catalog, &cli.movie) else {
        return Ok(cli.offset_ms.unwrap_or(0));
    };
    let json = fs::read_to_string(catalog)
        .with_context(|| format!("failed to read catalog {}", catalog.display()))?;
    let movies = parse_catalog(&json)
        .with_context(|| format!("failed to parse catalog {}", catalog.display()))?;
    match movies.into_iter().find(|m| &m.id == movie_id) {
        Some(movie) => Ok(movie.subtitle_delay),
        None => bail!("movie {movie_id} not found in {}", catalog.display()),
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let offset_ms = resolve_offset(&cli)?;
    let raw = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read captions {}", cli.file.display()))?;

    let track = SubtitleTrack::prepare(&raw, offset_ms);
    info!(
        "shifted {} {:?} timestamps by {}ms",
        timestamps(&raw).count(),
        track.format,
        offset_ms
    );

    if cli.data_uri {
        println!("{}", track.data_uri());
    } else {
        print!("{}", track.text);
    }
    Ok(())
}
