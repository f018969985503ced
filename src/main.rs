// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use pmstream::{Archive, AssembleReport, Assembler, AssemblerConfig, TileCoord};

mod cli;
mod logging;

use cli::display::{
    dim, failure, field, format_size, row, section_bot, section_mid, section_top, success,
    warning,
};
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init_logging(cli.log.as_deref()) {
        eprintln!("logging disabled: {:#}", e);
    }

    let result = match cli.command {
        Commands::Assemble {
            input,
            output,
            config,
            name,
            internal_compression,
            no_dedup,
            leaf_threshold,
            strict,
        } => load_config(config.as_deref()).and_then(|mut config| {
            if name.is_some() {
                config.name = name;
            }
            if let Some(compression) = internal_compression {
                config.internal_compression = compression.into();
            }
            if no_dedup {
                config.dedup = false;
            }
            if let Some(threshold) = leaf_threshold {
                config.leaf_threshold = threshold;
            }
            config.validate()?;
            run_assemble(&input, &output, config, strict)
        }),
        Commands::Inspect {
            file,
            tile,
            entries,
        } => run_inspect(&file, tile, entries),
    };

    if let Err(e) = result {
        failure(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<AssemblerConfig> {
    Ok(match path {
        Some(path) => AssemblerConfig::load(path)?,
        None => AssemblerConfig::default(),
    })
}

// ============================================================================
// ASSEMBLE
// ============================================================================

fn open_input(source: &str) -> Result<Box<dyn BufRead>> {
    if source == "-" {
        return Ok(Box::new(BufReader::new(io::stdin().lock())));
    }
    let file = File::open(source).with_context(|| format!("cannot open {}", source))?;
    Ok(Box::new(BufReader::with_capacity(1 << 20, file)))
}

fn run_assemble(
    inputs: &[String],
    output: &Path,
    config: AssemblerConfig,
    strict: bool,
) -> Result<()> {
    let mut assembler = Assembler::new(config);
    let progress = Progress::new();

    for source in inputs {
        let reader = open_input(source)?;
        assembler
            .ingest_with_progress(reader, |tiles| progress.tick(tiles))
            .with_context(|| format!("reading {}", source))?;
    }
    progress.finish();

    if strict && assembler.is_truncated() {
        bail!("stream ended without END_STREAM; no archive written (--strict)");
    }

    let report = assembler
        .finish_to_file(output)
        .with_context(|| format!("writing {}", output.display()))?;
    print_report(output, &report);
    Ok(())
}

fn print_report(output: &Path, report: &AssembleReport) {
    success(&format!(
        "{} ({} tiles, {} entries, {})",
        output.display(),
        report.stats.addressed_tiles,
        report.stats.tile_entries,
        format_size(report.archive_size()),
    ));
    if report.stats.duplicates_dropped > 0 {
        warning(&format!(
            "{} repeated tile ids dropped",
            report.stats.duplicates_dropped
        ));
    }
    for conflict in &report.conflicts {
        warning(&format!(
            "layer {} field {}: {} vs {}, stored as Mixed",
            conflict.layer, conflict.field, conflict.existing, conflict.incoming
        ));
    }
    if report.truncated {
        warning("stream truncated: archive marked partial");
    }
}

/// Spinner on a TTY, nothing otherwise.
#[cfg(feature = "parallel")]
struct Progress(Option<indicatif::ProgressBar>);

#[cfg(feature = "parallel")]
impl Progress {
    fn new() -> Self {
        Self(atty::is(atty::Stream::Stderr).then(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            {
                bar.set_style(style);
            }
            bar.set_message("reading tiles");
            bar
        }))
    }

    fn tick(&self, tiles: u64) {
        if let Some(bar) = &self.0 {
            if tiles % 1024 == 0 {
                bar.set_message(format!("{} tiles", tiles));
                bar.tick();
            }
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.0 {
            bar.finish_and_clear();
        }
    }
}

#[cfg(not(feature = "parallel"))]
struct Progress;

#[cfg(not(feature = "parallel"))]
impl Progress {
    fn new() -> Self {
        Progress
    }

    fn tick(&self, _tiles: u64) {}

    fn finish(&self) {}
}

// ============================================================================
// INSPECT
// ============================================================================

fn run_inspect(path: &Path, tile: Option<TileCoord>, list_entries: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let archive = Archive::from_bytes(&bytes)?;

    if let Some(coord) = tile {
        return match archive.get_tile(coord)? {
            Some(payload) => {
                println!(
                    "{} id={} {} bytes",
                    coord,
                    coord.id(),
                    payload.len()
                );
                Ok(())
            }
            None => bail!("tile {} is not in the archive", coord),
        };
    }

    let header = archive.header();
    section_top("HEADER");
    field("file", &path.display().to_string());
    field("size", &format_size(bytes.len() as u64));
    field(
        "compression",
        &format!(
            "internal {:?}, tiles {:?}",
            header.internal_compression, header.tile_compression
        ),
    );
    field("tile type", &format!("{:?}", header.tile_type));
    field("zoom", &format!("{}-{}", header.min_zoom, header.max_zoom));
    field(
        "bounds",
        &format!(
            "{:.4},{:.4},{:.4},{:.4}",
            header.bounds.min_lon_e7 as f64 / 1e7,
            header.bounds.min_lat_e7 as f64 / 1e7,
            header.bounds.max_lon_e7 as f64 / 1e7,
            header.bounds.max_lat_e7 as f64 / 1e7
        ),
    );
    field(
        "tiles",
        &format!(
            "{} addressed, {} entries, {} contents",
            header.addressed_tiles, header.tile_entries, header.tile_contents
        ),
    );

    section_mid("SECTIONS");
    let sections = header.sections();
    for (label, (offset, length)) in [
        ("metadata", sections.metadata),
        ("root directory", sections.root),
        ("leaf directories", sections.leaves),
        ("tile data", sections.data),
    ] {
        field(
            label,
            &format!("{} {}", format_size(length), dim(&format!("@ {}", offset))),
        );
    }

    section_mid("METADATA");
    let metadata = archive.metadata()?;
    if let Some(name) = &metadata.name {
        field("name", name);
    }
    if metadata.is_partial() {
        field("partial", "yes (stream was truncated)");
    }
    for layer in &metadata.vector_layers {
        field(
            &format!("layer {}", layer.id),
            &format!("z{}-{}, {} fields", layer.minzoom, layer.maxzoom, layer.fields.len()),
        );
    }

    section_mid("DIRECTORY");
    let root = archive.root();
    field(
        "root",
        &match root {
            pmstream::Directory::Leaf(entries) => format!("{} tile entries", entries.len()),
            pmstream::Directory::Root(pointers) => format!("{} leaf pointers", pointers.len()),
        },
    );
    if list_entries {
        for entry in archive.entries()? {
            let coord = TileCoord::from_id(entry.tile_id)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| "?".into());
            row(&format!(
                "{:>12} {:<16} run {:<6} {} B @ {}",
                entry.tile_id, coord, entry.run_length, entry.length, entry.offset
            ));
        }
    }
    section_bot();
    Ok(())
}
