//! Subcommand execution.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use strata_core::{format_entries, qualified_tag, Config, Dataset, DepthPolicy, Entry};

use crate::cli::Command;

/// Runs `command` with `cwd` as the working directory, writing results to `out`.
pub fn execute<W: Write>(
    command: &Command,
    config: &Config,
    cwd: &Path,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Init { dir } => {
            let dir = dir.as_deref().unwrap_or(cwd);
            let meta_dir = Dataset::init(dir)?;
            writeln!(out, "{}", meta_dir.display())?;
        }
        Command::Add { recursive, paths } => {
            let mut dataset = Dataset::find(cwd)?;
            let added = dataset.add(paths.as_slice(), *recursive)?;
            write_paths(out, &added)?;
        }
        Command::Rm { paths } => {
            let mut dataset = Dataset::find(cwd)?;
            let removed = dataset.remove(paths.as_slice())?;
            write_paths(out, &removed)?;
        }
        Command::Ls {
            recursive,
            max_depth,
            format,
            paths,
        } => {
            let dataset = Dataset::find(cwd)?;
            let policy = DepthPolicy::new(
                *recursive || config.list.recursive,
                max_depth.unwrap_or(config.list.max_depth),
            );
            let entries = dataset.list(paths.as_slice(), policy)?;
            let rendered = format_entries(&entries, format.unwrap_or(config.list.format))
                .context("failed to render listing")?;
            out.write_all(rendered.as_bytes())?;
            if !rendered.is_empty() && !rendered.ends_with('\n') {
                writeln!(out)?;
            }
        }
        Command::Tag { tag, registry } => {
            let mut dataset = Dataset::find(cwd)?;
            match tag {
                Some(tag) => {
                    dataset.set_tag(tag)?;
                    writeln!(out, "Tag set: {tag}")?;
                }
                None => match dataset.tag()? {
                    Some(tag) => {
                        let registry = registry.as_deref().unwrap_or(&config.general.registry);
                        writeln!(out, "{}", qualified_tag(&tag, registry))?;
                    }
                    None => writeln!(out, "No tag set")?,
                },
            }
        }
    }
    Ok(())
}

fn write_paths<W: Write>(out: &mut W, entries: &[Entry]) -> std::io::Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry.path)?;
    }
    Ok(())
}
