//! pindefs: a human-friendly naming layer over raw microcontroller pins.
//!
//! Embedded projects address hardware through symbolic names
//! (`Timer_WAKE`, `Connector_Pin_3`) that resolve to the physical pin
//! tokens of a hardware-definition library (`PD4`, `GND`). pindefs owns
//! that mapping: it derives the table from a KiCad netlist export, renders
//! it as a C header (or CSV/JSON), and checks an existing header against
//! the schematic.
//!
//! # Pipeline
//!
//! 1. Parse the KiCad XML netlist ([`core::netlist`]).
//! 2. Group components into snippets via `SnippetType`/`SnippetPin*`
//!    schematic fields ([`core::group`]).
//! 3. Pick a *root* snippet, the side whose pin names are the physical
//!    tokens, and give every other snippet pin the root pin it is wired
//!    to ([`core::mapgen`]).
//! 4. Emit or verify the `#define` table ([`core::header`]).
//!
//! The mapping itself is fixed at build time: the table type
//! ([`core::pins::PinDefs`]) rejects conflicting redefinitions and
//! round-trips losslessly through its header rendition.

pub mod core;

use crate::core::config::ProjectConfig;
use crate::core::error::PindefsError;
use crate::core::group::{self, SnippetFilter};
use crate::core::header::{self, HeaderMeta};
use crate::core::{export, mapgen, netlist};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "pindefs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate, check, and export pin-definition headers from KiCad netlists"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct GenCli {
    /// Path to a KiCad XML netlist export.
    #[clap(long)]
    netlist: Option<PathBuf>,
    /// Root snippet name (sheetpath + SnippetType, e.g. `/Mcu`).
    #[clap(long)]
    root: Option<String>,
    /// Comma-separated snippet path globs to include.
    #[clap(long)]
    filter: Option<String>,
    /// Output path. Print to stdout if not provided.
    #[clap(long)]
    output: Option<PathBuf>,
    /// Output format: 'header', 'csv' or 'json'.
    #[clap(long)]
    format: Option<String>,
}

#[derive(clap::Args, Debug)]
struct CheckCli {
    /// Pin-definition header to check.
    #[clap(long)]
    header: PathBuf,
    /// Netlist to check against; without it only well-formedness is checked.
    #[clap(long)]
    netlist: Option<PathBuf>,
    /// Root snippet name (required with --netlist).
    #[clap(long)]
    root: Option<String>,
    /// Comma-separated snippet path globs to include.
    #[clap(long)]
    filter: Option<String>,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    format: String,
}

#[derive(clap::Args, Debug)]
struct DumpCli {
    /// Path to a KiCad XML netlist export.
    #[clap(long)]
    netlist: Option<PathBuf>,
    /// Root snippet name; resolves the root pin column when given.
    #[clap(long)]
    root: Option<String>,
    /// Comma-separated snippet path globs to include.
    #[clap(long)]
    filter: Option<String>,
    /// Output format: 'csv' or 'json'.
    #[clap(long, default_value = "csv")]
    format: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the pin-definition table from a netlist and emit it
    Gen(GenCli),
    /// Check a pin-definition header, optionally against a netlist
    Check(CheckCli),
    /// Report snippet pin connectivity from a netlist
    Dump(DumpCli),
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ProjectConfig::load(Path::new("."))?;
    match cli.command {
        Command::Gen(args) => cmd_gen(args, &config),
        Command::Check(args) => cmd_check(args, &config),
        Command::Dump(args) => cmd_dump(args, &config),
    }
}

struct LoadedNetlist {
    netlist: netlist::Netlist,
    bytes: Vec<u8>,
}

fn load_netlist(path: &Path) -> anyhow::Result<LoadedNetlist> {
    let bytes = fs::read(path).with_context(|| format!("reading netlist {}", path.display()))?;
    let text = std::str::from_utf8(&bytes)
        .with_context(|| format!("netlist {} is not UTF-8", path.display()))?;
    let netlist = netlist::parse_str(text)
        .with_context(|| format!("parsing netlist {}", path.display()))?;
    Ok(LoadedNetlist { netlist, bytes })
}

fn compile_filter(globs: Option<String>) -> anyhow::Result<Option<SnippetFilter>> {
    match globs {
        Some(globs) => Ok(Some(SnippetFilter::compile(&globs)?)),
        None => Ok(None),
    }
}

fn print_warnings(warnings: &[String]) {
    use colored::Colorize;
    for warning in warnings {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
}

fn cmd_gen(args: GenCli, config: &ProjectConfig) -> anyhow::Result<()> {
    let netlist_path = args
        .netlist
        .or_else(|| config.netlist.clone())
        .context("no netlist given (use --netlist or set `netlist` in pindefs.toml)")?;
    let root = args
        .root
        .or_else(|| config.root.clone())
        .context("no root snippet given (use --root or set `root` in pindefs.toml)")?;
    let filter = compile_filter(args.filter.or_else(|| config.filter.clone()))?;
    let format = args
        .format
        .or_else(|| config.format.clone())
        .unwrap_or_else(|| "header".to_string());
    let output = args.output.or_else(|| config.output.clone());

    let loaded = load_netlist(&netlist_path)?;
    let mut warnings = Vec::new();
    let defs = mapgen::generate(&loaded.netlist, &root, filter.as_ref(), &mut warnings)?;
    print_warnings(&warnings);

    let meta = HeaderMeta::for_netlist(&loaded.netlist.source, &loaded.bytes);
    let rendered = match format.as_str() {
        "header" => header::emit(&defs, &meta),
        "csv" => export::pin_defs_csv(&defs),
        "json" => format!(
            "{}\n",
            serde_json::to_string_pretty(&export::pin_defs_json(&defs, &meta))?
        ),
        other => bail!("unknown format `{}` (expected 'header', 'csv' or 'json')", other),
    };

    match output {
        Some(path) => {
            fs::write(&path, rendered).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} definitions to {}", defs.len(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_check(args: CheckCli, config: &ProjectConfig) -> anyhow::Result<()> {
    let header_text = fs::read_to_string(&args.header)
        .with_context(|| format!("reading header {}", args.header.display()))?;
    let defs = header::parse(&header_text)
        .with_context(|| format!("parsing header {}", args.header.display()))?;

    let Some(netlist_path) = args.netlist.or_else(|| config.netlist.clone()) else {
        // Standalone check: parsing already enforced well-formedness and
        // duplicate rejection.
        if args.format == "json" {
            let value = export::envelope("check", "ok", json!({ "defines": defs.len() }));
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("ok: {} definitions in {}", defs.len(), args.header.display());
        }
        return Ok(());
    };

    let root = args
        .root
        .or_else(|| config.root.clone())
        .context("--root is required when checking against a netlist")?;
    let filter = compile_filter(args.filter.or_else(|| config.filter.clone()))?;

    let loaded = load_netlist(&netlist_path)?;
    let mut warnings = Vec::new();
    let expected = mapgen::generate(&loaded.netlist, &root, filter.as_ref(), &mut warnings)?;
    print_warnings(&warnings);

    let mut missing = Vec::new();
    let mut mismatched = Vec::new();
    let mut extra = Vec::new();
    for (logical, physical) in expected.iter() {
        match defs.lookup(logical.as_str()) {
            None => missing.push(format!("{} {}", logical, physical)),
            Some(actual) if actual != physical => {
                mismatched.push(format!("{}: expected {}, found {}", logical, physical, actual))
            }
            Some(_) => {}
        }
    }
    for (logical, physical) in defs.iter() {
        if expected.lookup(logical.as_str()).is_none() {
            extra.push(format!("{} {}", logical, physical));
        }
    }

    let clean = missing.is_empty() && mismatched.is_empty() && extra.is_empty();
    if args.format == "json" {
        let value = export::envelope(
            "check",
            if clean { "ok" } else { "fail" },
            json!({
                "missing": missing,
                "mismatched": mismatched,
                "extra": extra,
            }),
        );
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if clean {
        println!(
            "ok: {} matches the netlist ({} definitions)",
            args.header.display(),
            expected.len()
        );
    } else {
        for line in &missing {
            eprintln!("missing: #define {line}");
        }
        for line in &mismatched {
            eprintln!("mismatched: {line}");
        }
        for line in &extra {
            eprintln!("extra: #define {line}");
        }
    }

    if !clean {
        return Err(PindefsError::ValidationError(format!(
            "{} does not match the netlist ({} missing, {} mismatched, {} extra)",
            args.header.display(),
            missing.len(),
            mismatched.len(),
            extra.len()
        ))
        .into());
    }
    Ok(())
}

fn cmd_dump(args: DumpCli, config: &ProjectConfig) -> anyhow::Result<()> {
    let netlist_path = args
        .netlist
        .or_else(|| config.netlist.clone())
        .context("no netlist given (use --netlist or set `netlist` in pindefs.toml)")?;
    let root = args.root.or_else(|| config.root.clone());
    let filter = compile_filter(args.filter.or_else(|| config.filter.clone()))?;

    let loaded = load_netlist(&netlist_path)?;
    let mut warnings = Vec::new();
    let index = group::group_components(&loaded.netlist, &mut warnings)?;
    let nets = group::snippet_nets(&loaded.netlist, &index, &mut warnings)?;
    print_warnings(&warnings);

    if let Some(root) = root.as_deref() {
        if !index.snippets.contains_key(root) {
            return Err(PindefsError::NotFound(format!("root snippet `{}`", root)).into());
        }
    }

    let mut rows = export::dump_rows(&index, &nets, root.as_deref());
    if let Some(filter) = &filter {
        rows.retain(|row| filter.matches(&row.snippet));
    }

    match args.format.as_str() {
        "csv" => print!("{}", export::dump_csv(&rows)),
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&export::dump_json(&index, &rows))?
        ),
        other => bail!("unknown format `{}` (expected 'csv' or 'json')", other),
    }
    Ok(())
}
