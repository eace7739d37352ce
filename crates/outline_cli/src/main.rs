//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `outline_core` linkage.
//! - Load a snapshot file, optionally filter it by keyword, and print the
//!   outline as an indented `[order] level name` listing.
//!
//! Usage: `outline_cli [<snapshot.json> [keyword]] [--config <path>]`

use clap::Parser;
use outline_core::{
    core_version, init_logging, ping, Outline, OutlineConfig, OutlineNode, OutlineStore,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Default, PartialEq, Eq, Parser)]
#[command(
    name = "outline_cli",
    about = "Print a channel outline snapshot, optionally filtered by keyword",
    version
)]
struct CliArgs {
    /// Outline snapshot JSON file. Without it, prints ping and version.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: Option<PathBuf>,
    /// Case-insensitive keyword; keeps matches and their ancestors.
    keyword: Option<String>,
    /// Engine config JSON; also starts logging.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("outline_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => {
            let config = OutlineConfig::from_path(path).map_err(|err| err.to_string())?;
            init_logging(&config.logging)?;
            config
        }
        None => OutlineConfig::default(),
    };

    let Some(snapshot) = args.snapshot else {
        println!("outline_core ping={}", ping());
        println!("outline_core version={}", core_version());
        return Ok(());
    };

    let text = std::fs::read_to_string(&snapshot)
        .map_err(|err| format!("failed to read `{}`: {err}", snapshot.display()))?;
    let outline: Outline =
        serde_json::from_str(&text).map_err(|err| format!("invalid outline JSON: {err}"))?;
    let store = OutlineStore::new(outline, config.store).map_err(|err| err.to_string())?;

    let view = match &args.keyword {
        Some(keyword) => store.search(keyword),
        None => store.snapshot(),
    };
    print!("{}", render_outline(&view));
    Ok(())
}

fn render_outline(outline: &Outline) -> String {
    fn render_node(out: &mut String, node: &OutlineNode, depth: usize) {
        let _ = writeln!(
            out,
            "{:indent$}[{}] {} {}",
            "",
            node.order,
            node.kind(),
            node.name,
            indent = depth * 2
        );
        for child in node.children() {
            render_node(out, child, depth + 1);
        }
    }

    let mut out = String::new();
    for section in outline.sections() {
        render_node(&mut out, section, 0);
    }
    out
}
