use std::fs;
use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rover_core::command::format_commands;
use rover_core::detections::{latest_with_detections, parse_sessions};
use rover_core::{plan_drive, CompileOptions, DriveProfile, Path, PathCompiler};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rover", version, about = "Compile planner paths and inspect detection logs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a path file (`[[x,y],...]`) into motion commands
    Compile {
        #[arg(long = "path", value_name = "PATH")]
        path: PathBuf,

        /// Fail on non-adjacent waypoints instead of skipping them
        #[arg(long)]
        strict: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the timed motor plan for a path file
    Plan {
        #[arg(long = "path", value_name = "PATH")]
        path: PathBuf,

        /// Drive profile JSON; missing fields take defaults
        #[arg(long = "profile", value_name = "PATH")]
        profile: Option<PathBuf>,
    },
    /// Summarize measurement sessions in a detector log
    Detections {
        #[arg(long = "log", value_name = "PATH")]
        log: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Log filter from `RUST_LOG`-style directives, `info` when absent or invalid.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives.and_then(|d| EnvFilter::try_new(d).ok()).unwrap_or_else(|| EnvFilter::new("info"))
}

fn read_path(file: &FsPath) -> Result<Path> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {:?}", file))?;
    serde_json::from_str(&raw).with_context(|| format!("{:?} is not a [[x,y],...] path", file))
}

/// Runs one subcommand and returns what should be printed.
pub fn run(args: &Args) -> Result<String> {
    match &args.command {
        Command::Compile { path, strict, format } => {
            let p = read_path(path)?;
            let options = if *strict { CompileOptions::strict() } else { CompileOptions::default() };
            let cmds = PathCompiler::new(options).compile_path(&p)?;
            info!(waypoints = p.len(), commands = cmds.len(), "compiled");
            Ok(match format {
                Format::Text => format_commands(&cmds),
                Format::Json => serde_json::to_string_pretty(&cmds)?,
            })
        }
        Command::Plan { path, profile } => {
            let p = read_path(path)?;
            let profile: DriveProfile = match profile {
                Some(f) => {
                    let raw = fs::read_to_string(f).with_context(|| format!("failed to read {:?}", f))?;
                    serde_json::from_str(&raw).context("invalid drive profile")?
                }
                None => DriveProfile::default(),
            };
            let cmds = PathCompiler::default().compile_path(&p)?;
            let plan = plan_drive(&cmds, &profile);
            Ok(serde_json::to_string_pretty(&json!({ "total_ms": plan.total_ms(), "steps": plan.steps }))?)
        }
        Command::Detections { log } => {
            let text = fs::read_to_string(log).with_context(|| format!("failed to read {:?}", log))?;
            let sessions = parse_sessions(&text);
            let mut out = String::new();
            for s in &sessions {
                let counts: Vec<String> = s.class_counts().iter().map(|c| format!("{}={}", c.class, c.count)).collect();
                out.push_str(&format!("{} [{}] {}\n", s.session_id, s.label, counts.join(" ")));
            }
            if let Some(latest) = latest_with_detections(&sessions) {
                out.push_str(&format!("latest with detections: {}\n", latest.session_id));
            }
            Ok(out)
        }
    }
}
