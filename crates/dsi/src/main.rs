//! `dsi`: inspect and drive windows from the command line.
//!
//! # Usage
//!
//! ```text
//! dsi [--config <PATH>] <COMMAND>
//!
//! Commands:
//!   list                      Every window, one per line
//!   active                    The focused window
//!   find  --pid <PID> | --name <TEXT>
//!   pixel <X> <Y>             Capture the target window and print one pixel
//!   type  <TEXT>              Send text to the target window
//!   key   <NAME>              Send a named key (Enter, F5, ArrowUp, ...)
//!   click <X> <Y> [--button]  Click at window coordinates
//!   warp  <X> <Y>             Move the pointer relative to the target window
//! ```
//!
//! Commands that act on a window take `--pid` or `--name` to choose it and
//! default to the active window.
//!
//! Log output goes to stderr.  `RUST_LOG` overrides the `general.log_level`
//! value from the config file.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dsi::infrastructure::config::ConfigError;
use dsi::{load_config, load_config_from, Backend, Dsi, DsiConfig};
use dsi_core::{Key, MouseButton, Window};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "dsi", about = "Inspect and drive desktop windows", version)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, global = true, env = "DSI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every window.
    List,
    /// Show the window with input focus.
    Active,
    /// Find the first window matching a PID or a name substring.
    Find(Target),
    /// Print the pixel at window coordinates `(x, y)`.
    Pixel {
        x: u32,
        y: u32,
        #[command(flatten)]
        target: Target,
    },
    /// Type text into a window.
    Type {
        text: String,
        #[command(flatten)]
        target: Target,
    },
    /// Press and release a named key.
    Key {
        #[arg(value_parser = parse_key)]
        key: Key,
        #[command(flatten)]
        target: Target,
    },
    /// Click at window coordinates.
    Click {
        x: i32,
        y: i32,
        #[arg(long, default_value = "left", value_parser = parse_button)]
        button: MouseButton,
        #[command(flatten)]
        target: Target,
    },
    /// Move the pointer to window coordinates.
    Warp {
        x: i32,
        y: i32,
        #[command(flatten)]
        target: Target,
    },
}

/// Selects the window a command acts on.
#[derive(Debug, Clone, Default, Args)]
struct Target {
    /// Owning process id.
    #[arg(long, conflicts_with = "name")]
    pid: Option<u32>,

    /// Case-sensitive substring of the window name.
    #[arg(long)]
    name: Option<String>,
}

fn parse_key(s: &str) -> Result<Key, String> {
    s.parse::<Key>().map_err(|e| e.to_string())
}

fn parse_button(s: &str) -> Result<MouseButton, String> {
    s.parse::<MouseButton>().map_err(|e| e.to_string())
}

// ── Command execution ─────────────────────────────────────────────────────────

fn resolve<B: Backend>(dsi: &Dsi<B>, target: &Target) -> anyhow::Result<B::Window> {
    let found = match (target.pid, target.name.as_deref()) {
        (Some(pid), _) => dsi.get_window_by_pid(pid),
        (None, Some(name)) => dsi.get_window_by_name(name),
        (None, None) => dsi.get_active_window(),
    };
    found.with_context(|| match (target.pid, target.name.as_deref()) {
        (Some(pid), _) => format!("no window owned by pid {pid}"),
        (None, Some(name)) => format!("no window named like '{name}'"),
        (None, None) => "no active window".to_string(),
    })
}

/// Runs one command, writing its report to `out`.
fn execute<B: Backend>(
    dsi: &Dsi<B>,
    command: &Command,
    out: &mut impl std::io::Write,
) -> anyhow::Result<()> {
    match command {
        Command::List => {
            for window in dsi.get_all_windows() {
                writeln!(out, "{}", window.snapshot())?;
            }
        }
        Command::Active => {
            let window = resolve(dsi, &Target::default())?;
            writeln!(out, "{}", window.snapshot())?;
        }
        Command::Find(target) => {
            if target.pid.is_none() && target.name.is_none() {
                bail!("find needs --pid or --name");
            }
            let window = resolve(dsi, target)?;
            writeln!(out, "{}", window.snapshot())?;
        }
        Command::Pixel { x, y, target } => {
            let window = resolve(dsi, target)?;
            let image = window.capture(None).context("capture failed")?;
            let [b, g, r, a] = image.get_pixel(*x, *y).with_context(|| {
                format!("({x}, {y}) is outside the {}x{} capture", image.width(), image.height())
            })?;
            writeln!(out, "#{r:02x}{g:02x}{b:02x} alpha={a}")?;
        }
        Command::Type { text, target } => {
            resolve(dsi, target)?.send_string(text)?;
        }
        Command::Key { key, target } => {
            resolve(dsi, target)?.send_key(*key)?;
        }
        Command::Click { x, y, button, target } => {
            resolve(dsi, target)?.send_click(*x, *y, *button)?;
        }
        Command::Warp { x, y, target } => {
            resolve(dsi, target)?.warp_pointer(*x, *y, None)?;
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: DsiConfig = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match load_config() {
            Err(ConfigError::NoPlatformConfigDir) => DsiConfig::default(),
            loaded => loaded.context("failed to load config")?,
        },
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    let dsi = Dsi::with_config(&config).context("failed to open display")?;
    let stdout = std::io::stdout();
    execute(&dsi, &cli.command, &mut stdout.lock())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
