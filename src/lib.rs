// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Quire: a headless notes editor core with snapshot undo and embedded images

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod data;
pub mod editing;
pub mod model;
pub mod persistence;
pub mod script;
pub mod settings;
pub mod surface;

pub use config::EditorConfig;
pub use data::AppState;
pub use editing::EditorSession;
pub use script::ScriptRunner;

/// Entry point for the `quire` command-line driver
pub fn run() -> Result<()> {
    // Initialize tracing subscriber (can be controlled via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("quire=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("Usage: quire <notes.json> <script> [config.toml]");
    }
    let store_path = PathBuf::from(&args[1]);
    let script_path = PathBuf::from(&args[2]);

    let config = match args.get(3) {
        Some(path) => EditorConfig::load(Path::new(path))?,
        None => EditorConfig::default(),
    };
    let script = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read script: {}", script_path.display()))?;

    let app = AppState::open_json(&store_path, config)?;
    let base_dir = script_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut runner = ScriptRunner::new(app).with_base_dir(base_dir);
    runner.run(&script)?;
    runner.settle();

    for line in runner.output() {
        println!("{line}");
    }

    let mut app = runner.into_app();
    if !app.save() {
        tracing::error!("Final save failed");
    }
    if let Some(session) = app.session() {
        println!("{}", session.content());
    }
    app.close_note();
    Ok(())
}
