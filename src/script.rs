// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Line-oriented editing scripts.
//!
//! A script drives an `AppState` the way a UI shell would, one command per
//! line, against a virtual clock that only moves on `wait`. That makes
//! debounce and restore timings reproducible from the command line.
//!
//! ```text
//! notebook Work
//! new Plan
//! type Hello
//! wait 1000
//! select 0 0 0 5
//! bold
//! undo
//! print
//! ```

use crate::data::AppState;
use crate::editing::{
    Alignment, BlockFormat, FormatIntent, Key, KeyPress, ShellEvent,
};
use crate::model::{NoteId, NotebookId};
use crate::surface::{Boundary, Range};
use anyhow::{Context, Result, anyhow, bail};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Runs scripts against an `AppState` with a virtual clock
pub struct ScriptRunner {
    app: AppState,
    start: Instant,
    elapsed: Duration,
    notebook: Option<NotebookId>,
    base_dir: PathBuf,
    output: Vec<String>,
}

impl ScriptRunner {
    pub fn new(app: AppState) -> Self {
        Self {
            app,
            start: Instant::now(),
            elapsed: Duration::ZERO,
            notebook: None,
            base_dir: PathBuf::new(),
            output: Vec::new(),
        }
    }

    /// Resolve relative image paths against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn into_app(self) -> AppState {
        self.app
    }

    /// Virtual time now
    pub fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    /// Lines produced by `print` and shell messages
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Execute every line of `script`
    pub fn run(&mut self, script: &str) -> Result<()> {
        for (number, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.execute(line)
                .with_context(|| format!("Line {}: {}", number + 1, line))?;
        }
        Ok(())
    }

    /// Advance the clock until nothing is pending
    pub fn settle(&mut self) {
        while let Some(deadline) = self.app.next_deadline() {
            self.advance_to(deadline);
        }
        self.collect_events();
    }

    /// Execute a single command line
    pub fn execute(&mut self, line: &str) -> Result<()> {
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));
        let now = self.now();

        match command {
            "notebook" => {
                self.notebook = Some(self.app.create_notebook(rest)?);
            }
            "new" => {
                let id = self.app.create_note(self.notebook.clone(), rest, now)?;
                self.output.push(format!("note {id}"));
            }
            "open" => {
                self.app.open_note(&NoteId::new(rest), now)?;
            }
            "wait" => {
                let ms: u64 = rest
                    .parse()
                    .with_context(|| format!("Invalid duration: {rest}"))?;
                self.wait(Duration::from_millis(ms));
            }
            "blur" => self.app.blur(),
            "save" => {
                if !self.app.save() {
                    self.output.push("save failed".to_string());
                }
            }
            "key" => {
                let key = match rest {
                    "enter" => Key::Enter,
                    "backspace" => Key::Backspace,
                    "delete" => Key::Delete,
                    other => bail!("Unknown key: {other}"),
                };
                self.require_note()?;
                self.app.press_key(KeyPress::plain(key), now);
            }
            "image" => {
                self.require_note()?;
                let mut parts = rest.split_whitespace();
                let file = parts.next().ok_or_else(|| anyhow!("Missing image file"))?;
                let path = self.resolve(Path::new(file));
                self.app.insert_image_file(&path, parts.next(), now)?;
            }
            _ => self.edit(command, rest, now)?,
        }
        self.collect_events();
        Ok(())
    }

    /// Commands that act on the open session directly
    fn edit(&mut self, command: &str, rest: &str, now: Instant) -> Result<()> {
        let session = self
            .app
            .session_mut()
            .ok_or_else(|| anyhow!("No note is open"))?;

        let intent = match command {
            "title" => {
                session.set_title(rest, now);
                return Ok(());
            }
            "type" => {
                session.insert_text(rest, now);
                return Ok(());
            }
            "paste" => {
                session.paste_plain_text(&rest.replace("\\n", "\n"), now);
                return Ok(());
            }
            "focus" => {
                session.focus(now);
                return Ok(());
            }
            "undo" => {
                session.undo(now);
                return Ok(());
            }
            "redo" => {
                session.redo(now);
                return Ok(());
            }
            "caret-end" => {
                session.surface_mut().caret_to_end();
                return Ok(());
            }
            "select-all" => {
                let surface = session.surface_mut();
                surface.select_contents(surface.root());
                return Ok(());
            }
            "select" => {
                let range = parse_range(session.surface(), rest)?;
                if !session.surface_mut().set_selection(range) {
                    bail!("Selection out of range: {rest}");
                }
                return Ok(());
            }
            "print" => {
                let markup = session.content();
                self.output.push(markup);
                return Ok(());
            }
            "bold" => FormatIntent::Bold,
            "italic" => FormatIntent::Italic,
            "underline" => FormatIntent::Underline,
            "strike" => FormatIntent::Strikethrough,
            "bullets" => FormatIntent::UnorderedList,
            "numbers" => FormatIntent::OrderedList,
            "quote" => FormatIntent::Quote,
            "code" => FormatIntent::Code,
            "link" => FormatIntent::Link(rest.to_string()),
            "color" => FormatIntent::TextColor(rest.to_string()),
            "highlight" => FormatIntent::Highlight(rest.to_string()),
            "align" => FormatIntent::Align(
                Alignment::parse(rest).ok_or_else(|| anyhow!("Unknown alignment: {rest}"))?,
            ),
            "heading" => FormatIntent::Block(
                BlockFormat::parse(rest).ok_or_else(|| anyhow!("Unknown block format: {rest}"))?,
            ),
            other => bail!("Unknown command: {other}"),
        };
        let outcome = session.format(intent, now);
        tracing::debug!("{} -> {:?}", command, outcome);
        Ok(())
    }

    fn require_note(&self) -> Result<()> {
        if self.app.has_open_note() {
            Ok(())
        } else {
            Err(anyhow!("No note is open"))
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Move the clock forward, running tasks at their own deadlines
    fn wait(&mut self, duration: Duration) {
        let target = self.now() + duration;
        while let Some(deadline) = self.app.next_deadline().filter(|d| *d <= target) {
            self.advance_to(deadline);
        }
        self.elapsed = target - self.start;
    }

    fn advance_to(&mut self, deadline: Instant) {
        if deadline > self.now() {
            self.elapsed = deadline - self.start;
        }
        self.app.tick(self.now());
    }

    fn collect_events(&mut self) {
        for event in self.app.drain_events() {
            match event {
                ShellEvent::Message(message) => {
                    tracing::info!("Message: {}", message);
                    self.output.push(format!("message: {message}"));
                }
                ShellEvent::SaveStateChanged(state) => {
                    tracing::debug!("Save state: {}", state.as_str());
                }
                ShellEvent::CheckpointStateChanged { can_undo, can_redo } => {
                    tracing::debug!("Undo: {}, redo: {}", can_undo, can_redo);
                }
                ShellEvent::ImagePreview { name, .. } => {
                    tracing::info!("Preview requested: {}", name);
                }
            }
        }
    }
}

/// `<path> <offset> <path> <offset>`, paths as `0/1/2` or `-` for the root
fn parse_range(surface: &crate::surface::ContentSurface, text: &str) -> Result<Range> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [start_path, start_offset, end_path, end_offset] = parts.as_slice() else {
        bail!("Expected <path> <offset> <path> <offset>");
    };
    let boundary = |path: &str, offset: &str| -> Result<Boundary> {
        let indices = parse_path(path)?;
        let node = surface
            .node_at_path(&indices)
            .ok_or_else(|| anyhow!("No node at path {path}"))?;
        let offset = offset
            .parse()
            .with_context(|| format!("Invalid offset: {offset}"))?;
        Ok(Boundary::new(node, offset))
    };
    Ok(Range::new(
        boundary(start_path, start_offset)?,
        boundary(end_path, end_offset)?,
    ))
}

fn parse_path(text: &str) -> Result<Vec<usize>> {
    if text == "-" {
        return Ok(Vec::new());
    }
    text.split('/')
        .map(|index| {
            index
                .parse()
                .with_context(|| format!("Invalid path segment: {index}"))
        })
        .collect()
}
