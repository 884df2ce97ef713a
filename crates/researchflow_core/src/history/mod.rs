//! Undo/redo history.
//!
//! # Responsibility
//! - Execute commands against a mutation target and record them.
//! - Move commands between the undo and redo stacks.
//! - Persist both stacks to `undo_history.json` beside the project snapshot.
//!
//! # Invariants
//! - The undo stack never exceeds `capacity`; the oldest entry is evicted.
//! - Any recorded `execute` clears the redo stack.
//! - While a replay guard is raised, `execute` records and applies nothing.
//! - Stacks are persisted oldest-first, via temp file and rename.
//! - A command whose replay fails is discarded from both stacks.

pub mod guard;

pub use guard::{ReplayFlag, ReplayGuard};

use crate::command::{decode_command, encode_command, Command, MutationTarget, TargetError};
use crate::config::{HISTORY_FILE, MAX_HISTORY};
use crate::store::write_replacing;
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(Debug)]
pub enum HistoryError {
    /// Applying or reversing a command failed.
    Target(TargetError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// History artifact is not valid JSON, or a command failed to encode.
    Format(serde_json::Error),
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(err) => write!(f, "command failed: {err}"),
            Self::Io { path, source } => {
                write!(f, "history io error at `{}`: {source}", path.display())
            }
            Self::Format(err) => write!(f, "malformed history: {err}"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Target(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Format(err) => Some(err),
        }
    }
}

impl From<TargetError> for HistoryError {
    fn from(value: TargetError) -> Self {
        Self::Target(value)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Format(value)
    }
}

/// Outcome of loading a history artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryLoadReport {
    pub undo_loaded: usize,
    pub redo_loaded: usize,
    /// Records skipped for an unknown kind or malformed fields, plus undo
    /// entries trimmed to fit the capacity.
    pub dropped: usize,
}

/// Bounded undo/redo stacks with optional autosave.
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    capacity: usize,
    replay: ReplayFlag,
    history_file: Option<PathBuf>,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            replay: ReplayFlag::new(),
            history_file: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the command `undo` would reverse.
    pub fn undo_label(&self) -> Option<String> {
        self.undo_stack.back().map(Command::description)
    }

    /// Label of the command `redo` would re-apply.
    pub fn redo_label(&self) -> Option<String> {
        self.redo_stack.last().map(Command::description)
    }

    /// Undo stack, oldest first.
    pub fn undo_commands(&self) -> impl DoubleEndedIterator<Item = &Command> {
        self.undo_stack.iter()
    }

    /// Redo stack, oldest first; the last entry is the next redo.
    pub fn redo_commands(&self) -> impl DoubleEndedIterator<Item = &Command> {
        self.redo_stack.iter()
    }

    /// Handle to the replay flag, for targets that report their own edits.
    pub fn replay_flag(&self) -> ReplayFlag {
        self.replay.clone()
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_active()
    }

    /// Enables autosave to `<project_dir>/undo_history.json`.
    pub fn attach(&mut self, project_dir: &Path) {
        self.history_file = Some(project_dir.join(HISTORY_FILE));
    }

    pub fn detach(&mut self) {
        self.history_file = None;
    }

    pub fn history_file(&self) -> Option<&Path> {
        self.history_file.as_deref()
    }

    /// Applies `command` and records it.
    ///
    /// Returns `Ok(false)` without applying anything while a replay is in
    /// progress. When `apply` fails nothing is recorded and the redo stack
    /// is kept.
    pub fn execute(
        &mut self,
        command: impl Into<Command>,
        target: &mut dyn MutationTarget,
    ) -> HistoryResult<bool> {
        let mut command = command.into();
        if self.replay.is_active() {
            debug!(
                "event=history_execute module=history status=skip reason=replaying kind={}",
                command.kind().as_str()
            );
            return Ok(false);
        }

        if let Err(err) = command.apply(target) {
            warn!(
                "event=history_execute module=history status=error kind={} error={err}",
                command.kind().as_str()
            );
            return Err(err.into());
        }

        let kind = command.kind();
        self.push_undo(command);
        self.redo_stack.clear();
        debug!(
            "event=history_execute module=history status=ok kind={} undo={} redo=0",
            kind.as_str(),
            self.undo_stack.len()
        );
        self.autosave();
        Ok(true)
    }

    /// Reverses the newest command. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, target: &mut dyn MutationTarget) -> HistoryResult<bool> {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        let outcome = {
            let _guard = self.replay.enter();
            command.reverse(target)
        };
        self.finish_replay("undo", command, outcome, |manager, command| {
            manager.redo_stack.push(command)
        })
    }

    /// Re-applies the newest undone command. `Ok(false)` when there is
    /// nothing to redo.
    pub fn redo(&mut self, target: &mut dyn MutationTarget) -> HistoryResult<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let outcome = {
            let _guard = self.replay.enter();
            command.apply(target)
        };
        self.finish_replay("redo", command, outcome, Self::push_undo)
    }

    /// Empties both stacks. Neither the graph nor the history file is touched.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Writes both stacks to `<project_dir>/undo_history.json`.
    pub fn save_to_file(&self, project_dir: &Path) -> HistoryResult<()> {
        self.write_history(&project_dir.join(HISTORY_FILE))
    }

    /// Replaces both stacks with the contents of
    /// `<project_dir>/undo_history.json`.
    ///
    /// A missing file yields empty stacks. Unreadable or malformed files
    /// return an error and leave the current stacks untouched. Individual
    /// records that fail to decode are dropped.
    pub fn load_from_file(&mut self, project_dir: &Path) -> HistoryResult<HistoryLoadReport> {
        let path = project_dir.join(HISTORY_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.clear();
                debug!("event=history_load module=history status=ok reason=no_file");
                return Ok(HistoryLoadReport::default());
            }
            Err(source) => return Err(HistoryError::Io { path, source }),
        };
        let value: Value = serde_json::from_str(&text).map_err(|err| {
            error!("event=history_load module=history status=error reason=format");
            HistoryError::Format(err)
        })?;

        let mut report = HistoryLoadReport::default();
        let mut undo_stack: VecDeque<Command> = decode_stack(&value, "undo_stack", &mut report);
        let redo_stack: Vec<Command> = decode_stack(&value, "redo_stack", &mut report);
        while undo_stack.len() > self.capacity {
            undo_stack.pop_front();
            report.dropped += 1;
        }
        report.undo_loaded = undo_stack.len();
        report.redo_loaded = redo_stack.len();

        self.undo_stack = undo_stack;
        self.redo_stack = redo_stack;
        info!(
            "event=history_load module=history status=ok undo={} redo={} dropped={}",
            report.undo_loaded, report.redo_loaded, report.dropped
        );
        Ok(report)
    }

    fn push_undo(&mut self, command: Command) {
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    fn finish_replay(
        &mut self,
        action: &str,
        command: Command,
        outcome: Result<(), TargetError>,
        on_success: impl FnOnce(&mut Self, Command),
    ) -> HistoryResult<bool> {
        let kind = command.kind();
        let result = match outcome {
            Ok(()) => {
                on_success(self, command);
                info!(
                    "event=history_{action} module=history status=ok kind={} undo={} redo={}",
                    kind.as_str(),
                    self.undo_stack.len(),
                    self.redo_stack.len()
                );
                Ok(true)
            }
            Err(err) => {
                error!(
                    "event=history_{action} module=history status=error kind={} reason=discarded error={err}",
                    kind.as_str()
                );
                Err(HistoryError::Target(err))
            }
        };
        self.autosave();
        result
    }

    fn autosave(&self) {
        let Some(path) = self.history_file.as_deref() else {
            return;
        };
        if let Err(err) = self.write_history(path) {
            error!("event=history_save module=history status=error error={err}");
        }
    }

    fn write_history(&self, path: &Path) -> HistoryResult<()> {
        let undo = self
            .undo_stack
            .iter()
            .map(encode_command)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let redo = self
            .redo_stack
            .iter()
            .map(encode_command)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let text = serde_json::to_string_pretty(&json!({
            "undo_stack": undo,
            "redo_stack": redo,
        }))?;
        write_replacing(path, text.as_bytes())
            .map_err(|(path, source)| HistoryError::Io { path, source })
    }
}

fn decode_stack<C>(value: &Value, key: &str, report: &mut HistoryLoadReport) -> C
where
    C: FromIterator<Command>,
{
    let records = value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    records
        .iter()
        .filter_map(|record| {
            let command = decode_command(record);
            if command.is_none() {
                report.dropped += 1;
            }
            command
        })
        .collect()
}
