//! In-memory log group/stream registry.
//!
//! # Responsibilities
//! - Lazily create one log group per function, one stream per version tag
//! - Accumulate log lines per invocation, append-only
//! - Surface every line for live operator tailing as a side channel
//!
//! # Design Decisions
//! - The store is an explicitly constructed object shared via Arc, not a
//!   singleton; creation at process start, reset through `clear`/`drain`
//! - The active stream per prefix is kept in a map so concurrent
//!   `stream(prefix)` calls cannot race-create two diverging streams
//! - Draining takes lines, not streams: an invocation still holding a
//!   stream handle keeps appending to the same stream, and those lines
//!   land in the next dispatch cycle instead of being lost

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;

/// Append-only stream of log lines for one function version.
#[derive(Debug)]
pub struct LogStream {
    id: String,
    moment: DateTime<Utc>,
    name: String,
    lines: Mutex<Vec<String>>,
}

impl LogStream {
    fn new(prefix: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let moment = Utc::now();
        let name = format!(
            "{}/{}/{}/[{}]{}",
            moment.year(),
            moment.month(),
            moment.day(),
            prefix,
            id
        );

        Self {
            id,
            moment,
            name,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.moment
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a line, stripping display-only formatting for storage. The
    /// raw line is also surfaced for live tailing.
    pub fn log(&self, line: &str) {
        let stored = console::strip_ansi_codes(line).into_owned();
        self.lines
            .lock()
            .expect("log stream lock poisoned")
            .push(stored);

        tracing::info!(target: "edgefront::tail", stream = %self.name, "{line}");
    }

    /// Snapshot of the accumulated lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .expect("log stream lock poisoned")
            .clone()
    }

    /// Atomically take the accumulated lines, leaving the stream empty.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().expect("log stream lock poisoned"))
    }
}

#[derive(Debug, Default)]
struct GroupStreams {
    streams: Vec<Arc<LogStream>>,
    active_by_prefix: HashMap<String, Arc<LogStream>>,
}

/// Named collection of streams, one group per function.
#[derive(Debug)]
pub struct LogGroup {
    name: String,
    inner: Mutex<GroupStreams>,
}

impl LogGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Mutex::new(GroupStreams::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The most recently created stream for `prefix`, created on first
    /// use.
    pub fn stream(&self, prefix: &str) -> Arc<LogStream> {
        let mut inner = self.inner.lock().expect("log group lock poisoned");
        if let Some(stream) = inner.active_by_prefix.get(prefix) {
            return Arc::clone(stream);
        }

        let stream = Arc::new(LogStream::new(prefix));
        inner.streams.push(Arc::clone(&stream));
        inner
            .active_by_prefix
            .insert(prefix.to_string(), Arc::clone(&stream));
        stream
    }

    /// Snapshot of all streams, in creation order.
    pub fn streams(&self) -> Vec<Arc<LogStream>> {
        self.inner
            .lock()
            .expect("log group lock poisoned")
            .streams
            .clone()
    }

    /// Discard all streams in bulk. Streams are never removed one by one.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("log group lock poisoned");
        inner.streams.clear();
        inner.active_by_prefix.clear();
    }
}

/// Process-wide log store, shared by the pipeline and the dispatcher.
#[derive(Debug, Default)]
pub struct LogStore {
    groups: DashMap<String, Arc<LogGroup>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return or lazily create the group with `name`.
    pub fn group(&self, name: &str) -> Arc<LogGroup> {
        Arc::clone(
            &self
                .groups
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(LogGroup::new(name))),
        )
    }

    /// Snapshot of all groups.
    pub fn groups(&self) -> Vec<Arc<LogGroup>> {
        self.groups
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Discard every stream of every group.
    pub fn clear(&self) {
        for entry in self.groups.iter() {
            entry.value().clear();
        }
    }

    /// Take the lines of every stream of every group, as one atomic
    /// snapshot per stream. Lines appended mid-drain land in the next
    /// cycle.
    pub fn drain(&self) -> Vec<DrainedGroup> {
        self.groups()
            .into_iter()
            .map(|group| {
                let streams = group
                    .streams()
                    .into_iter()
                    .map(|stream| DrainedStream {
                        name: stream.name().to_string(),
                        lines: stream.take_lines(),
                    })
                    .collect();
                DrainedGroup {
                    name: group.name().to_string(),
                    streams,
                }
            })
            .collect()
    }
}

/// One group's worth of drained log lines.
#[derive(Debug)]
pub struct DrainedGroup {
    pub name: String,
    pub streams: Vec<DrainedStream>,
}

#[derive(Debug)]
pub struct DrainedStream {
    pub name: String,
    pub lines: Vec<String>,
}
