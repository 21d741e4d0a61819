//! Session history store
//!
//! Ordered, deduplicated collection of past queries. Entries are kept
//! most-recent-first; at most one entry is active at a time. The store lives
//! only as long as the process and is never written to disk.

use chrono::{DateTime, Utc};
use scholar_core::{validation_error, HistoryConfig, ScholarResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Identifier of a history entry.
///
/// Derived from the creation time in milliseconds and bumped past the
/// previous id when two entries land in the same millisecond, so ids are
/// strictly increasing and never reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HistoryId(u64);

impl HistoryId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored reference to a submitted (or blank) task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    /// Display label
    pub title: String,
    /// Original query; empty for a blank entry
    pub task: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Blank entries were created by "new chat" and carry no task
    pub fn is_blank(&self) -> bool {
        self.task.is_empty()
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.task.to_lowercase().contains(needle)
    }
}

/// What the caller has to do after a store operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSignal {
    /// Run the task again through the request lifecycle
    Resubmit { id: HistoryId, task: String },
    /// Drop the displayed report and empty the input
    ClearDisplay { id: Option<HistoryId> },
}

impl StoreSignal {
    /// Entry the signal refers to, if any
    pub fn id(&self) -> Option<HistoryId> {
        match self {
            StoreSignal::Resubmit { id, .. } => Some(*id),
            StoreSignal::ClearDisplay { id } => *id,
        }
    }
}

/// Result of [`SessionStore::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub id: HistoryId,
    /// False when an entry with the same task already existed
    pub created: bool,
}

#[derive(Debug, Default)]
struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    fn next(&mut self, now: DateTime<Utc>) -> HistoryId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last + 1);
        self.last = id;
        HistoryId(id)
    }
}

/// Ordered collection of history entries with an active selection
#[derive(Debug)]
pub struct SessionStore {
    entries: Vec<HistoryEntry>,
    active_id: Option<HistoryId>,
    ids: IdAllocator,
    config: HistoryConfig,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl SessionStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            active_id: None,
            ids: IdAllocator::default(),
            config,
        }
    }

    /// Record a submitted task and make it active.
    ///
    /// An existing entry with the same task is re-activated instead of
    /// duplicated. Blank tasks are rejected.
    pub fn add(&mut self, task: &str) -> ScholarResult<AddOutcome> {
        let task = task.trim();
        if task.is_empty() {
            return Err(validation_error!(
                "Task must not be empty",
                "task",
                "session_store"
            ));
        }

        if let Some(existing) = self.find_by_task(task) {
            let id = existing.id;
            debug!(%id, "Task already in history, re-activating");
            self.active_id = Some(id);
            return Ok(AddOutcome { id, created: false });
        }

        let title = self.title_for(task);
        let id = self.push_front(title, task.to_string());
        self.active_id = Some(id);
        info!(%id, entries = self.entries.len(), "Added history entry");

        Ok(AddOutcome { id, created: true })
    }

    /// Create a blank entry and make it active
    pub fn add_blank(&mut self) -> StoreSignal {
        let id = self.push_front(self.config.blank_title.clone(), String::new());
        self.active_id = Some(id);
        info!(%id, "Added blank history entry");

        StoreSignal::ClearDisplay { id: Some(id) }
    }

    /// Activate an entry.
    ///
    /// Returns `None` and changes nothing if `id` is unknown.
    pub fn select(&mut self, id: HistoryId) -> Option<StoreSignal> {
        let entry = self.get(id)?;
        let signal = if entry.is_blank() {
            StoreSignal::ClearDisplay { id: Some(id) }
        } else {
            StoreSignal::Resubmit {
                id,
                task: entry.task.clone(),
            }
        };

        self.active_id = Some(id);
        debug!(%id, "Selected history entry");
        Some(signal)
    }

    /// Remove every entry and clear the active selection
    pub fn clear_all(&mut self) -> StoreSignal {
        let removed = self.entries.len();
        self.entries.clear();
        self.active_id = None;
        info!(removed, "Cleared history");

        StoreSignal::ClearDisplay { id: None }
    }

    /// Case-insensitive substring search over titles and tasks.
    ///
    /// Lazy and restartable (clone it to iterate again); store order is kept.
    pub fn filter(&self, query: &str) -> Filter<'_> {
        Filter {
            entries: self.entries.iter(),
            needle: query.to_lowercase(),
        }
    }

    /// Populate an empty store from a list of past tasks, oldest first.
    ///
    /// Blank and duplicate tasks are skipped and the active entry is left
    /// alone. Returns the number of entries created; always 0 on a non-empty
    /// store.
    pub fn seed<I, S>(&mut self, tasks: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.entries.is_empty() {
            debug!("History already populated, skipping seed");
            return 0;
        }

        let mut created = 0;
        for task in tasks {
            let task = task.as_ref().trim();
            if task.is_empty() || self.find_by_task(task).is_some() {
                continue;
            }
            let title = self.title_for(task);
            self.push_front(title, task.to_string());
            created += 1;
        }

        info!(created, "Seeded history from past queries");
        created
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn find_by_task(&self, task: &str) -> Option<&HistoryEntry> {
        if task.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| entry.task == task)
    }

    pub fn active_id(&self) -> Option<HistoryId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&HistoryEntry> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_front(&mut self, title: String, task: String) -> HistoryId {
        let created_at = Utc::now();
        let id = self.ids.next(created_at);
        self.entries.insert(
            0,
            HistoryEntry {
                id,
                title,
                task,
                created_at,
            },
        );
        id
    }

    fn title_for(&self, task: &str) -> String {
        truncate_title(task, self.config.title_max_chars)
    }
}

/// Cut `task` to `max_chars` characters, marking the cut with "..."
pub fn truncate_title(task: &str, max_chars: usize) -> String {
    if task.chars().count() <= max_chars {
        return task.to_string();
    }
    let mut title: String = task.chars().take(max_chars).collect();
    title.push_str("...");
    title
}

/// Iterator returned by [`SessionStore::filter`]
#[derive(Debug, Clone)]
pub struct Filter<'a> {
    entries: std::slice::Iter<'a, HistoryEntry>,
    needle: String,
}

impl<'a> Iterator for Filter<'a> {
    type Item = &'a HistoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.entries.find(|entry| entry.matches(needle))
    }
}
