//! Research session facade
//!
//! Holds the history store, the request lifecycle, the displayed report and
//! the input text. A presentation layer mutates state only through the
//! operations here.

use crate::lifecycle::{RequestLifecycle, SubmitOrigin};
use crate::service::ResearchService;
use crate::store::{Filter, HistoryId, SessionStore, StoreSignal};
use crate::SessionResult;
use scholar_core::{with_timeout, ResearchReport, ScholarConfig};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ResearchSession {
    store: SessionStore,
    lifecycle: RequestLifecycle,
    service: Arc<dyn ResearchService>,
    displayed: Option<Arc<ResearchReport>>,
    input: String,
    timeout_ms: u64,
}

impl std::fmt::Debug for ResearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchSession")
            .field("store", &self.store)
            .field("lifecycle", &self.lifecycle)
            .field("displayed", &self.displayed.as_ref().map(|r| r.task().to_string()))
            .finish()
    }
}

impl ResearchSession {
    pub fn new(service: Arc<dyn ResearchService>, config: &ScholarConfig) -> Self {
        Self {
            store: SessionStore::new(config.history.clone()),
            lifecycle: RequestLifecycle::new(Arc::clone(&service), config.service.timeout_ms),
            service,
            displayed: None,
            input: String::new(),
            timeout_ms: config.service.timeout_ms,
        }
    }

    /// Submit a new task typed by the user.
    ///
    /// On success the task is recorded in history and the report replaces
    /// the displayed one. On failure nothing changes.
    pub async fn submit(&mut self, task: &str) -> SessionResult<Arc<ResearchReport>> {
        let completion = self.lifecycle.submit(task, SubmitOrigin::Fresh).await?;

        if completion.should_record_history() {
            self.store.add(task)?;
        }

        Ok(self.display(completion.report))
    }

    /// Activate a history entry.
    ///
    /// Entries with a task are researched again without touching history;
    /// blank entries clear the display. Unknown ids change nothing and
    /// return `Ok(None)`.
    pub async fn select(&mut self, id: HistoryId) -> SessionResult<Option<Arc<ResearchReport>>> {
        match self.store.select(id) {
            None => {
                warn!(%id, "Ignoring selection of unknown history entry");
                Ok(None)
            }
            Some(StoreSignal::ClearDisplay { .. }) => {
                self.clear_display();
                Ok(None)
            }
            Some(StoreSignal::Resubmit { task, .. }) => {
                let completion = self.lifecycle.submit(&task, SubmitOrigin::History).await?;
                Ok(Some(self.display(completion.report)))
            }
        }
    }

    /// Start a blank entry and clear the display
    pub fn new_chat(&mut self) -> Option<HistoryId> {
        let signal = self.store.add_blank();
        self.clear_display();
        signal.id()
    }

    /// Forget all history and clear the display
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.clear_display();
    }

    /// Seed history from the service's list of past queries.
    ///
    /// Only has an effect on an empty history. Returns the number of entries
    /// created.
    pub async fn hydrate(&mut self) -> SessionResult<usize> {
        let tasks = with_timeout(self.service.past_queries(), self.timeout_ms, "past_queries")
            .await
            .and_then(|result| result)?;
        let created = self.store.seed(tasks);
        info!(created, "Hydrated history");
        Ok(created)
    }

    pub fn filter(&self, query: &str) -> Filter<'_> {
        self.store.filter(query)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn displayed(&self) -> Option<&Arc<ResearchReport>> {
        self.displayed.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// True while a request is outstanding; the submit control should be
    /// disabled meanwhile
    pub fn is_pending(&self) -> bool {
        self.lifecycle.is_pending()
    }

    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    fn display(&mut self, report: ResearchReport) -> Arc<ResearchReport> {
        let report = Arc::new(report);
        self.displayed = Some(Arc::clone(&report));
        report
    }

    fn clear_display(&mut self) {
        self.displayed = None;
        self.input.clear();
    }
}
