//! In-memory ports and scripted collaborators for tests
//!
//! The stores honour the same conditional-write contracts as the SQLite
//! adapters. The provider and pipeline replay queued responses and record
//! what they were called with.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use jobscout_common::auth::TokenSet;
use jobscout_domain::{
    AccessToken, CredentialRecord, FetchReport, Result, SchedulerState, Versioned,
};

use crate::auth::ports::{AuthorizationProvider, CredentialStore, ProviderError};
use crate::scheduling::ports::{FetchPipeline, PipelineError, SchedulerStateStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type SwapHook = Box<dyn FnOnce(&mut SchedulerState) + Send>;

/// Versioned in-memory `SchedulerStateStore`
#[derive(Default)]
pub struct InMemorySchedulerStateStore {
    documents: Mutex<HashMap<String, Versioned<SchedulerState>>>,
    before_swap: Mutex<Option<SwapHook>>,
    swaps: AtomicUsize,
}

impl InMemorySchedulerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `state` at version 1, replacing anything present
    pub fn seed(&self, id: &str, state: SchedulerState) {
        lock(&self.documents).insert(id.to_string(), Versioned::new(1, state));
    }

    pub fn get(&self, id: &str) -> Option<Versioned<SchedulerState>> {
        lock(&self.documents).get(id).cloned()
    }

    /// Simulate a concurrent writer: `hook` mutates the stored document and
    /// bumps its version just before the next compare-and-swap is evaluated.
    pub fn before_next_swap<F>(&self, hook: F)
    where
        F: FnOnce(&mut SchedulerState) + Send + 'static,
    {
        *lock(&self.before_swap) = Some(Box::new(hook));
    }

    /// Number of successful compare-and-swap writes
    pub fn swap_count(&self) -> usize {
        self.swaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulerStateStore for InMemorySchedulerStateStore {
    async fn load(&self, id: &str) -> Result<Option<Versioned<SchedulerState>>> {
        Ok(self.get(id))
    }

    async fn create_if_absent(
        &self,
        id: &str,
        state: &SchedulerState,
    ) -> Result<(Versioned<SchedulerState>, bool)> {
        let mut documents = lock(&self.documents);
        if let Some(existing) = documents.get(id) {
            return Ok((existing.clone(), false));
        }
        let created = Versioned::new(1, state.clone());
        documents.insert(id.to_string(), created.clone());
        Ok((created, true))
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        state: &SchedulerState,
    ) -> Result<Option<u64>> {
        let hook = lock(&self.before_swap).take();
        let mut documents = lock(&self.documents);
        let Some(current) = documents.get_mut(id) else {
            return Ok(None);
        };

        if let Some(hook) = hook {
            hook(&mut current.value);
            current.version += 1;
        }

        if current.version != expected_version {
            return Ok(None);
        }
        current.version += 1;
        current.value = state.clone();
        self.swaps.fetch_add(1, Ordering::SeqCst);
        Ok(Some(current.version))
    }
}

/// In-memory `CredentialStore`
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
    replacements: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(id: &str, record: CredentialRecord) -> Self {
        let store = Self::new();
        lock(&store.records).insert(id.to_string(), record);
        store
    }

    pub fn get(&self, id: &str) -> Option<CredentialRecord> {
        lock(&self.records).get(id).cloned()
    }

    /// Overwrite directly, bypassing the conditional write
    pub fn overwrite(&self, id: &str, record: CredentialRecord) {
        lock(&self.records).insert(id.to_string(), record);
    }

    /// Number of successful conditional replacements
    pub fn replacement_count(&self) -> usize {
        self.replacements.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.get(id))
    }

    async fn put(&self, id: &str, record: &CredentialRecord) -> Result<()> {
        self.overwrite(id, record.clone());
        Ok(())
    }

    async fn replace_if_unchanged(
        &self,
        id: &str,
        expected_refresh_token: &str,
        record: &CredentialRecord,
    ) -> Result<bool> {
        let mut records = lock(&self.records);
        match records.get_mut(id) {
            Some(current) if current.refresh_token == expected_refresh_token => {
                *current = record.clone();
                self.replacements.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Authorization provider replaying queued responses
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<std::result::Result<TokenSet, ProviderError>>>,
    received: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful refresh
    pub fn push_tokens(&self, access_token: &str, refresh_token: Option<&str>, expires_in: i64) {
        lock(&self.responses).push_back(Ok(TokenSet::new(
            access_token.to_string(),
            refresh_token.map(str::to_string),
            expires_in,
            None,
        )));
    }

    /// Queue a failed refresh
    pub fn push_error(&self, error: ProviderError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Sleep this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Refresh tokens presented so far, in order
    pub fn received(&self) -> Vec<String> {
        lock(&self.received).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.received).len()
    }
}

#[async_trait]
impl AuthorizationProvider for ScriptedProvider {
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<TokenSet, ProviderError> {
        lock(&self.received).push(refresh_token.to_string());
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transient("no scripted response".to_string())))
    }
}

/// Fetch pipeline replaying queued responses
#[derive(Default)]
pub struct ScriptedPipeline {
    responses: Mutex<VecDeque<ScriptedRun>>,
    tokens_seen: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    panic_next: Mutex<bool>,
}

struct ScriptedRun {
    result: std::result::Result<FetchReport, PipelineError>,
    delay: Option<Duration>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, report: FetchReport) {
        self.push(Ok(report), None);
    }

    pub fn push_error(&self, error: PipelineError) {
        self.push(Err(error), None);
    }

    /// Queue a response that is only returned after `delay`
    pub fn push_ok_after(&self, report: FetchReport, delay: Duration) {
        self.push(Ok(report), Some(delay));
    }

    /// Queue a failure that is only returned after `delay`
    pub fn push_error_after(&self, error: PipelineError, delay: Duration) {
        self.push(Err(error), Some(delay));
    }

    /// Delay for runs whose response carries none
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Make the next run panic
    pub fn panic_next(&self) {
        *lock(&self.panic_next) = true;
    }

    /// Bearer tokens the pipeline was invoked with
    pub fn tokens_seen(&self) -> Vec<String> {
        lock(&self.tokens_seen).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.tokens_seen).len()
    }

    fn push(&self, result: std::result::Result<FetchReport, PipelineError>, delay: Option<Duration>) {
        lock(&self.responses).push_back(ScriptedRun { result, delay });
    }
}

#[async_trait]
impl FetchPipeline for ScriptedPipeline {
    #[allow(clippy::panic)]
    async fn run(&self, token: &AccessToken) -> std::result::Result<FetchReport, PipelineError> {
        lock(&self.tokens_seen).push(token.as_str().to_string());
        // Responses are claimed in call order, before any delay
        let scripted = lock(&self.responses).pop_front();
        let delay = scripted.as_ref().and_then(|run| run.delay).or(*lock(&self.delay));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let should_panic = std::mem::take(&mut *lock(&self.panic_next));
        if should_panic {
            panic!("scripted pipeline panic");
        }
        scripted.map_or_else(
            || Err(PipelineError::Transport("no scripted response".to_string())),
            |run| run.result,
        )
    }
}
