// Test mocks for the ingestion pipeline and help search.
//
// One mock per trait boundary:
// - MockResolver (LocationResolver): fixed point, no place, or transport error
// - MockCorroboration (CorroborationSearch): fixed post count or error
// - MockOracle (EventOracle): rule-based match answers, fixed plausibility
// - FlakyStore (EventStore): MemoryStore with switchable failures
// - MockHelpOracle (HelpOracle): canned raw answers
//
// Plus helpers for building reports, insert requests and verification fields.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use reliefmap_common::{
    CorroborationPost, Event, EventDescriptor, EventUpdate, Evidence, GeoPoint, HelpOffer,
    NewEvent, Report, Verification, VerificationStatus,
};

use crate::store::MemoryStore;
use crate::traits::{CorroborationSearch, EventOracle, EventStore, HelpOracle, LocationResolver};

// ---------------------------------------------------------------------------
// Test constants and builders
// ---------------------------------------------------------------------------

/// Chennai, Tamil Nadu coordinates.
pub const CHENNAI: GeoPoint = GeoPoint {
    lat: 13.0827,
    lng: 80.2707,
};

/// Anonymous flood report from Chennai.
pub fn chennai_flood() -> Report {
    report("flood", "Chennai", "Heavy flooding downtown")
}

pub fn report(disaster_type: &str, location: &str, description: &str) -> Report {
    Report {
        name: String::new(),
        disaster_type: disaster_type.to_string(),
        country: "India".to_string(),
        state: "Tamil Nadu".to_string(),
        location: location.to_string(),
        description: description.to_string(),
        image: None,
    }
}

pub fn pending() -> Verification {
    Verification {
        gemini_verified: true,
        twitter_verified: false,
        verification_status: VerificationStatus::Pending,
        tweets_summary: "No recent tweets found.".to_string(),
    }
}

/// Insert request for a flood in Chennai with the given description.
pub fn new_event(description: &str) -> NewEvent {
    NewEvent::from_report(
        &report("flood", "Chennai", description),
        Some(CHENNAI),
        Utc::now(),
        pending(),
    )
}

// ---------------------------------------------------------------------------
// MockResolver
// ---------------------------------------------------------------------------

pub struct MockResolver {
    answer: Option<Option<GeoPoint>>,
    calls: Arc<AtomicUsize>,
}

impl MockResolver {
    pub fn at(point: GeoPoint) -> Self {
        Self {
            answer: Some(Some(point)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolves every address to "no such place".
    pub fn nowhere() -> Self {
        Self {
            answer: Some(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationResolver for MockResolver {
    async fn resolve(&self, _address: &str) -> Result<Option<GeoPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answer {
            Some(point) => Ok(point),
            None => bail!("geocoder unreachable"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCorroboration
// ---------------------------------------------------------------------------

pub struct MockCorroboration {
    post_count: Option<usize>,
    queries: Mutex<Vec<String>>,
}

impl MockCorroboration {
    pub fn empty() -> Self {
        Self::with_posts(0)
    }

    pub fn with_posts(count: usize) -> Self {
        Self {
            post_count: Some(count),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            post_count: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorroborationSearch for MockCorroboration {
    async fn search(&self, query: &str) -> Result<Vec<CorroborationPost>> {
        self.queries.lock().unwrap().push(query.to_string());
        let Some(count) = self.post_count else {
            bail!("search API returned 503");
        };
        Ok((0..count)
            .map(|i| CorroborationPost {
                text: format!("post {i} about {query}"),
                author: Some(format!("user{i}")),
                created_at: Some(Utc::now()),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockOracle
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum MatchRule {
    Never,
    Always,
    /// Yes when the stored event's description is in the list.
    Descriptions(Vec<String>),
    Fail,
}

#[derive(Default)]
struct OracleCalls {
    matched_against: Vec<String>,
    plausibility: Vec<Evidence>,
}

/// Deterministic event oracle. Clones share their call log, so a test can
/// hand one clone to the engine and inspect the other.
#[derive(Clone)]
pub struct MockOracle {
    rule: MatchRule,
    plausible: Option<bool>,
    delay: Option<Duration>,
    calls: Arc<Mutex<OracleCalls>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    /// Never matches, always plausible.
    pub fn new() -> Self {
        Self {
            rule: MatchRule::Never,
            plausible: Some(true),
            delay: None,
            calls: Arc::new(Mutex::new(OracleCalls::default())),
        }
    }

    pub fn matching_all(mut self) -> Self {
        self.rule = MatchRule::Always;
        self
    }

    pub fn matching_descriptions(mut self, descriptions: &[&str]) -> Self {
        self.rule =
            MatchRule::Descriptions(descriptions.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn implausible(mut self) -> Self {
        self.plausible = Some(false);
        self
    }

    pub fn failing_match(mut self) -> Self {
        self.rule = MatchRule::Fail;
        self
    }

    pub fn failing_plausibility(mut self) -> Self {
        self.plausible = None;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn match_calls(&self) -> usize {
        self.calls.lock().unwrap().matched_against.len()
    }

    /// Descriptions of the stored events the oracle was asked about, in order.
    pub fn matched_against(&self) -> Vec<String> {
        self.calls.lock().unwrap().matched_against.clone()
    }

    pub fn plausibility_calls(&self) -> usize {
        self.calls.lock().unwrap().plausibility.len()
    }

    pub fn last_evidence(&self) -> Option<Evidence> {
        self.calls.lock().unwrap().plausibility.last().cloned()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EventOracle for MockOracle {
    async fn judge_match(
        &self,
        _report: &EventDescriptor,
        existing: &EventDescriptor,
    ) -> Result<bool> {
        self.pause().await;
        self.calls
            .lock()
            .unwrap()
            .matched_against
            .push(existing.description.clone());
        match &self.rule {
            MatchRule::Never => Ok(false),
            MatchRule::Always => Ok(true),
            MatchRule::Descriptions(list) => Ok(list.contains(&existing.description)),
            MatchRule::Fail => bail!("oracle quota exceeded"),
        }
    }

    async fn judge_plausible(&self, _report: &EventDescriptor, evidence: &Evidence) -> Result<bool> {
        self.pause().await;
        self.calls.lock().unwrap().plausibility.push(evidence.clone());
        match self.plausible {
            Some(answer) => Ok(answer),
            None => bail!("oracle quota exceeded"),
        }
    }
}

// ---------------------------------------------------------------------------
// FlakyStore
// ---------------------------------------------------------------------------

/// MemoryStore wrapper whose operations can be switched to fail.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_scan: AtomicBool,
    fail_insert: AtomicBool,
    fail_update: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_scan: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }

    pub fn fail_scan(self) -> Self {
        self.fail_scan.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_insert(self) -> Self {
        self.fail_insert.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_update(self) -> Self {
        self.fail_update.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn scan(&self) -> Result<Vec<Event>> {
        if self.fail_scan.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.scan().await
    }

    async fn list_recent(&self) -> Result<Vec<Event>> {
        if self.fail_scan.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.list_recent().await
    }

    async fn insert(&self, event: NewEvent) -> Result<Event> {
        if self.fail_insert.load(Ordering::SeqCst) {
            bail!("connection reset during insert");
        }
        self.inner.insert(event).await
    }

    async fn update_by_id(&self, id: Uuid, update: EventUpdate) -> Result<Event> {
        if self.fail_update.load(Ordering::SeqCst) {
            bail!("connection reset during update");
        }
        self.inner.update_by_id(id, update).await
    }
}

// ---------------------------------------------------------------------------
// MockHelpOracle
// ---------------------------------------------------------------------------

/// Canned raw answers. `None` makes that call fail.
pub struct MockHelpOracle {
    offers_answer: Option<String>,
    helplines_answer: Option<String>,
    offers_seen: Mutex<Vec<usize>>,
}

impl MockHelpOracle {
    pub fn answering(offers: &str, helplines: &str) -> Self {
        Self {
            offers_answer: Some(offers.to_string()),
            helplines_answer: Some(helplines.to_string()),
            offers_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_offers(mut self) -> Self {
        self.offers_answer = None;
        self
    }

    pub fn failing_helplines(mut self) -> Self {
        self.helplines_answer = None;
        self
    }

    /// Number of candidate offers passed on each filter call.
    pub fn offers_seen(&self) -> Vec<usize> {
        self.offers_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HelpOracle for MockHelpOracle {
    async fn filter_offers(&self, _query: &str, offers: &[HelpOffer]) -> Result<String> {
        self.offers_seen.lock().unwrap().push(offers.len());
        match &self.offers_answer {
            Some(answer) => Ok(answer.clone()),
            None => bail!("oracle quota exceeded"),
        }
    }

    async fn helplines(&self, _query: &str) -> Result<String> {
        match &self.helplines_answer {
            Some(answer) => Ok(answer.clone()),
            None => bail!("oracle quota exceeded"),
        }
    }
}
