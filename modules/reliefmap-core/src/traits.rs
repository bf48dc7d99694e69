// Collaborator boundaries of the ingestion pipeline.
//
// Every external dependency of DeduplicationEngine and HelpMatcher sits behind
// one of these traits so tests can swap in the deterministic mocks from
// `testing.rs`: no network, no database.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use reliefmap_common::{
    CorroborationPost, Event, EventDescriptor, EventUpdate, Evidence, GeoPoint, HelpOffer,
    NewEvent,
};

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolve a free-text address. `Ok(None)` means "no such place";
    /// `Err` is reserved for transport failures.
    async fn resolve(&self, address: &str) -> Result<Option<GeoPoint>>;
}

#[async_trait]
pub trait CorroborationSearch: Send + Sync {
    /// Recent public posts about `query`. Bounded, possibly empty.
    async fn search(&self, query: &str) -> Result<Vec<CorroborationPost>>;
}

// ---------------------------------------------------------------------------
// Oracles
// ---------------------------------------------------------------------------

/// Black-box judgments about reports. Answers are not idempotent and may be
/// inconsistent across calls, including under argument swap.
#[async_trait]
pub trait EventOracle: Send + Sync {
    /// Does `report` describe the same real-world event as `existing`?
    async fn judge_match(&self, report: &EventDescriptor, existing: &EventDescriptor)
        -> Result<bool>;

    /// Is `report` plausibly a real disaster given the evidence?
    async fn judge_plausible(&self, report: &EventDescriptor, evidence: &Evidence) -> Result<bool>;
}

/// Raw-text answers for help search. Parsing is the caller's job so that
/// malformed answers can degrade independently.
#[async_trait]
pub trait HelpOracle: Send + Sync {
    /// Answer expected to be a JSON array of the relevant offers.
    async fn filter_offers(&self, query: &str, offers: &[HelpOffer]) -> Result<String>;

    /// Answer expected to be `{"helplines": [{agency, number, description}]}`.
    async fn helplines(&self, query: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event, in store (insertion) order.
    async fn scan(&self) -> Result<Vec<Event>>;

    /// Every event, most recently updated first.
    async fn list_recent(&self) -> Result<Vec<Event>>;

    /// Persist a new event. The store assigns its id.
    async fn insert(&self, event: NewEvent) -> Result<Event>;

    /// Merge a duplicate report into `id`. The report-count increment and the
    /// image append are applied atomically by the store.
    async fn update_by_id(&self, id: Uuid, update: EventUpdate) -> Result<Event>;
}

#[async_trait]
pub trait HelpOfferStore: Send + Sync {
    /// Every offer, newest (highest id) first.
    async fn list_offers(&self) -> Result<Vec<HelpOffer>>;

    /// Persist an offer and return it as stored. If its id is already taken
    /// (two submissions in the same millisecond), the store assigns one past
    /// the current largest id instead.
    async fn insert_offer(&self, offer: HelpOffer) -> Result<HelpOffer>;
}
