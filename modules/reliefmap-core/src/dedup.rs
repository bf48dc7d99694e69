//! Report ingestion: match a report against known events, gate it on
//! plausibility, then merge into the matched event or create a new one.
//!
//! Steps, strictly sequential for one report:
//!
//! 1. geocode the report location (best effort)
//! 2. search for corroborating posts (best effort)
//! 3. scan the event store
//! 4. ask the oracle about each stored event in store order; first "yes" wins
//! 5. plausibility gate: a "no" rejects the report with zero writes
//! 6. classify trust from the two signals
//! 7/8. update-by-id on a match, insert otherwise
//!
//! Geocode and corroboration failures degrade. Oracle and store failures abort
//! before any write, so a failed ingestion never leaves a half-merged event.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use reliefmap_common::{
    Event, EventDescriptor, EventUpdate, Evidence, GeoPoint, NewEvent, ReliefMapError, Report,
};

use crate::traits::{CorroborationSearch, EventOracle, EventStore, LocationResolver};
use crate::trust::{self, Corroboration};

/// Per-call time limits for the pipeline's external calls.
#[derive(Debug, Clone, TypedBuilder)]
pub struct EngineSettings {
    /// Bound on each match or plausibility judgment.
    #[builder(default = Duration::from_secs(30))]
    pub oracle_timeout: Duration,
    /// Bound on the geocode and corroboration lookups.
    #[builder(default = Duration::from_secs(10))]
    pub lookup_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// No stored event matched; a new one was inserted.
    Created(Event),
    /// The report was merged into an existing event.
    Merged(Event),
}

impl IngestOutcome {
    pub fn event(&self) -> &Event {
        match self {
            IngestOutcome::Created(e) | IngestOutcome::Merged(e) => e,
        }
    }

    pub fn into_event(self) -> Event {
        match self {
            IngestOutcome::Created(e) | IngestOutcome::Merged(e) => e,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, IngestOutcome::Created(_))
    }
}

pub struct DeduplicationEngine {
    resolver: Arc<dyn LocationResolver>,
    corroboration: Arc<dyn CorroborationSearch>,
    oracle: Arc<dyn EventOracle>,
    store: Arc<dyn EventStore>,
    settings: EngineSettings,
}

impl DeduplicationEngine {
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        corroboration: Arc<dyn CorroborationSearch>,
        oracle: Arc<dyn EventOracle>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            resolver,
            corroboration,
            oracle,
            store,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Ingest one report. Performs exactly one store write on success and
    /// none on failure.
    pub async fn ingest(&self, report: Report) -> Result<IngestOutcome, ReliefMapError> {
        report.validate()?;

        let descriptor = report.descriptor();
        let location_point = self.resolve_location(&report).await;
        let corroboration = self.corroborate(&report).await;

        let events = self.store.scan().await.map_err(|e| {
            warn!(error = %e, "Event scan failed");
            ReliefMapError::StoreUnavailable(e.to_string())
        })?;

        let matched = self.find_match(&descriptor, &events).await?;

        let evidence = trust::evidence(&corroboration, report.image());
        let plausible = self.judge_plausible(&descriptor, &evidence).await?;
        if !plausible {
            info!(
                disaster_type = %report.disaster_type,
                location = %report.location,
                matched = matched.is_some(),
                "Report rejected by plausibility gate"
            );
            return Err(ReliefMapError::NotPlausible);
        }

        let verification = trust::verification(plausible, &corroboration);
        let now = Utc::now();

        match matched {
            Some(existing) => {
                let update = EventUpdate {
                    append_image: report.image().map(str::to_string),
                    timestamp: now,
                    verification,
                };
                let updated = self
                    .store
                    .update_by_id(existing.id, update)
                    .await
                    .map_err(|e| {
                        warn!(event_id = %existing.id, error = %e, "Event merge failed");
                        ReliefMapError::StoreUnavailable(e.to_string())
                    })?;
                info!(
                    event_id = %updated.id,
                    report_count = updated.report_count,
                    status = %updated.verification.verification_status,
                    "Report merged into existing event"
                );
                Ok(IngestOutcome::Merged(updated))
            }
            None => {
                let new = NewEvent::from_report(&report, location_point, now, verification);
                let created = self.store.insert(new).await.map_err(|e| {
                    warn!(error = %e, "Event insert failed");
                    ReliefMapError::StoreUnavailable(e.to_string())
                })?;
                info!(
                    event_id = %created.id,
                    status = %created.verification.verification_status,
                    geocoded = created.location_point().is_some(),
                    "New event created"
                );
                Ok(IngestOutcome::Created(created))
            }
        }
    }

    /// Linear scan in store order, stopping at the first event the oracle
    /// affirms. Later events are never consulted once one matches.
    async fn find_match<'a>(
        &self,
        report: &EventDescriptor,
        events: &'a [Event],
    ) -> Result<Option<&'a Event>, ReliefMapError> {
        for (position, existing) in events.iter().enumerate() {
            let existing_descriptor = existing.descriptor();
            let same = self
                .call_oracle(
                    "judge_match",
                    self.oracle.judge_match(report, &existing_descriptor),
                )
                .await?;
            if same {
                debug!(event_id = %existing.id, position, "Oracle matched existing event");
                return Ok(Some(existing));
            }
        }
        debug!(candidates = events.len(), "No existing event matched");
        Ok(None)
    }

    async fn judge_plausible(
        &self,
        report: &EventDescriptor,
        evidence: &Evidence,
    ) -> Result<bool, ReliefMapError> {
        self.call_oracle(
            "judge_plausible",
            self.oracle.judge_plausible(report, evidence),
        )
        .await
    }

    async fn resolve_location(&self, report: &Report) -> Option<GeoPoint> {
        let address = report.geocode_query();
        self.lookup(
            ReliefMapError::GeocodeUnavailable,
            self.resolver.resolve(&address),
        )
            .await
            .flatten()
    }

    async fn corroborate(&self, report: &Report) -> Corroboration {
        let query = report.corroboration_query();
        match self
            .lookup(
                ReliefMapError::CorroborationUnavailable,
                self.corroboration.search(&query),
            )
            .await
        {
            Some(posts) => {
                if !posts.is_empty() {
                    let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
                    debug!(count = posts.len(), ?texts, "Relevant posts found");
                }
                Corroboration::from_posts(&posts)
            }
            None => Corroboration::none(),
        }
    }

    /// Decision-critical call: any failure or timeout aborts the ingestion.
    async fn call_oracle<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, ReliefMapError> {
        match tokio::time::timeout(self.settings.oracle_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(call, error = %e, "Oracle call failed");
                Err(ReliefMapError::OracleUnavailable(format!("{call}: {e}")))
            }
            Err(_) => {
                warn!(call, timeout = ?self.settings.oracle_timeout, "Oracle call timed out");
                Err(ReliefMapError::OracleUnavailable(format!(
                    "{call} timed out after {:?}",
                    self.settings.oracle_timeout
                )))
            }
        }
    }

    /// Best-effort call: failures and timeouts are logged and become `None`.
    async fn lookup<T>(
        &self,
        unavailable: fn(String) -> ReliefMapError,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Option<T> {
        let err = match tokio::time::timeout(self.settings.lookup_timeout, fut).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => unavailable(e.to_string()),
            Err(_) => unavailable(format!(
                "timed out after {:?}",
                self.settings.lookup_timeout
            )),
        };
        warn!(kind = err.kind(), error = %err, "Lookup failed, continuing without it");
        None
    }
}
