//! Help search: filter stored help offers for a query and look up helplines.
//!
//! The two oracle questions are independent. A malformed or failed answer to
//! one yields an empty list for that half only; the request fails only when
//! the oracle could not be reached for either question.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use gemini_client::strip_code_blocks;
use serde::Deserialize;
use tracing::{info, warn};

use reliefmap_common::{HelpOffer, HelpSearchResult, Helpline, ReliefMapError};

use crate::traits::HelpOracle;

#[derive(Deserialize)]
struct HelplineDirectory {
    #[serde(default)]
    helplines: Vec<Helpline>,
}

/// Parse the offer-filter answer: a JSON array of offers. Only entries whose
/// `id` names a stored offer survive, and they are returned as stored.
pub fn parse_offers(answer: &str, offers: &[HelpOffer]) -> Option<Vec<HelpOffer>> {
    let picked: Vec<serde_json::Value> = serde_json::from_str(strip_code_blocks(answer)).ok()?;
    let by_id: HashMap<i64, &HelpOffer> = offers.iter().map(|o| (o.id, o)).collect();

    let mut seen = HashSet::new();
    Some(
        picked
            .iter()
            .filter_map(|v| v.get("id")?.as_i64())
            .filter(|id| seen.insert(*id))
            .filter_map(|id| by_id.get(&id).map(|o| (*o).clone()))
            .collect(),
    )
}

/// Parse the helpline answer: `{"helplines": [...]}` or a bare array.
pub fn parse_helplines(answer: &str) -> Option<Vec<Helpline>> {
    let body = strip_code_blocks(answer);
    if let Ok(directory) = serde_json::from_str::<HelplineDirectory>(body) {
        return Some(directory.helplines);
    }
    serde_json::from_str::<Vec<Helpline>>(body).ok()
}

pub struct HelpMatcher {
    oracle: Arc<dyn HelpOracle>,
    timeout: Duration,
}

impl HelpMatcher {
    pub fn new(oracle: Arc<dyn HelpOracle>) -> Self {
        Self {
            oracle,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn search(
        &self,
        query: &str,
        offers: &[HelpOffer],
    ) -> Result<HelpSearchResult, ReliefMapError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ReliefMapError::Validation("query must not be empty".into()));
        }

        let (offers_answer, helplines_answer) = tokio::join!(
            tokio::time::timeout(self.timeout, self.oracle.filter_offers(query, offers)),
            tokio::time::timeout(self.timeout, self.oracle.helplines(query)),
        );

        let offers_answer = flatten_answer("filter_offers", offers_answer);
        let helplines_answer = flatten_answer("helplines", helplines_answer);

        if let (Err(offers_err), Err(helplines_err)) = (&offers_answer, &helplines_answer) {
            return Err(ReliefMapError::OracleUnavailable(format!(
                "filter_offers: {offers_err}; helplines: {helplines_err}"
            )));
        }

        let matched = offers_answer
            .ok()
            .and_then(|answer| {
                let parsed = parse_offers(&answer, offers);
                if parsed.is_none() {
                    warn!("Offer filter answer was not a JSON array, returning no offers");
                }
                parsed
            })
            .unwrap_or_default();

        let helplines = helplines_answer
            .ok()
            .and_then(|answer| {
                let parsed = parse_helplines(&answer);
                if parsed.is_none() {
                    warn!("Helpline answer was not valid JSON, returning no helplines");
                }
                parsed
            })
            .unwrap_or_default();

        info!(
            candidates = offers.len(),
            offers = matched.len(),
            helplines = helplines.len(),
            "Help search complete"
        );

        Ok(HelpSearchResult {
            offers: matched,
            helplines,
        })
    }
}

fn flatten_answer(
    call: &'static str,
    answer: Result<anyhow::Result<String>, tokio::time::error::Elapsed>,
) -> Result<String, String> {
    match answer {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!(call, error = %e, "Help oracle call failed");
            Err(e.to_string())
        }
        Err(_) => {
            warn!(call, "Help oracle call timed out");
            Err("timed out".to_string())
        }
    }
}
