//! Help search against the in-memory offer store with a canned oracle.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use reliefmap_common::HelpOffer;
use reliefmap_core::testing::MockHelpOracle;
use reliefmap_core::{HelpMatcher, HelpOfferStore, MemoryStore};

const HELPLINES: &str = r#"```json
{"helplines": [{"agency": "NDRF", "number": "011-24363260", "description": "National Disaster Response Force"}]}
```"#;

async fn stored_offers(store: &MemoryStore) -> Vec<HelpOffer> {
    let now = Utc::now();
    let entries = [
        json!({"name": "Asha", "location": "Chennai", "offer": "boat rescue"}),
        json!({"name": "Vikram", "location": "Mumbai", "offer": "dry rations"}),
    ];
    for (i, entry) in entries.into_iter().enumerate() {
        let details = entry.as_object().cloned().unwrap();
        store
            .insert_offer(HelpOffer::from_submission(
                details,
                now + Duration::milliseconds(i as i64),
            ))
            .await
            .unwrap();
    }
    store.list_offers().await.unwrap()
}

#[tokio::test]
async fn returns_relevant_offers_and_helplines() {
    let store = MemoryStore::new();
    let offers = stored_offers(&store).await;
    let chennai = offers
        .iter()
        .find(|o| o.details["location"] == "Chennai")
        .unwrap()
        .clone();

    let answer = serde_json::to_string(&vec![&chennai]).unwrap();
    let oracle = Arc::new(MockHelpOracle::answering(&answer, HELPLINES));
    let matcher = HelpMatcher::new(oracle.clone());

    let result = matcher.search("Chennai", &offers).await.unwrap();

    assert_eq!(result.offers, vec![chennai]);
    assert_eq!(result.helplines.len(), 1);
    assert_eq!(result.helplines[0].agency, "NDRF");
    assert_eq!(oracle.offers_seen(), vec![2]);
}

#[tokio::test]
async fn malformed_offer_answer_degrades_to_empty() {
    let store = MemoryStore::new();
    let offers = stored_offers(&store).await;
    let matcher = HelpMatcher::new(Arc::new(MockHelpOracle::answering(
        "Asha can help with a boat.",
        HELPLINES,
    )));

    let result = matcher.search("Chennai", &offers).await.unwrap();

    assert!(result.offers.is_empty());
    assert_eq!(result.helplines.len(), 1);
}

#[tokio::test]
async fn malformed_helpline_answer_degrades_to_empty() {
    let matcher = HelpMatcher::new(Arc::new(MockHelpOracle::answering("[]", "Dial 112.")));

    let result = matcher.search("Chennai", &[]).await.unwrap();

    assert!(result.offers.is_empty());
    assert!(result.helplines.is_empty());
}

#[tokio::test]
async fn one_failed_call_still_answers() {
    let matcher = HelpMatcher::new(Arc::new(
        MockHelpOracle::answering("[]", HELPLINES).failing_offers(),
    ));

    let result = matcher.search("Chennai", &[]).await.unwrap();

    assert!(result.offers.is_empty());
    assert_eq!(result.helplines[0].number, "011-24363260");
}

#[tokio::test]
async fn both_calls_failing_is_oracle_unavailable() {
    let matcher = HelpMatcher::new(Arc::new(
        MockHelpOracle::answering("[]", HELPLINES)
            .failing_offers()
            .failing_helplines(),
    ));

    let err = matcher.search("Chennai", &[]).await.unwrap_err();

    assert_eq!(err.kind(), "OracleUnavailable");
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let oracle = Arc::new(MockHelpOracle::answering("[]", HELPLINES));
    let matcher = HelpMatcher::new(oracle.clone());

    let err = matcher.search("   ", &[]).await.unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
    assert!(oracle.offers_seen().is_empty());
}
