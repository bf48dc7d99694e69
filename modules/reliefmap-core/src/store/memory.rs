// In-process event and help-offer store.
//
// Used when no DATABASE_URL is configured and as the backing store in tests.
// A single mutex guards each collection, so a merge's increment and append
// happen under one lock and concurrent merges never lose a report.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use reliefmap_common::{Event, EventUpdate, HelpOffer, NewEvent};

use crate::traits::{EventStore, HelpOfferStore};

#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<Vec<Event>>,
    offers: Mutex<Vec<HelpOffer>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.lock_events().map(|e| e.len()).unwrap_or(0)
    }

    /// Snapshot of all events in insertion order.
    pub fn events(&self) -> Vec<Event> {
        self.lock_events().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn get(&self, id: Uuid) -> Option<Event> {
        self.lock_events()
            .ok()?
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    fn lock_events(&self) -> Result<std::sync::MutexGuard<'_, Vec<Event>>> {
        self.events
            .lock()
            .map_err(|_| anyhow!("memory event store poisoned"))
    }

    fn lock_offers(&self) -> Result<std::sync::MutexGuard<'_, Vec<HelpOffer>>> {
        self.offers
            .lock()
            .map_err(|_| anyhow!("memory offer store poisoned"))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn scan(&self) -> Result<Vec<Event>> {
        Ok(self.lock_events()?.clone())
    }

    async fn list_recent(&self) -> Result<Vec<Event>> {
        let mut events = self.lock_events()?.clone();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let event = Event::from_new(Uuid::new_v4(), event);
        self.lock_events()?.push(event.clone());
        Ok(event)
    }

    async fn update_by_id(&self, id: Uuid, update: EventUpdate) -> Result<Event> {
        let mut events = self.lock_events()?;
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("event {id} not found"))?;
        event.apply(update);
        Ok(event.clone())
    }
}

#[async_trait]
impl HelpOfferStore for MemoryStore {
    async fn list_offers(&self) -> Result<Vec<HelpOffer>> {
        let mut offers = self.lock_offers()?.clone();
        offers.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(offers)
    }

    async fn insert_offer(&self, mut offer: HelpOffer) -> Result<HelpOffer> {
        let mut offers = self.lock_offers()?;
        if offers.iter().any(|o| o.id == offer.id) {
            offer.id = offers.iter().map(|o| o.id).max().unwrap_or(offer.id) + 1;
        }
        offers.push(offer.clone());
        Ok(offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_event, pending};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn scan_preserves_insertion_order() {
        let store = MemoryStore::new();
        let a = store.insert(new_event("first")).await.unwrap();
        let b = store.insert(new_event("second")).await.unwrap();

        let ids: Vec<Uuid> = store.scan().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn list_recent_orders_by_timestamp_desc() {
        let store = MemoryStore::new();
        let old = store.insert(new_event("old")).await.unwrap();
        let _newer = store.insert(new_event("newer")).await.unwrap();

        store
            .update_by_id(
                old.id,
                EventUpdate {
                    append_image: None,
                    timestamp: Utc::now() + Duration::minutes(5),
                    verification: pending(),
                },
            )
            .await
            .unwrap();

        let recent = store.list_recent().await.unwrap();
        assert_eq!(recent[0].id, old.id);
    }

    #[tokio::test]
    async fn update_increments_and_appends() {
        let store = MemoryStore::new();
        let created = store.insert(new_event("flood")).await.unwrap();

        let updated = store
            .update_by_id(
                created.id,
                EventUpdate {
                    append_image: Some("img-2".into()),
                    timestamp: Utc::now(),
                    verification: pending(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.report_count, 2);
        assert_eq!(updated.images, vec!["img-2".to_string()]);
        assert_eq!(store.get(created.id).unwrap(), updated);
    }

    #[tokio::test]
    async fn update_unknown_id_fails() {
        let store = MemoryStore::new();
        let result = store
            .update_by_id(
                Uuid::new_v4(),
                EventUpdate {
                    append_image: None,
                    timestamp: Utc::now(),
                    verification: pending(),
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn offers_listed_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for offset in [0, 2, 1] {
            let offer = HelpOffer::from_submission(
                serde_json::Map::new(),
                now + Duration::milliseconds(offset),
            );
            store.insert_offer(offer).await.unwrap();
        }
        let ids: Vec<i64> = store.list_offers().await.unwrap().iter().map(|o| o.id).collect();
        let base = now.timestamp_millis();
        assert_eq!(ids, vec![base + 2, base + 1, base]);
    }

    #[tokio::test]
    async fn same_millisecond_offers_get_distinct_ids() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let base = now.timestamp_millis();

        let mut details = serde_json::Map::new();
        details.insert("offer".into(), serde_json::json!("boat"));
        let first = store
            .insert_offer(HelpOffer::from_submission(details.clone(), now))
            .await
            .unwrap();
        let second = store
            .insert_offer(HelpOffer::from_submission(details, now))
            .await
            .unwrap();

        assert_eq!(first.id, base);
        assert_eq!(second.id, base + 1);
        assert_eq!(second.details["offer"], "boat");
        assert_eq!(store.list_offers().await.unwrap().len(), 2);
    }
}
