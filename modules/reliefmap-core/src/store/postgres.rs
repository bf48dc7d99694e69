use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use reliefmap_common::{Event, EventUpdate, HelpOffer, NewEvent, Verification};

use crate::traits::{EventStore, HelpOfferStore};

const EVENT_COLUMNS: &str = "id, name, disaster_type, country, state, location, description, \
     lat, lng, images, report_count, last_reported_at, gemini_verified, twitter_verified, \
     verification_status, tweets_summary";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    disaster_type: String,
    country: String,
    state: String,
    location: String,
    description: String,
    lat: Option<f64>,
    lng: Option<f64>,
    images: Vec<String>,
    report_count: i32,
    last_reported_at: DateTime<Utc>,
    gemini_verified: bool,
    twitter_verified: bool,
    verification_status: String,
    tweets_summary: String,
}

impl TryFrom<EventRow> for Event {
    type Error = anyhow::Error;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Event {
            id: row.id,
            name: row.name,
            disaster_type: row.disaster_type,
            country: row.country,
            state: row.state,
            location: row.location,
            description: row.description,
            lat: row.lat,
            lng: row.lng,
            images: row.images,
            report_count: u32::try_from(row.report_count)
                .with_context(|| format!("negative report_count on event {}", row.id))?,
            timestamp: row.last_reported_at,
            verification: Verification {
                gemini_verified: row.gemini_verified,
                twitter_verified: row.twitter_verified,
                verification_status: row
                    .verification_status
                    .parse()
                    .map_err(|e: String| anyhow!(e))?,
                tweets_summary: row.tweets_summary,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: i64,
    details: Json<serde_json::Map<String, serde_json::Value>>,
}

impl From<OfferRow> for HelpOffer {
    fn from(row: OfferRow) -> Self {
        HelpOffer {
            id: row.id,
            details: row.details.0,
        }
    }
}

/// Postgres-backed store for events and help offers.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

#[async_trait]
impl EventStore for PgStore {
    async fn scan(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM disaster_events ORDER BY seq ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        into_events(rows)
    }

    async fn list_recent(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM disaster_events ORDER BY last_reported_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        into_events(rows)
    }

    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO disaster_events (
                id, name, disaster_type, country, state, location, description,
                lat, lng, images, report_count, last_reported_at,
                gemini_verified, twitter_verified, verification_status, tweets_summary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $11, $12, $13, $14, $15)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&event.name)
        .bind(&event.disaster_type)
        .bind(&event.country)
        .bind(&event.state)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.location_point.map(|p| p.lat))
        .bind(event.location_point.map(|p| p.lng))
        .bind(&event.images)
        .bind(event.timestamp)
        .bind(event.verification.gemini_verified)
        .bind(event.verification.twitter_verified)
        .bind(event.verification.verification_status.to_string())
        .bind(&event.verification.tweets_summary)
        .fetch_one(&self.pool)
        .await?;
        Event::try_from(row)
    }

    async fn update_by_id(&self, id: Uuid, update: EventUpdate) -> Result<Event> {
        // Increment and append happen in the UPDATE itself, so concurrent
        // merges into the same event cannot overwrite each other's count.
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE disaster_events SET
                report_count = report_count + 1,
                images = CASE WHEN $2::TEXT IS NULL THEN images ELSE array_append(images, $2::TEXT) END,
                last_reported_at = $3,
                gemini_verified = $4,
                twitter_verified = $5,
                verification_status = $6,
                tweets_summary = $7
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.append_image.as_deref())
        .bind(update.timestamp)
        .bind(update.verification.gemini_verified)
        .bind(update.verification.twitter_verified)
        .bind(update.verification.verification_status.to_string())
        .bind(&update.verification.tweets_summary)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| anyhow!("event {id} not found"))?;
        Event::try_from(row)
    }
}

#[async_trait]
impl HelpOfferStore for PgStore {
    async fn list_offers(&self) -> Result<Vec<HelpOffer>> {
        let rows = sqlx::query_as::<_, OfferRow>(
            "SELECT id, details FROM help_offers ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HelpOffer::from).collect())
    }

    async fn insert_offer(&self, offer: HelpOffer) -> Result<HelpOffer> {
        // The table lock serialises id selection against concurrent inserts.
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE help_offers IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            INSERT INTO help_offers (id, details)
            VALUES (
                CASE WHEN EXISTS (SELECT 1 FROM help_offers WHERE id = $1)
                     THEN (SELECT MAX(id) + 1 FROM help_offers)
                     ELSE $1
                END,
                $2
            )
            RETURNING id, details
            "#,
        )
        .bind(offer.id)
        .bind(Json(&offer.details))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }
}
