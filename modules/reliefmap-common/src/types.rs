use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReliefMapError;

// --- Geography ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Reports ---

/// A crowd-submitted disaster report. Consumed by ingestion, never stored as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub disaster_type: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    /// Single inline attachment, usually a base64 data URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl Report {
    /// Reject reports missing the fields identity matching depends on.
    pub fn validate(&self) -> Result<(), ReliefMapError> {
        let missing: Vec<&str> = [
            ("type", &self.disaster_type),
            ("location", &self.location),
            ("country", &self.country),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReliefMapError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn descriptor(&self) -> EventDescriptor {
        EventDescriptor {
            name: self.name.clone(),
            disaster_type: self.disaster_type.clone(),
            country: self.country.clone(),
            state: self.state.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }

    /// Free-text address handed to the geocoder: "location, state, country".
    pub fn geocode_query(&self) -> String {
        join_non_empty(&[&self.location, &self.state, &self.country], ", ")
    }

    /// Topical query for the corroboration search: "type location state country".
    pub fn corroboration_query(&self) -> String {
        join_non_empty(
            &[&self.disaster_type, &self.location, &self.state, &self.country],
            " ",
        )
    }

    /// The attachment, if present and non-blank.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|i| !i.trim().is_empty())
    }
}

fn join_non_empty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// The descriptive part of a report or event, as shown to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub disaster_type: String,
    pub country: String,
    pub state: String,
    pub location: String,
    pub description: String,
}

/// Supporting material for a plausibility judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub tweets_summary: String,
    /// Bounded prefix of the attached image, never the full payload.
    pub image_prefix: Option<String>,
}

// --- Verification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Pending,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(VerificationStatus::Verified),
            "pending" => Ok(VerificationStatus::Pending),
            other => Err(format!("unknown verification status: {other}")),
        }
    }
}

/// Trust fields computed from the most recent triggering report. Replaced as
/// a unit on every merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub gemini_verified: bool,
    pub twitter_verified: bool,
    pub verification_status: VerificationStatus,
    pub tweets_summary: String,
}

// --- Events ---

/// Canonical disaster event aggregated from one or more reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub disaster_type: String,
    pub country: String,
    pub state: String,
    pub location: String,
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub images: Vec<String>,
    pub report_count: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub verification: Verification,
}

impl Event {
    pub fn descriptor(&self) -> EventDescriptor {
        EventDescriptor {
            name: self.name.clone(),
            disaster_type: self.disaster_type.clone(),
            country: self.country.clone(),
            state: self.state.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }

    pub fn location_point(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lng: self.lng?,
        })
    }

    /// Build the stored form of a brand-new event from an insert request.
    pub fn from_new(id: Uuid, new: NewEvent) -> Self {
        Self {
            id,
            name: new.name,
            disaster_type: new.disaster_type,
            country: new.country,
            state: new.state,
            location: new.location,
            description: new.description,
            lat: new.location_point.map(|p| p.lat),
            lng: new.location_point.map(|p| p.lng),
            images: new.images,
            report_count: 1,
            timestamp: new.timestamp,
            verification: new.verification,
        }
    }

    /// Apply a merge in place: count +1, image appended, verification replaced.
    pub fn apply(&mut self, update: EventUpdate) {
        self.report_count += 1;
        if let Some(image) = update.append_image {
            self.images.push(image);
        }
        self.timestamp = update.timestamp;
        self.verification = update.verification;
    }
}

/// Insert request for an event created from its first report. The store
/// assigns the id; `report_count` always starts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub disaster_type: String,
    pub country: String,
    pub state: String,
    pub location: String,
    pub description: String,
    pub location_point: Option<GeoPoint>,
    pub images: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub verification: Verification,
}

impl NewEvent {
    pub fn from_report(
        report: &Report,
        location_point: Option<GeoPoint>,
        timestamp: DateTime<Utc>,
        verification: Verification,
    ) -> Self {
        Self {
            name: report.name.clone(),
            disaster_type: report.disaster_type.clone(),
            country: report.country.clone(),
            state: report.state.clone(),
            location: report.location.clone(),
            description: report.description.clone(),
            location_point,
            images: report.image().map(str::to_string).into_iter().collect(),
            timestamp,
            verification,
        }
    }
}

/// Merge of a duplicate report into an existing event. The store applies the
/// count increment and image append atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct EventUpdate {
    pub append_image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub verification: Verification,
}

// --- Social corroboration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorroborationPost {
    pub text: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// --- Help offers ---

/// Free-form offer of help. Only `id` is structured; everything else is kept
/// exactly as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpOffer {
    pub id: i64,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HelpOffer {
    /// Wrap a submitted body, assigning an id from the creation instant in
    /// epoch milliseconds. Any client-supplied `id` is discarded.
    pub fn from_submission(
        mut details: serde_json::Map<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Self {
        details.remove("id");
        Self {
            id: now.timestamp_millis(),
            details,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Helpline {
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelpSearchResult {
    pub offers: Vec<HelpOffer>,
    pub helplines: Vec<Helpline>,
}
