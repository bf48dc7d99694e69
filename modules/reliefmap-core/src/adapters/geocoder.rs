use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use reliefmap_common::GeoPoint;

use crate::traits::LocationResolver;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const USER_AGENT: &str = "reliefmap/0.1";

/// Longest address forwarded to a geocoder; anything longer is not a place name.
const MAX_ADDRESS_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Nominatim (OpenStreetMap), no key required
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: NOMINATIM_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

fn first_nominatim_point(results: Vec<NominatimResult>) -> Result<Option<GeoPoint>> {
    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };
    Ok(Some(GeoPoint {
        lat: first.lat.parse()?,
        lng: first.lon.parse()?,
    }))
}

#[async_trait]
impl LocationResolver for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<GeoPoint>> {
        if address.is_empty() || address.len() > MAX_ADDRESS_LEN {
            return Ok(None);
        }

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let results: Vec<NominatimResult> = resp.json().await?;
        let point = first_nominatim_point(results)?;
        debug!(address, found = point.is_some(), "nominatim: geocoded");
        Ok(point)
    }
}

// ---------------------------------------------------------------------------
// Google Maps Geocoding API
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GoogleLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLatLng,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    error_message: Option<String>,
}

impl GoogleGeocodeResponse {
    fn first_point(self) -> Result<Option<GeoPoint>> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next().map(|r| GeoPoint {
                lat: r.geometry.location.lat,
                lng: r.geometry.location.lng,
            })),
            "ZERO_RESULTS" => Ok(None),
            other => bail!(
                "google geocoding returned {other}: {}",
                self.error_message.unwrap_or_default()
            ),
        }
    }
}

pub struct GoogleGeocoder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleGeocoder {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: GOOGLE_GEOCODE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl LocationResolver for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<GeoPoint>> {
        if address.is_empty() || address.len() > MAX_ADDRESS_LEN {
            return Ok(None);
        }

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: GoogleGeocodeResponse = resp.json().await?;
        let point = body.first_point()?;
        debug!(address, found = point.is_some(), "google: geocoded");
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominatim_parses_string_coordinates() {
        let results: Vec<NominatimResult> =
            serde_json::from_str(r#"[{"lat":"13.0836939","lon":"80.270186","display_name":"Chennai"}]"#)
                .unwrap();
        let point = first_nominatim_point(results).unwrap().unwrap();
        assert!((point.lat - 13.0837).abs() < 1e-3);
        assert!((point.lng - 80.2702).abs() < 1e-3);
    }

    #[test]
    fn nominatim_empty_is_not_found() {
        assert!(first_nominatim_point(vec![]).unwrap().is_none());
    }

    #[test]
    fn google_ok_takes_first_result() {
        let body: GoogleGeocodeResponse = serde_json::from_str(
            r#"{"status":"OK","results":[{"geometry":{"location":{"lat":13.08,"lng":80.27}}},{"geometry":{"location":{"lat":1.0,"lng":2.0}}}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.first_point().unwrap(),
            Some(GeoPoint { lat: 13.08, lng: 80.27 })
        );
    }

    #[test]
    fn google_zero_results_is_not_found() {
        let body: GoogleGeocodeResponse =
            serde_json::from_str(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert!(body.first_point().unwrap().is_none());
    }

    #[test]
    fn google_denied_is_an_error() {
        let body: GoogleGeocodeResponse = serde_json::from_str(
            r#"{"status":"REQUEST_DENIED","results":[],"error_message":"bad key"}"#,
        )
        .unwrap();
        let err = body.first_point().unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn overlong_address_short_circuits() {
        let geocoder = NominatimGeocoder::new(reqwest::Client::new())
            .with_base_url("http://127.0.0.1:9/unused");
        let address = "x".repeat(MAX_ADDRESS_LEN + 1);
        assert!(geocoder.resolve(&address).await.unwrap().is_none());
    }
}
