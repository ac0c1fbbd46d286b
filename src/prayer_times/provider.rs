use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, VakitError};
use crate::models::Timings;
use crate::prayer_times::window::format_date;
use crate::utils::format::parse_time;

/// Source of a day's raw prayer timings for a coordinate.
pub trait TimingsProvider {
    fn fetch_timings(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<Timings>;
}

/// Client for the Aladhan `timings` endpoint.
pub struct AladhanClient {
    http: reqwest::blocking::Client,
    base_url: String,
    method: u8,
}

#[derive(Debug, Deserialize)]
struct AladhanResponse {
    code: u16,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AladhanData {
    timings: AladhanTimings,
    #[serde(default)]
    meta: Option<AladhanMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AladhanTimings {
    fajr: String,
    sunrise: String,
    dhuhr: String,
    asr: String,
    maghrib: String,
    isha: String,
}

#[derive(Debug, Deserialize)]
struct AladhanMeta {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl AladhanClient {
    pub fn new(base_url: &str, method: u8, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vakit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            method,
        })
    }
}

impl TimingsProvider for AladhanClient {
    fn fetch_timings(&self, date: NaiveDate, latitude: f64, longitude: f64) -> Result<Timings> {
        let url = format!("{}/timings/{}", self.base_url, format_date(date));
        log::debug!("GET {} ({}, {})", url, latitude, longitude);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("method", self.method.to_string()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(VakitError::Upstream(format!("HTTP {}", response.status())));
        }

        let body: AladhanResponse = response.json()?;
        if body.code != 200 {
            return Err(VakitError::Upstream(format!("API returned code {}", body.code)));
        }

        let data: AladhanData = serde_json::from_value(body.data)
            .map_err(|e| VakitError::Upstream(format!("unexpected payload: {}", e)))?;
        let t = data.timings;
        let upstream_time =
            |s: &str| parse_time(s).map_err(|_| VakitError::Upstream(format!("bad time '{}'", s)));

        Ok(Timings {
            fajr: upstream_time(&t.fajr)?,
            sunrise: upstream_time(&t.sunrise)?,
            dhuhr: upstream_time(&t.dhuhr)?,
            asr: upstream_time(&t.asr)?,
            maghrib: upstream_time(&t.maghrib)?,
            isha: upstream_time(&t.isha)?,
            latitude: data.meta.as_ref().and_then(|m| m.latitude),
            longitude: data.meta.as_ref().and_then(|m| m.longitude),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::format::format_time;
    use mockito::Matcher;

    const OK_BODY: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "06:41", "Sunrise": "08:07", "Dhuhr": "13:17",
                "Asr": "15:48", "Sunset": "18:17", "Maghrib": "18:17",
                "Isha": "19:38", "Imsak": "06:31", "Midnight": "01:17"
            },
            "meta": { "latitude": 41.0082, "longitude": 28.9784 }
        }
    }"#;

    fn client(url: &str) -> AladhanClient {
        AladhanClient::new(url, 13, Duration::from_secs(5)).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 27).unwrap()
    }

    #[test]
    fn parses_timings_and_meta() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", Matcher::Regex(r"^/timings/27-01-2026".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("method".into(), "13".into()),
                Matcher::UrlEncoded("latitude".into(), "41.0082".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create();

        let timings = client(&server.url())
            .fetch_timings(date(), 41.0082, 28.9784)
            .unwrap();

        mock.assert();
        assert_eq!(format_time(timings.fajr), "06:41");
        assert_eq!(format_time(timings.isha), "19:38");
        assert_eq!(timings.latitude, Some(41.0082));
    }

    #[test]
    fn http_error_is_upstream() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/timings/".to_string()))
            .match_query(Matcher::Any)
            .with_status(503)
            .create();

        let err = client(&server.url())
            .fetch_timings(date(), 41.0, 29.0)
            .unwrap_err();
        assert!(matches!(err, VakitError::Upstream(_)));
    }

    #[test]
    fn non_200_code_is_upstream() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Regex(r"^/timings/".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code": 400, "status": "BAD_REQUEST", "data": "Invalid date"}"#)
            .create();

        let err = client(&server.url())
            .fetch_timings(date(), 41.0, 29.0)
            .unwrap_err();
        assert!(matches!(err, VakitError::Upstream(_)));
    }
}
