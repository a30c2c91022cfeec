//! exchangerate-api.com integration
//!
//! Today's rates come from `latest/<BASE>`; any other date uses
//! `history/<BASE>/YYYY/MM/DD`, which the service only grants on paid plans.
//! A refused historical request surfaces as
//! [`MoneyError::HistoricalRateUnavailable`] so callers can tell it apart
//! from transport failures and missing credentials.

use super::base::RateTable;
use crate::currency::Currency;
use crate::error::{MoneyError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const EXCHANGERATE_API_URL: &str = "https://v6.exchangerate-api.com/v6";

/// `error-type` values meaning the historical endpoint is off limits or has no data
const HISTORICAL_REFUSALS: &[&str] = &["plan-upgrade-required", "no-data-available"];
const CREDENTIAL_REFUSALS: &[&str] = &["invalid-key", "inactive-account"];

/// Remote source of full rate tables
pub trait RateApi: Send + Sync {
    /// Full table for `date`, quoted against the API's base currency
    fn fetch(&self, date: NaiveDate) -> Result<RateTable>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: Option<BTreeMap<String, serde_json::Number>>,
}

/// Endpoint for `date`: `latest` when it is `today`, `history` otherwise
pub fn endpoint(
    base_url: &str,
    api_key: &str,
    base: Currency,
    date: NaiveDate,
    today: NaiveDate,
) -> String {
    let base_url = base_url.trim_end_matches('/');
    if date == today {
        format!("{}/{}/latest/{}", base_url, api_key, base.code())
    } else {
        format!(
            "{}/{}/history/{}/{}/{:02}/{:02}",
            base_url,
            api_key,
            base.code(),
            date.year(),
            date.month(),
            date.day()
        )
    }
}

/// Turn a raw response into a table or the matching error
pub fn interpret_response(
    date: NaiveDate,
    base: Currency,
    historical: bool,
    status: u16,
    body: &str,
) -> Result<RateTable> {
    let parsed: Option<ApiResponse> = serde_json::from_str(body).ok();
    let error_type = parsed.as_ref().and_then(|r| r.error_type.clone());

    if let Some(kind) = error_type.as_deref() {
        if CREDENTIAL_REFUSALS.contains(&kind) {
            return Err(MoneyError::MissingCredential(format!(
                "rate API rejected the key: {}",
                kind
            )));
        }
        if historical && HISTORICAL_REFUSALS.contains(&kind) {
            return Err(MoneyError::HistoricalRateUnavailable {
                date,
                reason: kind.to_string(),
            });
        }
    }
    if historical && status == 403 {
        return Err(MoneyError::HistoricalRateUnavailable {
            date,
            reason: "HTTP 403".to_string(),
        });
    }
    if status != 200 {
        return Err(MoneyError::RateApi(format!(
            "HTTP {} for {}{}",
            status,
            date,
            error_type.map(|e| format!(" ({})", e)).unwrap_or_default()
        )));
    }

    let response = parsed
        .ok_or_else(|| MoneyError::RateApi(format!("Malformed response body for {}", date)))?;
    if response.result.as_deref() == Some("error") {
        return Err(MoneyError::RateApi(format!(
            "Request for {} failed: {}",
            date,
            response.error_type.unwrap_or_else(|| "unknown error".to_string())
        )));
    }
    let rates = response.conversion_rates.ok_or_else(|| {
        MoneyError::RateApi(format!("Response for {} has no conversion_rates", date))
    })?;

    Ok(RateTable::from_json_rates(date, base, &rates))
}

#[cfg(feature = "api")]
pub use client::ExchangeRateApi;

#[cfg(feature = "api")]
mod client {
    use super::*;
    use crate::rates::base::{today, DEFAULT_BASE_CURRENCY};
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Blocking client for exchangerate-api.com
    pub struct ExchangeRateApi {
        api_key: Option<String>,
        base_url: String,
        base: Currency,
        today: Option<NaiveDate>,
        client: Client,
    }

    impl ExchangeRateApi {
        /// Create a client. A missing key is only reported when a fetch
        /// is attempted.
        pub fn new(api_key: Option<String>) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| MoneyError::Http(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self {
                api_key: api_key.filter(|k| !k.trim().is_empty()),
                base_url: EXCHANGERATE_API_URL.to_string(),
                base: DEFAULT_BASE_CURRENCY,
                today: None,
                client,
            })
        }

        /// Override the API root, e.g. for a mock server
        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        /// Set the currency the API quotes against
        pub fn with_base_currency(mut self, base: Currency) -> Self {
            self.base = base;
            self
        }

        /// Pin the date treated as "today" (selects `latest` vs `history`)
        pub fn with_today(mut self, date: NaiveDate) -> Self {
            self.today = Some(date);
            self
        }

        /// Whether an API key is configured
        pub fn has_key(&self) -> bool {
            self.api_key.is_some()
        }
    }

    impl RateApi for ExchangeRateApi {
        fn fetch(&self, date: NaiveDate) -> Result<RateTable> {
            let api_key = self.api_key.as_deref().ok_or_else(|| {
                MoneyError::MissingCredential(
                    "no API key configured for exchangerate-api.com".to_string(),
                )
            })?;

            let today = self.today.unwrap_or_else(today);
            let historical = date != today;
            let url = endpoint(&self.base_url, api_key, self.base, date, today);
            log::info!(
                "Fetching {} rates for {} from the rate API",
                if historical { "historical" } else { "latest" },
                date
            );

            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| {
                    MoneyError::Http(format!(
                        "Request for {} failed: {}",
                        date,
                        e.to_string().replace(api_key, "***")
                    ))
                })?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .map_err(|e| {
                    MoneyError::Http(format!(
                        "Reading response for {} failed: {}",
                        date,
                        e.to_string().replace(api_key, "***")
                    ))
                })?;

            interpret_response(date, self.base, historical, status, &body)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_key_fails_before_any_request() {
            let api = ExchangeRateApi::new(None).unwrap();
            assert!(!api.has_key());

            let date = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
            assert!(matches!(api.fetch(date), Err(MoneyError::MissingCredential(_))));
        }

        #[test]
        fn test_blank_key_counts_as_missing() {
            let api = ExchangeRateApi::new(Some("  ".to_string())).unwrap();
            assert!(!api.has_key());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 7, 14).unwrap()
    }

    #[test]
    fn test_endpoint_latest_and_history() {
        let latest = endpoint(EXCHANGERATE_API_URL, "KEY", Currency::USD, date(), date());
        assert_eq!(latest, "https://v6.exchangerate-api.com/v6/KEY/latest/USD");

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let history = endpoint("http://localhost:8080/v6/", "KEY", Currency::USD, date(), today);
        assert_eq!(history, "http://localhost:8080/v6/KEY/history/USD/2022/07/14");
    }

    #[test]
    fn test_success_response() {
        let body = r#"{"result": "success", "base_code": "USD",
                       "conversion_rates": {"USD": 1, "EUR": 0.995, "GBP": 0.8407}}"#;
        let table = interpret_response(date(), Currency::USD, false, 200, body).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(Currency::EUR), Some(dec!(0.995)));
    }

    #[test]
    fn test_historical_refusal_is_distinct() {
        let body = r#"{"result": "error", "error-type": "plan-upgrade-required"}"#;
        let err = interpret_response(date(), Currency::USD, true, 200, body).unwrap_err();
        assert!(matches!(err, MoneyError::HistoricalRateUnavailable { .. }));

        let err = interpret_response(date(), Currency::USD, true, 403, "forbidden").unwrap_err();
        assert!(matches!(err, MoneyError::HistoricalRateUnavailable { .. }));
    }

    #[test]
    fn test_rejected_key_is_a_credential_error() {
        let body = r#"{"result": "error", "error-type": "invalid-key"}"#;
        let err = interpret_response(date(), Currency::USD, false, 403, body).unwrap_err();
        assert!(matches!(err, MoneyError::MissingCredential(_)));
    }

    #[test]
    fn test_failed_fetches() {
        let err = interpret_response(date(), Currency::USD, false, 500, "oops").unwrap_err();
        assert!(matches!(err, MoneyError::RateApi(_)));

        let err = interpret_response(date(), Currency::USD, false, 200, r#"{"result": "success"}"#)
            .unwrap_err();
        assert!(matches!(err, MoneyError::RateApi(_)));

        let err = interpret_response(date(), Currency::USD, false, 200, "not json").unwrap_err();
        assert!(matches!(err, MoneyError::RateApi(_)));
    }
}
