use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::config::load_config;
use crate::error::{RecallError, format_api_error};
use crate::query::VehicleQuery;
use crate::record::{
    RecallRecord, ResultsEnvelope, fields, taxonomy_values, unique_field_values,
    unique_report_dates,
};
use crate::util::{non_empty, urljoin};

const CAMPAIGN_PATH: &str = "recalls/campaignNumber";
const VEHICLE_PATH: &str = "recalls/recallsByVehicle";
const MODEL_YEARS_PATH: &str = "products/vehicle/modelYears";
const MAKES_PATH: &str = "products/vehicle/makes";
const MODELS_PATH: &str = "products/vehicle/models";

/// Taxonomy endpoints are filtered to recall records with `issueType=r`.
const ISSUE_TYPE_RECALL: (&str, &str) = ("issueType", "r");

/// Rendered by [`Client::summary`] when no records are held.
pub const NO_DATA: &str = "no data available";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically `https://api.nhtsa.gov`.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// What happened on the most recent query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchOutcome {
    /// No query has been issued yet.
    #[default]
    NotFetched,
    /// The registry answered; `count` records are held (possibly zero).
    Fetched { count: usize },
    /// The request failed and the held records were cleared.
    Failed { reason: String },
}

/// Blocking client that caches the result set of its most recent query.
///
/// Query methods take `&mut self` and replace the held records wholesale.
/// Share a client across threads behind a `Mutex`.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    timeout: Duration,

    results: Vec<RecallRecord>,
    outcome: FetchOutcome,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.nhtsarc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variables `NHTSA_API_URL` / `NHTSA_TIMEOUT` / `NHTSA_VERIFY`
    /// - config file from `NHTSA_RC` or `.nhtsarc`
    /// - the public registry at `https://api.nhtsa.gov`
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        let cfg = load_config(url, None, verify)?;
        Self::with_config(cfg)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nhtsa-recalls-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("nhtsa-recalls-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(cfg.timeout);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            timeout: cfg.timeout,
            results: Vec::new(),
            outcome: FetchOutcome::NotFetched,
            http,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Replaces the held records with the recalls of one campaign.
    ///
    /// Transport failures are logged and leave an empty result set; only an
    /// empty campaign number is reported as an error.
    pub fn fetch_by_campaign(&mut self, campaign_number: &str) -> Result<usize, RecallError> {
        lenient_fetch(self.try_fetch_by_campaign(campaign_number))
    }

    /// Replaces the held records with recalls matching `query`.
    ///
    /// Fails with [`RecallError::InvalidArgument`] before any request when the
    /// query has no criteria. Transport failures are logged and leave an
    /// empty result set.
    pub fn fetch_by_vehicle(&mut self, query: &VehicleQuery) -> Result<usize, RecallError> {
        lenient_fetch(self.try_fetch_by_vehicle(query))
    }

    /// Like [`Client::fetch_by_campaign`] but surfaces transport failures.
    pub fn try_fetch_by_campaign(&mut self, campaign_number: &str) -> Result<usize, RecallError> {
        let campaign = non_empty(Some(campaign_number)).ok_or_else(|| {
            RecallError::InvalidArgument("campaign number must not be empty".to_string())
        })?;
        let params = [("campaignNumber", campaign.to_string())];
        self.replace_results(CAMPAIGN_PATH, &params)
    }

    /// Like [`Client::fetch_by_vehicle`] but surfaces transport failures.
    pub fn try_fetch_by_vehicle(&mut self, query: &VehicleQuery) -> Result<usize, RecallError> {
        let params = query.params()?;
        self.replace_results(VEHICLE_PATH, &params)
    }

    fn replace_results(
        &mut self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<usize, RecallError> {
        match self.get_results::<RecallRecord>(path, params) {
            Ok(records) => {
                let count = records.len();
                self.results = records;
                self.outcome = FetchOutcome::Fetched { count };
                Ok(count)
            }
            Err(e) => {
                self.results = Vec::new();
                self.outcome = FetchOutcome::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Model years known to the registry for recalls.
    pub fn all_model_years(&self) -> Vec<String> {
        lenient_lookup(self.try_all_model_years())
    }

    /// Makes with recalls for `model_year`.
    pub fn all_makes(&self, model_year: impl ToString) -> Vec<String> {
        lenient_lookup(self.try_all_makes(model_year))
    }

    /// Models with recalls for `model_year` and `make`.
    pub fn all_models(&self, model_year: impl ToString, make: &str) -> Vec<String> {
        lenient_lookup(self.try_all_models(model_year, make))
    }

    pub fn try_all_model_years(&self) -> Result<Vec<String>, RecallError> {
        let params = [(ISSUE_TYPE_RECALL.0, ISSUE_TYPE_RECALL.1.to_string())];
        let entries = self.get_results::<Value>(MODEL_YEARS_PATH, &params)?;
        Ok(taxonomy_values(&entries, "modelYear"))
    }

    pub fn try_all_makes(&self, model_year: impl ToString) -> Result<Vec<String>, RecallError> {
        let params = [
            ("modelYear", model_year.to_string()),
            (ISSUE_TYPE_RECALL.0, ISSUE_TYPE_RECALL.1.to_string()),
        ];
        let entries = self.get_results::<Value>(MAKES_PATH, &params)?;
        Ok(taxonomy_values(&entries, "make"))
    }

    pub fn try_all_models(
        &self,
        model_year: impl ToString,
        make: &str,
    ) -> Result<Vec<String>, RecallError> {
        let params = [
            ("modelYear", model_year.to_string()),
            ("make", make.to_string()),
            (ISSUE_TYPE_RECALL.0, ISSUE_TYPE_RECALL.1.to_string()),
        ];
        let entries = self.get_results::<Value>(MODELS_PATH, &params)?;
        Ok(taxonomy_values(&entries, "model"))
    }

    /// Records held from the most recent query.
    pub fn records(&self) -> &[RecallRecord] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn last_outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    /// Distinct non-empty values of `field` across the held records.
    pub fn unique_field_values(&self, field: &str) -> Vec<String> {
        unique_field_values(&self.results, field)
    }

    pub fn model_years(&self) -> Vec<String> {
        self.unique_field_values(fields::MODEL_YEAR)
    }

    pub fn models(&self) -> Vec<String> {
        self.unique_field_values(fields::MODEL)
    }

    pub fn makes(&self) -> Vec<String> {
        self.unique_field_values(fields::MAKE)
    }

    pub fn manufacturers(&self) -> Vec<String> {
        self.unique_field_values(fields::MANUFACTURER)
    }

    pub fn affected_units(&self) -> Vec<String> {
        self.unique_field_values(fields::UNITS_AFFECTED)
    }

    /// Distinct `ReportReceivedDate` values parsed day-first.
    ///
    /// Values that do not parse are logged and skipped.
    pub fn report_dates(&self) -> Vec<NaiveDate> {
        unique_report_dates(&self.results)
    }

    /// Multi-line summary of every projection, or [`NO_DATA`] when empty.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    fn get_results<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, RecallError> {
        let url = urljoin(&self.url, path);
        tracing::debug!(url = %url, ?params, "requesting recall data");

        let resp = self
            .http
            .get(&url)
            .query(params)
            .timeout(self.timeout)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(format_api_error(status, &url, &text));
        }

        let envelope: ResultsEnvelope<T> =
            serde_json::from_str(&text).map_err(|e| RecallError::Json {
                url: url.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(url = %url, count = envelope.results.len(), "received results");
        Ok(envelope.results)
    }
}

fn lenient_fetch(result: Result<usize, RecallError>) -> Result<usize, RecallError> {
    match result {
        Err(e @ RecallError::InvalidArgument(_)) => Err(e),
        Err(e) => {
            report_failure(&e);
            Ok(0)
        }
        ok => ok,
    }
}

fn lenient_lookup(result: Result<Vec<String>, RecallError>) -> Vec<String> {
    result.unwrap_or_else(|e| {
        report_failure(&e);
        Vec::new()
    })
}

fn report_failure(e: &RecallError) {
    match e {
        RecallError::Api { status, url, .. } => {
            tracing::warn!(status = *status, url = %url, error = %e, "HTTP error occurred");
        }
        _ => tracing::warn!(error = %e, "request failed"),
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.results.is_empty() {
            return f.write_str(NO_DATA);
        }

        let dates = self
            .report_dates()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        writeln!(f, "Units Affected: {}", self.affected_units().join(", "))?;
        writeln!(f, "Manufacturers: {}", self.manufacturers().join(", "))?;
        writeln!(f, "Models: {}", self.models().join(", "))?;
        writeln!(f, "Makes: {}", self.makes().join(", "))?;
        writeln!(f, "Model Years: {}", self.model_years().join(", "))?;
        write!(f, "Report Dates: {}", dates.join(", "))
    }
}
