//! Fitness activity checker (Google Fit REST API).
//!
//! Sums the minutes of allow-listed activity sessions within one UTC day and
//! compares them with the habit's fitness policy. Aggregate metrics (steps,
//! calories, distance, active minutes) are fetched alongside; their absence
//! never fails a check.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use goalforge_ledger::{FitnessPolicy, HabitType};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::http_client;
use crate::context::{Evidence, EvidenceKind, VerificationContext};
use crate::error::{Result, VerifyError};
use crate::orchestrator::Verifier;
use crate::step::{StageReport, VerificationMethod};

#[derive(Debug, Clone)]
pub struct FitnessConfig {
    /// Base URL of the fitness API (default: https://www.googleapis.com/fitness/v1)
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.googleapis.com/fitness/v1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Inclusive UTC window covering one day: `00:00:00.000` to `23:59:59.999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::default()).and_utc();
        let end = start + chrono::Duration::days(1) - chrono::Duration::milliseconds(1);
        Self { start, end }
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionList {
    #[serde(default)]
    session: Vec<Session>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    #[serde(default, deserialize_with = "lenient_i64")]
    activity_type: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    start_time_millis: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    end_time_millis: i64,
}

impl Session {
    fn minutes(&self) -> f64 {
        (self.end_time_millis - self.start_time_millis).max(0) as f64 / 60_000.0
    }
}

/// The API encodes int64 fields as strings.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub sessions: usize,
    pub total_minutes: u64,
    pub required_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessMetrics {
    pub steps: u64,
    pub calories: u64,
    pub distance_km: f64,
    pub active_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessReport {
    pub verified: bool,
    pub source: String,
    pub habit_type: HabitType,
    pub date: NaiveDate,
    pub activity: ActivitySummary,
    pub fitness: FitnessMetrics,
    pub summary: String,
}

pub struct FitnessChecker {
    config: FitnessConfig,
    http_client: reqwest::Client,
}

impl FitnessChecker {
    pub fn new(config: FitnessConfig) -> Self {
        let http_client = http_client(config.request_timeout, None);

        Self {
            config,
            http_client,
        }
    }

    pub async fn check(
        &self,
        access_token: &str,
        habit: HabitType,
        date: NaiveDate,
    ) -> Result<FitnessReport> {
        let policy = habit
            .profile()
            .fitness
            .as_ref()
            .ok_or(VerifyError::UnsupportedHabit(habit))?;
        let window = DayWindow::for_date(date);

        let sessions = self.fetch_sessions(access_token, &window).await?;
        let metrics = match self.fetch_aggregate(access_token, &window).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(error = %e, "Fitness aggregate unavailable, using zeros");
                FitnessMetrics::default()
            }
        };

        let report = evaluate(habit, policy, date, &sessions, metrics);
        debug!(
            habit = %habit,
            %date,
            minutes = report.activity.total_minutes,
            steps = report.fitness.steps,
            verified = report.verified,
            "Fitness activity checked"
        );
        Ok(report)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn fetch_sessions(&self, access_token: &str, window: &DayWindow) -> Result<Vec<Session>> {
        let start = window.start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let end = window.end.to_rfc3339_opts(SecondsFormat::Millis, true);

        let response = self
            .http_client
            .get(self.url("users/me/sessions"))
            .query(&[("startTime", start.as_str()), ("endTime", end.as_str())])
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(VerifyError::NeedsReauth),
            status if !status.is_success() => {
                return Err(VerifyError::Upstream {
                    service: "google_fit",
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let list: SessionList = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        Ok(list.session)
    }

    async fn fetch_aggregate(&self, access_token: &str, window: &DayWindow) -> Result<FitnessMetrics> {
        let body = json!({
            "aggregateBy": [
                { "dataTypeName": "com.google.step_count.delta" },
                { "dataTypeName": "com.google.calories.expended" },
                { "dataTypeName": "com.google.distance.delta" },
                { "dataTypeName": "com.google.active_minutes" },
            ],
            "startTimeMillis": window.start_millis(),
            "endTimeMillis": window.end_millis(),
            "bucketByTime": { "durationMillis": window.end_millis() - window.start_millis() },
        });

        let response = self
            .http_client
            .post(self.url("users/me/dataset:aggregate"))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VerifyError::Upstream {
                service: "google_fit",
                status: response.status().as_u16(),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        Ok(parse_aggregate(&data))
    }
}

fn parse_aggregate(data: &Value) -> FitnessMetrics {
    let mut steps = 0.0;
    let mut calories = 0.0;
    let mut distance_m = 0.0;
    let mut active = 0.0;

    let datasets = data
        .pointer("/bucket/0/dataset")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for dataset in datasets {
        let Some(value) = dataset.pointer("/point/0/value/0") else {
            continue;
        };
        let amount = value
            .get("intVal")
            .and_then(Value::as_f64)
            .filter(|v| *v != 0.0)
            .or_else(|| value.get("fpVal").and_then(Value::as_f64))
            .unwrap_or(0.0);

        let source = dataset
            .get("dataSourceId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if source.contains("step_count") {
            steps = amount;
        }
        if source.contains("calories") {
            calories = amount;
        }
        if source.contains("distance") {
            distance_m = amount;
        }
        if source.contains("active_minutes") {
            active = amount;
        }
    }

    FitnessMetrics {
        steps: steps.max(0.0) as u64,
        calories: calories.max(0.0).round() as u64,
        distance_km: (distance_m / 1000.0 * 100.0).round() / 100.0,
        active_minutes: active.max(0.0) as u64,
    }
}

fn evaluate(
    habit: HabitType,
    policy: &FitnessPolicy,
    date: NaiveDate,
    sessions: &[Session],
    fitness: FitnessMetrics,
) -> FitnessReport {
    let relevant: Vec<&Session> = sessions
        .iter()
        .filter(|s| policy.counts_activity(s.activity_type))
        .collect();
    let minutes: f64 = relevant.iter().map(|s| s.minutes()).sum();
    let verified = policy.is_met(minutes, fitness.steps);
    let rounded = minutes.round() as u64;

    let summary = if verified {
        let steps = if fitness.steps > 0 {
            format!(", {} steps", fitness.steps)
        } else {
            String::new()
        };
        format!(
            "{} activity verified: {} minutes of activity detected{}",
            habit, rounded, steps
        )
    } else {
        format!(
            "Insufficient {} activity: {}/{} minutes required",
            habit, rounded, policy.min_minutes
        )
    };

    FitnessReport {
        verified,
        source: "google_fit".to_string(),
        habit_type: habit,
        date,
        activity: ActivitySummary {
            sessions: relevant.len(),
            total_minutes: rounded,
            required_minutes: policy.min_minutes,
        },
        fitness,
        summary,
    }
}

#[async_trait]
impl Verifier for FitnessChecker {
    fn service(&self) -> &'static str {
        "google_fit"
    }

    fn method(&self) -> VerificationMethod {
        VerificationMethod::GoogleFitAuto
    }

    fn applies(&self, ctx: &VerificationContext) -> bool {
        ctx.habit.is_fitness_habit() && ctx.fitness_access_token.is_some()
    }

    async fn check(&self, ctx: &VerificationContext) -> Result<StageReport> {
        let token = ctx.fitness_access_token.as_deref().ok_or(VerifyError::NeedsReauth)?;
        let report = FitnessChecker::check(self, token, ctx.habit, ctx.date).await?;
        let data = serde_json::to_value(&report)
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

        Ok(StageReport {
            verified: report.verified,
            summary: report.summary,
            evidence: Some(Evidence::new(EvidenceKind::Fitness, data)),
        })
    }
}
