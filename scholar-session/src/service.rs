//! Research service client
//!
//! The research service turns a task string into a structured report. It is
//! an external collaborator: this module only defines the seam
//! ([`ResearchService`]) and the HTTP client used in production.

use async_trait::async_trait;
use scholar_core::{
    service_error, ErrorContext, ReportPayload, ResearchReport, ScholarError, ScholarResult,
    SectionKind, ServiceConfig,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that can answer a research task
#[async_trait]
pub trait ResearchService: Send + Sync {
    /// Run one research task
    async fn research(&self, task: &str) -> ScholarResult<ResearchReport>;

    /// Tasks the service already knows about, oldest first
    async fn past_queries(&self) -> ScholarResult<Vec<String>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct ResearchRequest<'a> {
    task: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct PastQueriesResponse {
    #[serde(default)]
    past_queries: Vec<String>,
}

/// HTTP client for the research service
#[derive(Debug, Clone)]
pub struct HttpResearchService {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpResearchService {
    pub fn new(config: ServiceConfig) -> ScholarResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created research service client for {}", config.base_url);

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn read_body(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> ScholarResult<String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| ScholarError::Service {
            message: format!("Failed to read response body: {}", e),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
            context: ErrorContext::new("research_client").with_operation(operation),
        })?;

        // The service reports failures as {"error": "..."}, sometimes with a 2xx status
        let reported = serde_json::from_str::<ErrorBody>(&body).ok();
        if status.is_success() && reported.is_none() {
            return Ok(body);
        }

        let message = reported
            .map(|parsed| parsed.error)
            .unwrap_or_else(|| format!("HTTP {}", status));

        warn!(
            status = status.as_u16(),
            operation, "Research service returned an error"
        );

        Err(ScholarError::Service {
            message,
            status: Some(status.as_u16()),
            source: None,
            context: ErrorContext::new("research_client")
                .with_operation(operation)
                .with_metadata("status", status.as_str()),
        })
    }
}

fn malformed_report(message: String, source: Option<serde_json::Error>) -> ScholarError {
    ScholarError::Service {
        message,
        status: None,
        source: source.map(Into::into),
        context: ErrorContext::new("research_client").with_operation("parse_report"),
    }
}

/// Parse a report body, which must name the task or at least one section
fn parse_report(body: &str) -> ScholarResult<ReportPayload> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| malformed_report(format!("Malformed report payload: {}", e), Some(e)))?;

    let recognized = value.as_object().is_some_and(|fields| {
        fields.contains_key("Task")
            || SectionKind::ALL
                .iter()
                .any(|kind| fields.contains_key(kind.title()))
    });
    if !recognized {
        return Err(malformed_report(
            "Report payload has neither a task nor any section".to_string(),
            None,
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| malformed_report(format!("Malformed report payload: {}", e), Some(e)))
}

#[async_trait]
impl ResearchService for HttpResearchService {
    async fn research(&self, task: &str) -> ScholarResult<ResearchReport> {
        let url = self.endpoint("supervisor");
        debug!("Posting research task to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ResearchRequest { task })
            .send()
            .await
            .map_err(|e| service_error!(format!("Request failed: {}", e), "research_client", e))?;

        let body = self.read_body(response, "research").await?;

        let payload = parse_report(&body)?;
        let report = ResearchReport::from_payload(payload, task)?;
        info!(
            task,
            sections = report.sections().count(),
            "Received research report"
        );
        Ok(report)
    }

    async fn past_queries(&self) -> ScholarResult<Vec<String>> {
        let url = self.endpoint("past_queries");
        debug!("Fetching past queries from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| service_error!(format!("Request failed: {}", e), "research_client", e))?;

        let body = self.read_body(response, "past_queries").await?;
        let parsed: PastQueriesResponse =
            serde_json::from_str(&body).map_err(|e| ScholarError::Service {
                message: format!("Malformed past queries payload: {}", e),
                status: None,
                source: Some(Box::new(e)),
                context: ErrorContext::new("research_client")
                    .with_operation("parse_past_queries"),
            })?;

        Ok(parsed.past_queries)
    }
}

/// Helper to create the HTTP client with common configuration
fn create_http_client(config: &ServiceConfig) -> ScholarResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ScholarError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("research_client").with_operation("create_http_client"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let service = HttpResearchService::new(ServiceConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            service.endpoint("/supervisor"),
            "http://localhost:5000/supervisor"
        );
    }

    #[test]
    fn report_without_known_keys_is_rejected() {
        for body in ["{}", r#"{"status":"queued"}"#, "[]"] {
            assert!(
                matches!(parse_report(body), Err(ScholarError::Service { .. })),
                "{body} should be rejected"
            );
        }
    }

    #[test]
    fn report_with_only_a_section_is_accepted() {
        let payload = parse_report(r#"{"Summary":["ok"]}"#).unwrap();
        assert_eq!(payload.summary, vec!["ok".to_string()]);
        assert!(payload.task.is_empty());
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(ResearchRequest { task: "X" }).unwrap();
        assert_eq!(body, serde_json::json!({ "task": "X" }));
    }
}
