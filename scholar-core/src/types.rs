//! Report data model
//!
//! A [`ResearchReport`] is the structured result of one research task: the task
//! string plus seven fixed sections. Reports are immutable once built; a new
//! submission always produces a new value.

use crate::error::{ScholarError, ScholarResult};
use crate::validation_error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed, ordered set of report sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Summary,
    GeneratedHypotheses,
    WebResearch,
    Analysis,
    Reasoning,
    Evaluation,
    Conclusion,
}

impl SectionKind {
    /// All sections in display order
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Summary,
        SectionKind::GeneratedHypotheses,
        SectionKind::WebResearch,
        SectionKind::Analysis,
        SectionKind::Reasoning,
        SectionKind::Evaluation,
        SectionKind::Conclusion,
    ];

    /// Display title, also the key used on the wire
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Summary => "Summary",
            SectionKind::GeneratedHypotheses => "Generated Hypotheses",
            SectionKind::WebResearch => "Web Research",
            SectionKind::Analysis => "Analysis",
            SectionKind::Reasoning => "Reasoning",
            SectionKind::Evaluation => "Evaluation",
            SectionKind::Conclusion => "Conclusion",
        }
    }

    /// Whether the section holds web records instead of paragraphs
    pub fn is_structured(self) -> bool {
        matches!(self, SectionKind::WebResearch)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

fn default_title() -> String {
    "No Title".to_string()
}

fn default_link() -> String {
    "No Link".to_string()
}

fn default_snippet() -> String {
    "No Description Available".to_string()
}

/// One web search hit in the "Web Research" section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_snippet")]
    pub snippet: String,
}

impl WebResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Borrowed view of a section's items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionView<'a> {
    Text(&'a [String]),
    Web(&'a [WebResult]),
}

impl SectionView<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionView::Text(paragraphs) => paragraphs.is_empty(),
            SectionView::Web(records) => records.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SectionView::Text(paragraphs) => paragraphs.len(),
            SectionView::Web(records) => records.len(),
        }
    }
}

/// Structured research result for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReportPayload", try_from = "ReportPayload")]
pub struct ResearchReport {
    task: String,
    summary: Vec<String>,
    hypotheses: Vec<String>,
    web_research: Vec<WebResult>,
    analysis: Vec<String>,
    reasoning: Vec<String>,
    evaluation: Vec<String>,
    conclusion: Vec<String>,
}

impl ResearchReport {
    /// Create a report with every section empty.
    ///
    /// Fails if `task` is blank.
    pub fn new(task: impl Into<String>) -> ScholarResult<Self> {
        let task = task.into();
        if task.trim().is_empty() {
            return Err(validation_error!(
                "Task must not be empty",
                "task",
                "report_model"
            ));
        }

        Ok(Self {
            task,
            summary: Vec::new(),
            hypotheses: Vec::new(),
            web_research: Vec::new(),
            analysis: Vec::new(),
            reasoning: Vec::new(),
            evaluation: Vec::new(),
            conclusion: Vec::new(),
        })
    }

    /// Replace the paragraphs of a text section.
    ///
    /// Blank paragraphs are dropped. Ignored for the structured section.
    pub fn with_text<I, S>(mut self, kind: SectionKind, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paragraphs = clean_paragraphs(paragraphs);
        match kind {
            SectionKind::Summary => self.summary = paragraphs,
            SectionKind::GeneratedHypotheses => self.hypotheses = paragraphs,
            SectionKind::Analysis => self.analysis = paragraphs,
            SectionKind::Reasoning => self.reasoning = paragraphs,
            SectionKind::Evaluation => self.evaluation = paragraphs,
            SectionKind::Conclusion => self.conclusion = paragraphs,
            SectionKind::WebResearch => {
                tracing::warn!("Ignoring paragraphs for the web research section");
            }
        }
        self
    }

    /// Replace the web research records
    pub fn with_web_research(mut self, records: Vec<WebResult>) -> Self {
        self.web_research = records;
        self
    }

    /// Build a report from a service payload.
    ///
    /// The payload's own task wins; `requested_task` is used when the service
    /// leaves it out.
    pub fn from_payload(payload: ReportPayload, requested_task: &str) -> ScholarResult<Self> {
        let task = if payload.task.trim().is_empty() {
            requested_task.to_string()
        } else {
            payload.task
        };

        Ok(Self::new(task)?
            .with_text(SectionKind::Summary, payload.summary)
            .with_text(SectionKind::GeneratedHypotheses, payload.hypotheses)
            .with_text(SectionKind::Analysis, payload.analysis)
            .with_text(SectionKind::Reasoning, payload.reasoning)
            .with_text(SectionKind::Evaluation, payload.evaluation)
            .with_text(SectionKind::Conclusion, payload.conclusion)
            .with_web_research(payload.web_research))
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// Paragraphs of a text section; empty for the structured section
    pub fn text(&self, kind: SectionKind) -> &[String] {
        match kind {
            SectionKind::Summary => &self.summary,
            SectionKind::GeneratedHypotheses => &self.hypotheses,
            SectionKind::Analysis => &self.analysis,
            SectionKind::Reasoning => &self.reasoning,
            SectionKind::Evaluation => &self.evaluation,
            SectionKind::Conclusion => &self.conclusion,
            SectionKind::WebResearch => &[],
        }
    }

    pub fn web_research(&self) -> &[WebResult] {
        &self.web_research
    }

    pub fn section(&self, kind: SectionKind) -> SectionView<'_> {
        if kind.is_structured() {
            SectionView::Web(&self.web_research)
        } else {
            SectionView::Text(self.text(kind))
        }
    }

    /// Non-empty sections in display order
    pub fn sections(&self) -> impl Iterator<Item = (SectionKind, SectionView<'_>)> + '_ {
        SectionKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.section(kind)))
            .filter(|(_, view)| !view.is_empty())
    }

    /// True when every section is empty
    pub fn is_blank(&self) -> bool {
        self.sections().next().is_none()
    }
}

fn clean_paragraphs<I, S>(paragraphs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    paragraphs
        .into_iter()
        .map(Into::into)
        .filter_map(|p| {
            let trimmed = p.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Wire shape of a report, keyed by section display names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(rename = "Task", default)]
    pub task: String,
    #[serde(rename = "Summary", default)]
    pub summary: Vec<String>,
    #[serde(rename = "Generated Hypotheses", default)]
    pub hypotheses: Vec<String>,
    #[serde(rename = "Web Research", default)]
    pub web_research: Vec<WebResult>,
    #[serde(rename = "Analysis", default)]
    pub analysis: Vec<String>,
    #[serde(rename = "Reasoning", default)]
    pub reasoning: Vec<String>,
    #[serde(rename = "Evaluation", default)]
    pub evaluation: Vec<String>,
    #[serde(rename = "Conclusion", default)]
    pub conclusion: Vec<String>,
}

impl From<ResearchReport> for ReportPayload {
    fn from(report: ResearchReport) -> Self {
        Self {
            task: report.task,
            summary: report.summary,
            hypotheses: report.hypotheses,
            web_research: report.web_research,
            analysis: report.analysis,
            reasoning: report.reasoning,
            evaluation: report.evaluation,
            conclusion: report.conclusion,
        }
    }
}

impl TryFrom<ReportPayload> for ResearchReport {
    type Error = ScholarError;

    fn try_from(payload: ReportPayload) -> Result<Self, Self::Error> {
        ResearchReport::from_payload(payload, "")
    }
}
