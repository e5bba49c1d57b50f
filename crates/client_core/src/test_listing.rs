//! The student's physical-test listing with subject and status facets.

use chrono::{DateTime, Utc};
use shared::{
    domain::TestStatus,
    protocol::{Subject, TestSummary},
};
use tracing::{info, warn};

use crate::TestCatalog;

pub const LISTING_ERROR: &str = "Error fetching tests. Please try again.";
pub const EMPTY_LISTING: &str = "No tests available for the selected filters.";

/// Chooses which backend listing is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubjectFilter {
    #[default]
    All,
    Named(String),
}

impl SubjectFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(raw.to_string())
        }
    }

    fn subject(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name.as_str()),
        }
    }
}

/// Applied locally to the fetched rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TestStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(TestStatus::parse(raw))
        }
    }

    pub fn matches(&self, row: &TestSummary) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => TestStatus::from_optional(row.status.as_deref())
                .label()
                .eq_ignore_ascii_case(wanted.label()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestListing {
    standard: u32,
    subject: SubjectFilter,
    status: StatusFilter,
    rows: Option<Vec<TestSummary>>,
    error: Option<String>,
}

impl TestListing {
    pub fn new(standard: u32) -> Self {
        Self {
            standard,
            subject: SubjectFilter::All,
            status: StatusFilter::All,
            rows: None,
            error: None,
        }
    }

    pub fn standard(&self) -> u32 {
        self.standard
    }

    pub fn subject_filter(&self) -> &SubjectFilter {
        &self.subject
    }

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status
    }

    /// Fetches rows for the current subject facet. On failure the previous
    /// rows are dropped and a user-facing error is kept.
    pub async fn load(&mut self, catalog: &dyn TestCatalog) {
        self.error = None;
        match catalog.list_tests(self.standard, self.subject.subject()).await {
            Ok(rows) => {
                info!(
                    standard = self.standard,
                    subject = ?self.subject,
                    rows = rows.len(),
                    "loaded test listing"
                );
                self.rows = Some(rows);
            }
            Err(err) => {
                warn!(standard = self.standard, error = %err, "failed to fetch tests");
                self.rows = Some(Vec::new());
                self.error = Some(LISTING_ERROR.to_string());
            }
        }
    }

    /// Changing the subject refetches; the status facet is kept.
    pub async fn set_subject_filter(&mut self, catalog: &dyn TestCatalog, subject: SubjectFilter) {
        self.subject = subject;
        self.load(catalog).await;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.status = status;
    }

    pub fn is_loaded(&self) -> bool {
        self.rows.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Rows passing the status facet, or `None` before the first load.
    pub fn visible(&self) -> Option<Vec<&TestSummary>> {
        self.rows
            .as_ref()
            .map(|rows| rows.iter().filter(|row| self.status.matches(row)).collect())
    }
}

/// Subject catalogue for the filter menu. Errors are logged and yield an
/// empty catalogue.
pub async fn load_subjects(catalog: &dyn TestCatalog, standard: u32) -> Vec<Subject> {
    match catalog.list_subjects(standard).await {
        Ok(subjects) => subjects,
        Err(err) => {
            warn!(standard, error = %err, "failed to fetch subjects");
            Vec::new()
        }
    }
}

pub fn format_due_date(due: Option<&DateTime<Utc>>) -> String {
    due.map(|due| due.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn status_label(row: &TestSummary) -> String {
    TestStatus::from_optional(row.status.as_deref()).to_string()
}

#[cfg(test)]
#[path = "tests/test_listing_tests.rs"]
mod tests;
