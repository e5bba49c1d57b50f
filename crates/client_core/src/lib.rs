use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{SubmissionId, TestId},
    error::ApiException,
    protocol::{Envelope, GradedResult, PhysicalTest, Subject, SubjectCatalogue, TestSummary},
};
use tracing::{debug, info};
use url::Url;

pub mod error;
pub mod guard;
pub mod result_view;
pub mod scheduler;
pub mod test_listing;
pub mod types;
pub mod upload_session;

pub use error::ClientError;
pub use guard::{
    ConfirmPrompt, GuardBinding, LeaveDecision, LeaveFlag, LeaveHook, LeaveKind, NavigationGuard,
};
pub use result_view::ResultView;
pub use scheduler::ViewTasks;
pub use test_listing::{StatusFilter, SubjectFilter, TestListing};
pub use types::{AnswerCopySubmission, PendingFile, Route, SessionContext};
pub use upload_session::{
    Notice, NoticeKind, SessionDeps, SessionEvent, SessionSnapshot, SessionTimings,
    SubmissionState, SubmitOutcome, UploadSession,
};

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loads the metadata of one physical test.
#[async_trait]
pub trait TestDataFetcher: Send + Sync {
    async fn fetch_test(&self, test_id: &TestId) -> Result<PhysicalTest>;
}

/// Persists scanned answer sheets against a student/test pairing.
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync {
    async fn submit_answer_copies(&self, submission: AnswerCopySubmission) -> Result<()>;
}

/// Performs in-app navigation on behalf of a view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[async_trait]
pub trait TestCatalog: Send + Sync {
    async fn list_tests(&self, standard: u32, subject: Option<&str>) -> Result<Vec<TestSummary>>;
    async fn list_subjects(&self, standard: u32) -> Result<Vec<Subject>>;
}

#[async_trait]
pub trait ResultFetcher: Send + Sync {
    async fn fetch_result(&self, submission_id: &SubmissionId) -> Result<GradedResult>;
}

/// HTTP client for the student dashboard backend.
#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base_url: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> std::result::Result<Self, ClientError> {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
    ) -> std::result::Result<Self, ClientError> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn checked(
        endpoint: &Url,
        response: Response,
    ) -> std::result::Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            endpoint: endpoint.path().to_string(),
            source: ApiException::from_response(status.as_u16(), &body),
        })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> std::result::Result<T, ClientError> {
        debug!(endpoint = %url.path(), "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.path().to_string(),
                source,
            })?;
        let envelope: Envelope<T> = Self::checked(&url, response)
            .await?
            .json()
            .await
            .map_err(|source| ClientError::Decode {
                endpoint: url.path().to_string(),
                source,
            })?;
        Ok(envelope.data)
    }

    pub async fn physical_test(
        &self,
        test_id: &TestId,
    ) -> std::result::Result<PhysicalTest, ClientError> {
        let url = self.endpoint(&["api", "physicaltest", "physical-tests", test_id.as_str()]);
        self.get_data(url).await
    }

    pub async fn tests_for_standard(
        &self,
        standard: u32,
        subject: Option<&str>,
    ) -> std::result::Result<Vec<TestSummary>, ClientError> {
        let standard = standard.to_string();
        let mut segments = vec![
            "api",
            "physicaltest",
            "physical-tests",
            "standard",
            standard.as_str(),
        ];
        if let Some(subject) = subject {
            segments.push(subject);
        }
        self.get_data(self.endpoint(&segments)).await
    }

    pub async fn subjects_for_standard(
        &self,
        standard: u32,
    ) -> std::result::Result<Vec<Subject>, ClientError> {
        let standard = standard.to_string();
        let url = self.endpoint(&["api", "subjects", "standard", standard.as_str()]);
        let catalogue: SubjectCatalogue = self.get_data(url).await?;
        Ok(catalogue.into_subjects())
    }

    pub async fn graded_result(
        &self,
        submission_id: &SubmissionId,
    ) -> std::result::Result<GradedResult, ClientError> {
        let url = self.endpoint(&[
            "api",
            "physicaltest",
            "answer-copies",
            "result",
            submission_id.as_str(),
        ]);
        self.get_data(url).await
    }

    async fn answer_copy_form(
        submission: &AnswerCopySubmission,
    ) -> std::result::Result<Form, ClientError> {
        let mut form = Form::new().text("studentId", submission.student_id.0.clone());
        if let Some(teacher_id) = &submission.teacher_id {
            form = form.text("teacherId", teacher_id.0.clone());
        }
        form = form.text("testId", submission.test_id.0.clone());

        for file in &submission.files {
            let bytes = file.read().await?;
            let part = Part::bytes(bytes)
                .file_name(file.filename().to_string())
                .mime_str(&file.mime_type())
                .map_err(|source| ClientError::FilePart {
                    filename: file.filename().to_string(),
                    source,
                })?;
            form = form.part("pdf", part);
        }
        Ok(form)
    }

    pub async fn post_answer_copies(
        &self,
        submission: &AnswerCopySubmission,
    ) -> std::result::Result<(), ClientError> {
        let url = self.endpoint(&["api", "physicaltest", "answer-copies"]);
        let form = Self::answer_copy_form(submission).await?;
        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.path().to_string(),
                source,
            })?;
        Self::checked(&url, response).await?;
        info!(
            test_id = %submission.test_id,
            files = submission.files.len(),
            "answer copies accepted"
        );
        Ok(())
    }
}

#[async_trait]
impl TestDataFetcher for DashboardClient {
    async fn fetch_test(&self, test_id: &TestId) -> Result<PhysicalTest> {
        Ok(self.physical_test(test_id).await?)
    }
}

#[async_trait]
impl SubmissionEndpoint for DashboardClient {
    async fn submit_answer_copies(&self, submission: AnswerCopySubmission) -> Result<()> {
        Ok(self.post_answer_copies(&submission).await?)
    }
}

#[async_trait]
impl TestCatalog for DashboardClient {
    async fn list_tests(&self, standard: u32, subject: Option<&str>) -> Result<Vec<TestSummary>> {
        Ok(self.tests_for_standard(standard, subject).await?)
    }

    async fn list_subjects(&self, standard: u32) -> Result<Vec<Subject>> {
        Ok(self.subjects_for_standard(standard).await?)
    }
}

#[async_trait]
impl ResultFetcher for DashboardClient {
    async fn fetch_result(&self, submission_id: &SubmissionId) -> Result<GradedResult> {
        Ok(self.graded_result(submission_id).await?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
