//! Graded result of one answer-copy submission.

use shared::{domain::SubmissionId, protocol::GradedResult};
use tracing::{info, warn};

use crate::ResultFetcher;

pub const NO_RESULT: &str = "NO Test Taken for This Test id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLink {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Loaded(GradedResult),
    /// Any failure to fetch is shown as "no result".
    NoResult,
}

impl ResultView {
    pub async fn load(fetcher: &dyn ResultFetcher, submission_id: &SubmissionId) -> Self {
        match fetcher.fetch_result(submission_id).await {
            Ok(result) => {
                info!(submission_id = %submission_id, "loaded graded result");
                Self::Loaded(result)
            }
            Err(err) => {
                warn!(submission_id = %submission_id, error = %err, "no graded result");
                Self::NoResult
            }
        }
    }

    pub fn result(&self) -> Option<&GradedResult> {
        match self {
            Self::Loaded(result) => Some(result),
            Self::NoResult => None,
        }
    }

    pub fn topic_links(&self) -> Vec<TopicLink> {
        self.result()
            .map(|result| {
                result
                    .recommendations
                    .iter()
                    .map(|rec| TopicLink {
                        name: rec.topic.name.clone(),
                        path: format!("/topic/{}", rec.topic.id),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use shared::{
        domain::TopicId,
        protocol::{PersonRef, Recommendation, ResultTestRef, TopicRef},
    };

    struct FixedResult(Option<GradedResult>);

    #[async_trait]
    impl ResultFetcher for FixedResult {
        async fn fetch_result(&self, submission_id: &SubmissionId) -> Result<GradedResult> {
            self.0
                .clone()
                .ok_or_else(|| anyhow!("404 no result for {submission_id}"))
        }
    }

    fn graded() -> GradedResult {
        GradedResult {
            id: None,
            teacher: PersonRef {
                full_name: "A. Rao".to_string(),
            },
            student: PersonRef {
                full_name: "K. Iyer".to_string(),
            },
            test: ResultTestRef { score: 50.0 },
            score: 41.0,
            grade: Some("A".to_string()),
            feedback: Some("Neat constructions".to_string()),
            recommendations: vec![Recommendation {
                topic: TopicRef {
                    id: TopicId::new("topic-3"),
                    name: "Circle theorems".to_string(),
                },
            }],
            pdf_path: Some("/uploads/a.pdf".to_string()),
        }
    }

    #[tokio::test]
    async fn loaded_result_exposes_topic_links() {
        let view = ResultView::load(&FixedResult(Some(graded())), &SubmissionId::new("s1")).await;
        assert_eq!(view.result().expect("loaded").score, 41.0);
        assert_eq!(
            view.topic_links(),
            vec![TopicLink {
                name: "Circle theorems".to_string(),
                path: "/topic/topic-3".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn fetch_error_becomes_no_result() {
        let view = ResultView::load(&FixedResult(None), &SubmissionId::new("s1")).await;
        assert_eq!(view, ResultView::NoResult);
        assert!(view.topic_links().is_empty());
    }
}
