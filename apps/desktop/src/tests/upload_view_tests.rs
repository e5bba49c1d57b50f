use super::*;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use anyhow::anyhow;
use async_trait::async_trait;
use client_core::{
    AnswerCopySubmission, ConfirmPrompt, Navigator, SessionContext, SubmissionEndpoint,
    TestDataFetcher,
};
use shared::{domain::StudentId, protocol::PhysicalTest};

struct OfflineFetcher;

#[async_trait]
impl TestDataFetcher for OfflineFetcher {
    async fn fetch_test(&self, test_id: &TestId) -> anyhow::Result<PhysicalTest> {
        Err(anyhow!("offline: {test_id}"))
    }
}

struct AcceptingEndpoint;

#[async_trait]
impl SubmissionEndpoint for AcceptingEndpoint {
    async fn submit_answer_copies(&self, _submission: AnswerCopySubmission) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes").push(route);
    }
}

struct CountingPrompt {
    answer: bool,
    asked: AtomicUsize,
}

#[async_trait]
impl ConfirmPrompt for CountingPrompt {
    async fn confirm(&self, _message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

struct View {
    session: Arc<UploadSession>,
    points: LeavePoints,
    navigator: Arc<RecordingNavigator>,
    prompt: Arc<CountingPrompt>,
}

impl View {
    fn asked(&self) -> usize {
        self.prompt.asked.load(Ordering::SeqCst)
    }

    fn routes(&self) -> Vec<Route> {
        self.navigator.routes.lock().expect("routes").clone()
    }
}

async fn mount_view(confirm: bool) -> View {
    let points = LeavePoints::default();
    let navigator = Arc::new(RecordingNavigator::default());
    let prompt = Arc::new(CountingPrompt {
        answer: confirm,
        asked: AtomicUsize::new(0),
    });
    let session = UploadSession::mount(
        SessionContext::new(StudentId::new("student-3")),
        TestId::new("test-1"),
        SessionDeps {
            fetcher: Arc::new(OfflineFetcher),
            endpoint: Arc::new(AcceptingEndpoint),
            navigator: navigator.clone(),
            prompt: prompt.clone(),
            leave_hooks: points.hooks(),
            timings: SessionTimings::default(),
        },
    )
    .await;
    View {
        session,
        points,
        navigator,
        prompt,
    }
}

#[test]
fn parses_view_commands() {
    assert_eq!(
        ViewCommand::parse("add a.pdf scans/b.jpg"),
        Ok(Some(ViewCommand::Add(vec![
            PathBuf::from("a.pdf"),
            PathBuf::from("scans/b.jpg"),
        ])))
    );
    assert_eq!(ViewCommand::parse("rm 2"), Ok(Some(ViewCommand::Remove(1))));
    assert_eq!(ViewCommand::parse("  SUBMIT "), Ok(Some(ViewCommand::Submit)));
    assert_eq!(ViewCommand::parse("exit"), Ok(Some(ViewCommand::Quit)));
    assert_eq!(ViewCommand::parse(""), Ok(None));
}

#[test]
fn rejects_bad_arguments() {
    assert!(ViewCommand::parse("add").is_err());
    assert!(ViewCommand::parse("rm 0").is_err());
    assert!(ViewCommand::parse("rm x").is_err());
    assert!(ViewCommand::parse("upload").is_err());
}

#[tokio::test]
async fn disarmed_hooks_leave_without_prompting() {
    let view = mount_view(false).await;

    assert!(!view.points.unload.is_armed());
    assert!(!view.points.back.is_armed());
    assert_eq!(
        view.points.attempt(&view.session, LeaveKind::Unload).await,
        LeaveDecision::Proceed
    );
    assert_eq!(
        view.points.attempt(&view.session, LeaveKind::Back).await,
        LeaveDecision::Proceed
    );
    assert_eq!(view.asked(), 0);
    assert!(view.routes().is_empty());
}

#[tokio::test]
async fn armed_hooks_route_leaves_through_the_prompt() {
    let declining = mount_view(false).await;
    declining
        .session
        .add_files([PendingFile::from_bytes("p1.pdf", b"%PDF".to_vec())]);
    assert!(declining.points.unload.is_armed());
    assert!(declining.points.back.is_armed());

    assert_eq!(
        declining.points.attempt(&declining.session, LeaveKind::Unload).await,
        LeaveDecision::Stay
    );
    assert_eq!(
        declining.points.attempt(&declining.session, LeaveKind::Back).await,
        LeaveDecision::Stay
    );
    assert_eq!(declining.asked(), 2);
    assert_eq!(declining.session.snapshot().pending_files, vec!["p1.pdf"]);

    let accepting = mount_view(true).await;
    accepting
        .session
        .add_files([PendingFile::from_bytes("p1.pdf", b"%PDF".to_vec())]);
    assert_eq!(
        accepting.points.attempt(&accepting.session, LeaveKind::Back).await,
        LeaveDecision::Proceed
    );
    assert_eq!(accepting.asked(), 1);
    assert_eq!(accepting.routes(), vec![Route::Back]);
}

#[tokio::test]
async fn detached_hooks_stop_guarding_after_teardown() {
    let view = mount_view(false).await;
    view.session
        .add_files([PendingFile::from_bytes("p1.pdf", b"%PDF".to_vec())]);

    view.session.teardown();

    assert!(!view.points.unload.is_attached());
    assert_eq!(
        view.points.attempt(&view.session, LeaveKind::Unload).await,
        LeaveDecision::Proceed
    );
    assert_eq!(view.asked(), 0);
}
