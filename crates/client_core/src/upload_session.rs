//! Controller behind the answer-sheet upload view.
//!
//! Owns the pending file list, the submission lifecycle and the navigation
//! guard. Timers for notices and the post-submit redirect live in a
//! [`ViewTasks`] set so they die with the view.

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use shared::{domain::TestId, protocol::PhysicalTest};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    guard::{
        ConfirmPrompt, GuardBinding, LeaveDecision, LeaveHook, LeaveKind, NavigationGuard,
        LEAVE_PROMPT,
    },
    lock_unpoisoned,
    scheduler::ViewTasks,
    types::{AnswerCopySubmission, PendingFile, Route, SessionContext},
    Navigator, SubmissionEndpoint, TestDataFetcher,
};

pub const NO_FILES_NOTICE: &str = "No files uploaded yet.";
pub const SUBMITTED_NOTICE: &str = "Successfully Submitted Test";
pub const SUBMIT_ERROR: &str = "An error occurred while submitting the test.";

const DEFAULT_NOTICE_DELAY: Duration = Duration::from_secs(3);
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn info(message: &str) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.to_string(),
        }
    }

    fn success(message: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    TestLoaded(PhysicalTest),
    TestUnavailable(String),
    FilesChanged { count: usize },
    StateChanged(SubmissionState),
    NoticeShown(Notice),
    NoticeDismissed,
    SubmissionFailed(String),
    Navigated(Route),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing selected; only a transient notice was shown.
    NothingToSubmit,
    /// A submission is already in flight; the control is disabled.
    AlreadyUploading,
    /// The view was torn down.
    Detached,
    Submitted,
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub notice_dismiss: Duration,
    pub redirect_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            notice_dismiss: DEFAULT_NOTICE_DELAY,
            redirect_delay: DEFAULT_NOTICE_DELAY,
        }
    }
}

/// Collaborators injected into a session at mount time.
pub struct SessionDeps {
    pub fetcher: Arc<dyn TestDataFetcher>,
    pub endpoint: Arc<dyn SubmissionEndpoint>,
    pub navigator: Arc<dyn Navigator>,
    pub prompt: Arc<dyn ConfirmPrompt>,
    pub leave_hooks: Vec<Arc<dyn LeaveHook>>,
    pub timings: SessionTimings,
}

/// Read-only picture of the view for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub test: Option<PhysicalTest>,
    pub pending_files: Vec<String>,
    pub state: SubmissionState,
    pub notice: Option<Notice>,
    pub error: Option<String>,
    pub submit_enabled: bool,
    pub guard_armed: bool,
}

struct ActiveNotice {
    id: u64,
    notice: Notice,
}

struct SessionState {
    test: Option<PhysicalTest>,
    pending: Vec<PendingFile>,
    submission: SubmissionState,
    notice: Option<ActiveNotice>,
    next_notice_id: u64,
    error: Option<String>,
    guard: GuardBinding,
    redirected: bool,
    torn_down: bool,
}

impl SessionState {
    fn sync_guard(&mut self) {
        let armed = NavigationGuard::is_armed(self.pending.len(), self.submission);
        self.guard.sync(armed);
    }
}

pub struct UploadSession {
    context: SessionContext,
    test_id: TestId,
    endpoint: Arc<dyn SubmissionEndpoint>,
    navigator: Arc<dyn Navigator>,
    prompt: Arc<dyn ConfirmPrompt>,
    timings: SessionTimings,
    inner: Mutex<SessionState>,
    tasks: ViewTasks,
    events: broadcast::Sender<SessionEvent>,
}

/// Clears `Uploading` on every exit path of a submit, including cancellation.
struct UploadInFlight<'a> {
    session: &'a UploadSession,
    outcome: SubmissionState,
}

impl<'a> UploadInFlight<'a> {
    fn new(session: &'a UploadSession) -> Self {
        Self {
            session,
            outcome: SubmissionState::Idle,
        }
    }

    fn finish(mut self, outcome: SubmissionState) {
        self.outcome = outcome;
    }
}

impl Drop for UploadInFlight<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.session.state();
            if state.submission == SubmissionState::Uploading {
                state.submission = self.outcome;
            }
            state.sync_guard();
        }
        self.session.emit(SessionEvent::StateChanged(self.outcome));
    }
}

impl UploadSession {
    /// Builds the session and loads the test metadata once. A failed load is
    /// logged and leaves the view without questions.
    pub async fn mount(context: SessionContext, test_id: TestId, deps: SessionDeps) -> Arc<Self> {
        let SessionDeps {
            fetcher,
            endpoint,
            navigator,
            prompt,
            leave_hooks,
            timings,
        } = deps;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session = Arc::new(Self {
            context,
            test_id,
            endpoint,
            navigator,
            prompt,
            timings,
            inner: Mutex::new(SessionState {
                test: None,
                pending: Vec::new(),
                submission: SubmissionState::Idle,
                notice: None,
                next_notice_id: 0,
                error: None,
                guard: GuardBinding::new(leave_hooks),
                redirected: false,
                torn_down: false,
            }),
            tasks: ViewTasks::new(),
            events,
        });

        match fetcher.fetch_test(&session.test_id).await {
            Ok(test) => {
                info!(
                    test_id = %session.test_id,
                    questions = test.questions.len(),
                    "loaded test metadata"
                );
                session.state().test = Some(test.clone());
                session.emit(SessionEvent::TestLoaded(test));
            }
            Err(err) => {
                warn!(test_id = %session.test_id, error = %err, "failed to fetch test metadata");
                session.emit(SessionEvent::TestUnavailable(err.to_string()));
            }
        }

        session
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock_unpoisoned(&self.inner)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Appends the selection in order. No de-duplication or validation.
    pub fn add_files(&self, selection: impl IntoIterator<Item = PendingFile>) -> usize {
        let count = {
            let mut state = self.state();
            state.pending.extend(selection);
            state.sync_guard();
            state.pending.len()
        };
        debug!(test_id = %self.test_id, count, "pending files added");
        self.emit(SessionEvent::FilesChanged { count });
        count
    }

    /// Removes the file at `index`; out-of-range indices are ignored.
    pub fn remove_file(&self, index: usize) -> Option<PendingFile> {
        let (removed, count) = {
            let mut state = self.state();
            if index >= state.pending.len() {
                return None;
            }
            let removed = state.pending.remove(index);
            state.sync_guard();
            (removed, state.pending.len())
        };
        self.emit(SessionEvent::FilesChanged { count });
        Some(removed)
    }

    pub fn pending_files(&self) -> Vec<PendingFile> {
        self.state().pending.clone()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.state().submission
    }

    pub fn guard_armed(&self) -> bool {
        let state = self.state();
        NavigationGuard::is_armed(state.pending.len(), state.submission)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            test: state.test.clone(),
            pending_files: state
                .pending
                .iter()
                .map(|file| file.filename().to_string())
                .collect(),
            state: state.submission,
            notice: state.notice.as_ref().map(|active| active.notice.clone()),
            error: state.error.clone(),
            submit_enabled: !state.torn_down && state.submission != SubmissionState::Uploading,
            guard_armed: NavigationGuard::is_armed(state.pending.len(), state.submission),
        }
    }

    fn show_notice(&self, notice: Notice) -> u64 {
        let id = {
            let mut state = self.state();
            state.next_notice_id += 1;
            let id = state.next_notice_id;
            state.notice = Some(ActiveNotice {
                id,
                notice: notice.clone(),
            });
            id
        };
        self.emit(SessionEvent::NoticeShown(notice));
        id
    }

    /// Hides the notice only if it is still the one that scheduled the dismissal.
    fn dismiss_notice(&self, id: u64) {
        let dismissed = {
            let mut state = self.state();
            let current = state.notice.as_ref().is_some_and(|active| active.id == id);
            if current {
                state.notice = None;
            }
            current
        };
        if dismissed {
            self.emit(SessionEvent::NoticeDismissed);
        }
    }

    fn redirect_to_listing(&self) {
        {
            let mut state = self.state();
            if state.redirected || state.torn_down {
                return;
            }
            state.redirected = true;
        }
        info!(test_id = %self.test_id, "redirecting to test listing");
        self.navigator.navigate(Route::TestListing);
        self.emit(SessionEvent::Navigated(Route::TestListing));
    }

    fn schedule_notice_dismiss(self: &Arc<Self>, id: u64) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.tasks.schedule_after(self.timings.notice_dismiss, async move {
            if let Some(session) = weak.upgrade() {
                session.dismiss_notice(id);
            }
        });
    }

    fn schedule_redirect(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.tasks.schedule_after(self.timings.redirect_delay, async move {
            if let Some(session) = weak.upgrade() {
                session.redirect_to_listing();
            }
        });
    }

    /// Sends every pending file to the answer-copy endpoint.
    pub async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let submission = {
            let mut state = self.state();
            if state.torn_down {
                return SubmitOutcome::Detached;
            }
            if state.submission == SubmissionState::Uploading {
                debug!(test_id = %self.test_id, "submit ignored while uploading");
                return SubmitOutcome::AlreadyUploading;
            }
            if state.pending.is_empty() {
                None
            } else {
                state.submission = SubmissionState::Uploading;
                state.error = None;
                state.sync_guard();
                Some(AnswerCopySubmission {
                    student_id: self.context.student_id.clone(),
                    teacher_id: state.test.as_ref().and_then(|test| test.teacher_id().cloned()),
                    test_id: self.test_id.clone(),
                    files: state.pending.clone(),
                })
            }
        };

        let Some(submission) = submission else {
            let id = self.show_notice(Notice::info(NO_FILES_NOTICE));
            self.schedule_notice_dismiss(id);
            return SubmitOutcome::NothingToSubmit;
        };

        self.emit(SessionEvent::StateChanged(SubmissionState::Uploading));
        info!(
            test_id = %self.test_id,
            files = submission.files.len(),
            has_teacher = submission.teacher_id.is_some(),
            "submitting answer copies"
        );

        let in_flight = UploadInFlight::new(self);
        match self.endpoint.submit_answer_copies(submission).await {
            Ok(()) => {
                in_flight.finish(SubmissionState::Succeeded);
                self.show_notice(Notice::success(SUBMITTED_NOTICE));
                self.schedule_redirect();
                SubmitOutcome::Submitted
            }
            Err(err) => {
                warn!(test_id = %self.test_id, error = %err, "answer copy submission failed");
                self.state().error = Some(SUBMIT_ERROR.to_string());
                in_flight.finish(SubmissionState::Failed);
                self.emit(SessionEvent::SubmissionFailed(SUBMIT_ERROR.to_string()));
                SubmitOutcome::Failed(err.to_string())
            }
        }
    }

    /// Handles a back or unload attempt. Asks for confirmation only while the
    /// guard is armed.
    pub async fn request_leave(&self, kind: LeaveKind) -> LeaveDecision {
        if self.guard_armed() && !self.prompt.confirm(LEAVE_PROMPT).await {
            info!(test_id = %self.test_id, ?kind, "leave cancelled by user");
            return LeaveDecision::Stay;
        }
        if kind == LeaveKind::Back {
            self.navigator.navigate(Route::Back);
            self.emit(SessionEvent::Navigated(Route::Back));
        }
        LeaveDecision::Proceed
    }

    /// Unmounts the view: cancels pending timers and detaches leave hooks.
    pub fn teardown(&self) {
        {
            let mut state = self.state();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.guard.release();
        }
        self.tasks.close();
        debug!(test_id = %self.test_id, "upload view torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.state().torn_down
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "tests/upload_session_tests.rs"]
mod tests;
