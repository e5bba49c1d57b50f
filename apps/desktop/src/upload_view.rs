//! Interactive answer-sheet upload view.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use client_core::{
    LeaveDecision, LeaveFlag, LeaveHook, LeaveKind, PendingFile, Route, SessionDeps, SessionEvent,
    SessionTimings, SubmissionState, SubmitOutcome, UploadSession,
};
use shared::domain::TestId;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::{
    console::{self, TerminalNavigator, TerminalPrompt},
    render, AppContext,
};

const HELP: &str = "commands: add <path>..., rm <n>, list, submit, back, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Add(Vec<PathBuf>),
    Remove(usize),
    List,
    Submit,
    Back,
    Quit,
    Help,
}

impl ViewCommand {
    /// Parses one input line. File numbers are 1-based as shown in `list`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => {
                let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if paths.is_empty() {
                    return Err("usage: add <path>...".to_string());
                }
                Self::Add(paths)
            }
            "rm" | "remove" => {
                let index = words
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| "usage: rm <n>".to_string())?;
                Self::Remove(index - 1)
            }
            "list" | "ls" => Self::List,
            "submit" => Self::Submit,
            "back" => Self::Back,
            "quit" | "exit" => Self::Quit,
            "help" | "?" => Self::Help,
            other => return Err(format!("unknown command '{other}'; {HELP}")),
        };
        Ok(Some(command))
    }
}

/// The view's unload and back hooks. A leave goes through the session's
/// confirmation only while the matching hook is armed.
pub struct LeavePoints {
    unload: Arc<LeaveFlag>,
    back: Arc<LeaveFlag>,
}

impl Default for LeavePoints {
    fn default() -> Self {
        Self {
            unload: LeaveFlag::new(LeaveKind::Unload),
            back: LeaveFlag::new(LeaveKind::Back),
        }
    }
}

impl LeavePoints {
    pub fn hooks(&self) -> Vec<Arc<dyn LeaveHook>> {
        vec![
            self.unload.clone() as Arc<dyn LeaveHook>,
            self.back.clone() as Arc<dyn LeaveHook>,
        ]
    }

    fn hook(&self, kind: LeaveKind) -> &LeaveFlag {
        match kind {
            LeaveKind::Unload => &self.unload,
            LeaveKind::Back => &self.back,
        }
    }

    pub async fn attempt(&self, session: &UploadSession, kind: LeaveKind) -> LeaveDecision {
        if !self.hook(kind).is_armed() {
            return LeaveDecision::Proceed;
        }
        session.request_leave(kind).await
    }
}

enum Flow {
    Stay,
    Close(Option<Route>),
}

pub async fn run(app: &AppContext, test_id: TestId, initial: Vec<PathBuf>) -> Result<()> {
    let lines = console::spawn_stdin_reader();
    let (navigator, mut routes) = TerminalNavigator::new();
    let points = LeavePoints::default();

    let deps = SessionDeps {
        fetcher: app.client.clone(),
        endpoint: app.client.clone(),
        navigator: Arc::new(navigator),
        prompt: Arc::new(TerminalPrompt::new(lines.clone())),
        leave_hooks: points.hooks(),
        timings: SessionTimings {
            notice_dismiss: app.settings.notice_delay(),
            redirect_delay: app.settings.notice_delay(),
        },
    };

    let session = UploadSession::mount(app.session_context()?, test_id, deps).await;
    let mut events = session.subscribe();
    session.add_files(initial.into_iter().map(PendingFile::from_path));

    print!("{}", render::session(&session.snapshot()));
    println!("{HELP}");

    let exit_route = loop {
        console::print_prompt("> ");
        tokio::select! {
            line = console::next_line(&lines) => {
                // Input closed; nobody is left to confirm a prompt.
                let Some(line) = line else {
                    break None;
                };
                if let Flow::Close(route) = handle_line(&session, &points, &line).await {
                    break route;
                }
            }
            route = routes.recv() => {
                break route;
            }
            event = events.recv() => {
                match event {
                    Ok(event) => show_event(&event),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "upload view lagged"),
                    Err(RecvError::Closed) => break None,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                if points.attempt(&session, LeaveKind::Unload).await == LeaveDecision::Proceed {
                    break None;
                }
            }
        }
    };

    session.teardown();
    match exit_route {
        Some(route) => {
            info!(route = route.path(), "navigated away from upload view");
            println!("-> {}", route.path());
        }
        None => info!("upload view closed"),
    }
    Ok(())
}

async fn handle_line(session: &Arc<UploadSession>, points: &LeavePoints, line: &str) -> Flow {
    let command = match ViewCommand::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Flow::Stay,
        Err(message) => {
            println!("{message}");
            return Flow::Stay;
        }
    };

    match command {
        ViewCommand::Add(paths) => {
            let added = session.add_files(paths.into_iter().map(PendingFile::from_path));
            println!("{added} file(s) selected");
        }
        ViewCommand::Remove(index) => match session.remove_file(index) {
            Some(file) => println!("removed {}", file.filename()),
            None => println!("no file #{}", index + 1),
        },
        ViewCommand::List => print!("{}", render::session(&session.snapshot())),
        ViewCommand::Submit => {
            if session.submission_state() == SubmissionState::Uploading {
                println!("Uploading...");
                return Flow::Stay;
            }
            let session = session.clone();
            tokio::spawn(async move {
                if let SubmitOutcome::Failed(reason) = session.submit().await {
                    debug!(%reason, "submit failed");
                }
            });
        }
        ViewCommand::Back => {
            if points.attempt(session, LeaveKind::Back).await == LeaveDecision::Proceed {
                return Flow::Close(Some(Route::Back));
            }
        }
        ViewCommand::Quit => {
            if points.attempt(session, LeaveKind::Unload).await == LeaveDecision::Proceed {
                return Flow::Close(None);
            }
        }
        ViewCommand::Help => println!("{HELP}"),
    }
    Flow::Stay
}

fn show_event(event: &SessionEvent) {
    match event {
        SessionEvent::NoticeShown(notice) => {
            print!("\n{}", render::notice_line(notice.kind, &notice.message));
        }
        SessionEvent::StateChanged(SubmissionState::Uploading) => println!("\nUploading..."),
        SessionEvent::SubmissionFailed(message) => println!("\nerror: {message}"),
        SessionEvent::Navigated(Route::TestListing) => {}
        other => debug!(?other, "upload view event"),
    }
}

#[cfg(test)]
#[path = "tests/upload_view_tests.rs"]
mod tests;
