//! Terminal adapters for the upload view's collaborators.

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
};

use async_trait::async_trait;
use client_core::{ConfirmPrompt, Navigator, Route};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

pub type SharedLines = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

/// Reads stdin on a dedicated thread so the runtime never blocks on it.
pub fn spawn_stdin_reader() -> SharedLines {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            }
        }
        debug!("stdin reader exiting");
    });
    Arc::new(Mutex::new(rx))
}

pub async fn next_line(lines: &SharedLines) -> Option<String> {
    lines.lock().await.recv().await
}

pub fn print_prompt(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Yes/no confirmation read from the shared stdin stream. EOF counts as "no".
pub struct TerminalPrompt {
    lines: SharedLines,
}

impl TerminalPrompt {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl ConfirmPrompt for TerminalPrompt {
    async fn confirm(&self, message: &str) -> bool {
        print_prompt(&format!("{message} [y/N] "));
        next_line(&self.lines)
            .await
            .map(|answer| is_affirmative(&answer))
            .unwrap_or(false)
    }
}

/// Used by one-shot commands; never discards unsubmitted work.
pub struct DeclinePrompt;

#[async_trait]
impl ConfirmPrompt for DeclinePrompt {
    async fn confirm(&self, _message: &str) -> bool {
        false
    }
}

/// Forwards navigation requests to the view loop.
pub struct TerminalNavigator {
    routes: mpsc::UnboundedSender<Route>,
}

impl TerminalNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (routes, rx) = mpsc::unbounded_channel();
        (Self { routes }, rx)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        if self.routes.send(route).is_err() {
            debug!(?route, "navigation after the view closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yes_answers_confirm() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES \n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[tokio::test]
    async fn prompt_reads_from_shared_lines() {
        let (tx, rx) = mpsc::unbounded_channel();
        let prompt = TerminalPrompt::new(Arc::new(Mutex::new(rx)));

        tx.send("y".to_string()).expect("send");
        assert!(prompt.confirm("Leave?").await);

        tx.send("no".to_string()).expect("send");
        assert!(!prompt.confirm("Leave?").await);

        drop(tx);
        assert!(!prompt.confirm("Leave?").await);
    }

    #[tokio::test]
    async fn navigator_forwards_routes() {
        let (navigator, mut routes) = TerminalNavigator::new();
        navigator.navigate(Route::TestListing);
        assert_eq!(routes.recv().await, Some(Route::TestListing));

        drop(routes);
        navigator.navigate(Route::Back);
    }
}
