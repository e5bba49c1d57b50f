//! Unsaved-work guarding for the upload view.
//!
//! One predicate decides whether leaving the view needs confirmation. Two
//! independent registration points (document unload and in-app back
//! navigation) mirror it through [`GuardBinding`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use tracing::debug;

use crate::upload_session::SubmissionState;

pub const LEAVE_PROMPT: &str =
    "You have answer sheets that were not submitted. Leave this page and discard them?";

pub struct NavigationGuard;

impl NavigationGuard {
    /// Armed while unsubmitted files exist, except during an in-flight upload.
    pub fn is_armed(pending_files: usize, state: SubmissionState) -> bool {
        pending_files > 0 && state != SubmissionState::Uploading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveKind {
    /// In-app back navigation.
    Back,
    /// Closing or reloading the whole document.
    Unload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Proceed,
    Stay,
}

/// Asks the user to confirm a destructive navigation.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// One place a leave attempt can be intercepted.
pub trait LeaveHook: Send + Sync {
    fn kind(&self) -> LeaveKind;
    fn set_armed(&self, armed: bool);
    fn detach(&self);
}

/// Flag-backed hook; front ends poll it from their own unload/back handlers.
pub struct LeaveFlag {
    kind: LeaveKind,
    armed: AtomicBool,
    attached: AtomicBool,
}

impl LeaveFlag {
    pub fn new(kind: LeaveKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            armed: AtomicBool::new(false),
            attached: AtomicBool::new(true),
        })
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl LeaveHook for LeaveFlag {
    fn kind(&self) -> LeaveKind {
        self.kind
    }

    fn set_armed(&self, armed: bool) {
        if self.is_attached() {
            self.armed.store(armed, Ordering::SeqCst);
        }
    }

    fn detach(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.attached.store(false, Ordering::SeqCst);
    }
}

/// Keeps every registered hook in step with the guard predicate.
pub struct GuardBinding {
    hooks: Vec<Arc<dyn LeaveHook>>,
    armed: bool,
    released: bool,
}

impl GuardBinding {
    pub fn new(hooks: Vec<Arc<dyn LeaveHook>>) -> Self {
        Self {
            hooks,
            armed: false,
            released: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Pushes a new armed state to the hooks. Unchanged states are not re-sent.
    pub fn sync(&mut self, armed: bool) {
        if self.released || armed == self.armed {
            return;
        }
        self.armed = armed;
        for hook in &self.hooks {
            hook.set_armed(armed);
        }
        debug!(armed, hooks = self.hooks.len(), "navigation guard updated");
    }

    /// Detaches every hook. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.armed = false;
        for hook in self.hooks.drain(..) {
            hook.detach();
        }
    }
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;
