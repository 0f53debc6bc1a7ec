//! Per-user session state.
//!
//! One explicit model for everything a user accumulates while working: the
//! active scan and its view, generated reports, chat histories and pending
//! notifications.

use std::collections::HashMap;

use log::info;

use crate::chat::{ChatMessage, ChatRole, FAILED_ANSWER, GREETING};
use crate::notification::{MAX_DISPLAYED, Notification, NotificationLevel};
use crate::view_state::{ViewError, ViewState};

#[derive(Debug, Default)]
pub struct Session {
    current_scan: Option<String>,
    dims: Option<(usize, usize, usize)>,
    view: Option<ViewState>,
    reports: HashMap<String, String>,
    chat_history: HashMap<String, Vec<ChatMessage>>,
    notifications: Vec<Notification>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_scan(&self) -> Option<&str> {
        self.current_scan.as_deref()
    }

    /// Dimensions of the active scan.
    pub fn dims(&self) -> Option<(usize, usize, usize)> {
        self.dims
    }

    pub fn view(&self) -> Option<ViewState> {
        self.view
    }

    /// Make `scan_id` active with a fresh view, discarding the previous one.
    pub fn select_scan(
        &mut self,
        scan_id: impl Into<String>,
        dims: (usize, usize, usize),
    ) -> Result<ViewState, ViewError> {
        let view = ViewState::new(dims)?;
        let scan_id = scan_id.into();
        info!("Selected scan {} with dimensions {:?}", scan_id, dims);
        self.current_scan = Some(scan_id);
        self.dims = Some(dims);
        self.view = Some(view);
        Ok(view)
    }

    /// Apply a view operation to the active view, if there is one.
    pub fn update_view<F>(&mut self, update: F) -> Option<ViewState>
    where
        F: FnOnce(ViewState, (usize, usize, usize)) -> ViewState,
    {
        let dims = self.dims?;
        let view = update(self.view?, dims);
        self.view = Some(view);
        Some(view)
    }

    /// Like [`Session::update_view`] for operations that can be rejected.
    /// A rejected operation leaves the view untouched.
    pub fn try_update_view<F>(&mut self, update: F) -> Option<Result<ViewState, ViewError>>
    where
        F: FnOnce(ViewState) -> Result<ViewState, ViewError>,
    {
        let result = update(self.view?);
        if let Ok(view) = result {
            self.view = Some(view);
        }
        Some(result)
    }

    /// Re-clamp the active view after the scan was reloaded with new dims.
    /// Dimensions with an empty axis are rejected and the session is left
    /// as it was.
    pub fn reload_dimensions(
        &mut self,
        dims: (usize, usize, usize),
    ) -> Result<Option<ViewState>, ViewError> {
        if dims.0 == 0 || dims.1 == 0 || dims.2 == 0 {
            return Err(ViewError::EmptyVolume(dims));
        }
        if self.current_scan.is_none() {
            return Ok(None);
        }
        self.dims = Some(dims);
        Ok(self.update_view(ViewState::reconcile))
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notifications.push(Notification::new(message, level));
    }

    /// The first few pending notifications; the queue is emptied either way.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        let mut pending = std::mem::take(&mut self.notifications);
        pending.truncate(MAX_DISPLAYED);
        pending
    }

    pub fn report(&self, scan_id: &str) -> Option<&str> {
        self.reports
            .get(scan_id)
            .map(String::as_str)
            .filter(|html| !html.is_empty())
    }

    pub fn store_report(&mut self, scan_id: impl Into<String>, html: impl Into<String>) {
        self.reports.insert(scan_id.into(), html.into());
    }

    /// Chat history of `scan_id`, seeded with the assistant greeting.
    pub fn chat_history(&mut self, scan_id: &str) -> &[ChatMessage] {
        self.history_mut(scan_id)
    }

    fn history_mut(&mut self, scan_id: &str) -> &mut Vec<ChatMessage> {
        self.chat_history
            .entry(scan_id.to_string())
            .or_insert_with(|| vec![ChatMessage::new(ChatRole::Assistant, GREETING)])
    }

    pub fn record_question(&mut self, scan_id: &str, question: &str) {
        self.history_mut(scan_id)
            .push(ChatMessage::new(ChatRole::User, question));
    }

    pub fn record_answer(&mut self, scan_id: &str, answer: &str) {
        self.history_mut(scan_id)
            .push(ChatMessage::new(ChatRole::Assistant, answer));
    }

    pub fn record_failed_answer(&mut self, scan_id: &str) {
        self.record_answer(scan_id, FAILED_ANSWER);
    }
}
