use crate::egui_app::ui::style::{self, StatusTone};
use egui::Color32;

/// Status badge + text shown in the footer.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusBarState {
    pub text: String,
    pub badge_label: String,
    pub badge_color: Color32,
    /// Rolling log of past messages, newest last.
    pub log: Vec<String>,
}

/// Messages kept in [`StatusBarState::log`].
pub const STATUS_LOG_LIMIT: usize = 50;

impl StatusBarState {
    pub fn idle() -> Self {
        Self {
            text: "Import a dataset to get started".into(),
            badge_label: style::status_badge(StatusTone::Idle).0.into(),
            badge_color: style::status_badge_color(StatusTone::Idle),
            log: Vec::new(),
        }
    }

    pub fn set(&mut self, text: impl Into<String>, tone: StatusTone) {
        let (label, color) = style::status_badge(tone);
        self.text = text.into();
        self.badge_label = label.into();
        self.badge_color = color;
        self.log.push(self.text.clone());
        if self.log.len() > STATUS_LOG_LIMIT {
            let excess = self.log.len() - STATUS_LOG_LIMIT;
            self.log.drain(..excess);
        }
    }

    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }
}

impl Default for StatusBarState {
    fn default() -> Self {
        Self::idle()
    }
}
