/// Modal progress indicator for the initialization run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressOverlayState {
    pub visible: bool,
    pub title: String,
    /// Stage label of the last update, e.g. `init training model_2 [1/3]`.
    pub detail: Option<String>,
    /// Completion in `[0.0, 1.0]`.
    pub fraction: f32,
}

impl ProgressOverlayState {
    /// Create a visible overlay at 0%.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            visible: true,
            title: title.into(),
            detail: None,
            fraction: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply an update; the bar never moves backwards.
    pub fn advance(&mut self, fraction: f32, detail: impl Into<String>) {
        self.fraction = fraction.clamp(self.fraction, 1.0);
        self.detail = Some(detail.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_monotonic_and_clamped() {
        let mut progress = ProgressOverlayState::new("Initializing");
        progress.advance(0.5, "evaluate max accuracy");
        progress.advance(0.25, "late update");
        assert_eq!(progress.fraction, 0.5);
        progress.advance(3.0, "setup finished");
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.detail.as_deref(), Some("setup finished"));
        progress.reset();
        assert!(!progress.visible);
    }
}
