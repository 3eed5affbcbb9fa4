use eframe::egui::{
    Color32, Stroke, Visuals,
    epaint::{CornerRadius, Shadow},
    style::WidgetVisuals,
};

use crate::settings::Theme;

/// Colors shared by the setup panels.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    /// Window background behind the sections.
    pub backdrop: Color32,
    /// Section and overlay cards.
    pub card: Color32,
    pub control: Color32,
    pub control_soft: Color32,
    pub outline: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub accent: Color32,
    pub alert: Color32,
    pub ok: Color32,
}

const DARK: Palette = Palette {
    backdrop: Color32::from_rgb(20, 23, 28),
    card: Color32::from_rgb(13, 15, 19),
    control: Color32::from_rgb(38, 43, 52),
    control_soft: Color32::from_rgb(29, 33, 40),
    outline: Color32::from_rgb(48, 54, 64),
    text: Color32::from_rgb(204, 210, 218),
    text_dim: Color32::from_rgb(134, 142, 154),
    accent: Color32::from_rgb(110, 196, 214),
    alert: Color32::from_rgb(222, 112, 96),
    ok: Color32::from_rgb(112, 190, 140),
};

const LIGHT: Palette = Palette {
    backdrop: Color32::from_rgb(236, 239, 242),
    card: Color32::from_rgb(251, 252, 253),
    control: Color32::from_rgb(216, 222, 228),
    control_soft: Color32::from_rgb(228, 233, 238),
    outline: Color32::from_rgb(190, 198, 206),
    text: Color32::from_rgb(30, 34, 40),
    text_dim: Color32::from_rgb(92, 100, 112),
    accent: Color32::from_rgb(18, 118, 140),
    alert: Color32::from_rgb(178, 64, 46),
    ok: Color32::from_rgb(36, 124, 78),
};

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => DARK,
        Theme::Light => LIGHT,
    }
}

/// egui visuals for `theme`: square corners, flat popups, palette colors.
pub fn visuals(theme: Theme) -> Visuals {
    let colors = palette(theme);
    let mut visuals = match theme {
        Theme::Dark => Visuals::dark(),
        Theme::Light => Visuals::light(),
    };
    visuals.panel_fill = colors.backdrop;
    visuals.window_fill = colors.card;
    visuals.extreme_bg_color = colors.card;
    visuals.faint_bg_color = colors.control_soft;
    visuals.override_text_color = Some(colors.text);
    visuals.hyperlink_color = colors.accent;
    visuals.warn_fg_color = colors.alert;
    visuals.error_fg_color = colors.alert;
    visuals.selection.bg_fill = colors.control;
    visuals.selection.stroke = Stroke::new(1.0, colors.accent);
    visuals.window_corner_radius = CornerRadius::ZERO;
    visuals.menu_corner_radius = CornerRadius::ZERO;
    visuals.popup_shadow = Shadow::NONE;
    visuals.window_shadow = Shadow::NONE;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = colors.card;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, colors.text);
    for (state, fill) in [
        (&mut widgets.inactive, colors.control),
        (&mut widgets.hovered, colors.control_soft),
        (&mut widgets.active, colors.control_soft),
        (&mut widgets.open, colors.control),
    ] {
        flat_widget(state, fill, colors);
    }
    visuals
}

fn flat_widget(state: &mut WidgetVisuals, fill: Color32, colors: Palette) {
    state.corner_radius = CornerRadius::ZERO;
    state.bg_fill = fill;
    state.weak_bg_fill = fill;
    state.bg_stroke = Stroke::new(1.0, colors.outline);
    state.fg_stroke = Stroke::new(1.0, colors.text);
}

pub fn section_stroke(theme: Theme) -> Stroke {
    Stroke::new(1.0, palette(theme).outline)
}

/// Severity of the message in the status bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Idle,
    Busy,
    Info,
    Warning,
    Error,
}

/// Badge text and fill for `tone`; readable on both themes.
pub fn status_badge(tone: StatusTone) -> (&'static str, Color32) {
    match tone {
        StatusTone::Idle => ("Setup", Color32::from_rgb(70, 76, 86)),
        StatusTone::Busy => ("Running", Color32::from_rgb(28, 120, 150)),
        StatusTone::Info => ("OK", Color32::from_rgb(46, 130, 90)),
        StatusTone::Warning => ("Check", Color32::from_rgb(176, 122, 34)),
        StatusTone::Error => ("Error", Color32::from_rgb(178, 58, 44)),
    }
}

pub fn status_badge_color(tone: StatusTone) -> Color32 {
    status_badge(tone).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_pick_matching_base_visuals() {
        assert!(visuals(Theme::Dark).dark_mode);
        assert!(!visuals(Theme::Light).dark_mode);
        assert_eq!(visuals(Theme::Light).panel_fill, LIGHT.backdrop);
    }

    #[test]
    fn error_badge_differs_from_idle() {
        assert_ne!(
            status_badge_color(StatusTone::Error),
            status_badge_color(StatusTone::Idle)
        );
        assert_eq!(status_badge(StatusTone::Busy).0, "Running");
    }
}
