#![forbid(unsafe_code)]

//! Values inherited down the view tree.
//!
//! A parent can change the [`Environment`] for its subtree (a dimmed
//! modifier, a frame with an explicit width); children read it from their
//! [`RenderContext`](crate::context::RenderContext). The theme is shared
//! behind an `Arc`, so cloning an environment per child is cheap.

use std::sync::Arc;

use web_time::Duration;

/// Light or dark terminal background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Appearance {
    #[default]
    Dark,
    Light,
}

/// Escape codes the built-in controls draw with.
///
/// Every field is a complete SGR sequence (or empty for "terminal
/// default").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    /// Body text.
    pub foreground: String,
    /// Canvas behind everything.
    pub background: String,
    /// Interactive elements.
    pub accent: String,
    /// Disabled and placeholder text.
    pub muted: String,
    /// Marker drawn on the focused control.
    pub focus_indicator: String,
    /// Status bar canvas.
    pub status_bar: String,
}

impl Theme {
    /// Theme for dark terminals.
    pub fn dark() -> Self {
        Self {
            name: "dark".into(),
            foreground: "\x1b[38;5;252m".into(),
            background: String::new(),
            accent: "\x1b[38;5;75m".into(),
            muted: "\x1b[38;5;243m".into(),
            focus_indicator: "\x1b[1;38;5;214m".into(),
            status_bar: "\x1b[48;5;236m".into(),
        }
    }

    /// Theme for light terminals.
    pub fn light() -> Self {
        Self {
            name: "light".into(),
            foreground: "\x1b[38;5;235m".into(),
            background: String::new(),
            accent: "\x1b[38;5;25m".into(),
            muted: "\x1b[38;5;246m".into(),
            focus_indicator: "\x1b[1;38;5;166m".into(),
            status_bar: "\x1b[48;5;253m".into(),
        }
    }

    /// Theme matching `appearance`.
    pub fn for_appearance(appearance: Appearance) -> Self {
        match appearance {
            Appearance::Dark => Self::dark(),
            Appearance::Light => Self::light(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Where an animation is at for the frame being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationPhase {
    /// Frames rendered so far.
    pub frame: u64,
    /// Time since the render loop started.
    pub elapsed: Duration,
}

/// Inherited rendering environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub theme: Arc<Theme>,
    pub appearance: Appearance,
    /// A parent fixed the width; text fills and truncates to it.
    pub explicit_width: bool,
    /// Overrides the theme's focus indicator for this subtree.
    pub focus_indicator: Option<String>,
    /// Content is drawn faint and controls do not show focus.
    pub dimmed: bool,
    pub animation: AnimationPhase,
}

impl Environment {
    /// Environment around `theme`.
    pub fn new(theme: Arc<Theme>, appearance: Appearance) -> Self {
        Self {
            theme,
            appearance,
            ..Self::default()
        }
    }

    /// The focus indicator in effect.
    pub fn focus_indicator(&self) -> &str {
        self.focus_indicator
            .as_deref()
            .unwrap_or(&self.theme.focus_indicator)
    }

    /// Copy with the animation phase replaced.
    #[must_use]
    pub fn with_animation(mut self, animation: AnimationPhase) -> Self {
        self.animation = animation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_indicator_override() {
        let mut env = Environment::default();
        assert_eq!(env.focus_indicator(), Theme::dark().focus_indicator);
        env.focus_indicator = Some("\x1b[7m".into());
        assert_eq!(env.focus_indicator(), "\x1b[7m");
    }

    #[test]
    fn appearance_picks_theme() {
        assert_eq!(Theme::for_appearance(Appearance::Light).name, "light");
        assert_eq!(Theme::for_appearance(Appearance::Dark), Theme::default());
    }
}
