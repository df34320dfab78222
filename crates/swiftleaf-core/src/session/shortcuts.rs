use crate::config::AppConfig;
use crate::config::defaults;

/// Where keyboard focus currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Reader,
    /// Typing into a text box; reader shortcuts must not fire.
    TextField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub logo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TogglePlayPause,
    SkipBackward,
    SkipForward,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub toggle_play_pause: String,
    pub skip_backward: String,
    pub skip_forward: String,
    pub restart: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for KeyBindings {
    fn from(config: &AppConfig) -> Self {
        Self {
            toggle_play_pause: config.key_toggle_play_pause.clone(),
            skip_backward: config.key_skip_backward.clone(),
            skip_forward: config.key_skip_forward.clone(),
            restart: config.key_restart.clone(),
        }
    }
}

impl KeyBindings {
    pub fn resolve(&self, input: &KeyInput, focus: InputFocus) -> Option<ShortcutAction> {
        if focus == InputFocus::TextField {
            return None;
        }
        let pressed = normalize_key_name(&input.key);
        if pressed.is_empty() {
            return None;
        }

        let bindings = [
            (
                &self.toggle_play_pause,
                defaults::default_key_toggle_play_pause(),
                ShortcutAction::TogglePlayPause,
            ),
            (
                &self.skip_backward,
                defaults::default_key_skip_backward(),
                ShortcutAction::SkipBackward,
            ),
            (
                &self.skip_forward,
                defaults::default_key_skip_forward(),
                ShortcutAction::SkipForward,
            ),
            (
                &self.restart,
                defaults::default_key_restart(),
                ShortcutAction::Restart,
            ),
        ];

        bindings
            .into_iter()
            .find(|(raw, fallback, _)| shortcut_matches(raw, fallback, &pressed, input.modifiers))
            .map(|(_, _, action)| action)
    }
}

/// Matches a binding such as `ctrl+r` against a pressed key. Shift is only
/// checked when the binding asks for it, so `R` triggers `r`.
pub fn shortcut_matches(raw: &str, fallback: &str, pressed: &str, modifiers: Modifiers) -> bool {
    let normalized = normalize_shortcut_token(raw, fallback);

    let mut required_ctrl = false;
    let mut required_alt = false;
    let mut required_logo = false;
    let mut required_shift = false;
    let mut required_key: Option<String> = None;

    for token in normalized
        .split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match token {
            "ctrl" | "control" => required_ctrl = true,
            "alt" => required_alt = true,
            "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
            "shift" => required_shift = true,
            key => required_key = Some(normalize_key_name(key)),
        }
    }

    let required_key = required_key.unwrap_or_else(|| normalize_key_name(fallback));
    if pressed != required_key {
        return false;
    }

    modifiers.ctrl == required_ctrl
        && modifiers.alt == required_alt
        && modifiers.logo == required_logo
        && (!required_shift || modifiers.shift)
}

pub fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized.replace("spacebar", "space")
    }
}

/// Canonical lowercase key name: `" "` and `spacebar` become `space`,
/// `left`/`right` become `arrowleft`/`arrowright`.
pub fn normalize_key_name(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let lower = key.trim().to_lowercase();
    match lower.as_str() {
        "spacebar" | "space" => "space".to_string(),
        "left" | "arrowleft" => "arrowleft".to_string(),
        "right" | "arrowright" => "arrowright".to_string(),
        _ => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spacebar_alias() {
        assert_eq!(normalize_shortcut_token(" SpaceBar ", "x"), "space");
        assert_eq!(normalize_key_name(" "), "space");
        assert_eq!(normalize_key_name("Left"), "arrowleft");
        assert_eq!(normalize_key_name("ArrowRight"), "arrowright");
    }

    #[test]
    fn default_bindings_cover_reader_keys() {
        let bindings = KeyBindings::default();
        let focus = InputFocus::Reader;
        assert_eq!(
            bindings.resolve(&KeyInput::new(" "), focus),
            Some(ShortcutAction::TogglePlayPause)
        );
        assert_eq!(
            bindings.resolve(&KeyInput::new("ArrowLeft"), focus),
            Some(ShortcutAction::SkipBackward)
        );
        assert_eq!(
            bindings.resolve(&KeyInput::new("ArrowRight"), focus),
            Some(ShortcutAction::SkipForward)
        );
        assert_eq!(
            bindings.resolve(&KeyInput::new("r"), focus),
            Some(ShortcutAction::Restart)
        );
        assert_eq!(bindings.resolve(&KeyInput::new("x"), focus), None);
    }

    #[test]
    fn uppercase_restart_matches_with_shift() {
        let shifted = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.resolve(&KeyInput::with_modifiers("R", shifted), InputFocus::Reader),
            Some(ShortcutAction::Restart)
        );
    }

    #[test]
    fn text_field_focus_suppresses_shortcuts() {
        let bindings = KeyBindings::default();
        for key in [" ", "ArrowLeft", "ArrowRight", "r", "R"] {
            assert_eq!(
                bindings.resolve(&KeyInput::new(key), InputFocus::TextField),
                None,
                "key {key:?}"
            );
        }
    }

    #[test]
    fn custom_binding_requires_exact_modifiers() {
        let bindings = KeyBindings {
            restart: "ctrl+r".to_string(),
            ..KeyBindings::default()
        };
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert_eq!(
            bindings.resolve(&KeyInput::with_modifiers("r", ctrl), InputFocus::Reader),
            Some(ShortcutAction::Restart)
        );
        assert_eq!(bindings.resolve(&KeyInput::new("r"), InputFocus::Reader), None);
    }

    #[test]
    fn blank_binding_uses_default_key() {
        assert!(shortcut_matches("", "space", "space", Modifiers::default()));
        assert!(!shortcut_matches("", "space", "r", Modifiers::default()));
    }
}
