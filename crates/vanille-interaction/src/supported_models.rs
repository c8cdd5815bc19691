//! Model ids offered for selection and system-message weight presets.
//!
//! | Model ID | Notes |
//! |----------|-------|
//! | `gpt-3.5-turbo-1106` | Default for new sessions |
//! | `gpt-3.5-turbo` | |
//! | `gpt-3.5-turbo-16k` | Long context |
//! | `gpt-3.5-turbo-16k-0613` | Long context, pinned |
//! | `gpt-4-1106-preview` | |
//! | `gpt-4` | |
//! | `gpt-4-32k` | Long context |
//! | `gpt-4-32k-0613` | Long context, pinned |
//! | `gpt-4-gizmo-g-3w1rEXGE0` | Proxy-specific |
//! | `gpt-4-all` | Proxy-specific |
//!
//! Any other id is still accepted by the client; this list only drives
//! completion and validation hints in the front end.

pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-3.5-turbo-1106",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-16k",
    "gpt-3.5-turbo-16k-0613",
    "gpt-4-1106-preview",
    "gpt-4",
    "gpt-4-32k",
    "gpt-4-32k-0613",
    "gpt-4-gizmo-g-3w1rEXGE0",
    "gpt-4-all",
];

/// Inclusion probabilities offered when adding a system message.
pub const SYSTEM_MESSAGE_PROBABILITIES: &[f64] = &[0.1, 0.3, 0.5, 0.7, 1.0];

pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_listed() {
        assert!(is_supported_model(vanille_core::session::DEFAULT_MODEL));
        assert!(!is_supported_model("gpt-2"));
    }

    #[test]
    fn presets_are_valid_probabilities() {
        assert!(
            SYSTEM_MESSAGE_PROBABILITIES
                .iter()
                .all(|p| (0.0..=1.0).contains(p))
        );
    }
}
