//! Domain error taxonomy.
//!
//! Transport code returns `Result<T, String>`; these types classify what a
//! front-end must do with a failure.

use thiserror::Error;

use crate::i18n::Language;

/// Why a handle was rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("handle is empty")]
    Empty,
    #[error("handle must start with '@'")]
    MissingSigil,
    /// Only ASCII letters, digits, `_` and single `.` separators are allowed.
    #[error("handle contains characters a username cannot have")]
    InvalidCharacters,
}

impl HandleError {
    /// The message shown in the error view.
    pub fn localized(self, lang: Language) -> &'static str {
        let labels = lang.labels();
        match self {
            HandleError::Empty => labels.empty_handle,
            HandleError::MissingSigil => labels.syntax_error,
            HandleError::InvalidCharacters => labels.invalid_handle,
        }
    }
}

#[derive(Debug, Error)]
pub enum TraceError {
    /// Malformed handle; the user corrects it and resubmits.
    #[error("invalid handle: {0}")]
    InvalidHandle(#[from] HandleError),
    /// The generation call itself failed; terminal until reset.
    #[error("generation failed: {0}")]
    Generation(String),
    /// A chat turn failed; recovered as an inline message.
    #[error("chat failed: {0}")]
    Chat(String),
    /// A chat message was empty after trimming; nothing was sent.
    #[error("empty chat message")]
    EmptyMessage,
    /// A lookup was requested before the disclaimer was accepted.
    #[error("disclaimer not accepted")]
    DisclaimerPending,
}

impl TraceError {
    /// The message a front-end shows for this error.
    pub fn localized(&self, lang: Language) -> &'static str {
        let labels = lang.labels();
        match self {
            TraceError::InvalidHandle(e) => e.localized(lang),
            TraceError::Generation(_) => labels.connection_terminated,
            TraceError::Chat(_) => labels.chat_network_error,
            TraceError::EmptyMessage => labels.empty_message,
            TraceError::DisclaimerPending => labels.disclaimer_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_error_converts() {
        let err: TraceError = HandleError::MissingSigil.into();
        assert!(matches!(err, TraceError::InvalidHandle(HandleError::MissingSigil)));
        assert_eq!(
            err.localized(Language::En),
            "SYNTAX ERROR: HANDLE MUST START WITH '@'"
        );
    }

    #[test]
    fn invalid_characters_have_their_own_label() {
        let err = TraceError::from(HandleError::InvalidCharacters);
        assert_eq!(
            err.localized(Language::En),
            "SYNTAX ERROR: ILLEGAL CHARACTERS IN HANDLE"
        );
        assert_ne!(
            err.localized(Language::Ru),
            err.localized(Language::En)
        );
    }

    #[test]
    fn generation_error_hides_details() {
        let err = TraceError::Generation("OpenRouter API HTTP 500: boom".into());
        assert!(err.to_string().contains("HTTP 500"));
        assert!(!err.localized(Language::En).contains("500"));
    }
}
