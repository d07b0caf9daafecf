//! Internationalization (i18n) support for hostrota
//!
//! CLI messages, notifications, error descriptions and export labels are
//! translated through `rust-i18n`. Supported languages: English (en) and
//! Korean (ko).
//!
//! # Environment Variables
//!
//! - `HOSTROTA_LANG`: Set the preferred language (en, ko). Defaults to English.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostrota::i18n::{t, set_locale};
//!
//! set_locale("ko");
//! let msg = t!("cli.aborted");
//!
//! // Exports pass the locale explicitly
//! let header = t!("export.header.name", locale = "en");
//! ```

use std::sync::RwLock;

// Note: rust_i18n::i18n! macro is declared in lib.rs (crate root)

static CURRENT_LOCALE: RwLock<Option<String>> = RwLock::new(None);

/// Languages with a locale file
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "ko"];

/// Set the current locale for translations
pub fn set_locale(locale: &str) {
    let normalized = normalize_locale(locale);
    rust_i18n::set_locale(&normalized);
    *CURRENT_LOCALE.write().unwrap() = Some(normalized);
}

/// Get the current locale
///
/// Returns the currently active locale or the default fallback.
pub fn current_locale() -> String {
    CURRENT_LOCALE
        .read()
        .unwrap()
        .clone()
        .unwrap_or_else(|| "en".to_string())
}

/// Initialize i18n from environment variables
///
/// Reads `HOSTROTA_LANG`, falling back to English if not set.
pub fn init_from_env() {
    let locale = std::env::var("HOSTROTA_LANG").unwrap_or_else(|_| "en".to_string());
    set_locale(&locale);
}

/// Normalize locale code to supported format
///
/// - ko-KR, ko_KR, korean -> ko
/// - everything else -> en
pub fn normalize_locale(locale: &str) -> String {
    let lower = locale.trim().to_lowercase();

    if lower.starts_with("ko") || lower == "korean" {
        "ko".to_string()
    } else {
        "en".to_string()
    }
}

/// Translate a key with optional parameters
///
/// This is a re-export of rust_i18n::t! for convenience.
#[doc(inline)]
pub use rust_i18n::t;
