//! Helper utilities for MusicXML export
//!
//! Logging macro, number formatting and GCD/LCM used across the MusicXML module.

/// Log a message for MusicXML export
pub fn log_musicxml(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::log_1(&format!("[MusicXML] {}", message).into());
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        log::debug!("[MusicXML] {}", message);
    }
}

/// Logging macro for MusicXML export
#[macro_export]
macro_rules! musicxml_log {
    ($($arg:tt)*) => {
        $crate::renderers::musicxml::helpers::log_musicxml(&format!($($arg)*));
    };
}

/// Format a number with at most two decimals and no trailing zeros
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Calculate least common multiple
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}

/// Calculate greatest common divisor
pub fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Escape special XML characters
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
