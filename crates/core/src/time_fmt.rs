// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact human-readable durations for listings.

/// Format elapsed seconds as `5s`, `2m`, `1h`, `3d`.
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

/// Format the age of an epoch-ms timestamp relative to `now_ms`.
///
/// Zero timestamps render as `-`.
pub fn format_age_ms(then_ms: u64, now_ms: u64) -> String {
    if then_ms == 0 {
        return "-".to_string();
    }
    format_elapsed(now_ms.saturating_sub(then_ms) / 1000)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
