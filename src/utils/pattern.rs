//! Output file name templating.
//!
//! Supported tokens: `{name}`, `{index}`, `{format}`, `{original_format}`,
//! `{date}`, `{time}` and `{timestamp}`. Each token is replaced once, at its
//! first occurrence. `{date}`, `{time}` and `{timestamp}` read the injected
//! [`Clock`], so tests pin them with [`FixedClock`].

use chrono::{DateTime, Local};
use crate::utils::formats::{extension_of, stem_of};

/// Source of wall-clock time for date/time tokens.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Expands `pattern` for the file at zero-based `index`.
///
/// The result carries no extension; see [`output_file_name`].
pub fn apply_pattern(pattern: &str, original_name: &str, index: usize, clock: &dyn Clock) -> String {
    let original_ext = extension_of(original_name);
    let now = clock.now();

    let mut out = pattern.to_string();
    replace_first(&mut out, "{name}", stem_of(original_name));
    replace_first(&mut out, "{index}", &format!("{:03}", index + 1));
    replace_first(&mut out, "{format}", &original_ext);
    replace_first(&mut out, "{original_format}", &original_ext);
    replace_first(&mut out, "{date}", &now.format("%Y-%m-%d").to_string());
    replace_first(&mut out, "{time}", &now.format("%H-%M-%S").to_string());
    replace_first(&mut out, "{timestamp}", &now.timestamp_millis().to_string());
    out
}

/// Expands `pattern` and appends `.extension`.
///
/// An empty expansion falls back to the original stem so the output never
/// ends up as a bare extension.
pub fn output_file_name(
    pattern: &str,
    original_name: &str,
    index: usize,
    extension: &str,
    clock: &dyn Clock,
) -> String {
    let base = apply_pattern(pattern, original_name, index, clock);
    let base = if base.trim().is_empty() { stem_of(original_name).to_string() } else { base };
    format!("{base}.{extension}")
}

fn replace_first(haystack: &mut String, token: &str, value: &str) {
    if let Some(pos) = haystack.find(token) {
        haystack.replace_range(pos..pos + token.len(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap())
    }

    #[test]
    fn name_index_and_date() {
        let out = output_file_name("{name}_{index}_{date}", "vacation.png", 4, "png", &clock());
        assert_eq!(out, "vacation_005_2024-03-09.png");
    }

    #[test]
    fn time_and_timestamp_tokens() {
        let c = clock();
        let out = apply_pattern("{time}-{timestamp}", "a.jpg", 0, &c);
        assert_eq!(out, format!("14-05-07-{}", c.0.timestamp_millis()));
    }

    #[test]
    fn formats_are_lowercased_extension() {
        let out = apply_pattern("{name}.{format}.{original_format}", "Shot.PNG", 0, &clock());
        assert_eq!(out, "Shot.png.png");
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let out = apply_pattern("{name}-{name}", "cat.gif", 0, &clock());
        assert_eq!(out, "cat-{name}");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let out = apply_pattern("{name}_{camera}", "img.jpg", 9, &clock());
        assert_eq!(out, "img_{camera}");
    }

    #[test]
    fn expansion_without_tokens_is_stable() {
        let once = apply_pattern("{name}_{index}", "clip.mov", 11, &clock());
        let twice = apply_pattern(&once, "clip.mov", 11, &clock());
        assert_eq!(once, "clip_012");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_pattern_falls_back_to_stem() {
        assert_eq!(output_file_name("", "photo.jpg", 0, "webp", &clock()), "photo.webp");
    }
}
