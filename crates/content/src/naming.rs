use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

const UNTITLED: &str = "untitled";

/// Lowercase, hyphen-separated form of `text`. Runs of anything that is not
/// a letter or digit collapse to a single hyphen and the ends are trimmed.
///
/// Applying it to its own output returns the same string.
pub fn slugify(text: &str) -> String {
    let slug = slug::slugify(text);
    if slug.is_empty() {
        UNTITLED.to_string()
    } else {
        slug
    }
}

/// Upload names keep their extension and characters, with whitespace
/// replaced by hyphens and everything lowercased.
pub fn sanitize_media_name(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned
    }
}

/// Human title from a filename: `my-best-cake.md` becomes `My Best Cake`.
pub fn display_title(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    stem.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Millisecond timestamps that never repeat within a process.
///
/// Each stamp is the current wall-clock millisecond, bumped past the
/// previous stamp when the clock has not advanced.
#[derive(Debug, Default)]
pub struct StampSource {
    last: AtomicI64,
}

impl StampSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(previous) | Err(previous) => now.max(previous + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Best Cake!"), "my-best-cake");
        assert_eq!(slugify("  --Nelson   Mandela--  "), "nelson-mandela");
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in ["My Best Cake!", "a__b  c", "Ünïcödé Tïtle", "already-slugged", "x"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_sanitize_media_name() {
        assert_eq!(sanitize_media_name("My Cake  Photo.JPG"), "my-cake-photo.jpg");
        assert_eq!(sanitize_media_name("C:\\Users\\amna\\clip one.mp4"), "clip-one.mp4");
        assert_eq!(sanitize_media_name("   "), "untitled");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("my-best-cake.md"), "My Best Cake");
        assert_eq!(display_title("about.md"), "About");
        assert_eq!(display_title("no-extension"), "No Extension");
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let stamps = StampSource::new();
        let mut previous = stamps.next();
        for _ in 0..1000 {
            let next = stamps.next();
            assert!(next > previous);
            previous = next;
        }
    }
}
