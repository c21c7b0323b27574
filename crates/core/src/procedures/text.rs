//! Text derivations for knowledge-base articles: slugs, previews, reading time.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("tag pattern is valid"));

const WORDS_PER_MINUTE: f64 = 200.0;
const PREVIEW_LEN: usize = 200;
const META_DESCRIPTION_LEN: usize = 157;
const FALLBACK_SLUG: &str = "procedure";

fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Lowercases `text`, folds common accents and collapses every run of
/// other characters into a single `-`.
///
/// # Examples
///
/// ```
/// use helpdesk_core::procedures::slugify;
///
/// assert_eq!(slugify("Réinitialiser le Wi-Fi !"), "reinitialiser-le-wi-fi");
/// assert_eq!(slugify("!!!"), "procedure");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_alphanumeric() {
            Some(c)
        } else {
            fold_accent(c)
        };
        match c {
            Some(c) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            }
            None => pending_dash = true,
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Appends `-1`, `-2`, … to `base` until `is_taken` returns false.
pub fn unique_slug(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Removes HTML tags.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Estimated reading time of HTML content, e.g. `"3 min"`.
///
/// Empty content reads `"0 min"`. Anything else reads at least one minute.
pub fn reading_time(content: &str) -> String {
    if content.is_empty() {
        return "0 min".to_string();
    }
    let words = strip_tags(content).split_whitespace().count();
    let minutes = (words as f64 / WORDS_PER_MINUTE).round_ties_even().max(1.0);
    format!("{} min", minutes as u64)
}

/// First 200 characters of the plain text, with `...` when truncated.
pub fn content_preview(content: &str) -> String {
    let text = strip_tags(content);
    if text.chars().count() > PREVIEW_LEN {
        let head: String = text.chars().take(PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        text
    }
}

/// Meta description derived from the description.
///
/// Returns `None` when the description is empty.
pub fn meta_description(description: &str) -> Option<String> {
    if description.is_empty() {
        return None;
    }
    let head: String = description.chars().take(META_DESCRIPTION_LEN).collect();
    Some(format!("{head}..."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Reset the Router"), "reset-the-router");
        assert_eq!(slugify("  --Sécurité  réseau-- "), "securite-reseau");
        assert_eq!(slugify("Windows 11: update"), "windows-11-update");
        assert_eq!(slugify(""), "procedure");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let taken = ["reset", "reset-1"];
        assert_eq!(unique_slug("reset", |s| taken.contains(&s)), "reset-2");
        assert_eq!(unique_slug("other", |s| taken.contains(&s)), "other");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time(""), "0 min");
        assert_eq!(reading_time("<p>one two three</p>"), "1 min");
        assert_eq!(reading_time(&"word ".repeat(600)), "3 min");
        // 500 / 200 = 2.5 rounds to even.
        assert_eq!(reading_time(&"word ".repeat(500)), "2 min");
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("<p>short</p>"), "short");
        let long = "a".repeat(250);
        let preview = content_preview(&long);
        assert_eq!(preview.len(), 203);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_meta_description() {
        assert_eq!(meta_description(""), None);
        assert_eq!(meta_description("Short").as_deref(), Some("Short..."));
        let long = "x".repeat(300);
        assert_eq!(meta_description(&long).map(|m| m.len()), Some(160));
    }
}
