//! Text → filesystem-safe path segment

use std::collections::HashSet;

/// Characters no supported filesystem accepts in a path segment
const ILLEGAL: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Name used when nothing printable is left
pub const UNTITLED: &str = "untitled";

/// Keep segments well under the usual 255-byte limit, leaving room for
/// ".md" and a collision suffix
const MAX_SEGMENT_BYTES: usize = 200;

/// Map arbitrary text to a single path segment
///
/// Illegal and control characters become `_` and surrounding whitespace and
/// trailing dots are trimmed. A leading dot becomes `_`, so node text can
/// never produce `.git` or `.keep`. Windows device names (`CON`, `nul.txt`,
/// `LPT1`) get a `_` prefix, and an empty result is `"untitled"`. The mapping
/// is deterministic and idempotent.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut segment = replaced.trim_start().to_string();
    if segment.starts_with('.') {
        segment.replace_range(..1, "_");
    }

    if segment.len() > MAX_SEGMENT_BYTES {
        let mut cut = MAX_SEGMENT_BYTES;
        while !segment.is_char_boundary(cut) {
            cut -= 1;
        }
        segment.truncate(cut);
    }

    let segment = segment.trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    if segment.is_empty() {
        UNTITLED.to_string()
    } else if is_windows_device_name(segment.split('.').next().unwrap_or(segment)) {
        format!("_{}", segment)
    } else {
        segment.to_string()
    }
}

fn is_windows_device_name(base: &str) -> bool {
    let base = base.trim_end().to_ascii_uppercase();
    match base.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        _ => base
            .strip_prefix("COM")
            .or_else(|| base.strip_prefix("LPT"))
            .is_some_and(|n| n.len() == 1 && matches!(n.as_bytes()[0], b'1'..=b'9')),
    }
}

/// Hands out names that are unique within one directory
///
/// The first claimant keeps the plain name; later ones get ` (2)`, ` (3)`,
/// and so on. Comparison ignores case so the layout also survives
/// case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    /// Start with `names` already taken
    pub fn reserving(names: &[&str]) -> Self {
        Self {
            taken: names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Reserve `stem + ext`, suffixing the stem until it is free
    pub fn claim(&mut self, stem: &str, ext: &str) -> String {
        let first = format!("{}{}", stem, ext);
        if self.taken.insert(first.to_lowercase()) {
            return first;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{} ({}){}", stem, n, ext);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_characters() {
        assert_eq!(sanitize("a/b:c"), "a_b_c");
        assert_eq!(sanitize("a_b_c"), "a_b_c");
        assert_eq!(sanitize("what?*<>|\"\\"), "what_______");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(sanitize(""), UNTITLED);
        assert_eq!(sanitize("   "), UNTITLED);
        assert_eq!(sanitize("."), "_");
        assert_eq!(sanitize(".."), "_");
    }

    #[test]
    fn test_trims() {
        assert_eq!(sanitize("  Topic 1  "), "Topic 1");
        assert_eq!(sanitize("Ends with dots..."), "Ends with dots");
        assert_eq!(sanitize("tab\there"), "tab_here");
    }

    #[test]
    fn test_hidden_names_neutralized() {
        assert_eq!(sanitize(".git"), "_git");
        assert_eq!(sanitize(".keep"), "_keep");
    }

    #[test]
    fn test_windows_device_names() {
        assert_eq!(sanitize("CON"), "_CON");
        assert_eq!(sanitize("nul.txt"), "_nul.txt");
        assert_eq!(sanitize("Com1"), "_Com1");
        assert_eq!(sanitize("LPT9"), "_LPT9");
        assert_eq!(sanitize("COM0"), "COM0");
        assert_eq!(sanitize("CONSOLE"), "CONSOLE");
        assert_eq!(sanitize("aux "), "_aux");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "a/b:c",
            "  . x . ",
            ".hidden",
            "Card A",
            "日本語/テキスト",
            "trailing . .",
            "CON",
            "prn.md",
            &"x".repeat(300),
            &"é".repeat(150),
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_long_names_truncated_on_char_boundary() {
        let long = "é".repeat(150);
        let out = sanitize(&long);
        assert!(out.len() <= MAX_SEGMENT_BYTES);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_unique_names() {
        let mut names = UniqueNames::default();
        assert_eq!(names.claim("Topic", ""), "Topic");
        assert_eq!(names.claim("topic", ""), "topic (2)");
        assert_eq!(names.claim("Topic", ""), "Topic (3)");
        assert_eq!(names.claim("Card", ".md"), "Card.md");
        assert_eq!(names.claim("Card", ".md"), "Card (2).md");
    }

    #[test]
    fn test_reserved_names_never_handed_out() {
        let mut names = UniqueNames::reserving(&["README.md", ".keep"]);
        assert_eq!(names.claim("readme", ".md"), "readme (2).md");
        assert_eq!(names.claim("README.md", ""), "README.md (2)");
    }
}
