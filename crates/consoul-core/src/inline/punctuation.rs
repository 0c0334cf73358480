//! Typographic punctuation and email obfuscation

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static EM_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"--").unwrap());

/// A single quote opening a quotation: at the start or after space/opening punctuation
static OPENING_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|[-\x{2014}/(\[{"\s])'"#).unwrap());

static OPENING_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|[-\x{2014}/(\[{\x{2018}\s])""#).unwrap());

static ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3}").unwrap());

/// Convert ASCII dashes, quotes and ellipses to their typographic forms
pub fn smartypants(text: &str) -> String {
    let text = EM_DASH.replace_all(text, "\u{2014}");
    let text = OPENING_SINGLE.replace_all(&text, "${1}\u{2018}");
    let text = text.replace('\'', "\u{2019}");
    let text = OPENING_DOUBLE.replace_all(&text, "${1}\u{201c}");
    let text = text.replace('"', "\u{201d}");
    ELLIPSIS.replace_all(&text, "\u{2026}").into_owned()
}

/// Encode every character as a decimal or hex character reference, picked at random
pub fn mangle(text: &str) -> String {
    mangle_with(text, &mut rand::thread_rng())
}

pub fn mangle_with<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    text.chars()
        .map(|ch| {
            let code = u32::from(ch);
            if rng.gen_bool(0.5) {
                format!("&#x{code:x};")
            } else {
                format!("&#{code};")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn decode(mangled: &str) -> String {
        mangled
            .split_terminator(';')
            .map(|entity| {
                let entity = entity.strip_prefix("&#").unwrap();
                let code = match entity.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).unwrap(),
                    None => entity.parse().unwrap(),
                };
                char::from_u32(code).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_dashes_and_ellipsis() {
        assert_eq!(smartypants("a -- b..."), "a \u{2014} b\u{2026}");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(smartypants("'hi'"), "\u{2018}hi\u{2019}");
        assert_eq!(smartypants("it's"), "it\u{2019}s");
        assert_eq!(smartypants("say \"hi\""), "say \u{201c}hi\u{201d}");
        assert_eq!(smartypants("(\"x\")"), "(\u{201c}x\u{201d})");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(smartypants("nothing to see"), "nothing to see");
    }

    #[test]
    fn test_mangle_decodes_back() {
        let mut rng = StdRng::seed_from_u64(7);
        let mangled = mangle_with("me@example.com", &mut rng);
        assert!(!mangled.contains('@'));
        assert_eq!(decode(&mangled), "me@example.com");
    }

    #[test]
    fn test_mangle_uses_both_forms() {
        let mut rng = StdRng::seed_from_u64(1);
        let mangled = mangle_with(&"a".repeat(64), &mut rng);
        assert!(mangled.contains("&#x61;"));
        assert!(mangled.contains("&#97;"));
    }
}
