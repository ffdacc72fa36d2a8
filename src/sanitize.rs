//! Filename stem normalization.
//!
//! Produces stems that are safe on every common filesystem and inside URLs:
//! lowercase ASCII letters, digits and a single delimiter character.
//!
//! Characters allowed unescaped in a URL path (RFC 3986) include `$-_.+` as
//! well; of those only the delimiter is kept, and dots are always folded to `_`
//! so the stem never looks like it carries a second extension.

/// Delimiter used when none is configured.
pub const DEFAULT_DELIMITER: char = '_';

/// Normalizes a filename stem into a lowercase, delimiter-separated, URL-safe stem.
///
/// Steps are applied in this order:
///
/// 1. spaces become `delimiter`
/// 2. ASCII lowercase
/// 3. `.` becomes `_` (regardless of `delimiter`)
/// 4. everything except `[a-z0-9]` and `delimiter` is dropped
/// 5. runs of `delimiter` collapse to one
///
/// # Examples
///
/// ```
/// use xplat::sanitize;
///
/// assert_eq!(sanitize("Hello World.test", '_'), "hello_world_test");
/// assert_eq!(sanitize("Hello World", '-'), "hello-world");
/// ```
#[must_use]
pub fn sanitize(stem: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(stem.len());

    for ch in stem.chars() {
        let ch = if ch == ' ' { delimiter } else { ch };
        let ch = match ch.to_ascii_lowercase() {
            '.' => '_',
            other => other,
        };

        let keep = ch == delimiter || ch.is_ascii_lowercase() || ch.is_ascii_digit();
        if !keep {
            continue;
        }

        if ch == delimiter && out.ends_with(delimiter) {
            continue;
        }
        out.push(ch);
    }

    out
}

/// Returns true if `stem` is already in sanitized form for `delimiter`.
#[must_use]
pub fn is_sanitized(stem: &str, delimiter: char) -> bool {
    sanitize(stem, delimiter) == stem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_transformation() {
        assert_eq!(sanitize("Hello World.test", '_'), "hello_world_test");
    }

    #[test]
    fn test_dots_collapse() {
        assert_eq!(
            sanitize("This..Has...Lots.Of..Dots", '_'),
            "this_has_lots_of_dots"
        );
    }

    #[test]
    fn test_delimiter_runs_collapse() {
        assert_eq!(sanitize("Too__Many___Delims", '_'), "too_many_delims");
    }

    #[test]
    fn test_custom_delimiter() {
        assert_eq!(sanitize("Hello World", '-'), "hello-world");
        // underscores from dots are neither alphanumeric nor the delimiter
        assert_eq!(sanitize("Report.Final Draft", '-'), "reportfinal-draft");
    }

    #[test]
    fn test_special_characters_stripped() {
        assert_eq!(sanitize("file#special!", '_'), "filespecial");
        assert_eq!(sanitize("file#with#special#chars!", '_'), "filewithspecialchars");
        assert_eq!(sanitize("Space to Delim.test.FILE", '_'), "space_to_delim_test_file");
    }

    #[test]
    fn test_empty_and_symbol_only_stems() {
        assert_eq!(sanitize("", '_'), "");
        assert_eq!(sanitize("#!@$%", '_'), "");
        assert_eq!(sanitize("   ", '_'), "_");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(sanitize("Café Menu", '_'), "caf_menu");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Hello World.test",
            "This..Has...Lots.Of..Dots",
            "  leading and trailing  ",
            "MiXeD-CaSe_with-Dashes",
            "a . b . c",
            "Ünïcödé Nämé",
            "",
        ];
        for delimiter in ['_', '-'] {
            for sample in samples {
                let once = sanitize(sample, delimiter);
                assert_eq!(sanitize(&once, delimiter), once, "sample: {sample:?}");
                assert!(is_sanitized(&once, delimiter));
            }
        }
    }

    #[test]
    fn test_output_alphabet() {
        let samples = ["A  B", "x..y", "__a__", "1 2 3", "tab\tseparated", "a--b"];
        for delimiter in ['_', '-'] {
            for sample in samples {
                let out = sanitize(sample, delimiter);
                assert!(
                    out.chars()
                        .all(|c| c == delimiter || c.is_ascii_lowercase() || c.is_ascii_digit()),
                    "unexpected character in {out:?}"
                );
                let doubled: String = [delimiter, delimiter].iter().collect();
                assert!(!out.contains(&doubled), "repeated delimiter in {out:?}");
            }
        }
    }
}
