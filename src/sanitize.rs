//! Markup stripping for rich-text fields.
//!
//! Index documents never store markup; every rich-text field passes
//! through [`strip_markup`] before it reaches the engine.

/// Remove all angle-bracket-delimited tags from the input.
///
/// This is a blunt `<...>` removal, not an HTML parser: each `<` and the
/// shortest span up to the next `>` is dropped; a `<` with no closing `>`
/// is kept verbatim. Bracket characters inside text content may therefore
/// be partially stripped — accepted behavior, not a defect.
///
/// Never fails and is idempotent: the output contains no removable span,
/// so a second pass is the identity.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                // Unclosed bracket: not a tag, keep the tail as-is
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_markup("<b>hi</b> <i>there</i>"), "hi there");
        assert_eq!(strip_markup("<p>desc</p>"), "desc");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_no_markup_passthrough() {
        assert_eq!(strip_markup("plain text"), "plain text");
    }

    #[test]
    fn test_unclosed_bracket_kept() {
        assert_eq!(strip_markup("a < b"), "a < b");
    }

    #[test]
    fn test_attributes_removed() {
        assert_eq!(
            strip_markup(r#"<a href="https://example.com">link</a>"#),
            "link"
        );
    }

    #[test]
    fn test_idempotence() {
        let cases = [
            "",
            "plain",
            "<b>hi</b> <i>there</i>",
            "a < b",
            "<<b>>",
            "5 > 3 and <em>more</em>",
        ];
        for case in cases {
            let once = strip_markup(case);
            assert_eq!(strip_markup(&once), once, "not idempotent for {case:?}");
        }
    }
}
