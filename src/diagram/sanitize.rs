/// Characters that end or reinterpret a quoted Mermaid label.
const FORBIDDEN: &[char] = &['"', '\'', '`', '{', '}', '[', ']', '(', ')', '<', '>', '|', '#', ';'];

/// Makes free text safe to embed as a diagram label.
///
/// Line breaks and tabs become spaces, whitespace runs collapse, and the result is
/// trimmed, so applying it twice changes nothing.
pub fn sanitize_label(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitized label, or `fallback` when nothing printable is left.
pub fn label_or(text: &str, fallback: impl FnOnce() -> String) -> String {
    let label = sanitize_label(text);
    if label.is_empty() {
        fallback()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_braces_and_newlines() {
        let out = sanitize_label("Approve \"PO\"\n{urgent} it's [done]");
        assert_eq!(out, "Approve PO urgent its done");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        for input in [
            "",
            "   ",
            "a\r\n\tb",
            "\"'\"'",
            "Año fiscal: cierre | revisión #2; (final)",
            "x  \n  y",
        ] {
            let once = sanitize_label(input);
            assert_eq!(sanitize_label(&once), once, "input {input:?}");
            assert!(!once.contains('"'));
            assert!(!once.contains('\''));
            assert!(!once.contains('\n'));
        }
    }

    #[test]
    fn keeps_accents_and_colons() {
        assert_eq!(sanitize_label("Revisión: almacén"), "Revisión: almacén");
    }

    #[test]
    fn fallback_for_empty_label() {
        assert_eq!(label_or("\"\"", || "Step 3".to_string()), "Step 3");
        assert_eq!(label_or("Ship", || "Step 3".to_string()), "Ship");
    }
}
