/// Tag prepended to every reply produced by the agent.
pub const TAG: &str = "[nanda-go] ";

const SUBSTITUTIONS: [(&str, &str); 3] = [
    ("hello", "greetings"),
    ("Hello", "Greetings"),
    ("goodbye", "farewell"),
];

/// Rewrite a message using the fixed substitution table and tag the result.
///
/// Matching is case-sensitive and substring-based; each pass runs over the
/// output of the previous one.
pub fn transform(input: &str) -> String {
    let body = SUBSTITUTIONS
        .iter()
        .fold(input.to_string(), |acc, (from, to)| acc.replace(from, to));
    tagged(&body)
}

pub(crate) fn tagged(body: &str) -> String {
    let mut out = String::with_capacity(TAG.len() + body.len());
    out.push_str(TAG);
    out.push_str(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence_in_order() {
        assert_eq!(
            transform("hello there, Hello again, goodbye and goodbye"),
            "[nanda-go] greetings there, Greetings again, farewell and farewell"
        );
    }

    #[test]
    fn matching_is_substring_based_and_case_sensitive() {
        assert_eq!(transform("HelloWorld"), "[nanda-go] GreetingsWorld");
        assert_eq!(transform("shell"), "[nanda-go] shell");
        assert_eq!(transform("HELLO Goodbye"), "[nanda-go] HELLO Goodbye");
        assert_eq!(transform("othello"), "[nanda-go] otgreetings");
    }

    #[test]
    fn empty_input_yields_bare_tag() {
        assert_eq!(transform(""), TAG);
    }

    #[test]
    fn output_never_contains_searched_literals() {
        for input in ["hellohello", "Hellogoodbyehello", "say goodbye, Hello!"] {
            let out = transform(input);
            assert!(out.starts_with(TAG));
            let body = &out[TAG.len()..];
            for needle in ["hello", "Hello", "goodbye"] {
                assert!(!body.contains(needle), "{needle} left in {out:?}");
            }
        }
    }
}
