//! Ballot extraction from model responses
//!
//! Models asked for `{"ranking": [...]}` return it wrapped in prose, code
//! fences, Python-dict syntax, or not at all. Extraction is a cascade of
//! increasingly forgiving parsers, each producing either a validated
//! permutation or a reason the attempt failed:
//!
//! | Stage | Accepts |
//! |-------|---------|
//! | strict | the whole response is a JSON object |
//! | balanced | the first balanced `{…}` substring parses as JSON |
//! | relaxed | same substring with single-quoted strings and trailing commas |
//!
//! These functions are pure text → structure logic; the retry loop around
//! them lives in the application layer.

use serde_json::Value;
use thiserror::Error;

use super::ranking::Ranking;

/// Why a response yielded no ballot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BallotParseError {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("JSON missing 'ranking' field")]
    MissingField,

    #[error("'ranking' field is not a list of integers")]
    NotIntegerList,

    #[error("invalid ranking indices: {0:?}")]
    InvalidIndices(Vec<i64>),
}

/// A successfully extracted ballot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBallot {
    pub ranking: Ranking,
    /// The prompt asks for one-based labels; some models answer zero-based
    /// anyway. Those ballots are accepted but flagged so the oracle can log
    /// the deviation.
    pub zero_based: bool,
}

/// Extract and validate a ballot for an election over `num_candidates`.
pub fn parse_ballot(text: &str, num_candidates: usize) -> Result<ParsedBallot, BallotParseError> {
    let value = extract_json_object(text).ok_or(BallotParseError::NoJson)?;
    let field = value.get("ranking").ok_or(BallotParseError::MissingField)?;
    let list = field.as_array().ok_or(BallotParseError::NotIntegerList)?;
    let labels = list
        .iter()
        .map(Value::as_i64)
        .collect::<Option<Vec<i64>>>()
        .ok_or(BallotParseError::NotIntegerList)?;

    if let Ok(ranking) = Ranking::from_one_based(&labels, num_candidates) {
        return Ok(ParsedBallot {
            ranking,
            zero_based: false,
        });
    }

    let as_zero_based = labels
        .iter()
        .map(|&label| usize::try_from(label).ok())
        .collect::<Option<Vec<usize>>>()
        .and_then(|order| Ranking::new(order, num_candidates).ok());
    match as_zero_based {
        Some(ranking) => Ok(ParsedBallot {
            ranking,
            zero_based: true,
        }),
        None => Err(BallotParseError::InvalidIndices(labels)),
    }
}

/// Run the extraction cascade, returning the first JSON object found.
fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let candidate = first_balanced_object(trimmed)?;
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    let relaxed = relax_to_json(candidate);
    match serde_json::from_str::<Value>(&relaxed) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Slice out the first balanced `{…}` block, tracking quoted strings so
/// braces inside string literals do not unbalance the scan.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_double || in_single => escaped = true,
            '"' if !in_single => in_double = !in_double,
            '\'' if !in_double => in_single = !in_single,
            '{' if !in_double && !in_single => depth += 1,
            '}' if !in_double && !in_single => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrite Python-literal syntax into JSON: single-quoted strings become
/// double-quoted and trailing commas are dropped. Everything else passes
/// through unchanged.
fn relax_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_double = false;
    let mut in_single = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_double || in_single => {
                match chars.next() {
                    // An escaped quote inside a single-quoted string needs
                    // no escape once the string is double-quoted
                    Some('\'') if in_single => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                }
            }
            '"' if in_single => out.push_str("\\\""),
            '"' => {
                in_double = !in_double;
                out.push('"');
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push('"');
            }
            ',' if !in_double && !in_single => {
                let mut lookahead = chars.clone();
                let closes_container = loop {
                    match lookahead.next() {
                        Some(n) if n.is_whitespace() => continue,
                        Some('}') | Some(']') => break true,
                        _ => break false,
                    }
                };
                if !closes_container {
                    out.push(',');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_whole_response() {
        let parsed = parse_ballot(r#"{"ranking": [2, 1, 3]}"#, 3).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[1, 0, 2]);
        assert!(!parsed.zero_based);
    }

    #[test]
    fn json_embedded_in_prose() {
        let text = "Here is the ranking you asked for: {\"ranking\": [1, 3, 2]} — hope that helps!";
        let parsed = parse_ballot(text, 3).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[0, 2, 1]);
    }

    #[test]
    fn json_in_code_fence() {
        let text = "```json\n{\"ranking\": [3, 1, 2]}\n```";
        let parsed = parse_ballot(text, 3).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[2, 0, 1]);
    }

    #[test]
    fn python_dict_single_quotes() {
        let parsed = parse_ballot("{'ranking': [2, 1]}", 2).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[1, 0]);
    }

    #[test]
    fn trailing_comma_tolerated() {
        let parsed = parse_ballot(r#"{"ranking": [1, 2, 3,], }"#, 3).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn nested_braces_stay_balanced() {
        let text = r#"{"meta": {"note": "a"}, "ranking": [2, 1]}"#;
        let parsed = parse_ballot(text, 2).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[1, 0]);
    }

    #[test]
    fn zero_based_ballot_accepted_and_flagged() {
        let parsed = parse_ballot(r#"{"ranking": [0, 2, 1]}"#, 3).unwrap();
        assert!(parsed.zero_based);
        assert_eq!(parsed.ranking.as_slice(), &[0, 2, 1]);
    }

    #[test]
    fn missing_field() {
        assert_eq!(
            parse_ballot(r#"{"order": [1, 2]}"#, 2),
            Err(BallotParseError::MissingField)
        );
    }

    #[test]
    fn field_not_a_list_of_integers() {
        assert_eq!(
            parse_ballot(r#"{"ranking": "1, 2"}"#, 2),
            Err(BallotParseError::NotIntegerList)
        );
        assert_eq!(
            parse_ballot(r#"{"ranking": ["first", "second"]}"#, 2),
            Err(BallotParseError::NotIntegerList)
        );
    }

    #[test]
    fn wrong_length_and_duplicates_rejected() {
        assert!(matches!(
            parse_ballot(r#"{"ranking": [1, 2]}"#, 3),
            Err(BallotParseError::InvalidIndices(_))
        ));
        assert!(matches!(
            parse_ballot(r#"{"ranking": [1, 1, 2]}"#, 3),
            Err(BallotParseError::InvalidIndices(_))
        ));
    }

    #[test]
    fn no_json_at_all() {
        assert_eq!(
            parse_ballot("I would rank them 1, then 2, then 3.", 3),
            Err(BallotParseError::NoJson)
        );
    }

    #[test]
    fn balanced_scan_ignores_braces_in_strings() {
        let text = r#"{"note": "weird } brace", "ranking": [1, 2]}"#;
        let parsed = parse_ballot(text, 2).unwrap();
        assert_eq!(parsed.ranking.as_slice(), &[0, 1]);
    }
}
