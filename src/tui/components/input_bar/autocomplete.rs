//! Completion candidates for the word under the cursor.

/// Query operators offered after a `$`.
pub const OPERATORS: &[&str] = &[
    "$and", "$eq", "$exists", "$gt", "$gte", "$in", "$lt", "$lte", "$ne", "$nin", "$or",
];

pub const OBJECT_ID: &str = "ObjectId(\"\")";

fn is_word_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '{' | '}' | '[' | ']' | ',' | ':' | '"' | '\''))
}

/// Byte offset where the word ending at `cursor` starts.
pub fn word_start(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(cursor)
}

/// Candidates for the word ending at `cursor`: operators for `$…`,
/// `ObjectId("")` for a prefix of it, then matching document keys.
pub fn suggest(text: &str, cursor: usize, doc_keys: &[String]) -> Vec<String> {
    let word = &text[word_start(text, cursor)..cursor];
    if word.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<&str> = Vec::new();
    if word.starts_with('$') {
        for op in OPERATORS {
            candidates.push(op);
        }
    }
    if word.starts_with('O') {
        candidates.push(OBJECT_ID);
    }
    for key in doc_keys {
        candidates.push(key);
    }

    let mut out: Vec<String> = Vec::new();
    for candidate in candidates {
        if candidate.starts_with(word) && candidate != word && !out.iter().any(|c| c == candidate)
        {
            out.push(candidate.to_string());
        }
    }
    out
}

/// Replace the word ending at `cursor` with `suggestion`. Returns the new
/// text and cursor. The cursor lands between the quotes of `ObjectId("")`.
pub fn apply(text: &str, cursor: usize, suggestion: &str) -> (String, usize) {
    let start = word_start(text, cursor);
    let mut out = String::with_capacity(text.len() + suggestion.len());
    out.push_str(&text[..start]);
    out.push_str(suggestion);
    let mut new_cursor = out.len();
    if suggestion == OBJECT_ID {
        new_cursor -= 2;
    }
    out.push_str(&text[cursor..]);
    (out, new_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        vec!["name".to_string(), "number".to_string(), "_id".to_string()]
    }

    #[test]
    fn test_word_stops_at_json_punctuation() {
        let text = r#"{"na"#;
        assert_eq!(&text[word_start(text, text.len())..], "na");
        assert_eq!(word_start("", 0), 0);
    }

    #[test]
    fn test_operator_suggestions() {
        let text = r#"{"age": {"$g"#;
        assert_eq!(suggest(text, text.len(), &keys()), vec!["$gt", "$gte"]);
    }

    #[test]
    fn test_document_key_suggestions_skip_exact_match() {
        assert_eq!(suggest("n", 1, &keys()), vec!["name", "number"]);
        assert!(suggest("name", 4, &keys()).is_empty());
        assert!(suggest("{ ", 2, &keys()).is_empty());
    }

    #[test]
    fn test_object_id_suggestion_places_cursor_inside_quotes() {
        let text = r#"{"_id": Obj"#;
        let suggestions = suggest(text, text.len(), &keys());
        assert_eq!(suggestions, vec![OBJECT_ID]);

        let (out, cursor) = apply(text, text.len(), OBJECT_ID);
        assert_eq!(out, r#"{"_id": ObjectId("")"#);
        assert_eq!(&out[cursor..], "\")");
    }

    #[test]
    fn test_apply_keeps_text_after_cursor() {
        let (out, cursor) = apply(r#"{"na": 1}"#, 4, "name");
        assert_eq!(out, r#"{"name": 1}"#);
        assert_eq!(cursor, 6);
    }
}
