//! Shell-style tokenizer for the issue query language.

/// Split a query into whitespace-separated tokens.
///
/// Double quotes group whitespace into a single token and are stripped.
/// Single quotes are accepted as a substitute for double quotes, so the two
/// pair with each other. An unterminated quote runs to the end of input.
/// Empty tokens are never produced.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in query.chars() {
        match ch {
            '"' | '\'' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_tokens() {
        assert_eq!(tokenize("is:open  sort:error"), vec!["is:open", "sort:error"]);
    }

    #[test]
    fn test_empty_and_blank_queries() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }

    #[test]
    fn test_double_quotes_group_whitespace() {
        assert_eq!(
            tokenize(r#"is:open "author:12 34" x"#),
            vec!["is:open", "author:12 34", "x"]
        );
    }

    #[test]
    fn test_single_quotes_substitute_for_double() {
        assert_eq!(tokenize("sort:'created_at-asc'"), vec!["sort:created_at-asc"]);
        assert_eq!(tokenize(r#"a:'b c" d"#), vec!["a:b c", "d"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#"is:open "from:@me sort:error"#), vec![
            "is:open",
            "from:@me sort:error"
        ]);
    }
}
