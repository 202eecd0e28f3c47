//! Glob matching for pattern-based key deletion.
//!
//! Supports `*` (any run of characters, including none) and `?` (exactly one
//! character). Every other character matches itself.

/// Returns true if `key` matches the glob `pattern`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    // Position of the last `*` seen and the key index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
            }
            Some(&c) if c == '?' || c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    k = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Returns true if the pattern contains no wildcards.
pub fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        assert!(glob_match("content:GET:a.css", "content:GET:a.css"));
        assert!(!glob_match("content:GET:a.css", "content:GET:a.cssx"));
    }

    #[test]
    fn test_star_prefix() {
        assert!(glob_match("content:GET:static/*", "content:GET:static/app.js"));
        assert!(glob_match("content:GET:static/*", "content:GET:static/"));
        assert!(!glob_match("content:GET:static/*", "content:GET:images/a.png"));
    }

    #[test]
    fn test_star_in_middle() {
        assert!(glob_match("content:*:index.html", "content:HEAD:index.html"));
        assert!(glob_match("*.png", "content:GET:a/b/c.png"));
        assert!(!glob_match("*.png", "content:GET:a.png.gz"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("content:GET:v?/app.js", "content:GET:v2/app.js"));
        assert!(!glob_match("content:GET:v?/app.js", "content:GET:v10/app.js"));
    }

    #[test]
    fn test_match_everything() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(!glob_match("", "anything"));
    }

    #[test]
    fn test_is_literal() {
        assert!(is_literal("content:GET:a"));
        assert!(!is_literal("content:*"));
        assert!(!is_literal("content:GET:v?"));
    }
}
