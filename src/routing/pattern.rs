//! Glob-style path pattern matching.
//!
//! # Design Decisions
//! - Shell-glob semantics: `*` and `?` never cross a `/` boundary, `**`
//!   matches any sequence of characters including `/`
//! - No regex, simple backtracking over char slices; patterns come from
//!   config and are short

/// Returns true if `path` matches the glob `pattern`.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let path: Vec<char> = path.chars().collect();
    matches(&pattern, &path)
}

fn matches(pattern: &[char], path: &[char]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some('*') => {
            if pattern.get(1) == Some(&'*') {
                // Collapse the `**` run, then try every split point.
                let mut rest = &pattern[2..];
                while rest.first() == Some(&'*') {
                    rest = &rest[1..];
                }
                (0..=path.len()).any(|i| matches(rest, &path[i..]))
            } else {
                let rest = &pattern[1..];
                let segment_len = path.iter().take_while(|c| **c != '/').count();
                (0..=segment_len).any(|i| matches(rest, &path[i..]))
            }
        }
        Some('?') => {
            !path.is_empty() && path[0] != '/' && matches(&pattern[1..], &path[1..])
        }
        Some(&literal) => {
            path.first() == Some(&literal) && matches(&pattern[1..], &path[1..])
        }
    }
}
