//! Comment extraction.
//!
//! Comments carry metadata (such as the `version=` tag) that the parser
//! itself discards.

/// A `--` comment and the line it appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment<'src> {
    /// 1-based line number.
    pub line: usize,
    /// Text after the `--` marker, untrimmed.
    pub text: &'src str,
}

/// Returns every `--` comment in `source`, in order.
///
/// `--` inside a string literal does not start a comment.
///
/// # Examples
///
/// ```
/// use asdl_schema_parser::fetch_comments;
///
/// let source = "-- version=3.8\nmodule M version \"--\" { } -- end";
/// let texts: Vec<&str> = fetch_comments(source).iter().map(|c| c.text).collect();
/// assert_eq!(texts, vec![" version=3.8", " end"]);
/// ```
pub fn fetch_comments(source: &str) -> Vec<Comment<'_>> {
    let mut comments = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        if let Some(start) = comment_start(line) {
            comments.push(Comment {
                line: idx + 1,
                text: &line[start + 2..],
            });
        }
    }

    comments
}

/// Byte offset of the `--` marker outside string literals, if any.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            // skip the escaped byte
            Some(_) if byte == b'\\' => idx += 1,
            Some(open) if byte == open => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'-' && bytes.get(idx + 1) == Some(&b'-') => return Some(idx),
            None => {}
        }
        idx += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_comments_reports_lines() {
        let source = "module M {\n  -- first\n  x = A -- second\n}\n";
        let comments = fetch_comments(source);
        assert_eq!(
            comments,
            vec![
                Comment {
                    line: 2,
                    text: " first"
                },
                Comment {
                    line: 3,
                    text: " second"
                },
            ]
        );
    }

    #[test]
    fn test_fetch_comments_ignores_markers_in_strings() {
        assert!(fetch_comments("module M version 'a--b' { }").is_empty());
        assert!(fetch_comments("module M version \"a\\\"--\" { }").is_empty());
    }

    #[test]
    fn test_fetch_comments_keeps_empty_comment() {
        let comments = fetch_comments("--");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "");
    }
}
