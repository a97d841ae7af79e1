//! Quoted key/value extraction for Valve's text formats
//!
//! appmanifest_*.acf and libraryfolders.vdf are loosely structured VDF with
//! no schema guarantees. The files are only ever consumed here as flat
//! `"key" "value"` pairs, so instead of a full tree parse this scans for
//! every occurrence of a quoted key immediately followed (whitespace only
//! in between) by a quoted value. Anything the scanner does not understand
//! is skipped, never fatal.

/// A quoted token with its byte span in the source text.
struct Token {
    text: String,
    start: usize,
    end: usize,
}

/// Collect every quoted string in order. Values are taken verbatim up to
/// the closing quote - VDF escape sequences are left untouched, matching
/// how Steam's own files are written on Linux.
fn quoted_tokens(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = content.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'"' {
            let start = i;
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b'"' {
                j += 1;
            }
            if j >= bytes.len() {
                break; // unterminated string, stop scanning
            }
            tokens.push(Token {
                text: content[start + 1..j].to_string(),
                start,
                end: j + 1,
            });
            i = j + 1;
        } else {
            i += 1;
        }
    }

    tokens
}

/// Extract every value paired with `key` (case-insensitive), in file order.
#[must_use]
pub fn extract_values(content: &str, key: &str) -> Vec<String> {
    let tokens = quoted_tokens(content);
    let mut values = Vec::new();

    for pair in tokens.windows(2) {
        let (k, v) = (&pair[0], &pair[1]);
        if !k.text.eq_ignore_ascii_case(key) {
            continue;
        }
        // Only whitespace may separate a key from its value; a `{` or any
        // other token in between means this key opens a block instead.
        let gap = &content[k.end..v.start];
        if gap.chars().all(char::is_whitespace) {
            values.push(v.text.clone());
        }
    }

    values
}

/// Extract the first value paired with `key`, if any.
#[must_use]
pub fn extract_value(content: &str, key: &str) -> Option<String> {
    extract_values(content, key).into_iter().next()
}
