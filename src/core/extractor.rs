//! Lexical recovery of directives, struct/enum definitions and function
//! prototypes from C text. Best-effort: no grammar, no semantic checks.
//!
//! Known limitation: macros that expand to braces or parentheses are not
//! expanded, so headers relying on them may be split in unexpected places.

use crate::domain::model::{Declaration, DeclarationKind, Extraction};
use regex::Regex;
use std::sync::OnceLock;

const NON_FUNCTION_NAMES: &[&str] = &["if", "while", "for", "switch", "return", "sizeof"];

fn prototype_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)^(?P<ret>(?:[A-Za-z_]\w*[\s\*]+)+)(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^;{}]*)\)\s*;$",
        )
        .expect("static regex is valid")
    })
}

pub fn extract(text: &str) -> Extraction {
    let (masked, directives) = mask_non_code(text);
    let (structs_and_enums, prototypes) = scan_file_scope(text, &masked);

    tracing::debug!(
        "Extracted {} directives, {} struct/enum definitions, {} prototypes",
        directives.len(),
        structs_and_enums.len(),
        prototypes.len()
    );

    Extraction {
        directives,
        structs_and_enums,
        prototypes,
    }
}

fn slice(text: &str, start: usize, end: usize) -> String {
    String::from_utf8_lossy(&text.as_bytes()[start..end]).into_owned()
}

fn blank(masked: &mut [u8], start: usize, end: usize) {
    for byte in &mut masked[start..end] {
        if *byte != b'\n' {
            *byte = b' ';
        }
    }
}

/// Index of the newline ending the directive that starts at `from` (or the
/// end of input), following `\` continuations.
fn directive_end(bytes: &[u8], from: usize) -> usize {
    let mut pos = from;
    loop {
        let eol = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |offset| pos + offset);

        let continued = bytes[pos..eol]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            == Some(&b'\\');

        if continued && eol < bytes.len() {
            pos = eol + 1;
        } else {
            return eol;
        }
    }
}

/// Returns a copy of `text` where comments, literal contents and directive
/// lines are replaced by spaces (newlines kept, offsets unchanged), together
/// with the directives found on the way.
fn mask_non_code(text: &str) -> (Vec<u8>, Vec<Declaration>) {
    let bytes = text.as_bytes();
    let n = bytes.len();
    let mut masked = bytes.to_vec();
    let mut directives = Vec::new();

    let mut i = 0;
    let mut line_start = 0;
    let mut at_line_start = true;

    while i < n {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if b == b'\n' {
            i += 1;
            line_start = i;
            at_line_start = true;
            continue;
        }

        if at_line_start && b == b'#' {
            let end = directive_end(bytes, i);
            let line = slice(text, line_start, end);
            directives.push(Declaration::new(
                DeclarationKind::Directive,
                line.trim_end_matches('\r'),
                line_start,
            ));
            blank(&mut masked, line_start, end);
            i = end;
            continue;
        }

        match (b, next) {
            (b'/', Some(b'/')) => {
                let end = bytes[i..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map_or(n, |offset| i + offset);
                blank(&mut masked, i, end);
                at_line_start = false;
                i = end;
            }
            (b'/', Some(b'*')) => {
                let end = bytes[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(n, |offset| i + 2 + offset + 2);
                blank(&mut masked, i, end);
                at_line_start = false;
                i = end;
            }
            (b'"', _) | (b'\'', _) => {
                let mut j = i + 1;
                while j < n && bytes[j] != b && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                let j = j.min(n);
                blank(&mut masked, i + 1, j);
                at_line_start = false;
                i = if j < n && bytes[j] == b { j + 1 } else { j };
            }
            _ => {
                if !b.is_ascii_whitespace() {
                    at_line_start = false;
                }
                i += 1;
            }
        }
    }

    (masked, directives)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_whitespace(masked: &[u8], mut pos: usize) -> usize {
    while pos < masked.len() && masked[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn word_end(masked: &[u8], mut pos: usize) -> usize {
    while pos < masked.len() && is_word_byte(masked[pos]) {
        pos += 1;
    }
    pos
}

/// Closing brace matching the `{` at `open`, or `None` when the input ends first.
fn matching_brace(masked: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in masked[open..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// First `;` outside any brace nesting, starting at `from`.
fn statement_terminator(masked: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in masked[from..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return Some(from + offset),
            _ => {}
        }
    }
    None
}

fn is_extern_c(head: &str) -> bool {
    let compact: String = head.chars().filter(|c| !c.is_whitespace()).collect();
    compact == "extern\"C\""
}

/// Drops trailing `__attribute__((...))` groups so `int f(void)
/// __attribute__((deprecated));` is matched as `int f(void);`.
fn without_trailing_attributes(statement: &str) -> String {
    let Some(mut body) = statement.trim_end().strip_suffix(';') else {
        return statement.to_string();
    };
    body = body.trim_end();

    while body.ends_with(')') {
        let mut depth = 0i32;
        let mut open = None;
        for (idx, c) in body.char_indices().rev() {
            match c {
                ')' => depth += 1,
                '(' => {
                    depth -= 1;
                    if depth == 0 {
                        open = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(open) = open else { break };
        match body[..open].trim_end().strip_suffix("__attribute__") {
            Some(rest) => body = rest.trim_end(),
            None => break,
        }
    }

    format!("{};", body)
}

fn as_prototype(statement: &str) -> bool {
    let statement = without_trailing_attributes(statement);
    let Some(caps) = prototype_shape().captures(&statement) else {
        return false;
    };

    let ret = &caps["ret"];
    if ret.split(|c: char| c.is_whitespace() || c == '*').any(|w| w == "typedef" || w == "return") {
        return false;
    }
    if NON_FUNCTION_NAMES.contains(&&caps["name"]) {
        return false;
    }

    let mut depth = 0i32;
    for c in caps["params"].chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn scan_file_scope(text: &str, masked: &[u8]) -> (Vec<Declaration>, Vec<Declaration>) {
    let n = masked.len();
    let mut structs = Vec::new();
    let mut prototypes = Vec::new();

    let mut i = 0;
    let mut stmt_start = 0;
    let mut stmt_has_block = false;
    let mut open_extern_blocks = 0usize;

    while i < n {
        let b = masked[i];

        if b == b';' {
            let start = skip_whitespace(masked, stmt_start);
            if !stmt_has_block && start < i {
                let statement = String::from_utf8_lossy(&masked[start..=i]);
                if as_prototype(&statement) {
                    prototypes.push(Declaration::new(
                        DeclarationKind::FunctionPrototype,
                        slice(text, start, i + 1),
                        start,
                    ));
                }
            }
            i += 1;
            stmt_start = i;
            stmt_has_block = false;
            continue;
        }

        if b == b'{' {
            let head_start = skip_whitespace(masked, stmt_start);
            let head = slice(text, head_start.min(i), i);
            if is_extern_c(&head) {
                open_extern_blocks += 1;
                i += 1;
                stmt_start = i;
                stmt_has_block = false;
                continue;
            }

            let Some(close) = matching_brace(masked, i) else {
                tracing::warn!("Unbalanced brace at byte {}; ignoring the rest of the input", i);
                break;
            };

            // `) {` opens a function body, which ends the statement by itself.
            let is_definition = masked[head_start.min(i)..i]
                .iter()
                .rev()
                .find(|c| !c.is_ascii_whitespace())
                == Some(&b')');
            i = close + 1;
            if is_definition {
                stmt_start = i;
                stmt_has_block = false;
            } else {
                stmt_has_block = true;
            }
            continue;
        }

        if b == b'}' {
            open_extern_blocks = open_extern_blocks.saturating_sub(1);
            i += 1;
            stmt_start = i;
            stmt_has_block = false;
            continue;
        }

        if !is_word_byte(b) {
            i += 1;
            continue;
        }

        let end = word_end(masked, i);
        let word = &masked[i..end];
        if word != b"struct" && word != b"enum" {
            i = end;
            continue;
        }

        let mut j = skip_whitespace(masked, end);
        if j < n && (masked[j].is_ascii_alphabetic() || masked[j] == b'_') {
            j = skip_whitespace(masked, word_end(masked, j));
        }
        if j >= n || masked[j] != b'{' {
            i = end;
            continue;
        }

        let head_start = skip_whitespace(masked, stmt_start);
        let region_start = if head_start < i && masked[head_start..i].trim_ascii() == b"typedef" {
            head_start
        } else {
            i
        };

        let region_end = match matching_brace(masked, j) {
            Some(close) => statement_terminator(masked, close + 1).map(|semi| semi + 1),
            None => None,
        };

        match region_end {
            Some(region_end) => {
                structs.push(Declaration::new(
                    DeclarationKind::StructOrEnum,
                    slice(text, region_start, region_end),
                    region_start,
                ));
                i = region_end;
                stmt_start = i;
                stmt_has_block = false;
            }
            None => {
                tracing::warn!(
                    "Unterminated {} definition at byte {}; extending it to end of input",
                    String::from_utf8_lossy(word),
                    region_start
                );
                structs.push(Declaration::new(
                    DeclarationKind::StructOrEnum,
                    slice(text, region_start, n).trim_end(),
                    region_start,
                ));
                break;
            }
        }
    }

    if open_extern_blocks > 0 {
        tracing::debug!("{} extern \"C\" block(s) left open", open_extern_blocks);
    }

    (structs, prototypes)
}
