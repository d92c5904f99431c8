use std::str::Split;

/// How schema text is cut into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// A statement ends at any line whose trimmed text ends with `;`.
    /// Semicolons at the end of a line inside literals or function bodies
    /// split the statement.
    #[default]
    Line,
    /// Character scanner aware of quotes, comments and dollar-quoted bodies.
    Quoted,
}

pub fn split_statements(sql: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Line => LineStatements::new(sql).collect(),
        SplitMode::Quoted => split_quoted_statements(sql),
    }
}

/// Lazily yields `;`-terminated statements, skipping blank and `--` lines.
/// Content after the last terminator is dropped.
pub struct LineStatements<'a> {
    lines: Split<'a, char>,
    current: String,
}

impl<'a> LineStatements<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self {
            lines: sql.split('\n'),
            current: String::new(),
        }
    }
}

impl Iterator for LineStatements<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for line in self.lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }

            self.current.push_str(line);
            self.current.push('\n');

            if trimmed.ends_with(';') {
                let stmt = self.current.trim().to_string();
                self.current.clear();
                if !stmt.is_empty() && stmt != ";" {
                    return Some(stmt);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan<'a> {
    Normal,
    SingleQuote { backslash_escapes: bool },
    DoubleQuote,
    LineComment { whole_line: bool },
    BlockComment { depth: usize },
    Dollar { tag: &'a str },
}

pub fn split_quoted_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = Scan::Normal;
    let mut seg_start = 0;
    let mut line_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            Scan::Normal => match ch {
                b'\'' => {
                    state = Scan::SingleQuote {
                        backslash_escapes: is_escape_string_prefix(bytes, i),
                    };
                }
                b'"' => state = Scan::DoubleQuote,
                b'-' if next == Some(b'-') => {
                    let whole_line = sql[line_start..i].trim().is_empty();
                    if whole_line {
                        current.push_str(&sql[seg_start..line_start]);
                    }
                    state = Scan::LineComment { whole_line };
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = Scan::BlockComment { depth: 1 };
                    i += 1;
                }
                b'$' if !is_ident_byte(i.checked_sub(1).map(|p| bytes[p])) => {
                    if let Some(tag) = dollar_tag(&sql[i..]) {
                        state = Scan::Dollar { tag };
                        i += tag.len();
                        continue;
                    }
                }
                b';' => {
                    current.push_str(&sql[seg_start..=i]);
                    push_statement(&mut statements, &current);
                    current.clear();
                    seg_start = i + 1;
                }
                _ => {}
            },
            Scan::SingleQuote { backslash_escapes } => match ch {
                b'\\' if backslash_escapes && next.is_some() => i += 1,
                b'\'' if next == Some(b'\'') => i += 1,
                b'\'' => state = Scan::Normal,
                _ => {}
            },
            Scan::DoubleQuote => match ch {
                b'"' if next == Some(b'"') => i += 1,
                b'"' => state = Scan::Normal,
                _ => {}
            },
            Scan::LineComment { whole_line } => {
                if ch == b'\n' {
                    if whole_line {
                        seg_start = i + 1;
                    }
                    state = Scan::Normal;
                }
            }
            Scan::BlockComment { depth } => match ch {
                b'/' if next == Some(b'*') => {
                    state = Scan::BlockComment { depth: depth + 1 };
                    i += 1;
                }
                b'*' if next == Some(b'/') => {
                    state = if depth == 1 {
                        Scan::Normal
                    } else {
                        Scan::BlockComment { depth: depth - 1 }
                    };
                    i += 1;
                }
                _ => {}
            },
            Scan::Dollar { tag } => {
                if bytes[i..].starts_with(tag.as_bytes()) {
                    state = Scan::Normal;
                    i += tag.len();
                    continue;
                }
            }
        }

        if bytes[i] == b'\n' {
            line_start = i + 1;
        }
        i += 1;
    }

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() && stmt != ";" {
        statements.push(stmt.to_string());
    }
}

fn is_ident_byte(b: Option<u8>) -> bool {
    matches!(b, Some(b) if b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80)
}

// `E'...'` strings are the only ones where backslash escapes a quote.
fn is_escape_string_prefix(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1).map(|p| bytes[p]) {
        Some(b'E' | b'e') => !is_ident_byte(quote.checked_sub(2).map(|p| bytes[p])),
        _ => false,
    }
}

/// Returns the full opening delimiter (`$$` or `$tag$`) at the start of `rest`.
fn dollar_tag(rest: &str) -> Option<&str> {
    let body = rest.get(1..)?;
    let end = body.find('$')?;
    let tag = &body[..end];
    let valid = tag
        .bytes()
        .enumerate()
        .all(|(idx, b)| b == b'_' || b.is_ascii_alphabetic() || (idx > 0 && b.is_ascii_digit()));
    valid.then(|| &rest[..end + 2])
}
