//! Statement scanner for Fortran free-form source
//!
//! Turns raw text into a sequence of statements, each a short token list. Only what the analyzer needs survives:
//! identifiers (lowercased), `::`, and single punctuation characters. String literals and numbers collapse to a
//! placeholder token so their contents can never look like keywords.
//!
//! ## Handled
//!
//! - `!` comments outside string literals
//! - `&` continuation lines (joined; the statement keeps its first physical line number)
//! - `;` statement separators
//! - preprocessor lines (`#ifdef ...`) are skipped

/// A token in a scanned statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier or keyword, lowercased.
    Ident(String),
    /// `::`
    DoubleColon,
    /// Any other single punctuation character.
    Punct(char),
    /// A string or numeric literal (contents dropped).
    Literal,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// One logical statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based line where the statement starts.
    pub line: usize,
    pub tokens: Vec<Token>,
}

impl Statement {
    /// Return the identifier at `index`, if that token is an identifier.
    pub fn ident_at(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).and_then(Token::ident)
    }
}

/// Scan `source` into statements.
pub fn scan(source: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim_start().starts_with('#') && pending.is_none() {
            continue;
        }

        let code = strip_comment(raw);
        let mut code = code.trim();

        if pending.is_some() {
            code = code.strip_prefix('&').unwrap_or(code);
        } else if code.is_empty() {
            continue;
        }

        let (start_line, mut text) = pending.take().unwrap_or((line_no, String::new()));
        if let Some(head) = code.strip_suffix('&') {
            text.push_str(head);
            text.push(' ');
            pending = Some((start_line, text));
            continue;
        }
        text.push_str(code);

        for part in split_statements(&text) {
            let tokens = tokenize(part);
            if !tokens.is_empty() {
                statements.push(Statement {
                    line: start_line,
                    tokens,
                });
            }
        }
    }

    // A dangling continuation at EOF still forms a statement.
    if let Some((line, text)) = pending {
        for part in split_statements(&text) {
            let tokens = tokenize(part);
            if !tokens.is_empty() {
                statements.push(Statement { line, tokens });
            }
        }
    }

    statements
}

/// Remove a trailing `!` comment, respecting `'` and `"` string literals.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '!' => return &line[..i],
            None => {}
        }
    }
    line
}

fn split_statements(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ';' => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if is_ident_start(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_ident_continue(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            tokens.push(Token::Ident(text[start..end].to_ascii_lowercase()));
        } else if c.is_ascii_digit() {
            while chars.peek().is_some_and(|&(_, n)| n.is_ascii_alphanumeric() || n == '_' || n == '.') {
                chars.next();
            }
            tokens.push(Token::Literal);
        } else if c == '\'' || c == '"' {
            // Doubled quotes inside a literal re-open it immediately, so a plain toggle is enough.
            for (_, n) in chars.by_ref() {
                if n == c {
                    break;
                }
            }
            tokens.push(Token::Literal);
        } else if c == ':' && chars.peek().is_some_and(|&(_, n)| n == ':') {
            chars.next();
            tokens.push(Token::DoubleColon);
        } else {
            tokens.push(Token::Punct(c));
        }
    }

    tokens
}

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idents(stmt: &Statement) -> Vec<&str> {
        stmt.tokens.iter().filter_map(Token::ident).collect()
    }

    #[test]
    fn test_comment_outside_string_only() {
        assert_eq!(strip_comment("x = 1 ! note"), "x = 1 ");
        assert_eq!(strip_comment("print *, 'hi ! there' ! c"), "print *, 'hi ! there' ");
        assert_eq!(strip_comment("print *, \"it's\" ! c"), "print *, \"it's\" ");
    }

    #[test]
    fn test_keywords_lowercased() {
        let stmts = scan("SUBROUTINE Test_One()\nEnd Subroutine");
        assert_eq!(idents(&stmts[0]), ["subroutine", "test_one"]);
        assert_eq!(idents(&stmts[1]), ["end", "subroutine"]);
    }

    #[test]
    fn test_continuation_joins_lines() {
        let stmts = scan("subroutine test_long(a, &\n    & b)\nend subroutine");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].line, 1);
        assert_eq!(idents(&stmts[0]), ["subroutine", "test_long", "a", "b"]);
        assert_eq!(stmts[1].line, 3);
    }

    #[test]
    fn test_semicolons_split_statements() {
        let stmts = scan("x = 1; y = 'a;b'; end");
        assert_eq!(stmts.len(), 3);
        assert_eq!(idents(&stmts[2]), ["end"]);
    }

    #[test]
    fn test_literals_hide_contents() {
        let stmts = scan("print *, 'subroutine test_fake'");
        assert_eq!(idents(&stmts[0]), ["print"]);
    }

    #[test]
    fn test_double_colon_and_preprocessor() {
        let stmts = scan("#ifdef X\nuse, intrinsic :: iso_fortran_env\n");
        assert_eq!(stmts.len(), 1);
        assert_eq!(
            stmts[0].tokens,
            vec![
                Token::Ident("use".into()),
                Token::Punct(','),
                Token::Ident("intrinsic".into()),
                Token::DoubleColon,
                Token::Ident("iso_fortran_env".into()),
            ]
        );
    }
}
