//! Line recognisers for the build-file grammar.
//
//  Grammar (ASCII, case-insensitive):
//
//      directive      ::= '@' name ( WS+ arg )* WS* ( '//' .* )?
//      target-header  ::= name ':' WS* ( '//' .* )?
//      name           ::= [A-Za-z0-9-]+
//      arg            ::= [A-Za-z0-9-.]+
//
//  A blank line (empty, whitespace only, or a bare comment) is accepted
//  wherever a directive is expected and produces nothing.

use std::iter::Peekable;
use std::str::Chars;

/// What a line means while scanning for directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveLine {
    Blank,
    Directive { name: String, args: Vec<String> },
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_arg_char(c: char) -> bool {
    is_name_char(c) || c == '.'
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F, buf: &mut String) {
        while let Some(c) = self.peek_char() {
            if pred(c) {
                buf.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Skips whitespace, returning whether anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn token(&mut self, pred: fn(char) -> bool) -> Option<String> {
        let mut buf = String::new();
        self.consume_while(pred, &mut buf);
        (!buf.is_empty()).then_some(buf)
    }

    /// True when the rest of the line is empty or a `//` comment.
    fn at_line_end(&mut self) -> bool {
        let mut rest = self.chars.clone();
        match rest.next() {
            None => true,
            Some('/') => rest.next() == Some('/'),
            Some(_) => false,
        }
    }
}

/// True for an empty, whitespace-only or pure-comment line.
pub fn is_blank(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || text.starts_with("//")
}

/// Classifies a line inside a directive section.
///
/// `indented` lines (those belonging to a target) have leading whitespace
/// trimmed before matching. Returns `None` when the line is neither a
/// directive nor blank, which ends the directive section.
pub fn directive_line(text: &str, indented: bool) -> Option<DirectiveLine> {
    let text = if indented { text.trim_start() } else { text };

    if is_blank(text) {
        return Some(DirectiveLine::Blank);
    }

    let mut sc = Scanner::new(text);
    if !sc.eat('@') {
        return None;
    }
    let name = sc.token(is_name_char)?;

    let mut args = Vec::new();
    loop {
        let separated = sc.skip_whitespace();
        if sc.at_line_end() {
            break;
        }
        if !separated {
            return None;
        }
        args.push(sc.token(is_arg_char)?);
    }

    Some(DirectiveLine::Directive { name, args })
}

/// Name of the target declared by a `name:` header line.
///
/// Matched exactly as written; an indented header is not a header.
pub fn target_header(text: &str) -> Option<String> {
    let mut sc = Scanner::new(text);
    let name = sc.token(is_name_char)?;
    if !sc.eat(':') {
        return None;
    }
    sc.skip_whitespace();
    sc.at_line_end().then_some(name)
}

pub fn is_target_header(text: &str) -> bool {
    target_header(text).is_some()
}
