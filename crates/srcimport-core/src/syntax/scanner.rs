//! Span-preserving lexical scan of C# source text.
//!
//! One forward pass over the input produces a flat stream of items:
//! identifiers (keywords included), single-character punctuation, and
//! preprocessor directives. Comments, string literals (regular, verbatim,
//! interpolated, raw), and character literals are consumed silently so that
//! braces and `#` characters inside them can never be mistaken for
//! structure. Everything is addressed by byte span into the original text;
//! the scanner never copies or normalises source bytes.

use std::ops::Range;

/// Lexical-level scan failures. No recovery is attempted; the caller
/// reports these verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: usize },

    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: usize },
}

/// Kind of a preprocessor directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    Endif,
    /// Any other directive (`#region`, `#pragma`, `#nullable`, …) — kept in
    /// the stream so line accounting stays honest, otherwise ignored.
    Other,
}

/// A conditional-directive line as it appeared in the source.
#[derive(Debug, Clone)]
pub struct RawDirective {
    pub kind: DirectiveKind,
    /// Condition text after the directive keyword, with any trailing `//`
    /// comment stripped. Empty for `#else`/`#endif`/other directives.
    pub condition: String,
    /// 1-based line number of the directive, for error reporting.
    pub line: usize,
}

/// One item of the scanned stream.
#[derive(Debug, Clone)]
pub(crate) enum Item {
    /// An identifier or keyword (including `@`-verbatim identifiers).
    Ident { start: usize, end: usize },
    /// A single punctuation character the structural pass may care about.
    Punct { ch: char },
    /// A preprocessor directive line.
    Directive(RawDirective),
}

/// The result of scanning one source text.
#[derive(Debug)]
pub struct Scan<'a> {
    source: &'a str,
    items: Vec<Item>,
}

impl<'a> Scan<'a> {
    pub(crate) fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn text(&self, span: Range<usize>) -> &'a str {
        &self.source[span]
    }

    /// All directives, in source order.
    pub fn directives(&self) -> impl Iterator<Item = &RawDirective> {
        self.items.iter().filter_map(|item| match item {
            Item::Directive(d) => Some(d),
            _ => None,
        })
    }
}

/// Scan `source` into an item stream.
pub fn scan(source: &str) -> Result<Scan<'_>, ScanError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        line: 1,
        at_line_start: true,
        items: Vec::new(),
    };
    lexer.run()?;
    Ok(Scan {
        source,
        items: lexer.items,
    })
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    at_line_start: bool,
    items: Vec<Item>,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.src[self.pos..].starts_with(pat)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            if c == '\n' {
                self.line += 1;
                self.at_line_start = true;
            }
            self.pos += c.len_utf8();
        }
    }

    fn run(&mut self) -> Result<(), ScanError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '\u{FEFF}' {
                self.bump();
                continue;
            }

            let line_start = self.at_line_start;
            self.at_line_start = false;

            if c == '#' && line_start {
                self.directive_line();
                continue;
            }

            match c {
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '@' => self.at_sigil()?,
                '$' => self.dollar_sigil()?,
                '"' => self.string_like()?,
                '\'' => self.char_literal(),
                c if is_ident_start(c) => self.ident(),
                c if c.is_ascii_digit() => self.number(),
                c => {
                    self.items.push(Item::Punct { ch: c });
                    self.bump();
                }
            }

            // Multi-line constructs leave the cursor mid-line.
            self.at_line_start = false;
        }
        Ok(())
    }

    /// A directive occupies the rest of its line. The keyword may be
    /// separated from `#` by horizontal whitespace, per the C# lexical
    /// grammar.
    fn directive_line(&mut self) {
        let line = self.line;
        self.bump(); // '#'
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }

        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_lowercase()) {
            self.bump();
        }
        let kind = match &self.src[name_start..self.pos] {
            "if" => DirectiveKind::If,
            "elif" => DirectiveKind::Elif,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            _ => DirectiveKind::Other,
        };

        let rest_start = self.pos;
        while matches!(self.peek(), Some(c) if c != '\n') {
            self.bump();
        }
        let rest = &self.src[rest_start..self.pos];

        let condition = match kind {
            DirectiveKind::If | DirectiveKind::Elif => {
                // Directives admit single-line comments only.
                let rest = rest.split_once("//").map_or(rest, |(before, _)| before);
                rest.trim().to_string()
            }
            _ => String::new(),
        };

        self.items
            .push(Item::Directive(RawDirective { kind, condition, line }));
    }

    fn line_comment(&mut self) {
        while matches!(self.peek(), Some(c) if c != '\n') {
            self.bump();
        }
    }

    fn block_comment(&mut self) -> Result<(), ScanError> {
        let line = self.line;
        self.bump(); // '/'
        self.bump(); // '*'
        loop {
            if self.starts_with("*/") {
                self.bump();
                self.bump();
                return Ok(());
            }
            if self.peek().is_none() {
                return Err(ScanError::UnterminatedComment { line });
            }
            self.bump();
        }
    }

    /// `@"…"` verbatim string, `@$"…"` verbatim interpolated string, or an
    /// `@ident` verbatim identifier. A lone `@` falls through as punctuation.
    fn at_sigil(&mut self) -> Result<(), ScanError> {
        match self.peek_at(1) {
            Some('"') => {
                self.bump(); // '@'
                self.verbatim_string(false)
            }
            Some('$') if self.peek_at(2) == Some('"') => {
                self.bump(); // '@'
                self.bump(); // '$'
                self.verbatim_string(true)
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                self.bump(); // '@'
                self.bump();
                while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
                    self.bump();
                }
                self.items.push(Item::Ident { start, end: self.pos });
                Ok(())
            }
            _ => {
                self.items.push(Item::Punct { ch: '@' });
                self.bump();
                Ok(())
            }
        }
    }

    /// `$"…"` interpolated, `$@"…"` verbatim interpolated, `$…$"""…"""` raw
    /// interpolated. A lone `$` falls through as punctuation.
    fn dollar_sigil(&mut self) -> Result<(), ScanError> {
        let mut dollars = 1;
        while self.peek_at(dollars) == Some('$') {
            dollars += 1;
        }
        let after = self.peek_at(dollars);

        if after == Some('"') {
            for _ in 0..dollars {
                self.bump();
            }
            return self.string_like_interpolated();
        }
        if dollars == 1 && after == Some('@') && self.peek_at(2) == Some('"') {
            self.bump(); // '$'
            self.bump(); // '@'
            return self.verbatim_string(true);
        }

        self.items.push(Item::Punct { ch: '$' });
        self.bump();
        Ok(())
    }

    /// At a `"` with no sigil: raw string if three or more quotes, else a
    /// regular string literal.
    fn string_like(&mut self) -> Result<(), ScanError> {
        if self.starts_with("\"\"\"") {
            self.raw_string()
        } else {
            self.regular_string(false)
        }
    }

    fn string_like_interpolated(&mut self) -> Result<(), ScanError> {
        if self.starts_with("\"\"\"") {
            // Raw interpolated: the hole delimiters match the dollar count;
            // content (braces included) is opaque, so raw handling suffices.
            self.raw_string()
        } else {
            self.regular_string(true)
        }
    }

    fn regular_string(&mut self, interpolated: bool) -> Result<(), ScanError> {
        let line = self.line;
        self.bump(); // opening '"'
        loop {
            match self.peek() {
                None | Some('\n') => return Err(ScanError::UnterminatedString { line }),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('"') => {
                    self.bump();
                    return Ok(());
                }
                Some('{') if interpolated => {
                    if self.peek_at(1) == Some('{') {
                        self.bump();
                        self.bump();
                    } else {
                        self.bump();
                        self.interpolation_hole(line)?;
                    }
                }
                Some('}') if interpolated && self.peek_at(1) == Some('}') => {
                    self.bump();
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn verbatim_string(&mut self, interpolated: bool) -> Result<(), ScanError> {
        let line = self.line;
        self.bump(); // opening '"'
        loop {
            match self.peek() {
                None => return Err(ScanError::UnterminatedString { line }),
                Some('"') => {
                    if self.peek_at(1) == Some('"') {
                        self.bump();
                        self.bump(); // "" escape
                    } else {
                        self.bump();
                        return Ok(());
                    }
                }
                Some('{') if interpolated => {
                    if self.peek_at(1) == Some('{') {
                        self.bump();
                        self.bump();
                    } else {
                        self.bump();
                        self.interpolation_hole(line)?;
                    }
                }
                Some('}') if interpolated && self.peek_at(1) == Some('}') => {
                    self.bump();
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// `"""…"""` with any number (≥ 3) of opening quotes; closes on a run of
    /// at least as many quotes.
    fn raw_string(&mut self) -> Result<(), ScanError> {
        let line = self.line;
        let mut open = 0;
        while self.peek() == Some('"') {
            self.bump();
            open += 1;
        }
        loop {
            match self.peek() {
                None => return Err(ScanError::UnterminatedString { line }),
                Some('"') => {
                    let mut run = 0;
                    while self.peek() == Some('"') {
                        self.bump();
                        run += 1;
                    }
                    if run >= open {
                        return Ok(());
                    }
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// An interpolation hole: balanced braces containing arbitrary
    /// expression code, consumed without emitting items (holes live inside
    /// member bodies and must not perturb brace-level structure).
    fn interpolation_hole(&mut self, string_line: usize) -> Result<(), ScanError> {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => return Err(ScanError::UnterminatedString { line: string_line }),
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('"') => self.string_like()?,
                Some('@') if self.peek_at(1) == Some('"') => {
                    self.bump();
                    self.verbatim_string(false)?;
                }
                Some('$') if self.peek_at(1) == Some('"') => {
                    self.bump();
                    self.regular_string(true)?;
                }
                Some('\'') => self.char_literal(),
                Some('/') if self.peek_at(1) == Some('*') => self.block_comment()?,
                Some(_) => self.bump(),
            }
        }
    }

    /// Character literal, scanned leniently: if no closing quote follows
    /// within one (possibly escaped) character, the opening quote is treated
    /// as stray punctuation. Disabled-text regions routinely contain prose
    /// apostrophes that are not literals.
    fn char_literal(&mut self) {
        let save = (self.pos, self.line, self.at_line_start);
        self.bump(); // opening '\''
        match self.peek() {
            Some('\\') => {
                self.bump(); // backslash
                self.bump(); // escape char ('n', 'x', 'u', the quote, …)
                // Hex/unicode escape payload: \x41, A, \U00000041
                while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                    self.bump();
                }
            }
            Some(c) if c != '\'' && c != '\n' => self.bump(),
            _ => {}
        }
        if self.peek() == Some('\'') {
            self.bump();
        } else {
            (self.pos, self.line, self.at_line_start) = save;
            self.bump(); // just the quote
        }
    }

    fn ident(&mut self) {
        let start = self.pos;
        self.bump();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        self.items.push(Item::Ident { start, end: self.pos });
    }

    /// Numeric literal: digits, letters (suffixes, hex), underscores, and a
    /// dot when followed by a digit. Exponent signs are left to the
    /// punctuation stream; nothing structural hangs off them.
    fn number(&mut self) {
        self.bump();
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => self.bump(),
                Some('.') if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => {
                    self.bump();
                }
                _ => return,
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
