//! # Tokenizing Scanner
//!
//! A single-pass character automaton over raw document text. It tracks four
//! pieces of state (inside a string, escape pending, brace depth, bracket
//! depth) and reports one [`Transition`] per character so callers can
//! sample the state at every position.
//!
//! ## State machine
//!
//! ```text
//!   Normal --'"'--> InString --'\\'--> Escaped --any--> InString
//!      ^                |
//!      +------'"'-------+
//! ```
//!
//! `{`/`}` and `[`/`]` move the depth counters only in `Normal`. There is no
//! terminal state and malformed input never stops the scanner: depths may
//! go negative, which callers read as "exited the structure".

/// Coarse automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    InString,
    /// One-character sub-state of `InString` after a backslash.
    Escaped,
}

/// What a single character did to the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StringOpened,
    StringClosed,
    /// A backslash inside a string; the next character is escaped.
    EscapeStarted,
    /// Any other character inside a string, including the escaped one.
    StringChar,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    Whitespace,
    /// Any other character outside a string (numbers, literals, garbage).
    Scalar,
}

/// The automaton itself. Cheap to copy; holds no text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scanner {
    in_string: bool,
    escape_next: bool,
    brace_depth: i64,
    bracket_depth: i64,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one character and return the transition it caused.
    pub fn advance(&mut self, ch: char) -> Transition {
        if self.escape_next {
            self.escape_next = false;
            return Transition::StringChar;
        }

        if self.in_string {
            return match ch {
                '\\' => {
                    self.escape_next = true;
                    Transition::EscapeStarted
                }
                '"' => {
                    self.in_string = false;
                    Transition::StringClosed
                }
                _ => Transition::StringChar,
            };
        }

        match ch {
            '"' => {
                self.in_string = true;
                Transition::StringOpened
            }
            '{' => {
                self.brace_depth += 1;
                Transition::OpenBrace
            }
            '}' => {
                self.brace_depth -= 1;
                Transition::CloseBrace
            }
            '[' => {
                self.bracket_depth += 1;
                Transition::OpenBracket
            }
            ']' => {
                self.bracket_depth -= 1;
                Transition::CloseBracket
            }
            ':' => Transition::Colon,
            ',' => Transition::Comma,
            c if c.is_whitespace() => Transition::Whitespace,
            _ => Transition::Scalar,
        }
    }

    pub fn state(&self) -> ScanState {
        match (self.in_string, self.escape_next) {
            (true, true) => ScanState::Escaped,
            (true, false) => ScanState::InString,
            _ => ScanState::Normal,
        }
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    pub fn brace_depth(&self) -> i64 {
        self.brace_depth
    }

    pub fn bracket_depth(&self) -> i64 {
        self.bracket_depth
    }

    /// Combined nesting depth of objects and arrays.
    pub fn depth(&self) -> i64 {
        self.brace_depth + self.bracket_depth
    }
}

/// One scanned character with its position and the state after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    /// 1-based line.
    pub line: usize,
    /// 1-based character column.
    pub column: usize,
    pub ch: char,
    pub transition: Transition,
    /// Automaton state after consuming `ch`.
    pub after: Scanner,
}

/// Scan `text` line by line, character by character.
///
/// Lines are split on `\n`; a trailing `\r` is treated as whitespace and
/// does not shift line numbers. String state carries across line breaks.
pub fn scan(text: &str) -> impl Iterator<Item = Scanned> + '_ {
    scan_from(text, 1)
}

/// Like [`scan`], but starts at 1-based line `first_line` with a fresh
/// automaton.
pub fn scan_from(text: &str, first_line: usize) -> impl Iterator<Item = Scanned> + '_ {
    let mut scanner = Scanner::new();
    text.split('\n')
        .enumerate()
        .skip(first_line.saturating_sub(1))
        .flat_map(|(idx, line)| {
            line.chars()
                .enumerate()
                .map(move |(col, ch)| (idx + 1, col + 1, ch))
        })
        .map(move |(line, column, ch)| {
            let transition = scanner.advance(ch);
            Scanned {
                line,
                column,
                ch,
                transition,
                after: scanner,
            }
        })
}
