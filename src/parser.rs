use crate::ast::Ast;
use crate::error::Error;
use crate::nfa::{CharPredicate, Nfa};

/// Turns pattern text into an automaton.
///
/// This is the extension point of the engine: any implementation can be
/// handed to [`crate::RegularExpression::with_parser`] in place of
/// [`SimpleParser`].
pub trait Parser {
    /// Parses `source` into a tree. Returns `None` if there is nothing to
    /// parse.
    fn parse(&mut self, source: &str) -> Option<Ast>;

    /// Whether the most recent parse found a syntax anomaly.
    fn error(&self) -> bool;

    /// Parses and compiles `source`. Without a tree the result is a fresh
    /// automaton that accepts nothing.
    fn compile(&mut self, source: &str) -> Nfa {
        match self.parse(source) {
            Some(ast) => ast.build(),
            None => Nfa::new(),
        }
    }
}

/// Default for [`Config::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for [`SimpleParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Record syntax anomalies instead of silently absorbing them. The
    /// produced tree is the same either way.
    pub strict: bool,
    /// Deepest group nesting that is parsed. A group opened past this depth
    /// is skipped up to its closing `)` and contributes nothing.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Recursive-descent parser for the default pattern syntax.
///
/// Grammar, from lowest to highest precedence:
///
/// ```text
/// choice  := concat ('|' concat)*
/// concat  := primary+
/// primary := atom ('?' | '*' | '+')?
/// atom    := '.' | '[' bracket ']' | '(' ('?:')? choice ')' | '\' char | char
/// ```
///
/// Malformed input always yields a best-effort tree. In strict mode the
/// first anomaly is recorded and reported by [`Parser::error`].
#[derive(Debug, Default)]
pub struct SimpleParser {
    config: Config,
    last_error: Option<Error>,
}

impl SimpleParser {
    /// Creates a permissive parser, which never reports errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that records syntax anomalies.
    pub fn strict() -> Self {
        Self::with_config(Config {
            strict: true,
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            last_error: None,
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// First anomaly found by the most recent parse.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Like [`Parser::compile`], but fails with the first anomaly found.
    pub fn try_compile(&mut self, source: &str) -> Result<Nfa, Error> {
        let nfa = self.compile(source);
        match self.last_error.clone() {
            Some(err) => Err(err),
            None => Ok(nfa),
        }
    }
}

impl Parser for SimpleParser {
    fn parse(&mut self, source: &str) -> Option<Ast> {
        let mut reader = Reader::new(source, self.config);
        let ast = reader.parse();
        if let Some(err) = &reader.error {
            log::debug!("pattern {:?}: {}", source, err);
        }
        self.last_error = reader.error;
        ast
    }

    fn error(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Cursor over the pattern for a single parse.
struct Reader<'a> {
    pattern: &'a str,
    pos: usize,
    config: Config,
    depth: usize,
    error: Option<Error>,
}

impl<'a> Reader<'a> {
    fn new(pattern: &'a str, config: Config) -> Self {
        Self {
            pattern,
            pos: 0,
            config,
            depth: 0,
            error: None,
        }
    }

    /// Peek at the next character in the pattern without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    /// Advance the reader by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `expected` if it is the next character.
    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn report(&mut self, err: Error) {
        if self.config.strict && self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Entry point. A `)` without a matching `(` ends the parse; whatever
    /// follows it is ignored.
    fn parse(&mut self) -> Option<Ast> {
        if self.pattern.is_empty() {
            return None;
        }
        let ast = self.parse_choice();
        if self.peek() == Some(')') {
            self.report(Error::UnmatchedParenthesis { position: self.pos });
        }
        ast
    }

    /// Parse alternation (`|`). An empty alternative contributes no branch.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Choice([a, b, c])
    /// - Pattern: `a||b`  → Choice([a, b])
    /// - Pattern: `a|`    → a
    fn parse_choice(&mut self) -> Option<Ast> {
        let first = self.parse_concat();
        let mut empty_first = first.is_none();
        let mut branches: Vec<Ast> = first.into_iter().collect();
        let mut alternation = false;

        while self.peek() == Some('|') {
            let bar = self.pos;
            self.advance();
            if self.peek().is_none() {
                self.report(Error::EmptyAlternative { position: bar });
                break;
            }
            alternation = true;
            match self.parse_concat() {
                Some(branch) if !empty_first => branches.push(branch),
                branch => {
                    self.report(Error::EmptyAlternative { position: bar });
                    branches.extend(branch);
                    empty_first = false;
                }
            }
        }

        if alternation && branches.len() > 1 {
            Some(Ast::choice(branches))
        } else {
            branches.pop()
        }
    }

    /// Parse a sequence of primaries.
    ///
    /// Example:
    /// - Pattern: `abc` → Concat([a, b, c])
    /// - Pattern: `a`   → a
    fn parse_concat(&mut self) -> Option<Ast> {
        let mut items = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            items.extend(self.parse_primary());
        }
        if items.len() > 1 {
            Some(Ast::concat(items))
        } else {
            items.pop()
        }
    }

    fn parse_primary(&mut self) -> Option<Ast> {
        let atom = self.parse_atom();
        self.parse_quantifier(atom)
    }

    /// Parse an optional quantifier binding to `atom`. The next character
    /// is left alone unless it is a quantifier.
    ///
    /// Example:
    /// - Pattern: `a?` → Optional(a)
    /// - Pattern: `a*` → KleeneStar(a)
    /// - Pattern: `a+` → KleenePlus(a)
    fn parse_quantifier(&mut self, atom: Option<Ast>) -> Option<Ast> {
        let wrap: fn(Ast) -> Ast = match self.peek() {
            Some('?') => Ast::optional,
            Some('*') => Ast::kleene_star,
            Some('+') => Ast::kleene_plus,
            _ => return atom,
        };
        self.advance();
        atom.map(wrap)
    }

    /// Parse a single atom. Returns `None` for constructs that match
    /// nothing of their own: an empty group or a trailing backslash.
    ///
    /// Examples:
    /// - Pattern: `.`     → Leaf(Any)
    /// - Pattern: `\*`    → Leaf(Exact('*'))
    /// - Pattern: `[a-c]` → Leaf(Set)
    /// - Pattern: `(ab)`  → Subexpression(Concat(a, b))
    fn parse_atom(&mut self) -> Option<Ast> {
        let start = self.pos;
        match self.advance()? {
            '\\' => match self.advance() {
                Some(c) => Some(Ast::single_character(c)),
                None => {
                    self.report(Error::DanglingEscape { position: start });
                    None
                }
            },
            '.' => Some(Ast::any_character()),
            '[' => Some(self.parse_bracket(start)),
            '(' => self.parse_group(start),
            c @ ('?' | '*' | '+') => {
                self.report(Error::NothingToRepeat { position: start });
                Some(Ast::single_character(c))
            }
            c => Some(Ast::single_character(c)),
        }
    }

    /// Parse the rest of a group whose `(` sits at `start`.
    ///
    /// Example:
    /// - Pattern: `(a|b)`   → Subexpression(Choice(a, b))
    /// - Pattern: `(?:a|b)` → Choice(a, b)
    fn parse_group(&mut self, start: usize) -> Option<Ast> {
        if self.depth >= self.config.max_depth {
            self.report(Error::NestingTooDeep {
                position: start,
                limit: self.config.max_depth,
            });
            self.skip_group(start);
            return None;
        }

        self.depth += 1;
        let inner = self.parse_group_body(start);
        self.depth -= 1;
        inner
    }

    fn parse_group_body(&mut self, start: usize) -> Option<Ast> {
        let mut capture = true;
        let flag = self.pos;
        if self.expect('?') {
            if self.expect(':') {
                capture = false;
            } else {
                self.report(Error::UnknownGroupFlag { position: flag });
            }
        }

        let inner = self.parse_choice();
        if !self.expect(')') {
            self.report(Error::UnterminatedGroup { position: start });
        }
        if inner.is_none() {
            self.report(Error::EmptyGroup { position: start });
        }

        if capture {
            inner.map(Ast::subexpression)
        } else {
            inner
        }
    }

    /// Skips the rest of a group whose `(` sits at `start`, including any
    /// groups nested in it.
    fn skip_group(&mut self, start: usize) {
        let mut open = 1;
        while open > 0 {
            let at = self.pos;
            let Some(c) = self.advance() else {
                self.report(Error::UnterminatedGroup { position: start });
                return;
            };
            match c {
                '\\' => {
                    self.advance();
                }
                '[' => {
                    self.parse_bracket(at);
                }
                '(' => open += 1,
                ')' => open -= 1,
                _ => {}
            }
        }
    }

    /// Parse the rest of a bracket expression whose `[` sits at `start`.
    /// Reading stops at `]` or at the end of the pattern.
    ///
    /// Examples:
    /// - Pattern: `[abc]`  → members a, b, c
    /// - Pattern: `[^a-z]` → anything outside a..=z
    /// - Pattern: `[-a]`   → members -, a
    fn parse_bracket(&mut self, start: usize) -> Ast {
        let mut negated = false;
        let mut members = Vec::new();
        let mut ranges = Vec::new();

        if self.expect('^') {
            negated = true;
        } else if self.expect('-') {
            members.push('-');
        }

        loop {
            let at = self.pos;
            let Some(c) = self.advance() else {
                self.report(Error::UnterminatedBracket { position: start });
                break;
            };
            match c {
                ']' => break,
                '\\' => match self.advance() {
                    Some(escaped) => members.push(escaped),
                    None => {
                        self.report(Error::DanglingEscape { position: at });
                        members.push('\\');
                    }
                },
                _ if self.peek() == Some('-') => {
                    self.advance();
                    // The upper bound is taken verbatim, even if it is `]`.
                    if let Some(end) = self.advance() {
                        if c > end {
                            self.report(Error::InvalidRange {
                                position: at,
                                start: c,
                                end,
                            });
                        }
                        ranges.push(c..=end);
                    }
                }
                _ => members.push(c),
            }
        }

        Ast::Leaf(CharPredicate::Set {
            members,
            ranges,
            negated,
        })
    }
}
