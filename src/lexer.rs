//! A JSONPath tokenizer.
//!
//! The lexer is a small state machine. Each state consumes some input,
//! emits zero or more tokens and returns the next state. Lexing stops at the
//! end of the query or at the first error, in which case the last token in
//! the output is a [`TokenType::Error`].
//!
//! Queries may omit the leading `$`. A query that starts with a name, a
//! bracketed selection, a wildcard or a descendant segment is lexed as if it
//! were preceded by an implicit root identifier, so `ethereum.aud` and
//! `$.ethereum.aud` produce the same segments.
use std::str::CharIndices;

use crate::{
    errors::JSONPathError,
    token::{Token, TokenType, EOQ},
};

/// Where a quoted string appears, and so where lexing resumes after it.
#[derive(Debug, Clone, Copy)]
enum Context {
    Bracketed,
    Filter,
}

enum State {
    Done,
    Root,
    ImplicitRoot,
    Segment,
    Descendant,
    Shorthand,
    Bracketed,
    Filter,
    Quoted { quote: char, context: Context },
}

/// A function call whose closing parenthesis has not been seen yet.
struct Call {
    filter_depth: u32,
    parens: u32,
}

struct Lexer<'q> {
    query: &'q str,
    chars: CharIndices<'q>,
    tokens: Vec<Token>,

    start: usize,
    pos: usize,

    filter_depth: u32,
    calls: Vec<Call>,
}

/// Split `query` into tokens. The last token is either `Eoq` or an `Error`.
pub fn tokenize(query: &str) -> Vec<Token> {
    Lexer::new(query).run()
}

/// Like [`tokenize`], but a lexing error is returned as a [`JSONPathError`].
pub fn lex(query: &str) -> Result<Vec<Token>, JSONPathError> {
    let tokens = tokenize(query);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            span,
        }) => Err(JSONPathError::lexer(msg.to_string(), *span)),
        _ => Ok(tokens),
    }
}

impl<'q> Lexer<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            chars: query.char_indices(),
            tokens: Vec::new(),
            start: 0,
            pos: 0,
            filter_depth: 0,
            calls: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut state = State::Root;
        loop {
            state = match state {
                State::Done => break,
                State::Root => self.root(),
                State::ImplicitRoot => self.implicit_root(),
                State::Segment => self.segment(),
                State::Descendant => self.descendant(),
                State::Shorthand => self.shorthand(),
                State::Bracketed => self.bracketed(),
                State::Filter => self.filter(),
                State::Quoted { quote, context } => self.quoted(quote, context),
            };
        }
        self.tokens
    }

    // Input handling

    fn next(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();
        Some(ch)
    }

    fn peek(&self) -> char {
        self.chars.clone().next().map_or(EOQ, |(_, ch)| ch)
    }

    fn accept(&mut self, ch: char) -> bool {
        self.accept_if(|c| c == ch)
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        let ok = pred(self.peek());
        if ok {
            self.next();
        }
        ok
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while self.accept_if(&pred) {
            accepted = true;
        }
        accepted
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    /// Skip whitespace, reporting whether there was any.
    fn skip_whitespace(&mut self) -> bool {
        debug_assert_eq!(self.pos, self.start, "unemitted input");
        let skipped = self.accept_run(is_whitespace_char);
        self.ignore();
        skipped
    }

    fn value(&self) -> &str {
        self.query.get(self.start..self.pos).unwrap_or_default()
    }

    // Output

    fn emit(&mut self, kind: TokenType) {
        self.tokens.push(Token::new(kind, self.start, self.pos));
        self.start = self.pos;
    }

    /// Emit a token built from the pending input.
    fn emit_value(&mut self, make: impl FnOnce(Box<str>) -> TokenType) {
        let value: Box<str> = self.value().into();
        self.emit(make(value));
    }

    /// Consume one character and emit it as `kind`.
    fn bump(&mut self, kind: TokenType) {
        self.next();
        self.emit(kind);
    }

    fn error(&mut self, msg: impl Into<Box<str>>) -> State {
        self.emit(TokenType::Error { msg: msg.into() });
        State::Done
    }

    // Function call tracking

    /// Are we directly inside the argument list of a function call?
    fn in_call(&self) -> bool {
        self.calls
            .last()
            .is_some_and(|call| call.filter_depth == self.filter_depth)
    }

    fn current_call(&mut self) -> Option<&mut Call> {
        let depth = self.filter_depth;
        self.calls
            .last_mut()
            .filter(|call| call.filter_depth == depth)
    }

    fn open_paren(&mut self) {
        if let Some(call) = self.current_call() {
            call.parens += 1;
        }
    }

    fn close_paren(&mut self) {
        if let Some(call) = self.current_call() {
            call.parens -= 1;
            if call.parens == 0 {
                self.calls.pop();
            }
        }
    }

    // States

    fn root(&mut self) -> State {
        if self.accept('$') {
            self.emit(TokenType::Root);
            State::Segment
        } else {
            State::ImplicitRoot
        }
    }

    fn implicit_root(&mut self) -> State {
        match self.peek() {
            EOQ => self.error("empty query"),
            '[' => {
                self.bump(TokenType::LBracket);
                State::Bracketed
            }
            '*' => {
                self.bump(TokenType::Wild);
                State::Segment
            }
            '.' => {
                self.next();
                self.dots()
            }
            ch if is_name_first(ch) => self.name(),
            ch => {
                self.next();
                self.error(format!("unexpected character '{}'", ch))
            }
        }
    }

    fn segment(&mut self) -> State {
        if self.skip_whitespace() && self.peek() == EOQ {
            return self.error("unexpected trailing whitespace");
        }

        match self.peek() {
            '.' => {
                self.next();
                self.dots()
            }
            '[' => {
                self.bump(TokenType::LBracket);
                State::Bracketed
            }
            _ if self.filter_depth > 0 => State::Filter,
            EOQ => {
                self.emit(TokenType::Eoq);
                State::Done
            }
            _ => {
                let found = self.next().unwrap_or(EOQ);
                self.error(format!(
                    "expected '.', '..' or a bracketed selection, found '{}'",
                    found
                ))
            }
        }
    }

    /// Called with one dot consumed.
    fn dots(&mut self) -> State {
        if self.accept('.') {
            self.emit(TokenType::DoubleDot);
            State::Descendant
        } else {
            State::Shorthand
        }
    }

    fn name(&mut self) -> State {
        self.accept_run(is_name_char);
        self.emit_value(|value| TokenType::Name { value });
        State::Segment
    }

    fn descendant(&mut self) -> State {
        match self.peek() {
            '*' => {
                self.bump(TokenType::Wild);
                State::Segment
            }
            '[' => {
                self.bump(TokenType::LBracket);
                State::Bracketed
            }
            ch if is_name_first(ch) => self.name(),
            _ => match self.next() {
                Some(ch) => self.error(format!("unexpected descendant selection token '{}'", ch)),
                None => self.error("bald descendant segment"),
            },
        }
    }

    fn shorthand(&mut self) -> State {
        self.ignore(); // the dot

        if self.accept_run(is_whitespace_char) {
            return self.error("unexpected whitespace after dot");
        }

        match self.peek() {
            '*' => {
                self.bump(TokenType::Wild);
                State::Segment
            }
            ch if is_name_first(ch) => self.name(),
            _ => match self.next() {
                Some(ch) => self.error(format!("unexpected shorthand selector '{}'", ch)),
                None => self.error("unexpected trailing dot"),
            },
        }
    }

    fn bracketed(&mut self) -> State {
        self.skip_whitespace();

        match self.peek() {
            ']' => {
                self.bump(TokenType::RBracket);
                if self.filter_depth > 0 {
                    State::Filter
                } else {
                    State::Segment
                }
            }
            '*' => {
                self.bump(TokenType::Wild);
                State::Bracketed
            }
            '?' => {
                self.bump(TokenType::Filter);
                self.filter_depth += 1;
                State::Filter
            }
            ',' => {
                self.bump(TokenType::Comma);
                State::Bracketed
            }
            ':' => {
                self.bump(TokenType::Colon);
                State::Bracketed
            }
            quote @ ('\'' | '"') => {
                self.next();
                State::Quoted {
                    quote,
                    context: Context::Bracketed,
                }
            }
            '-' => {
                self.next();
                if self.accept_run(is_digit) {
                    self.emit_value(|value| TokenType::Index { value });
                    State::Bracketed
                } else {
                    let found = self.peek();
                    self.error(format!("expected a digit after '-', found '{}'", found))
                }
            }
            EOQ => self.error("unclosed bracketed selection"),
            ch if is_digit(ch) => {
                self.accept_run(is_digit);
                self.emit_value(|value| TokenType::Index { value });
                State::Bracketed
            }
            ch => {
                self.next();
                self.error(format!("unexpected '{}' in bracketed selection", ch))
            }
        }
    }

    fn filter(&mut self) -> State {
        self.skip_whitespace();

        match self.peek() {
            EOQ => self.error("unclosed bracketed selection"),
            ']' if self.in_call() => {
                self.next();
                self.error("unbalanced parentheses")
            }
            ']' => {
                self.filter_depth -= 1;
                State::Bracketed
            }
            ',' => {
                self.bump(TokenType::Comma);
                // Separates arguments inside a call, selectors otherwise.
                if self.in_call() {
                    State::Filter
                } else {
                    self.filter_depth -= 1;
                    State::Bracketed
                }
            }
            quote @ ('\'' | '"') => {
                self.next();
                State::Quoted {
                    quote,
                    context: Context::Filter,
                }
            }
            '(' => {
                self.bump(TokenType::LParen);
                self.open_paren();
                State::Filter
            }
            ')' => {
                self.bump(TokenType::RParen);
                self.close_paren();
                State::Filter
            }
            '$' => {
                self.bump(TokenType::Root);
                State::Segment
            }
            '@' => {
                self.bump(TokenType::Current);
                State::Segment
            }
            '.' => State::Segment,
            '!' => self.operator('=', TokenType::Ne, TokenType::Not),
            '<' => self.operator('=', TokenType::Le, TokenType::Lt),
            '>' => self.operator('=', TokenType::Ge, TokenType::Gt),
            '=' => self.doubled(TokenType::Eq, "expected '==', found '='"),
            '&' => self.doubled(TokenType::And, "unexpected '&', did you mean '&&'?"),
            '|' => self.doubled(TokenType::Or, "unexpected '|', did you mean '||'?"),
            '-' => {
                self.next();
                self.number()
            }
            ch if is_digit(ch) => self.number(),
            ch if is_function_name_first(ch) => self.keyword_or_function(),
            ch => {
                self.next();
                self.error(format!("unexpected filter expression token '{}'", ch))
            }
        }
    }

    /// A one character operator, or a two character one if `second` follows.
    fn operator(&mut self, second: char, long: TokenType, short: TokenType) -> State {
        self.next();
        let kind = if self.accept(second) { long } else { short };
        self.emit(kind);
        State::Filter
    }

    /// An operator written as the same character twice.
    fn doubled(&mut self, kind: TokenType, msg: &str) -> State {
        let first = self.next();
        if first.is_some_and(|ch| self.accept(ch)) {
            self.emit(kind);
            State::Filter
        } else {
            self.error(msg)
        }
    }

    fn keyword_or_function(&mut self) -> State {
        self.accept_run(is_function_name_char);

        let keyword = match self.value() {
            "true" => Some(TokenType::True),
            "false" => Some(TokenType::False),
            "null" => Some(TokenType::Null),
            _ => None,
        };

        match keyword {
            Some(kind) => {
                self.emit(kind);
                State::Filter
            }
            None if self.peek() == '(' => {
                self.calls.push(Call {
                    filter_depth: self.filter_depth,
                    parens: 1,
                });
                self.emit_value(|name| TokenType::Function { name });
                self.next();
                self.ignore(); // the left paren
                State::Filter
            }
            None => {
                let msg = format!(
                    "expected a keyword or function call, found '{}'",
                    self.value()
                );
                self.error(msg)
            }
        }
    }

    fn number(&mut self) -> State {
        if !self.accept_run(is_digit) {
            let found = self.peek();
            return self.error(format!("expected a digit, found '{}'", found));
        }

        let mut is_float = false;

        if self.accept('.') {
            if !self.accept_run(is_digit) {
                return self.error("a fractional digit is required after a decimal point");
            }
            is_float = true;
        }

        if self.accept_if(|ch| ch == 'e' || ch == 'E') {
            // a negative exponent always makes a float
            if self.accept('-') {
                is_float = true;
            } else {
                self.accept('+');
            }
            if !self.accept_run(is_digit) {
                return self.error("at least one exponent digit is required");
            }
        }

        if is_float {
            self.emit_value(|value| TokenType::Float { value });
        } else {
            self.emit_value(|value| TokenType::Int { value });
        }

        State::Filter
    }

    /// Called with the opening quote consumed.
    fn quoted(&mut self, quote: char, context: Context) -> State {
        self.ignore();

        loop {
            match self.peek() {
                '\\' => {
                    self.next();
                    if !self.accept_if(|c| is_escape_char(c) || c == quote) {
                        return self.error("invalid escape sequence");
                    }
                }
                EOQ => {
                    let msg = format!("unclosed string starting at index {}", self.start);
                    return self.error(msg);
                }
                ch if ch == quote => break,
                _ => {
                    self.next();
                }
            }
        }

        if quote == '\'' {
            self.emit_value(|value| TokenType::SingleQuoteString { value });
        } else {
            self.emit_value(|value| TokenType::DoubleQuoteString { value });
        }
        self.next();
        self.ignore(); // the closing quote

        match context {
            Context::Bracketed => State::Bracketed,
            Context::Filter => State::Filter,
        }
    }
}

fn is_name_first(ch: char) -> bool {
    // Surrogate code points can't be a char, so everything from 0x80 up is allowed.
    ch.is_ascii_alphabetic() || ch == '_' || ch as u32 >= 0x80
}

// Hyphens may appear after the first character, so kebab-case keys like
// `jsonpath-error` work as shorthand names.
fn is_name_char(ch: char) -> bool {
    is_digit(ch) || is_name_first(ch) || ch == '-'
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_function_name_first(ch: char) -> bool {
    ch.is_ascii_lowercase()
}

fn is_function_name_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, 'b' | 'f' | 'n' | 'r' | 't' | 'u' | '/' | '\\')
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}
