use std::{collections::HashMap, iter::Peekable, ops::RangeInclusive, str::Chars, vec::IntoIter};

use crate::{
    errors::JSONPathError,
    filter::{ComparisonOperator, FilterExpression, LogicalOperator},
    function::{signatures, ExpressionType, FunctionSignature},
    query::Query,
    segment::Segment,
    selector::Selector,
    standard_functions,
    token::{Token, TokenType},
};

use TokenType::*;

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_LOGICAL_OR: u8 = 3;
const PRECEDENCE_LOGICAL_AND: u8 = 4;
const PRECEDENCE_RELATIONAL: u8 = 5;
const PRECEDENCE_LOGICAL_NOT: u8 = 7;

/// How deeply filter expressions may nest, counting parentheses, `!`,
/// function calls and filters inside filter queries.
pub const MAX_FILTER_DEPTH: usize = 128;

/// A token iterator that keeps yielding an end of query token once the
/// underlying tokens are exhausted.
struct Tokens {
    it: Peekable<IntoIter<Token>>,
    eoq: Token,
    depth: usize,
}

impl Tokens {
    fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map(|t| t.span.1).unwrap_or_default();
        Self {
            it: tokens.into_iter().peekable(),
            eoq: Token::new(Eoq, end, end),
            depth: 0,
        }
    }

    fn next(&mut self) -> Token {
        match self.it.next() {
            Some(token) => token,
            None => self.eoq.clone(),
        }
    }

    fn peek(&mut self) -> &Token {
        match self.it.peek() {
            Some(token) => token,
            None => &self.eoq,
        }
    }

    fn peek_kind(&mut self) -> &TokenType {
        &self.peek().kind
    }

    /// Go one level deeper into a filter expression tree.
    fn descend(&mut self, span: (usize, usize)) -> Result<(), JSONPathError> {
        if self.depth >= MAX_FILTER_DEPTH {
            return Err(JSONPathError::syntax(
                String::from("maximum filter nesting depth exceeded"),
                span,
            ));
        }
        self.depth += 1;
        Ok(())
    }
}

pub struct Parser {
    pub index_range: RangeInclusive<i64>,
    pub functions: HashMap<String, FunctionSignature>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            index_range: ((-2_i64).pow(53) + 1..=2_i64.pow(53) - 1),
            functions: signatures(&standard_functions::register()),
        }
    }

    /// Build a query from `tokens`. A leading `$` is optional.
    pub fn parse(&self, tokens: Vec<Token>) -> Result<Query, JSONPathError> {
        let mut it = Tokens::new(tokens);

        if *it.peek_kind() == Root {
            it.next();
        }

        let segments = self.parse_segments(&mut it)?;

        match it.next() {
            Token { kind: Eoq, .. } => Ok(Query::new(segments)),
            token => Err(JSONPathError::syntax(
                format!("expected end of query, found {}", token.kind),
                token.span,
            )),
        }
    }

    fn parse_segments(&self, it: &mut Tokens) -> Result<Vec<Segment>, JSONPathError> {
        let mut segments: Vec<Segment> = Vec::new();

        loop {
            match it.peek_kind() {
                DoubleDot => {
                    let token = it.next();
                    let selectors = self.parse_selectors(it)?;
                    if selectors.is_empty() {
                        return Err(JSONPathError::syntax(
                            String::from("bald descendant segment"),
                            token.span,
                        ));
                    }
                    segments.push(Segment::Recursive { selectors });
                }
                LBracket | Name { .. } | Wild => {
                    let selectors = self.parse_selectors(it)?;
                    segments.push(Segment::Child { selectors });
                }
                _ => break,
            }
        }

        Ok(segments)
    }

    fn parse_selectors(&self, it: &mut Tokens) -> Result<Vec<Selector>, JSONPathError> {
        match it.peek_kind() {
            Name { .. } => match it.next().kind {
                Name { value } => Ok(vec![Selector::Name {
                    name: value.into_string(),
                }]),
                _ => Ok(Vec::new()),
            },
            Wild => {
                it.next();
                Ok(vec![Selector::Wild])
            }
            LBracket => self.parse_bracketed(it),
            _ => Ok(Vec::new()),
        }
    }

    fn parse_bracketed(&self, it: &mut Tokens) -> Result<Vec<Selector>, JSONPathError> {
        let open = it.next(); // LBracket
        let mut selectors: Vec<Selector> = Vec::new();

        loop {
            let token = it.next();
            let selector = match &token.kind {
                RBracket if selectors.is_empty() => {
                    return Err(JSONPathError::syntax(
                        String::from("empty bracketed selection"),
                        (open.span.0, token.span.1),
                    ));
                }
                RBracket => {
                    return Err(JSONPathError::syntax(
                        String::from("unexpected trailing comma"),
                        token.span,
                    ));
                }
                Index { .. } | Colon => self.parse_slice_or_index(it, &token)?,
                DoubleQuoteString { value } => Selector::Name {
                    name: unescape(value, '"', token.span)?,
                },
                SingleQuoteString { value } => Selector::Name {
                    name: unescape(value, '\'', token.span)?,
                },
                Wild => Selector::Wild,
                Filter => self.parse_filter(it, &token)?,
                Eoq => {
                    return Err(JSONPathError::syntax(
                        String::from("unclosed bracketed selection"),
                        (open.span.0, token.span.1),
                    ));
                }
                kind => {
                    return Err(JSONPathError::syntax(
                        format!("unexpected {} in bracketed selection", kind),
                        token.span,
                    ));
                }
            };

            selectors.push(selector);

            let token = it.next();
            match token.kind {
                RBracket => break,
                Comma => continue,
                Eoq => {
                    return Err(JSONPathError::syntax(
                        String::from("unclosed bracketed selection"),
                        (open.span.0, token.span.1),
                    ));
                }
                kind => {
                    return Err(JSONPathError::syntax(
                        format!("expected a comma or closing bracket, found {}", kind),
                        token.span,
                    ));
                }
            }
        }

        Ok(selectors)
    }

    fn parse_slice_or_index(
        &self,
        it: &mut Tokens,
        token: &Token,
    ) -> Result<Selector, JSONPathError> {
        if let Index { value } = &token.kind {
            if *it.peek_kind() != Colon {
                return Ok(Selector::Index {
                    index: self.parse_index(value, token.span)?,
                });
            }
        }

        let mut start: Option<i64> = None;
        let mut stop: Option<i64> = None;
        let mut step: Option<i64> = None;

        if let Index { value } = &token.kind {
            start = Some(self.parse_index(value, token.span)?);
            it.next(); // colon
        }

        if matches!(it.peek_kind(), Index { .. }) {
            let token = it.next();
            if let Index { value } = &token.kind {
                stop = Some(self.parse_index(value, token.span)?);
            }
        }

        if *it.peek_kind() == Colon {
            it.next();
            if matches!(it.peek_kind(), Index { .. }) {
                let token = it.next();
                if let Index { value } = &token.kind {
                    step = Some(self.parse_index(value, token.span)?);
                }
            }
        }

        Ok(Selector::Slice { start, stop, step })
    }

    fn parse_index(&self, value: &str, span: (usize, usize)) -> Result<i64, JSONPathError> {
        if value.len() > 1 && (value.starts_with('0') || value.starts_with("-0")) {
            return Err(JSONPathError::syntax(
                format!("invalid index '{}'", value),
                span,
            ));
        }

        let index = value
            .parse::<i64>()
            .map_err(|_| JSONPathError::syntax(String::from("index out of range"), span))?;

        if !self.index_range.contains(&index) {
            return Err(JSONPathError::syntax(
                String::from("index out of range"),
                span,
            ));
        }

        Ok(index)
    }

    fn parse_filter(&self, it: &mut Tokens, token: &Token) -> Result<Selector, JSONPathError> {
        let span = (token.span.0, it.peek().span.1);
        let expr = self.parse_filter_expression(it, PRECEDENCE_LOWEST)?;
        self.assert_test_expression(&expr, span)?;

        Ok(Selector::Filter {
            expression: Box::new(expr),
        })
    }

    fn parse_not_expression(
        &self,
        it: &mut Tokens,
        span: (usize, usize),
    ) -> Result<FilterExpression, JSONPathError> {
        let expr = self.parse_filter_expression(it, PRECEDENCE_LOGICAL_NOT)?;
        self.assert_test_expression(&expr, span)?;
        Ok(FilterExpression::Not {
            expression: Box::new(expr),
        })
    }

    fn parse_infix_expression(
        &self,
        it: &mut Tokens,
        left: FilterExpression,
    ) -> Result<FilterExpression, JSONPathError> {
        let token = it.next();
        let precedence = self.precedence(&token.kind);
        let right = self.parse_filter_expression(it, precedence)?;

        let operator = match token.kind {
            And | Or => {
                self.assert_test_expression(&left, token.span)?;
                self.assert_test_expression(&right, token.span)?;
                return Ok(FilterExpression::Logical {
                    left: Box::new(left),
                    operator: if token.kind == And {
                        LogicalOperator::And
                    } else {
                        LogicalOperator::Or
                    },
                    right: Box::new(right),
                });
            }
            Eq => ComparisonOperator::Eq,
            Ge => ComparisonOperator::Ge,
            Gt => ComparisonOperator::Gt,
            Le => ComparisonOperator::Le,
            Lt => ComparisonOperator::Lt,
            Ne => ComparisonOperator::Ne,
            kind => {
                return Err(JSONPathError::syntax(
                    format!("unexpected infix operator {}", kind),
                    token.span,
                ))
            }
        };

        self.assert_comparable(&left, token.span)?;
        self.assert_comparable(&right, token.span)?;

        Ok(FilterExpression::Comparison {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(
        &self,
        it: &mut Tokens,
        span: (usize, usize),
    ) -> Result<FilterExpression, JSONPathError> {
        let expr = self.parse_filter_expression(it, PRECEDENCE_LOWEST)?;
        let token = it.next();

        match token.kind {
            RParen => Ok(expr),
            Eoq | RBracket => Err(JSONPathError::syntax(
                String::from("unbalanced parentheses"),
                (span.0, token.span.1),
            )),
            kind => Err(JSONPathError::syntax(
                format!("expected ')', found {}", kind),
                token.span,
            )),
        }
    }

    fn parse_basic_expression(&self, it: &mut Tokens) -> Result<FilterExpression, JSONPathError> {
        let token = it.next();
        it.descend(token.span)?;
        let expr = self.parse_primary(it, token);
        it.depth -= 1;
        expr
    }

    fn parse_primary(
        &self,
        it: &mut Tokens,
        token: Token,
    ) -> Result<FilterExpression, JSONPathError> {
        match token.kind {
            DoubleQuoteString { value } => Ok(FilterExpression::String {
                value: unescape(&value, '"', token.span)?,
            }),
            SingleQuoteString { value } => Ok(FilterExpression::String {
                value: unescape(&value, '\'', token.span)?,
            }),
            True => Ok(FilterExpression::True),
            False => Ok(FilterExpression::False),
            Null => Ok(FilterExpression::Null),
            Int { value } => Ok(FilterExpression::Int {
                value: parse_int(&value, token.span)?,
            }),
            Float { value } => Ok(FilterExpression::Float {
                value: parse_float(&value, token.span)?,
            }),
            Function { name } => self.parse_function_call(it, name.into_string(), token.span),
            Root => Ok(FilterExpression::RootQuery {
                query: Box::new(Query::new(self.parse_segments(it)?)),
            }),
            Current => Ok(FilterExpression::RelativeQuery {
                query: Box::new(Query::new(self.parse_segments(it)?)),
            }),
            LParen => self.parse_grouped_expression(it, token.span),
            Not => self.parse_not_expression(it, token.span),
            kind => Err(JSONPathError::syntax(
                format!("expected a filter expression, found {}", kind),
                token.span,
            )),
        }
    }

    fn parse_function_call(
        &self,
        it: &mut Tokens,
        name: String,
        span: (usize, usize),
    ) -> Result<FilterExpression, JSONPathError> {
        let mut args: Vec<FilterExpression> = Vec::new();

        loop {
            if *it.peek_kind() == RParen {
                let token = it.next();
                if !args.is_empty() {
                    return Err(JSONPathError::syntax(
                        String::from("unexpected trailing comma"),
                        token.span,
                    ));
                }
                break;
            }

            let mut expr = self.parse_basic_expression(it)?;
            let depth = it.depth;

            while is_infix(it.peek_kind()) {
                let span = it.peek().span;
                it.descend(span)?;
                expr = self.parse_infix_expression(it, expr)?;
            }

            it.depth = depth;

            args.push(expr);

            let token = it.next();
            match token.kind {
                RParen => break,
                Comma => continue,
                Eoq | RBracket => {
                    return Err(JSONPathError::syntax(
                        String::from("unbalanced parentheses"),
                        (span.0, token.span.1),
                    ));
                }
                kind => {
                    return Err(JSONPathError::syntax(
                        format!("expected a comma or closing parenthesis, found {}", kind),
                        token.span,
                    ));
                }
            }
        }

        self.assert_well_typed(&name, &args, span)?;
        Ok(FilterExpression::Function { name, args })
    }

    fn parse_filter_expression(
        &self,
        it: &mut Tokens,
        precedence: u8,
    ) -> Result<FilterExpression, JSONPathError> {
        let mut left = self.parse_basic_expression(it)?;
        let depth = it.depth;

        loop {
            // Operators of equal precedence associate to the left.
            let kind = it.peek_kind();
            if !is_infix(kind) || self.precedence(kind) <= precedence {
                break;
            }

            // Each operator nests `left` one level deeper.
            let span = it.peek().span;
            it.descend(span)?;
            left = self.parse_infix_expression(it, left)?;
        }

        it.depth = depth;
        Ok(left)
    }

    fn precedence(&self, kind: &TokenType) -> u8 {
        match kind {
            And => PRECEDENCE_LOGICAL_AND,
            Eq | Ge | Gt | Le | Lt | Ne => PRECEDENCE_RELATIONAL,
            Not => PRECEDENCE_LOGICAL_NOT,
            Or => PRECEDENCE_LOGICAL_OR,
            _ => PRECEDENCE_LOWEST,
        }
    }

    fn return_type(&self, name: &str) -> Option<ExpressionType> {
        self.functions.get(name).map(|sig| sig.return_type)
    }

    /// Filter selectors, logical operands and `!` operands must produce a
    /// logical result or a node list.
    fn assert_test_expression(
        &self,
        expr: &FilterExpression,
        span: (usize, usize),
    ) -> Result<(), JSONPathError> {
        match expr {
            FilterExpression::Function { name, .. }
                if self.return_type(name) == Some(ExpressionType::Value) =>
            {
                Err(JSONPathError::typ(
                    format!("result of {}() must be compared", name),
                    span,
                ))
            }
            expr if expr.is_literal() => Err(JSONPathError::typ(
                String::from("filter expression literals must be compared"),
                span,
            )),
            _ => Ok(()),
        }
    }

    fn assert_comparable(
        &self,
        expr: &FilterExpression,
        span: (usize, usize),
    ) -> Result<(), JSONPathError> {
        match expr {
            FilterExpression::RelativeQuery { query } | FilterExpression::RootQuery { query } => {
                if query.is_singular() {
                    Ok(())
                } else {
                    Err(JSONPathError::typ(
                        String::from("non-singular query is not comparable"),
                        span,
                    ))
                }
            }
            FilterExpression::Function { name, .. } => {
                if self.return_type(name) == Some(ExpressionType::Value) {
                    Ok(())
                } else {
                    Err(JSONPathError::typ(
                        format!("result of {}() is not comparable", name),
                        span,
                    ))
                }
            }
            expr if expr.is_literal() => Ok(()),
            _ => Err(JSONPathError::typ(
                String::from("expression is not comparable"),
                span,
            )),
        }
    }

    fn assert_well_typed(
        &self,
        name: &str,
        args: &[FilterExpression],
        span: (usize, usize),
    ) -> Result<(), JSONPathError> {
        let sig = self.functions.get(name).ok_or_else(|| {
            JSONPathError::name(format!("unknown function `{}`", name), span)
        })?;

        let expected = sig.param_types.len();
        if args.len() != expected {
            return Err(JSONPathError::typ(
                format!(
                    "{}() takes {} argument{} but {} {} given",
                    name,
                    expected,
                    if expected == 1 { "" } else { "s" },
                    args.len(),
                    if args.len() == 1 { "was" } else { "were" },
                ),
                span,
            ));
        }

        for (i, (typ, arg)) in sig.param_types.iter().zip(args).enumerate() {
            let ok = match typ {
                ExpressionType::Value => match arg {
                    FilterExpression::RelativeQuery { query }
                    | FilterExpression::RootQuery { query } => query.is_singular(),
                    FilterExpression::Function { name, .. } => {
                        self.return_type(name) == Some(ExpressionType::Value)
                    }
                    arg => arg.is_literal(),
                },
                ExpressionType::Logical => match arg {
                    FilterExpression::Function { name, .. } => matches!(
                        self.return_type(name),
                        Some(ExpressionType::Logical | ExpressionType::Nodes)
                    ),
                    arg => !arg.is_literal(),
                },
                ExpressionType::Nodes => match arg {
                    FilterExpression::RelativeQuery { .. } | FilterExpression::RootQuery { .. } => {
                        true
                    }
                    FilterExpression::Function { name, .. } => {
                        self.return_type(name) == Some(ExpressionType::Nodes)
                    }
                    _ => false,
                },
            };

            if !ok {
                return Err(JSONPathError::typ(
                    format!("{}() argument {} must be of {:?}Type", name, i, typ),
                    span,
                ));
            }
        }

        Ok(())
    }
}

fn is_infix(kind: &TokenType) -> bool {
    matches!(kind, Eq | Ge | Gt | Le | Lt | Ne | And | Or)
}

/// Reject leading zeros in number literals. `-0` is allowed.
fn assert_no_leading_zero(value: &str, span: (usize, usize)) -> Result<(), JSONPathError> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut chars = digits.chars();
    if chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
        Err(JSONPathError::syntax(
            String::from("unexpected leading zero in number literal"),
            span,
        ))
    } else {
        Ok(())
    }
}

// i64::MAX isn't representable as an f64, so the upper bound is exclusive.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F: f64 = 9_223_372_036_854_775_808.0;

fn parse_int(value: &str, span: (usize, usize)) -> Result<i64, JSONPathError> {
    assert_no_leading_zero(value, span)?;
    match value.parse::<i64>() {
        Ok(i) => Ok(i),
        // Integers with an exponent, like `1e2`.
        Err(_) => value
            .parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && (I64_MIN_F..I64_MAX_F).contains(f))
            .map(|f| f as i64)
            .ok_or_else(|| JSONPathError::syntax(String::from("invalid integer literal"), span)),
    }
}

fn parse_float(value: &str, span: (usize, usize)) -> Result<f64, JSONPathError> {
    assert_no_leading_zero(value, span)?;
    value
        .parse::<f64>()
        .map_err(|_| JSONPathError::syntax(String::from("invalid float literal"), span))
}

/// Decode escape sequences in a string literal that was delimited by `quote`.
fn unescape(value: &str, quote: char, span: (usize, usize)) -> Result<String, JSONPathError> {
    let mut rv = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(q) if q == quote => rv.push(q),
                Some('\\') => rv.push('\\'),
                Some('/') => rv.push('/'),
                Some('b') => rv.push('\x08'),
                Some('f') => rv.push('\x0C'),
                Some('n') => rv.push('\n'),
                Some('r') => rv.push('\r'),
                Some('t') => rv.push('\t'),
                Some('u') => rv.push(unescape_code_point(&mut chars, span)?),
                _ => {
                    return Err(JSONPathError::syntax(String::from("invalid escape"), span));
                }
            },
            c if (c as u32) <= 0x1F => {
                return Err(JSONPathError::syntax(
                    String::from("invalid character"),
                    span,
                ));
            }
            c => rv.push(c),
        }
    }

    Ok(rv)
}

fn unescape_code_point(chars: &mut Chars, span: (usize, usize)) -> Result<char, JSONPathError> {
    let invalid = || JSONPathError::syntax(String::from("invalid \\uXXXX escape"), span);
    let high = hex_digits(chars).ok_or_else(invalid)?;

    let code_point = match high {
        0xD800..=0xDBFF => {
            if chars.next() != Some('\\') || chars.next() != Some('u') {
                return Err(invalid());
            }
            let low = hex_digits(chars).ok_or_else(invalid)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(invalid());
            }
            0x10000 + (((high & 0x03FF) << 10) | (low & 0x03FF))
        }
        0xDC00..=0xDFFF => return Err(invalid()),
        code_point => code_point,
    };

    char::from_u32(code_point).ok_or_else(invalid)
}

fn hex_digits(chars: &mut Chars) -> Option<u32> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(&digits, 16).ok()
    } else {
        None
    }
}
