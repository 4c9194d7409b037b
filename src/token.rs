use core::fmt;

/// Returned by the lexer when it reads past the end of the query.
pub const EOQ: char = '\0';

/// Byte offsets of a token in the query string, end exclusive.
pub type Span = (usize, usize);

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    Eoq,
    Error { msg: Box<str> },

    // segments and selectors
    Colon,
    Comma,
    DoubleDot,
    Filter,
    Index { value: Box<str> },
    LBracket,
    Name { value: Box<str> },
    RBracket,
    Root,
    Wild,

    // filter expressions
    And,
    Current,
    DoubleQuoteString { value: Box<str> },
    Eq,
    False,
    Float { value: Box<str> },
    Function { name: Box<str> },
    Ge,
    Gt,
    Int { value: Box<str> },
    Le,
    LParen,
    Lt,
    Ne,
    Not,
    Null,
    Or,
    RParen,
    SingleQuoteString { value: Box<str> },
    True,
}

impl TokenType {
    /// Source text of tokens that always look the same.
    fn symbol(&self) -> Option<&'static str> {
        use TokenType::*;
        let s = match self {
            Colon => ":",
            Comma => ",",
            DoubleDot => "..",
            Filter => "?",
            LBracket => "[",
            RBracket => "]",
            Root => "$",
            Wild => "*",
            And => "&&",
            Current => "@",
            Eq => "==",
            False => "false",
            Ge => ">=",
            Gt => ">",
            Le => "<=",
            LParen => "(",
            Lt => "<",
            Ne => "!=",
            Not => "!",
            Null => "null",
            Or => "||",
            RParen => ")",
            True => "true",
            _ => return None,
        };
        Some(s)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = self.symbol() {
            return write!(f, "'{}'", symbol);
        }

        match self {
            TokenType::Eoq => f.write_str("end of query"),
            TokenType::Error { msg } => write!(f, "error: {}", msg),
            TokenType::Index { value }
            | TokenType::Name { value }
            | TokenType::Float { value }
            | TokenType::Int { value } => write!(f, "'{}'", value),
            TokenType::Function { name } => write!(f, "'{}('", name),
            TokenType::DoubleQuoteString { value } => write!(f, "'\"{}\"'", value),
            TokenType::SingleQuoteString { value } => write!(f, "\"'{}'\"", value),
            _ => Ok(()),
        }
    }
}

/// A JSONPath expression token, as produced by the lexer.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenType, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: (start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_symbols() {
        assert_eq!(TokenType::Le.to_string(), "'<='");
        assert_eq!(TokenType::Or.to_string(), "'||'");
        assert_eq!(TokenType::Eoq.to_string(), "end of query");
    }

    #[test]
    fn display_values() {
        let name = TokenType::Function {
            name: "count".into(),
        };
        assert_eq!(name.to_string(), "'count('");

        let quoted = TokenType::SingleQuoteString {
            value: "usd".into(),
        };
        assert_eq!(quoted.to_string(), "\"'usd'\"");
    }
}
