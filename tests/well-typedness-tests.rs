use crypto_sheets_api::{
    errors::{JSONPathError, JSONPathErrorType},
    lexer::lex,
    parser::Parser,
};
use lazy_static::lazy_static;

lazy_static! {
    static ref PARSER: Parser = Parser::new();
}

fn parse(query: &str) -> Result<(), JSONPathError> {
    PARSER.parse(lex(query)?).map(|_| ())
}

macro_rules! assert_valid {
    ($($name:ident: $value:expr,)*) => {
    $(
        #[test]
        fn $name() -> Result<(), JSONPathError> {
            parse($value)
        }
    )*
    }
}

macro_rules! assert_type_error {
    ($($name:ident: $value:expr => $msg:expr,)*) => {
    $(
        #[test]
        fn $name() {
            let err = parse($value).unwrap_err();
            assert_eq!(err.kind, JSONPathErrorType::TypeError);
            assert_eq!(err.msg, $msg);
        }
    )*
    }
}

mod well_typed {
    use super::*;

    assert_valid! {
        length_of_singular_query: "$[?length(@.symbol) == 3]",
        count_of_wildcard: "$[?count(@.tags.*) > 1]",
        count_of_nested_filter: "$[?count(@.tickers[?@.volume > 0]) > 0]",
        match_with_literal_pattern: "$[?match(@.id, 'bit.*')]",
        search_with_root_pattern: "$[?search(@.name, $.pattern)]",
        value_of_descendants_compared: "$[?value(@..usd) > 100]",
        value_as_length_argument: "$[?length(value(@..symbol)) > 1]",
        existence: "$[?@.market_cap]",
        negated_existence: "$[?!@.market_cap]",
        without_leading_root: "[?@.current_price > 1]",
    }
}

mod ill_typed {
    use super::*;

    assert_type_error! {
        length_of_wildcard: "$[?length(@.*) < 3]"
            => "length() argument 0 must be of ValueType",
        count_of_literal: "$[?count(1) == 1]"
            => "count() argument 0 must be of NodesType",
        count_not_compared: "$[?count(@.tags.*)]"
            => "result of count() must be compared",
        match_compared: "$[?match(@.id, 'bit.*') == true]"
            => "result of match() is not comparable",
        match_of_wildcard: "$[?match(@.*, 'usd')]"
            => "match() argument 0 must be of ValueType",
        value_not_compared: "$[?value(@..usd)]"
            => "result of value() must be compared",
        comparison_as_value_argument: "$[?length(count(@.*) == 1) > 0]"
            => "length() argument 0 must be of ValueType",
        literal_not_compared: "$[?1]"
            => "filter expression literals must be compared",
        wildcard_compared: "$[?@.* > 1]"
            => "non-singular query is not comparable",
    }
}
