use crypto_sheets_api::find;
use serde::Deserialize;
use serde_json::Value;

const MARKETS: &str = r#"
[
    {"id": "bitcoin", "symbol": "btc", "current_price": 67187.12, "market_cap_rank": 1, "tags": ["pow", "store-of-value"]},
    {"id": "ethereum", "symbol": "eth", "current_price": 3456.78, "market_cap_rank": 2, "tags": ["pos", "smart-contracts"]},
    {"id": "tether", "symbol": "usdt", "current_price": 1.0, "market_cap_rank": 3, "tags": []},
    {"id": "wrapped-bitcoin", "symbol": "wbtc", "current_price": 67150.0, "market_cap_rank": 15, "tags": ["wrapped"]}
]"#;

const CASES: &str = r#"
[
    {
        "name": "greater than",
        "query": "$[?@.current_price > 1000].id",
        "result": ["bitcoin", "ethereum", "wrapped-bitcoin"]
    },
    {
        "name": "implicit root",
        "query": "[?@.market_cap_rank <= 2].symbol",
        "result": ["btc", "eth"]
    },
    {
        "name": "logical or",
        "query": "$[?@.symbol == 'usdt' || @.market_cap_rank == 15].id",
        "result": ["tether", "wrapped-bitcoin"]
    },
    {
        "name": "logical and binds tighter than or",
        "query": "$[?@.symbol == 'btc' || @.market_cap_rank > 1 && @.current_price < 10].id",
        "result": ["bitcoin", "tether"]
    },
    {
        "name": "logical not",
        "query": "$[?!(@.market_cap_rank < 3)].id",
        "result": ["tether", "wrapped-bitcoin"]
    },
    {
        "name": "length of an array",
        "query": "$[?length(@.tags) == 0].id",
        "result": ["tether"]
    },
    {
        "name": "length of a string",
        "query": "$[?length(@.symbol) == 4].id",
        "result": ["tether", "wrapped-bitcoin"]
    },
    {
        "name": "count",
        "query": "$[?count(@.tags[*]) > 1].id",
        "result": ["bitcoin", "ethereum"]
    },
    {
        "name": "match is anchored",
        "query": "$[?match(@.id, 'bit.*')].symbol",
        "result": ["btc"]
    },
    {
        "name": "search is not anchored",
        "query": "$[?search(@.id, 'bit')].symbol",
        "result": ["btc", "wbtc"]
    },
    {
        "name": "value",
        "query": "$[?value(@.tags[0]) == 'wrapped'].id",
        "result": ["wrapped-bitcoin"]
    },
    {
        "name": "existence",
        "query": "$[?@.tags[1]].id",
        "result": ["bitcoin", "ethereum"]
    },
    {
        "name": "root query",
        "query": "$[?@.market_cap_rank == $[0].market_cap_rank].id",
        "result": ["bitcoin"]
    },
    {
        "name": "int and float are equal",
        "query": "$[?@.current_price == 1].id",
        "result": ["tether"]
    },
    {
        "name": "string ordering",
        "query": "$[?@.symbol < 'c'].id",
        "result": ["bitcoin"]
    },
    {
        "name": "missing member is not equal to null",
        "query": "$[?@.missing == null].id",
        "result": []
    },
    {
        "name": "missing members are equal",
        "query": "$[?@.missing == @.other].id",
        "result": ["bitcoin", "ethereum", "tether", "wrapped-bitcoin"]
    },
    {
        "name": "descendant then index",
        "query": "$..tags[0]",
        "result": ["pow", "pos", "wrapped"]
    },
    {
        "name": "slice with negative step",
        "query": "$[::-2].id",
        "result": ["wrapped-bitcoin", "ethereum"]
    },
    {
        "name": "negative index",
        "query": "$[-1].symbol",
        "result": ["wbtc"]
    },
    {
        "name": "filter in a later selector",
        "query": "$[0, ?@.market_cap_rank == 2].id",
        "result": ["bitcoin", "ethereum"]
    }
]"#;

#[derive(Deserialize)]
struct Case {
    name: String,
    query: String,
    result: Vec<Value>,
}

#[test]
fn filter_cases() {
    let document: Value = serde_json::from_str(MARKETS).unwrap();
    let cases: Vec<Case> = serde_json::from_str(CASES).unwrap();

    for case in cases {
        let nodes = find(&case.query, &document)
            .unwrap_or_else(|err| panic!("{}: {}", case.name, err));
        let values: Vec<Value> = nodes.into_iter().map(|n| n.value.clone()).collect();
        assert_eq!(values, case.result, "{}", case.name);
    }
}

#[test]
fn filter_object_members() {
    let data = r#"
    {
        "bitcoin": {"usd": 67187.12, "usd_24h_change": -1.5},
        "ethereum": {"usd": 3456.78, "usd_24h_change": 2.25}
    }"#;

    let value: Value = serde_json::from_str(data).unwrap();
    let nodes = find("$[?@.usd_24h_change > 0]", &value).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes.first().unwrap().path(), "$['ethereum']");
}

#[test]
fn nested_filter() {
    let data = r#"
    {
        "exchanges": [
            {"name": "a", "tickers": [{"target": "USD"}, {"target": "EUR"}]},
            {"name": "b", "tickers": [{"target": "AUD"}]}
        ]
    }"#;

    let value: Value = serde_json::from_str(data).unwrap();
    let nodes = find("exchanges[?@.tickers[?@.target == 'EUR']].name", &value).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes.first().unwrap().value.as_str().unwrap(), "a");
}
