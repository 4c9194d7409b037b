//! The five functions every JSONPath query can call: `count`, `length`,
//! `match`, `search` and `value`.
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
};

use lru::LruCache;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::{
    filter::FilterExpressionResult,
    function::{ExpressionType, FunctionExtension, FunctionRegister, FunctionSignature},
};

use ExpressionType::{Logical, Nodes, Value as ValueType};
use FilterExpressionResult as Res;

const REGEX_CACHE_SIZE: usize = 100;

/// A register holding the standard functions.
pub fn register() -> FunctionRegister {
    let mut register = FunctionRegister::new();
    register.insert(String::from("count"), Arc::new(Count));
    register.insert(String::from("length"), Arc::new(Length));
    register.insert(String::from("match"), Arc::new(RegexTest::full_match()));
    register.insert(String::from("search"), Arc::new(RegexTest::search()));
    register.insert(String::from("value"), Arc::new(Value));
    register
}

/// The number of nodes in a node list.
#[derive(Debug, Default)]
pub struct Count;

impl FunctionExtension for Count {
    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(&[Nodes], ValueType)
    }

    fn call<'a>(&self, args: Vec<Res<'a>>) -> Res<'a> {
        match args.as_slice() {
            [Res::Nodes(nodes)] => Res::Int(nodes.len() as i64),
            _ => Res::Nothing,
        }
    }
}

/// Characters in a string, elements in an array or members in an object.
/// Nothing for anything else.
#[derive(Debug, Default)]
pub struct Length;

impl FunctionExtension for Length {
    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(&[ValueType], ValueType)
    }

    fn call<'a>(&self, args: Vec<Res<'a>>) -> Res<'a> {
        let len = match args.as_slice() {
            [Res::String(s)] => s.chars().count(),
            [Res::Array(JsonValue::Array(arr))] => arr.len(),
            [Res::Object(JsonValue::Object(obj))] => obj.len(),
            _ => return Res::Nothing,
        };
        Res::Int(len as i64)
    }
}

/// The value of a single node. Nothing for empty or multi-node lists.
#[derive(Debug, Default)]
pub struct Value;

impl FunctionExtension for Value {
    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(&[Nodes], ValueType)
    }

    fn call<'a>(&self, args: Vec<Res<'a>>) -> Res<'a> {
        match args.as_slice() {
            [Res::Nodes(nodes)] => match nodes.as_slice() {
                [node] => Res::from_json_value(node.value),
                _ => Res::Nothing,
            },
            _ => Res::Nothing,
        }
    }
}

/// `match` and `search`. Both test a string against an I-Regexp pattern;
/// `match` must cover the whole string.
pub struct RegexTest {
    translate: fn(&str) -> String,
    cache: Mutex<LruCache<String, Option<Regex>>>,
}

impl RegexTest {
    pub fn full_match() -> Self {
        Self::new(full_match)
    }

    pub fn search() -> Self {
        Self::new(map_regex)
    }

    fn new(translate: fn(&str) -> String) -> Self {
        let size = NonZeroUsize::new(REGEX_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            translate,
            cache: Mutex::new(LruCache::new(size)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Option<Regex>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Patterns that are not valid I-Regexp are cached as `None` and never match.
    fn is_match(&self, s: &str, pattern: &str) -> bool {
        let mut cache = self.lock();

        if let Some(re) = cache.get(pattern) {
            return re.as_ref().is_some_and(|re| re.is_match(s));
        }

        let re = iregexp::check(pattern)
            .then(|| Regex::new(&(self.translate)(pattern)).ok())
            .flatten();
        let matched = re.as_ref().is_some_and(|re| re.is_match(s));
        cache.put(pattern.to_owned(), re);
        matched
    }
}

impl FunctionExtension for RegexTest {
    fn sig(&self) -> FunctionSignature {
        FunctionSignature::new(&[ValueType, ValueType], Logical)
    }

    fn call<'a>(&self, args: Vec<Res<'a>>) -> Res<'a> {
        match args.as_slice() {
            [Res::String(s), Res::String(pattern)] => Res::Bool(self.is_match(s, pattern)),
            _ => Res::Bool(false),
        }
    }
}

/// Map an I-Regexp pattern to `regex` syntax. Outside of a character class,
/// `.` matches anything except line breaks.
fn map_regex(pattern: &str) -> String {
    let mut mapped = String::with_capacity(pattern.len());
    let mut in_class = false;
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                mapped.push(c);
                mapped.extend(chars.next());
            }
            '.' if !in_class => mapped.push_str("[^\\n\\r]"),
            '[' | ']' => {
                in_class = c == '[';
                mapped.push(c);
            }
            _ => mapped.push(c),
        }
    }

    mapped
}

fn full_match(pattern: &str) -> String {
    format!("^(?:{})$", map_regex(pattern))
}
