//! Parameter types and resolved values
//!
//! Parameter types are identified by a [`TypeKey`]. Resolvers, validators and
//! suggestion providers are registered against type keys in a [`TypeMap`],
//! and lookups fall back through the supertypes declared in a
//! [`TypeHierarchy`]: the exact type wins, then the nearest declared supertype,
//! with ties at the same distance broken by registration order.

use std::any::Any;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::RegistrationError;

/// Identifier of a parameter type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    pub const fn from_static(name: &'static str) -> Self {
        TypeKey(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        TypeKey(Cow::Owned(name.into().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        TypeKey::new(name)
    }
}

/// Built-in type keys
pub mod builtin {
    use super::TypeKey;

    pub const STRING: TypeKey = TypeKey::from_static("string");
    pub const NUMBER: TypeKey = TypeKey::from_static("number");
    pub const INTEGER: TypeKey = TypeKey::from_static("integer");
    pub const FLOAT: TypeKey = TypeKey::from_static("float");
    pub const BOOLEAN: TypeKey = TypeKey::from_static("boolean");
    pub const EITHER: TypeKey = TypeKey::from_static("either");
    pub const ACTOR_NAME: TypeKey = TypeKey::from_static("actor-name");
    pub const COMMAND_PATH: TypeKey = TypeKey::from_static("command-path");
}

/// Full type of a parameter, possibly parameterized
///
/// `either<integer, string>` is the raw type `either` with two type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamType {
    raw: TypeKey,
    arguments: Vec<ParamType>,
}

impl ParamType {
    pub fn simple(raw: TypeKey) -> Self {
        Self {
            raw,
            arguments: Vec::new(),
        }
    }

    pub fn either(first: ParamType, second: ParamType) -> Self {
        Self {
            raw: builtin::EITHER,
            arguments: vec![first, second],
        }
    }

    pub fn raw(&self) -> &TypeKey {
        &self.raw
    }

    pub fn arguments(&self) -> &[ParamType] {
        &self.arguments
    }

    pub fn is_either(&self) -> bool {
        self.raw == builtin::EITHER
    }

    /// Both sides of an `either` type, in preference order
    pub fn either_sides(&self) -> Option<(&ParamType, &ParamType)> {
        match (self.is_either(), self.arguments.as_slice()) {
            (true, [first, second]) => Some((first, second)),
            _ => None,
        }
    }
}

impl From<TypeKey> for ParamType {
    fn from(raw: TypeKey) -> Self {
        ParamType::simple(raw)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

impl FromStr for ParamType {
    type Err = RegistrationError;

    /// Parse declarations such as `integer` or `either<integer, string>`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RegistrationError::InvalidType {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let mut parser = TypeParser {
            chars: input.chars().filter(|c| !c.is_whitespace()).collect(),
            pos: 0,
        };
        let parsed = parser.parse().map_err(|reason| invalid(&reason))?;
        if parser.pos != parser.chars.len() {
            return Err(invalid("unexpected trailing characters"));
        }
        if parsed.is_either() && parsed.either_sides().is_none() {
            return Err(invalid("either takes exactly two type arguments"));
        }
        Ok(parsed)
    }
}

struct TypeParser {
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser {
    fn parse(&mut self) -> Result<ParamType, String> {
        let start = self.pos;
        while self.pos < self.chars.len()
            && (self.chars[self.pos].is_alphanumeric() || matches!(self.chars[self.pos], '-' | '_'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("expected a type name at position {}", start));
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        let mut arguments = Vec::new();
        if self.chars.get(self.pos) == Some(&'<') {
            self.pos += 1;
            loop {
                arguments.push(self.parse()?);
                match self.chars.get(self.pos) {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err("unclosed type argument list".to_string()),
                }
            }
        }
        let raw = TypeKey::new(name);
        if raw == builtin::EITHER && arguments.len() != 2 {
            return Err("either takes exactly two type arguments".to_string());
        }
        Ok(ParamType { raw, arguments })
    }
}

/// Object-safe bound for values produced by resolvers
pub trait ArgumentValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> ArgumentValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A resolved, type-erased argument value
#[derive(Clone)]
pub struct ArgValue(Arc<dyn ArgumentValue>);

impl ArgValue {
    pub fn new<T: ArgumentValue>(value: T) -> Self {
        ArgValue(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Declared supertypes of each type key
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: HashMap<TypeKey, Vec<TypeKey>>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `parent` as a supertype of `child`
    ///
    /// Parents of the same child are searched in declaration order.
    pub fn declare(&mut self, child: TypeKey, parent: TypeKey) {
        let parents = self.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    pub fn parents(&self, key: &TypeKey) -> &[TypeKey] {
        self.parents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The type itself and its supertypes, grouped by distance
    ///
    /// Level 0 is the type itself, level 1 its direct parents, and so on.
    /// Each type appears once, at its shortest distance.
    pub fn lineage(&self, key: &TypeKey) -> Vec<Vec<TypeKey>> {
        let mut levels = vec![vec![key.clone()]];
        let mut seen: HashSet<TypeKey> = HashSet::from([key.clone()]);
        loop {
            let next: Vec<TypeKey> = levels
                .last()
                .into_iter()
                .flatten()
                .flat_map(|k| self.parents(k).iter().cloned())
                .filter(|k| seen.insert(k.clone()))
                .collect();
            if next.is_empty() {
                return levels;
            }
            levels.push(next);
        }
    }

    pub fn is_assignable(&self, key: &TypeKey, target: &TypeKey) -> bool {
        self.lineage(key).iter().flatten().any(|k| k == target)
    }
}

/// Registry of values keyed by type with supertype-aware lookup
#[derive(Debug, Clone)]
pub struct TypeMap<V> {
    entries: Vec<(TypeKey, V)>,
}

impl<V> Default for TypeMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> TypeMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` for `key`, replacing an earlier registration in place
    pub fn insert(&mut self, key: TypeKey, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Register `value` for `key`, keeping earlier registrations
    pub fn append(&mut self, key: TypeKey, value: V) {
        self.entries.push((key, value));
    }

    pub fn get_exact(&self, key: &TypeKey) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Most specific registration applicable to `key`
    pub fn get(&self, key: &TypeKey, hierarchy: &TypeHierarchy) -> Option<&V> {
        for level in hierarchy.lineage(key) {
            let found = self
                .entries
                .iter()
                .find(|(k, _)| level.contains(k))
                .map(|(_, v)| v);
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Every registration applicable to `key`, in registration order
    pub fn matching(&self, key: &TypeKey, hierarchy: &TypeHierarchy) -> Vec<&V> {
        let lineage: Vec<TypeKey> = hierarchy.lineage(key).into_iter().flatten().collect();
        self.entries
            .iter()
            .filter(|(k, _)| lineage.contains(k))
            .map(|(_, v)| v)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::builtin::*;
    use super::*;

    #[test]
    fn test_parse_param_types() {
        let simple: ParamType = "Integer".parse().unwrap();
        assert_eq!(simple, ParamType::simple(INTEGER));

        let either: ParamType = "either<integer, string>".parse().unwrap();
        let (first, second) = either.either_sides().unwrap();
        assert_eq!(first.raw(), &INTEGER);
        assert_eq!(second.raw(), &STRING);
        assert_eq!(either.to_string(), "either<integer, string>");

        let nested: ParamType = "either<boolean, either<integer, string>>".parse().unwrap();
        assert!(nested.either_sides().unwrap().1.is_either());
    }

    #[test]
    fn test_parse_invalid_types() {
        assert!("".parse::<ParamType>().is_err());
        assert!("either<integer>".parse::<ParamType>().is_err());
        assert!("either<integer, string".parse::<ParamType>().is_err());
        assert!("integer>".parse::<ParamType>().is_err());
    }

    #[test]
    fn test_arg_value_downcast() {
        let value = ArgValue::new(42_i64);
        assert!(value.is::<i64>());
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert_eq!(value.downcast_ref::<String>(), None);
        assert_eq!(format!("{:?}", value), "42");
    }

    #[test]
    fn test_lineage_levels() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare(INTEGER, NUMBER);
        hierarchy.declare(NUMBER, TypeKey::new("any"));
        hierarchy.declare(INTEGER, TypeKey::new("any"));

        let lineage = hierarchy.lineage(&INTEGER);
        assert_eq!(lineage[0], vec![INTEGER]);
        assert_eq!(lineage[1], vec![NUMBER, TypeKey::new("any")]);
        assert_eq!(lineage.len(), 2);
        assert!(hierarchy.is_assignable(&INTEGER, &NUMBER));
        assert!(!hierarchy.is_assignable(&NUMBER, &INTEGER));
    }

    #[test]
    fn test_type_map_prefers_most_specific() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare(INTEGER, NUMBER);

        let mut map = TypeMap::new();
        map.insert(NUMBER, "number");
        assert_eq!(map.get(&INTEGER, &hierarchy), Some(&"number"));

        map.insert(INTEGER, "integer");
        assert_eq!(map.get(&INTEGER, &hierarchy), Some(&"integer"));
        assert_eq!(map.get(&FLOAT, &hierarchy), None);
        assert_eq!(map.get_exact(&NUMBER), Some(&"number"));
    }

    #[test]
    fn test_type_map_ties_use_registration_order() {
        let mut hierarchy = TypeHierarchy::new();
        let a = TypeKey::new("a");
        let b = TypeKey::new("b");
        hierarchy.declare(INTEGER, b.clone());
        hierarchy.declare(INTEGER, a.clone());

        let mut map = TypeMap::new();
        map.insert(a.clone(), "a");
        map.insert(b.clone(), "b");
        assert_eq!(map.get(&INTEGER, &hierarchy), Some(&"a"));
    }

    #[test]
    fn test_type_map_matching_collects_all() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.declare(INTEGER, NUMBER);

        let mut map = TypeMap::new();
        map.append(NUMBER, 1);
        map.append(STRING, 2);
        map.append(INTEGER, 3);
        map.append(NUMBER, 4);

        let found: Vec<i32> = map.matching(&INTEGER, &hierarchy).into_iter().copied().collect();
        assert_eq!(found, vec![1, 3, 4]);
    }
}
