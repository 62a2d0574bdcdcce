//! Command paths
//!
//! A [`CommandPath`] identifies a registered command or category by its
//! lower-cased name segments. A [`MutableCommandPath`] is the scratch copy the
//! dispatcher grows while it walks down the tree for one input line.

use std::collections::VecDeque;
use std::fmt;

use crate::errors::{RegistrationError, RegistrationResult};
use crate::stack::ArgumentStack;

/// Immutable, case-normalized path of a command or category
///
/// The root path has no segments. Equality and hashing are structural over the
/// lower-cased segments, so `Config Set` and `config set` are the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPath {
    segments: Vec<String>,
}

impl CommandPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a path from ordered segments, lower-casing each one
    pub fn new<I, S>(segments: I) -> RegistrationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.trim().is_empty() {
                return Err(RegistrationError::EmptyPathSegment {
                    input: segment.to_string(),
                });
            }
            normalized.push(segment.to_lowercase());
        }
        Ok(Self {
            segments: normalized,
        })
    }

    /// Parse a whitespace separated path such as `"config set"`
    pub fn parse(input: &str) -> RegistrationResult<Self> {
        Self::new(input.split_whitespace())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The last segment, which is the name of the node
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn parent(&self) -> Option<CommandPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// A new path with `segment` appended
    pub fn child(&self, segment: &str) -> RegistrationResult<CommandPath> {
        if segment.trim().is_empty() {
            return Err(RegistrationError::EmptyPathSegment {
                input: segment.to_string(),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_lowercase());
        Ok(Self { segments })
    }

    pub fn starts_with(&self, other: &CommandPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Every proper ancestor from the root down, excluding `self`
    pub fn ancestors(&self) -> Vec<CommandPath> {
        (0..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(" "))
    }
}

/// Scratch path mutated while walking the tree for a single dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutableCommandPath {
    segments: VecDeque<String>,
}

impl MutableCommandPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed a path from the remaining tokens of an argument stack
    pub fn from_stack(stack: &ArgumentStack) -> RegistrationResult<Self> {
        let mut path = Self::empty();
        for token in stack.iter() {
            path.push_back(token)?;
        }
        Ok(path)
    }

    pub fn push_back(&mut self, segment: &str) -> RegistrationResult<()> {
        self.segments.push_back(Self::normalize(segment)?);
        Ok(())
    }

    pub fn push_front(&mut self, segment: &str) -> RegistrationResult<()> {
        self.segments.push_front(Self::normalize(segment)?);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.segments.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<String> {
        self.segments.pop_back()
    }

    pub fn peek_front(&self) -> Option<&str> {
        self.segments.front().map(String::as_str)
    }

    pub fn peek_back(&self) -> Option<&str> {
        self.segments.back().map(String::as_str)
    }

    /// Case-insensitive membership test
    pub fn contains(&self, segment: &str) -> bool {
        let needle = segment.to_lowercase();
        self.segments.iter().any(|s| *s == needle)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn to_immutable(&self) -> CommandPath {
        CommandPath {
            segments: self.segments.iter().cloned().collect(),
        }
    }

    fn normalize(segment: &str) -> RegistrationResult<String> {
        if segment.trim().is_empty() {
            return Err(RegistrationError::EmptyPathSegment {
                input: segment.to_string(),
            });
        }
        Ok(segment.to_lowercase())
    }
}

impl From<&CommandPath> for MutableCommandPath {
    fn from(path: &CommandPath) -> Self {
        Self {
            segments: path.segments.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for MutableCommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_case_insensitive() {
        let a = CommandPath::parse("Config SET").unwrap();
        let b = CommandPath::new(["config", "set"]).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_paths_are_position_sensitive() {
        let a = CommandPath::parse("config set").unwrap();
        let b = CommandPath::parse("set config").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_root() {
        assert!(CommandPath::root().is_root());
        assert!(CommandPath::parse("").unwrap().is_root());
        assert!(!CommandPath::parse("ban").unwrap().is_root());
        assert_eq!(CommandPath::root().parent(), None);
    }

    #[test]
    fn test_empty_segment_is_rejected() {
        let result = CommandPath::new(["config", ""]);
        assert!(matches!(
            result,
            Err(RegistrationError::EmptyPathSegment { .. })
        ));
        assert!(CommandPath::root().child("  ").is_err());
    }

    #[test]
    fn test_parent_child_and_ancestors() {
        let path = CommandPath::parse("a b c").unwrap();
        assert_eq!(path.name(), Some("c"));
        assert_eq!(path.parent().unwrap(), CommandPath::parse("a b").unwrap());
        assert_eq!(
            CommandPath::parse("a b").unwrap().child("C").unwrap(),
            path
        );

        let ancestors = path.ancestors();
        assert_eq!(ancestors.len(), 3);
        assert!(ancestors[0].is_root());
        assert_eq!(ancestors[2].to_string(), "a b");
        assert!(path.starts_with(&ancestors[1]));
    }

    #[test]
    fn test_mutable_path_operations() {
        let stack = ArgumentStack::new(vec!["Config".to_string(), "Set".to_string()]);
        let mut path = MutableCommandPath::from_stack(&stack).unwrap();

        assert_eq!(path.peek_front(), Some("config"));
        assert_eq!(path.peek_back(), Some("set"));
        assert!(path.contains("SET"));

        path.push_front("Root").unwrap();
        assert_eq!(path.to_string(), "root config set");

        assert_eq!(path.pop_back(), Some("set".to_string()));
        assert_eq!(path.pop_front(), Some("root".to_string()));
        assert_eq!(path.to_immutable(), CommandPath::parse("config").unwrap());

        assert!(path.push_back("").is_err());
        path.clear();
        assert!(path.is_root());
    }
}
