//! Actors and permissions
//!
//! An actor is whoever sends a command. The engine only needs a display name
//! and a way to ask whether the actor holds a permission node.

use std::collections::HashSet;

/// The identity invoking a command
pub trait Actor: Send + Sync {
    fn name(&self) -> &str;

    fn has_permission(&self, node: &str) -> bool;
}

/// Permission required to use a command, category or parameter
///
/// An empty permission grants access to everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Permission {
    node: Option<String>,
}

impl Permission {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn node(node: impl Into<String>) -> Self {
        Self {
            node: Some(node.into()),
        }
    }

    pub fn as_node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.node.is_none()
    }

    pub fn can_execute(&self, actor: &dyn Actor) -> bool {
        match &self.node {
            Some(node) => actor.has_permission(node),
            None => true,
        }
    }

    /// This permission, or `parent` when none was declared
    pub fn or_inherit(&self, parent: &Permission) -> Permission {
        if self.is_none() {
            parent.clone()
        } else {
            self.clone()
        }
    }
}

/// An actor with a fixed set of granted permission nodes
///
/// `*` grants everything and `prefix.*` grants every node under `prefix`.
#[derive(Debug, Clone, Default)]
pub struct SimpleActor {
    name: String,
    granted: HashSet<String>,
}

impl SimpleActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granted: HashSet::new(),
        }
    }

    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.granted.insert(node.into().to_lowercase());
        self
    }

    pub fn with_permissions<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for node in nodes {
            self.granted.insert(node.into().to_lowercase());
        }
        self
    }
}

impl Actor for SimpleActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, node: &str) -> bool {
        let node = node.to_lowercase();
        if self.granted.contains("*") || self.granted.contains(&node) {
            return true;
        }
        self.granted.iter().any(|granted| {
            granted
                .strip_suffix(".*")
                .is_some_and(|prefix| node.starts_with(&format!("{}.", prefix)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_permission_allows_everyone() {
        let actor = SimpleActor::new("guest");
        assert!(Permission::none().can_execute(&actor));
        assert!(!Permission::node("admin.ban").can_execute(&actor));
    }

    #[test]
    fn test_wildcards() {
        let actor = SimpleActor::new("mod").with_permission("admin.*");
        assert!(actor.has_permission("admin.ban"));
        assert!(actor.has_permission("ADMIN.kick.silent"));
        assert!(!actor.has_permission("admin"));
        assert!(!actor.has_permission("user.chat"));

        let root = SimpleActor::new("root").with_permission("*");
        assert!(root.has_permission("anything.at.all"));
    }

    #[test]
    fn test_inheritance() {
        let parent = Permission::node("config");
        assert_eq!(Permission::none().or_inherit(&parent), parent);
        assert_eq!(
            Permission::node("config.set").or_inherit(&parent),
            Permission::node("config.set")
        );
    }
}
