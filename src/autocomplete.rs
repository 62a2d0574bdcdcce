//! Suggestions for partially typed input
//!
//! Completion is a read-only pass over the command tree. It walks the typed
//! path the same way dispatch does, honouring permissions, and then asks the
//! suggestion provider of the parameter currently being typed for candidates.
//! Candidates are filtered against the partial token ignoring case, sorted
//! case-insensitively and deduplicated.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::actor::Actor;
use crate::command::{CommandCategory, CommandParameter, ExecutableCommand};
use crate::handler::CommandHandler;
use crate::process::{BooleanResolver, ChoiceResolver};
use crate::stack::tokenize_for_completion;

/// What a suggestion provider may look at
pub struct SuggestionContext<'a> {
    /// Tokens typed after the command name, excluding the partial token
    pub args: &'a [String],
    pub actor: &'a dyn Actor,
    pub command: &'a ExecutableCommand,
    pub parameter: &'a CommandParameter,
    partial: &'a str,
}

impl<'a> SuggestionContext<'a> {
    pub fn new(
        args: &'a [String],
        actor: &'a dyn Actor,
        command: &'a ExecutableCommand,
        parameter: &'a CommandParameter,
        partial: &'a str,
    ) -> Self {
        Self {
            args,
            actor,
            command,
            parameter,
            partial,
        }
    }

    /// The token being typed, possibly empty
    pub fn partial(&self) -> &'a str {
        self.partial
    }
}

/// Produces completion candidates for one parameter
///
/// Providers must not have side effects; completion may be abandoned at any
/// point. Candidates need not be filtered or sorted.
pub trait SuggestionProvider: Send + Sync {
    fn suggestions(&self, context: &SuggestionContext<'_>) -> Vec<String>;
}

/// Offers nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySuggestions;

impl SuggestionProvider for EmptySuggestions {
    fn suggestions(&self, _context: &SuggestionContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

/// A fixed list of candidates
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions {
    values: Vec<String>,
}

impl StaticSuggestions {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl SuggestionProvider for StaticSuggestions {
    fn suggestions(&self, _context: &SuggestionContext<'_>) -> Vec<String> {
        self.values.clone()
    }
}

impl SuggestionProvider for ChoiceResolver {
    fn suggestions(&self, _context: &SuggestionContext<'_>) -> Vec<String> {
        self.choices().to_vec()
    }
}

impl SuggestionProvider for BooleanResolver {
    fn suggestions(&self, _context: &SuggestionContext<'_>) -> Vec<String> {
        vec!["true".to_string(), "false".to_string()]
    }
}

/// Wrap a closure as a suggestion provider
pub fn suggestions_fn<F>(f: F) -> impl SuggestionProvider
where
    F: Fn(&SuggestionContext<'_>) -> Vec<String> + Send + Sync,
{
    FnSuggestions(f)
}

struct FnSuggestions<F>(F);

impl<F> SuggestionProvider for FnSuggestions<F>
where
    F: Fn(&SuggestionContext<'_>) -> Vec<String> + Send + Sync,
{
    fn suggestions(&self, context: &SuggestionContext<'_>) -> Vec<String> {
        (self.0)(context)
    }
}

/// Union of two providers, used for `either<A, B>` parameters
///
/// Both sides are always asked: the actor has not committed to either
/// interpretation while still typing.
pub struct ComposedSuggestions {
    first: Arc<dyn SuggestionProvider>,
    second: Arc<dyn SuggestionProvider>,
}

impl SuggestionProvider for ComposedSuggestions {
    fn suggestions(&self, context: &SuggestionContext<'_>) -> Vec<String> {
        let mut values = self.first.suggestions(context);
        values.extend(self.second.suggestions(context));
        values
    }
}

pub fn compose(
    first: Arc<dyn SuggestionProvider>,
    second: Arc<dyn SuggestionProvider>,
) -> Arc<dyn SuggestionProvider> {
    Arc::new(ComposedSuggestions { first, second })
}

/// Filter by the partial token, then sort and deduplicate
pub fn finalize(candidates: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    let mut values: Vec<String> = candidates
        .into_iter()
        .filter(|c| c.to_lowercase().starts_with(&partial))
        .collect();
    values.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    values.dedup();
    values
}

/// Suggestions for the last token of a partially typed line
pub(crate) fn complete(handler: &CommandHandler, actor: &dyn Actor, input: &str) -> Vec<String> {
    let mut tokens = tokenize_for_completion(input);
    let partial = tokens.pop().unwrap_or_default();
    let typed = tokens;

    let mut category = handler.root();
    let mut index = 0;
    while index < typed.len() {
        let Ok(child) = category.path().child(&typed[index]) else {
            break;
        };
        if let Some(next) = handler.category(&child) {
            if !next.permission().can_execute(actor) {
                return Vec::new();
            }
            category = next;
            index += 1;
            continue;
        }
        if let Some(command) = handler.command(&child) {
            return complete_command(handler, actor, command, &typed[index + 1..], &partial);
        }
        break;
    }

    debug!(path = %category.path(), partial = %partial, "Completing");
    if index < typed.len() {
        return match category.default_action() {
            Some(default) => complete_command(handler, actor, default, &typed[index..], &partial),
            None => Vec::new(),
        };
    }

    let mut candidates = child_names(handler, actor, category);
    if let Some(default) = category.default_action() {
        candidates.extend(complete_command(handler, actor, default, &[], &partial));
    }
    finalize(candidates, &partial)
}

fn child_names(handler: &CommandHandler, actor: &dyn Actor, category: &CommandCategory) -> Vec<String> {
    let visible_category = |name: &&str| {
        category
            .path()
            .child(name)
            .ok()
            .and_then(|path| handler.category(&path))
            .is_some_and(|c| c.permission().can_execute(actor))
    };
    let visible_command = |name: &&str| {
        category
            .path()
            .child(name)
            .ok()
            .and_then(|path| handler.command(&path))
            .is_some_and(|c| c.permission().can_execute(actor))
    };
    category
        .categories()
        .filter(visible_category)
        .chain(category.commands().filter(visible_command))
        .map(str::to_string)
        .collect()
}

fn complete_command(
    handler: &CommandHandler,
    actor: &dyn Actor,
    command: &ExecutableCommand,
    args: &[String],
    partial: &str,
) -> Vec<String> {
    if !command.permission().can_execute(actor) {
        return Vec::new();
    }

    let flag_prefix = handler.config().flag_prefix.as_str();
    let switch_prefix = handler.config().switch_prefix.as_str();
    let named: Vec<&CommandParameter> = command
        .flag_parameters()
        .filter(|p| p.permission().can_execute(actor))
        .collect();

    let suggest = |parameter: &CommandParameter| {
        let context = SuggestionContext::new(args, actor, command, parameter, partial);
        parameter.suggestion_provider().suggestions(&context)
    };

    // a flag literal just before the partial token expects the flag's value
    if let Some(last) = args.last() {
        let flag = named.iter().find(|p| {
            p.is_flag() && handler.literal_of(p).is_some_and(|l| l.eq_ignore_ascii_case(last))
        });
        if let Some(flag) = flag {
            return finalize(suggest(*flag), partial);
        }
    }

    let mut used = HashSet::new();
    let mut positional = 0;
    let mut i = 0;
    while i < args.len() {
        let matched = named
            .iter()
            .find(|p| handler.literal_of(p).is_some_and(|l| l.eq_ignore_ascii_case(&args[i])));
        match matched {
            Some(p) => {
                used.insert(p.name().to_string());
                i += if p.is_flag() { 2 } else { 1 };
            }
            None => {
                positional += 1;
                i += 1;
            }
        }
    }

    // slots are counted over every positional so a hidden one keeps its place
    let values: Vec<&CommandParameter> = command.value_parameters().collect();
    let current = values
        .get(positional)
        .copied()
        .or_else(|| values.last().copied().filter(|p| p.consumes_all()));
    if current.is_some_and(|p| !p.permission().can_execute(actor)) {
        return Vec::new();
    }

    let mut candidates = current.map(suggest).unwrap_or_default();
    let typing_literal = (!flag_prefix.is_empty() && partial.starts_with(flag_prefix))
        || (!switch_prefix.is_empty() && partial.starts_with(switch_prefix));
    if current.is_none() || typing_literal {
        candidates.extend(
            named
                .iter()
                .filter(|p| !used.contains(p.name()))
                .filter_map(|p| handler.literal_of(p)),
        );
    }
    finalize(candidates, partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_finalize_filters_ignoring_case() {
        let values = finalize(strings(&["Alice", "bob", "alex", "ALBERT"]), "al");
        assert_eq!(values, strings(&["ALBERT", "alex", "Alice"]));
    }

    #[test]
    fn test_finalize_sorts_and_dedupes() {
        let values = finalize(strings(&["b", "a", "B", "a", "c"]), "");
        assert_eq!(values, strings(&["a", "B", "b", "c"]));
    }

    #[test]
    fn test_finalize_empty() {
        assert!(finalize(Vec::new(), "x").is_empty());
        assert!(finalize(strings(&["abc"]), "x").is_empty());
    }
}
