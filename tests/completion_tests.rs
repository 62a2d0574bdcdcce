//! Autocomplete behaviour over a small command tree

use cmdroute::autocomplete::{suggestions_fn, StaticSuggestions};
use cmdroute::builtin::{BOOLEAN, INTEGER, STRING};
use cmdroute::process::{ChoiceResolver, ParameterResolver};
use cmdroute::{
    Actor, CategorySpec, CommandHandler, CommandSpec, ParamType, ParameterSpec, Permission,
    SimpleActor, TypeKey,
};

fn guest() -> SimpleActor {
    SimpleActor::new("guest")
}

fn admin() -> SimpleActor {
    SimpleActor::new("root").with_permission("admin")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn tree() -> CommandHandler {
    let mut handler = CommandHandler::new();
    handler
        .register_category(CategorySpec::new("admin").permission(Permission::node("admin")))
        .unwrap();

    let modes = ChoiceResolver::new(["Soft", "Hard"]);
    handler
        .register(
            CommandSpec::new("admin ban")
                .parameter(ParameterSpec::new("target", STRING))
                .parameter(ParameterSpec::switch("silent"))
                .parameter(
                    ParameterSpec::new("mode", STRING)
                        .flag()
                        .optional()
                        .resolver(ParameterResolver::value(modes.clone()))
                        .suggestions(modes),
                )
                .action(|_| Ok(())),
        )
        .unwrap();
    handler
        .register(CommandSpec::new("set").action(|_| Ok(())))
        .unwrap();
    handler
        .register(
            CommandSpec::new("spawn")
                .parameter(ParameterSpec::new("count", INTEGER))
                .parameter(ParameterSpec::new("baby", BOOLEAN).optional())
                .action(|_| Ok(())),
        )
        .unwrap();
    handler
}

#[test]
fn test_root_children_respect_permissions() {
    let handler = tree();
    assert_eq!(handler.complete(&guest(), ""), strings(&["set", "spawn"]));
    assert_eq!(handler.complete(&admin(), ""), strings(&["admin", "set", "spawn"]));
    assert_eq!(handler.complete(&admin(), "S"), strings(&["set", "spawn"]));
    assert_eq!(handler.complete(&admin(), "sp"), strings(&["spawn"]));
}

#[test]
fn test_hidden_category_offers_nothing() {
    let handler = tree();
    assert!(handler.complete(&guest(), "admin ").is_empty());
    assert_eq!(handler.complete(&admin(), "admin "), strings(&["ban"]));
}

#[test]
fn test_boolean_suggestions() {
    let handler = tree();
    assert_eq!(handler.complete(&guest(), "spawn 3 "), strings(&["false", "true"]));
    assert_eq!(handler.complete(&guest(), "spawn 3 T"), strings(&["true"]));
    assert!(handler.complete(&guest(), "spawn ").is_empty());
}

#[test]
fn test_flag_literals_after_positionals() {
    let handler = tree();
    assert_eq!(
        handler.complete(&admin(), "admin ban bob "),
        strings(&["--mode", "--silent"])
    );
    assert_eq!(handler.complete(&admin(), "admin ban bob --s"), strings(&["--silent"]));
    assert_eq!(
        handler.complete(&admin(), "admin ban bob --silent "),
        strings(&["--mode"])
    );
}

#[test]
fn test_flag_literal_while_typing_positional() {
    let handler = tree();
    assert_eq!(handler.complete(&admin(), "admin ban --"), strings(&["--mode", "--silent"]));
}

#[test]
fn test_flag_value_suggestions() {
    let handler = tree();
    assert_eq!(
        handler.complete(&admin(), "admin ban bob --mode "),
        strings(&["Hard", "Soft"])
    );
    assert_eq!(handler.complete(&admin(), "admin ban bob --mode h"), strings(&["Hard"]));
}

#[test]
fn test_either_merges_both_sides() {
    let mut handler = CommandHandler::new();
    let color = TypeKey::new("color");
    let size = TypeKey::new("size");
    handler.register_resolver(
        color.clone(),
        ParameterResolver::value(ChoiceResolver::new(["red", "Blue", "green"])),
    );
    handler.register_suggestions(color.clone(), StaticSuggestions::new(["red", "Blue", "green"]));
    handler.register_resolver(
        size.clone(),
        ParameterResolver::value(ChoiceResolver::new(["small", "big", "red"])),
    );
    handler.register_suggestions(size.clone(), StaticSuggestions::new(["small", "big", "red"]));
    handler
        .register(
            CommandSpec::new("paint")
                .parameter(ParameterSpec::new("style", ParamType::either(color.into(), size.into())))
                .action(|_| Ok(())),
        )
        .unwrap();

    let actor = guest();
    assert_eq!(
        handler.complete(&actor, "paint "),
        strings(&["big", "Blue", "green", "red", "small"])
    );
    assert_eq!(handler.complete(&actor, "paint B"), strings(&["big", "Blue"]));
}

#[test]
fn test_default_action_completion() {
    let mut handler = CommandHandler::new();
    handler
        .register(
            CommandSpec::new("warp")
                .default_action()
                .parameter(
                    ParameterSpec::new("target", STRING)
                        .optional()
                        .suggestions(StaticSuggestions::new(["spawn", "home"])),
                )
                .action(|_| Ok(())),
        )
        .unwrap();
    handler
        .register(CommandSpec::new("warp list").action(|_| Ok(())))
        .unwrap();

    let actor = guest();
    assert_eq!(handler.complete(&actor, "warp "), strings(&["home", "list", "spawn"]));
    assert_eq!(handler.complete(&actor, "warp h"), strings(&["home"]));
}

#[test]
fn test_provider_sees_context() {
    let mut handler = CommandHandler::new();
    handler
        .register(
            CommandSpec::new("msg")
                .parameter(ParameterSpec::new("to", STRING).suggestions(suggestions_fn(|context| {
                    vec![format!("{}-friend", context.actor.name()), "everyone".to_string()]
                })))
                .action(|_| Ok(())),
        )
        .unwrap();

    assert_eq!(
        handler.complete(&SimpleActor::new("alice"), "msg "),
        strings(&["alice-friend", "everyone"])
    );
}

#[test]
fn test_restricted_positional_keeps_its_slot() {
    let mut handler = CommandHandler::new();
    handler
        .register(
            CommandSpec::new("give")
                .parameter(
                    ParameterSpec::new("target", STRING)
                        .permission(Permission::node("give.target"))
                        .suggestions(StaticSuggestions::new(["alice", "bob"])),
                )
                .parameter(
                    ParameterSpec::new("amount", INTEGER)
                        .suggestions(StaticSuggestions::new(["1", "64"])),
                )
                .action(|_| Ok(())),
        )
        .unwrap();

    assert!(handler.complete(&guest(), "give ").is_empty());
    assert_eq!(handler.complete(&guest(), "give alice "), strings(&["1", "64"]));

    let trusted = SimpleActor::new("op").with_permission("give.target");
    assert_eq!(handler.complete(&trusted, "give "), strings(&["alice", "bob"]));
}
