//! Command handlers for all CLI operations
//!
//! Every subcommand builds a [`cmdroute::CommandHandler`] from the schema
//! given on the command line and drives it. Commands declared in the schema
//! have no behaviour of their own; `run` prints what they resolved to.

use super::{CliContext, Commands, ConfigAction};
use anyhow::{bail, Context, Result};
use cmdroute::command::action_fn;
use cmdroute::{
    ArgValue, CommandHandler, CommandPath, CommandSchema, ConfigManager, DispatchOutcome, Either,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CliHandler {
    context: CliContext,
}

impl CliHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Run { line, json } => self.handle_run(&join_words(&line), json),
            Commands::Complete { line, json } => self.handle_complete(&line, json),
            Commands::Tree => self.handle_tree(),
            Commands::Config { action } => self.handle_config(action),
        }
    }

    /// Build the engine from the configured schema
    fn build_engine(&self) -> Result<CommandHandler> {
        let path = match &self.context.schema_path {
            Some(path) => path,
            None => bail!("No command schema given; pass --schema or set CMDROUTE_SCHEMA"),
        };
        let schema = CommandSchema::load(path)
            .with_context(|| format!("Failed to load command schema from {}", path.display()))?;

        let mut engine = CommandHandler::with_config(self.context.config_manager.config().clone());
        let installed = schema
            .install(&mut engine, |_| action_fn(|_| Ok(())))
            .context("Failed to register commands from schema")?;
        debug!("Installed {} commands from {}", installed.len(), path.display());
        Ok(engine)
    }

    fn handle_run(&self, line: &str, json: bool) -> Result<()> {
        let engine = self.build_engine()?;
        match engine.dispatch(&self.context.actor, line) {
            Ok(outcome) => {
                info!("Dispatched '{}'", outcome.path);
                if json {
                    println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?);
                } else {
                    print_outcome(&outcome);
                }
                Ok(())
            }
            Err(e) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&e.report())?);
                }
                Err(e.into())
            }
        }
    }

    fn handle_complete(&self, line: &str, json: bool) -> Result<()> {
        let engine = self.build_engine()?;
        let suggestions = engine.complete(&self.context.actor, line);
        if json {
            println!("{}", serde_json::to_string(&suggestions)?);
        } else {
            for suggestion in suggestions {
                println!("{}", suggestion);
            }
        }
        Ok(())
    }

    fn handle_tree(&self) -> Result<()> {
        let engine = self.build_engine()?;
        let config = engine.config();

        for category in engine.categories() {
            if !category.path().is_root() {
                let mut line = format!("{}/", category.path());
                if let Some(node) = category.permission().as_node() {
                    line.push_str(&format!(" [{}]", node));
                }
                if let Some(description) = category.description() {
                    line.push_str(&format!(" - {}", description));
                }
                println!("{}", line);
            }
            if let Some(default) = category.default_action() {
                println!(
                    "  {} (default)",
                    default.usage(&config.flag_prefix, &config.switch_prefix)
                );
            }
        }

        for path in engine.command_paths() {
            let Some(command) = engine.command(path) else {
                continue;
            };
            if command.path() != path {
                println!("{} -> {}", path, command.path());
                continue;
            }
            let mut line = command.usage(&config.flag_prefix, &config.switch_prefix);
            if let Some(node) = command.permission().as_node() {
                line.push_str(&format!(" [{}]", node));
            }
            if let Some(description) = command.description() {
                line.push_str(&format!(" - {}", description));
            }
            println!("{}", line);
        }
        Ok(())
    }

    fn handle_config(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                let manager = &self.context.config_manager;
                println!("# {}", manager.path().display());
                println!("{}", toml::to_string_pretty(manager.config())?);
            }
            ConfigAction::Init { force } => {
                let path = self.context.config_manager.path().to_path_buf();
                if path.exists() && !force {
                    bail!("Configuration already exists at {}; use --force to overwrite", path.display());
                }
                let mut manager = ConfigManager::load(&path)?;
                *manager.config_mut() = Default::default();
                manager.save()?;
                println!("Wrote default configuration to {}", path.display());
            }
        }
        Ok(())
    }
}

/// Rejoin shell words so the engine's tokenizer splits them the same way
fn join_words(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let plain = !word.is_empty()
                && !word
                    .chars()
                    .any(|c| c.is_whitespace() || c == '"' || c == '\\');
            if plain {
                word.clone()
            } else {
                let escaped = word.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_outcome(outcome: &DispatchOutcome) {
    println!("{}", outcome.path);
    for (name, value) in outcome.arguments.iter() {
        println!("  {} = {}", name, value.map_or(Value::Null, value_json));
    }
}

fn outcome_json(outcome: &DispatchOutcome) -> Value {
    let arguments: Map<String, Value> = outcome
        .arguments
        .iter()
        .map(|(name, value)| (name.to_string(), value.map_or(Value::Null, value_json)))
        .collect();
    json!({
        "path": outcome.path.to_string(),
        "arguments": arguments,
    })
}

/// Render a resolved value of one of the built-in types
fn value_json(value: &ArgValue) -> Value {
    if let Some(s) = value.downcast_ref::<String>() {
        json!(s)
    } else if let Some(n) = value.downcast_ref::<i64>() {
        json!(n)
    } else if let Some(n) = value.downcast_ref::<f64>() {
        json!(n)
    } else if let Some(b) = value.downcast_ref::<bool>() {
        json!(b)
    } else if let Some(path) = value.downcast_ref::<CommandPath>() {
        json!(path.to_string())
    } else if let Some(either) = value.downcast_ref::<Either<ArgValue, ArgValue>>() {
        match either {
            Either::First(v) | Either::Second(v) => value_json(v),
        }
    } else {
        json!(format!("{:?}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_words_preserves_shell_words() {
        let words: Vec<String> = ["say", "hello world", "a\"b", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let line = join_words(&words);
        assert_eq!(line, r#"say "hello world" "a\"b" """#);
        assert_eq!(cmdroute::stack::tokenize(&line), words);
    }

    #[test]
    fn test_value_json() {
        assert_eq!(value_json(&ArgValue::new("a".to_string())), json!("a"));
        assert_eq!(value_json(&ArgValue::new(5_i64)), json!(5));
        assert_eq!(value_json(&ArgValue::new(true)), json!(true));

        let either = ArgValue::new(Either::<ArgValue, ArgValue>::Second(ArgValue::new(2.5_f64)));
        assert_eq!(value_json(&either), json!(2.5));
    }
}
