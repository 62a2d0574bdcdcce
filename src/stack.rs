//! Tokenized input and the argument stack
//!
//! Input lines are split on whitespace; double quotes group words into a
//! single token and a backslash escapes the next character. The resulting
//! tokens are held in an [`ArgumentStack`] that value resolvers consume from
//! the front.

use std::collections::VecDeque;

use crate::errors::ResolveError;

/// Split an input line into tokens
pub fn tokenize(input: &str) -> Vec<String> {
    let (tokens, _) = split(input);
    tokens
}

/// Split a partially typed line for autocompletion
///
/// The returned list always ends with the token being typed, which is empty
/// when the line is empty or ends with unquoted whitespace.
pub fn tokenize_for_completion(input: &str) -> Vec<String> {
    let (mut tokens, open) = split(input);
    if !open {
        tokens.push(String::new());
    }
    tokens
}

/// Returns the tokens and whether the last token was still open at the end
/// of input (not terminated by whitespace).
fn split(input: &str) -> (Vec<String>, bool) {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_quotes = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                has_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    let open = has_token;
    if has_token {
        tokens.push(current);
    }
    (tokens, open)
}

/// The remaining raw tokens of one dispatch attempt
///
/// Owned by a single dispatch and never shared. Tokens are consumed from the
/// front; the number of consumed tokens never exceeds the original length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentStack {
    tokens: VecDeque<String>,
    consumed: usize,
}

impl ArgumentStack {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
            consumed: 0,
        }
    }

    /// Tokenize `input` into a new stack
    pub fn parse(input: &str) -> Self {
        Self::new(tokenize(input))
    }

    pub fn peek(&self) -> Option<&str> {
        self.tokens.front().map(String::as_str)
    }

    /// Consume the next token
    pub fn pop(&mut self) -> Result<String, ResolveError> {
        let token = self.tokens.pop_front().ok_or(ResolveError::Exhausted)?;
        self.consumed += 1;
        Ok(token)
    }

    /// Consume every remaining token, joined with single spaces
    pub fn join_remaining(&mut self) -> Result<String, ResolveError> {
        if self.tokens.is_empty() {
            return Err(ResolveError::Exhausted);
        }
        self.consumed += self.tokens.len();
        let joined: Vec<String> = self.tokens.drain(..).collect();
        Ok(joined.join(" "))
    }

    /// Index of the first token equal to `literal`, ignoring case
    pub fn position_of(&self, literal: &str) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case(literal))
    }

    /// Remove the token at `index`, counting it as consumed
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        let token = self.tokens.remove(index)?;
        self.consumed += 1;
        Some(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.tokens.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_whitespace() {
        assert_eq!(tokenize("  set   alice 5 "), vec!["set", "alice", "5"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_quotes_and_escapes() {
        assert_eq!(
            tokenize(r#"say "hello world" again"#),
            vec!["say", "hello world", "again"]
        );
        assert_eq!(tokenize(r#"say "" x"#), vec!["say", "", "x"]);
        assert_eq!(tokenize(r#"a\ b c"#), vec!["a b", "c"]);
        assert_eq!(tokenize(r#"quote \"x\""#), vec!["quote", "\"x\""]);
        // an unterminated quote runs to the end of the line
        assert_eq!(tokenize(r#"say "open ended"#), vec!["say", "open ended"]);
    }

    #[test]
    fn test_tokenize_for_completion() {
        assert_eq!(tokenize_for_completion(""), vec![""]);
        assert_eq!(tokenize_for_completion("set al"), vec!["set", "al"]);
        assert_eq!(tokenize_for_completion("set "), vec!["set", ""]);
        assert_eq!(tokenize_for_completion(r#"say "hello wo"#), vec!["say", "hello wo"]);
    }

    #[test]
    fn test_stack_consumption() {
        let mut stack = ArgumentStack::parse("a b c");
        assert_eq!(stack.peek(), Some("a"));
        assert_eq!(stack.pop().unwrap(), "a");
        assert_eq!(stack.consumed(), 1);
        assert_eq!(stack.join_remaining().unwrap(), "b c");
        assert_eq!(stack.consumed(), 3);
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), Err(ResolveError::Exhausted));
        assert_eq!(stack.join_remaining(), Err(ResolveError::Exhausted));
    }

    #[test]
    fn test_literal_removal() {
        let mut stack = ArgumentStack::parse("ban bob --Silent 1d");
        let index = stack.position_of("--silent").unwrap();
        assert_eq!(index, 2);
        assert_eq!(stack.remove_at(index).unwrap(), "--Silent");
        assert_eq!(stack.to_vec(), vec!["ban", "bob", "1d"]);
        assert_eq!(stack.consumed(), 1);
        assert_eq!(stack.position_of("--silent"), None);
    }
}
