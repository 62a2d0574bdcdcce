//! Stack trace sanitization for resolver defects
//!
//! A resolver defect ([`crate::errors::DispatchError::IllegalResolverState`])
//! carries a [`DefectTrace`] captured where the defect was detected. Most of
//! that trace is dispatch machinery; a [`StackTraceSanitizer`] cuts the trace
//! at the first frame that belongs to an ignored module or function, leaving
//! only the frames above it.

use std::backtrace::Backtrace;
use std::fmt;

use once_cell::sync::Lazy;

use crate::config::SanitizerConfig;

/// One frame of a captured trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub symbol: String,
    pub location: Option<String>,
}

impl StackFrame {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Fully qualified function path without the trailing symbol hash
    pub fn function(&self) -> &str {
        let symbol = self.symbol.trim_start_matches('<');
        match symbol.rsplit_once("::") {
            Some((head, hash)) if is_symbol_hash(hash) => head,
            _ => symbol,
        }
    }

    /// Everything before the last segment of [`StackFrame::function`]
    pub fn module(&self) -> &str {
        let function = self.function();
        function.rsplit_once("::").map_or("", |(module, _)| module)
    }

    pub fn is_unresolved(&self) -> bool {
        self.symbol.is_empty() || self.symbol == "<unknown>"
    }
}

fn is_symbol_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.function(), location),
            None => write!(f, "{}", self.function()),
        }
    }
}

/// A trace attached to a resolver defect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectTrace {
    pub message: String,
    frames: Vec<StackFrame>,
    cause: Option<Box<DefectTrace>>,
}

impl DefectTrace {
    /// A trace with no frames
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
            cause: None,
        }
    }

    /// Capture the current call stack, innermost frame first
    ///
    /// Frames belonging to the capture itself are dropped.
    pub fn capture(message: impl Into<String>) -> Self {
        let rendered = Backtrace::force_capture().to_string();
        let frames = parse_frames(&rendered);
        let start = frames
            .iter()
            .position(|f| f.function().contains("DefectTrace::capture"))
            .map_or(0, |i| i + 1);
        Self::new(message).with_frames(frames.into_iter().skip(start))
    }

    pub fn with_frames(mut self, frames: impl IntoIterator<Item = StackFrame>) -> Self {
        self.frames = frames.into_iter().collect();
        self
    }

    pub fn with_cause(mut self, cause: DefectTrace) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn cause(&self) -> Option<&DefectTrace> {
        self.cause.as_deref()
    }
}

impl fmt::Display for DefectTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {:>3}: {}", i, frame)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// Parse the `Display` rendering of a std backtrace
fn parse_frames(rendered: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    for line in rendered.lines() {
        let line = line.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                last.location = Some(location.to_string());
            }
            continue;
        }
        if let Some((index, symbol)) = line.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                frames.push(StackFrame::new(symbol.trim()));
            }
        }
    }
    frames
}

/// Removes dispatch machinery from defect traces
///
/// Sanitizing is idempotent: a sanitized trace contains no ignored frame, so
/// a second pass leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTraceSanitizer {
    modules: Vec<String>,
    module_prefixes: Vec<String>,
    functions: Vec<String>,
    ignore_unresolved: bool,
}

static DEFAULT_SANITIZER: Lazy<StackTraceSanitizer> = Lazy::new(|| {
    StackTraceSanitizer::builder()
        .ignore_module("cmdroute::dispatcher")
        .ignore_module_prefix("core::ops::function")
        .build()
});

/// Sanitizer that hides the dispatch loop and closure call shims
pub fn default_sanitizer() -> &'static StackTraceSanitizer {
    &DEFAULT_SANITIZER
}

impl StackTraceSanitizer {
    pub fn builder() -> SanitizerBuilder {
        SanitizerBuilder::default()
    }

    /// A sanitizer that keeps every frame
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SanitizerConfig) -> Self {
        let mut builder = Self::builder();
        for module in &config.ignore_modules {
            builder = builder.ignore_module(module);
        }
        for prefix in &config.ignore_module_prefixes {
            builder = builder.ignore_module_prefix(prefix);
        }
        for function in &config.ignore_functions {
            builder = builder.ignore_function(function);
        }
        if config.ignore_unresolved {
            builder = builder.ignore_unresolved();
        }
        builder.build()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.module_prefixes.is_empty()
            && self.functions.is_empty()
            && !self.ignore_unresolved
    }

    /// Whether the frame belongs to ignored code
    pub fn is_ignored(&self, frame: &StackFrame) -> bool {
        if frame.is_unresolved() {
            return self.ignore_unresolved;
        }
        let function = frame.function();
        self.functions.iter().any(|f| f == function)
            || self.module_prefixes.iter().any(|p| function.starts_with(p.as_str()))
            || self.modules.iter().any(|m| {
                function
                    .strip_prefix(m.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
            })
    }

    /// Drop the first ignored frame and everything below it, then do the same
    /// for the cause chain
    pub fn sanitize(&self, trace: &mut DefectTrace) {
        if let Some(cut) = trace.frames.iter().position(|f| self.is_ignored(f)) {
            trace.frames.truncate(cut);
        }
        if let Some(cause) = trace.cause.as_deref_mut() {
            self.sanitize(cause);
        }
    }

    pub fn sanitized(&self, mut trace: DefectTrace) -> DefectTrace {
        self.sanitize(&mut trace);
        trace
    }
}

/// Builder for [`StackTraceSanitizer`]
#[derive(Debug, Default)]
pub struct SanitizerBuilder {
    inner: StackTraceSanitizer,
}

impl SanitizerBuilder {
    /// Ignore every function defined in `module` or its submodules
    pub fn ignore_module(mut self, module: impl Into<String>) -> Self {
        self.inner.modules.push(module.into());
        self
    }

    /// Ignore every function whose path starts with `prefix`
    pub fn ignore_module_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.inner.module_prefixes.push(prefix.into());
        self
    }

    /// Ignore one fully qualified function
    pub fn ignore_function(mut self, function: impl Into<String>) -> Self {
        self.inner.functions.push(function.into());
        self
    }

    /// Treat frames without symbol information as ignored
    pub fn ignore_unresolved(mut self) -> Self {
        self.inner.ignore_unresolved = true;
        self
    }

    pub fn build(self) -> StackTraceSanitizer {
        self.inner
    }
}
