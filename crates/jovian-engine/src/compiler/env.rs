//! Lexical scopes
//!
//! An `Environment` maps identifiers to bindings and borrows its parent, so a
//! scope can never outlive the construct that created it.

use super::error::{CompileError, CompileResult};
use super::ir::{FunctionId, Value};
use rustc_hash::FxHashMap;

/// What a name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Stack slot in `function`; reading it emits a load
    Stack { slot: Value, function: FunctionId },
    /// Global variable; reading it emits a load
    Global(Value),
    /// Instance pointer bound by `var ... (new ...)`. The register belongs to
    /// `function` and is only defined inside control-flow `region`.
    Instance {
        value: Value,
        function: FunctionId,
        region: u32,
    },
    /// Used as-is (compiled functions)
    Direct(Value),
}

#[derive(Debug, Default)]
pub struct Environment<'p> {
    bindings: FxHashMap<String, Binding>,
    parent: Option<&'p Environment<'p>>,
}

impl<'p> Environment<'p> {
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    pub fn child(&self) -> Environment<'_> {
        Environment {
            bindings: FxHashMap::default(),
            parent: Some(self),
        }
    }

    /// Install a binding in this scope, shadowing outer ones
    pub fn define(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    /// Nearest enclosing binding of `name`
    pub fn lookup(&self, name: &str) -> CompileResult<&Binding> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.bindings.get(name) {
                return Ok(binding);
            }
            scope = env.parent;
        }
        Err(CompileError::UnresolvedIdentifier {
            name: name.to_string(),
        })
    }
}
