//! External symbol environment
//!
//! The host declares, before compilation, which functions and global
//! storage slots a program may reference by name. Registration hands back
//! stable ids; the code generator emits those ids and the VM host resolves
//! them at run time.

use crate::compiler::instruction::{ExternalId, GlobalId};
use crate::parser::ast::FunctionKind;
use rustc_hash::FxHashMap;

/// A host-provided callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFunction {
    pub name: String,
    pub arity: usize,
    pub kind: FunctionKind,
}

/// Registry of external functions and global slots
#[derive(Debug, Clone, Default)]
pub struct Environment {
    functions: Vec<ExternalFunction>,
    function_index: FxHashMap<String, ExternalId>,
    globals: Vec<String>,
    global_index: FxHashMap<String, GlobalId>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external function. Registering a name twice replaces the
    /// earlier descriptor but keeps its id.
    pub fn function(&mut self, name: &str, arity: usize, kind: FunctionKind) -> ExternalId {
        let descriptor = ExternalFunction {
            name: name.to_string(),
            arity,
            kind,
        };

        if let Some(&id) = self.function_index.get(name) {
            self.functions[id.0] = descriptor;
            return id;
        }

        let id = ExternalId(self.functions.len());
        self.functions.push(descriptor);
        self.function_index.insert(name.to_string(), id);
        id
    }

    /// Register a global storage slot; idempotent per name
    pub fn global(&mut self, name: &str) -> GlobalId {
        if let Some(&id) = self.global_index.get(name) {
            return id;
        }

        let id = GlobalId(self.globals.len());
        self.globals.push(name.to_string());
        self.global_index.insert(name.to_string(), id);
        id
    }

    /// Look up a function by exact name and argument count
    pub fn resolve_function(&self, name: &str, argc: usize) -> Option<(ExternalId, &ExternalFunction)> {
        let id = *self.function_index.get(name)?;
        let function = &self.functions[id.0];
        (function.arity == argc).then_some((id, function))
    }

    pub fn resolve_global(&self, name: &str) -> Option<GlobalId> {
        self.global_index.get(name).copied()
    }

    pub fn global_name(&self, id: GlobalId) -> Option<&str> {
        self.globals.get(id.0).map(String::as_str)
    }

    pub fn functions(&self) -> impl Iterator<Item = (ExternalId, &ExternalFunction)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (ExternalId(i), f))
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }
}
