//! Host side of external calls and global storage
//!
//! The machine never knows what an external function does. It hands each
//! [`Instruction::CallExternal`](crate::compiler::instruction::Instruction::CallExternal)
//! and each global access to a [`Host`]. [`Bindings`] is the ready-made host:
//! one closure per external function and a value per global, both keyed by
//! the ids an [`Environment`] handed out.

use crate::compiler::environment::Environment;
use crate::compiler::instruction::{ExternalId, GlobalId};
use crate::vm::errors::VmError;
use rustc_hash::FxHashMap;

pub trait Host {
    /// Run an external function. The result is ignored for void functions.
    fn call_external(&mut self, id: ExternalId, args: &[i64]) -> Result<i64, VmError>;

    fn load_global(&mut self, id: GlobalId) -> Result<i64, VmError>;

    fn store_global(&mut self, id: GlobalId, value: i64) -> Result<(), VmError>;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn call_external(&mut self, id: ExternalId, args: &[i64]) -> Result<i64, VmError> {
        (**self).call_external(id, args)
    }

    fn load_global(&mut self, id: GlobalId) -> Result<i64, VmError> {
        (**self).load_global(id)
    }

    fn store_global(&mut self, id: GlobalId, value: i64) -> Result<(), VmError> {
        (**self).store_global(id, value)
    }
}

type ExternalFn<'a> = Box<dyn FnMut(&[i64]) -> i64 + 'a>;

/// Closure-backed [`Host`] for one [`Environment`]
pub struct Bindings<'a> {
    function_names: Vec<String>,
    function_index: FxHashMap<String, ExternalId>,
    functions: Vec<Option<ExternalFn<'a>>>,
    global_names: Vec<String>,
    global_index: FxHashMap<String, GlobalId>,
    globals: Vec<i64>,
}

impl<'a> Bindings<'a> {
    /// Unbound functions and zeroed globals for everything `env` declares
    pub fn new(env: &Environment) -> Self {
        let mut function_names = Vec::new();
        let mut function_index = FxHashMap::default();
        for (id, function) in env.functions() {
            function_names.push(function.name.clone());
            function_index.insert(function.name.clone(), id);
        }

        let mut global_names = Vec::with_capacity(env.global_count());
        let mut global_index = FxHashMap::default();
        for i in 0..env.global_count() {
            let id = GlobalId(i);
            let name = env.global_name(id).unwrap_or_default().to_string();
            global_index.insert(name.clone(), id);
            global_names.push(name);
        }

        Self {
            functions: function_names.iter().map(|_| None).collect(),
            function_names,
            function_index,
            globals: vec![0; global_names.len()],
            global_names,
            global_index,
        }
    }

    /// Attach the implementation of a declared external function
    pub fn bind<F>(&mut self, name: &str, f: F) -> Result<ExternalId, VmError>
    where
        F: FnMut(&[i64]) -> i64 + 'a,
    {
        let id = *self
            .function_index
            .get(name)
            .ok_or_else(|| VmError::UndeclaredExternal(name.to_string()))?;
        self.functions[id.0] = Some(Box::new(f));
        Ok(id)
    }

    pub fn set_global(&mut self, name: &str, value: i64) -> Result<(), VmError> {
        let id = *self
            .global_index
            .get(name)
            .ok_or_else(|| VmError::UnboundGlobal(name.to_string()))?;
        self.globals[id.0] = value;
        Ok(())
    }

    pub fn global(&self, name: &str) -> Option<i64> {
        self.global_index.get(name).map(|id| self.globals[id.0])
    }
}

impl Host for Bindings<'_> {
    fn call_external(&mut self, id: ExternalId, args: &[i64]) -> Result<i64, VmError> {
        match self.functions.get_mut(id.0) {
            Some(Some(f)) => Ok(f(args)),
            Some(None) => Err(VmError::UnboundExternal(self.function_names[id.0].clone())),
            None => Err(VmError::UnboundExternal(format!("#{}", id.0))),
        }
    }

    fn load_global(&mut self, id: GlobalId) -> Result<i64, VmError> {
        self.globals
            .get(id.0)
            .copied()
            .ok_or_else(|| VmError::UnboundGlobal(format!("#{}", id.0)))
    }

    fn store_global(&mut self, id: GlobalId, value: i64) -> Result<(), VmError> {
        let slot = self
            .globals
            .get_mut(id.0)
            .ok_or_else(|| VmError::UnboundGlobal(format!("#{}", id.0)))?;
        *slot = value;
        Ok(())
    }
}

impl std::fmt::Debug for Bindings<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound: Vec<_> = self
            .function_names
            .iter()
            .zip(&self.functions)
            .map(|(name, f)| (name.as_str(), f.is_some()))
            .collect();
        let globals: Vec<_> = self
            .global_names
            .iter()
            .map(String::as_str)
            .zip(&self.globals)
            .collect();
        f.debug_struct("Bindings")
            .field("functions", &bound)
            .field("globals", &globals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::FunctionKind;
    use std::cell::RefCell;

    #[test]
    fn test_bound_function_is_called() {
        let mut env = Environment::new();
        let print = env.function("Print", 1, FunctionKind::Void);
        let add = env.function("Add", 2, FunctionKind::Value);

        let seen = RefCell::new(Vec::new());
        let mut bindings = Bindings::new(&env);
        bindings
            .bind("Print", |args| {
                seen.borrow_mut().push(args[0]);
                0
            })
            .unwrap();
        bindings.bind("Add", |args| args[0] + args[1]).unwrap();

        assert_eq!(bindings.call_external(add, &[2, 3]), Ok(5));
        bindings.call_external(print, &[7]).unwrap();
        drop(bindings);
        assert_eq!(seen.into_inner(), vec![7]);
    }

    #[test]
    fn test_unbound_and_undeclared() {
        let mut env = Environment::new();
        let print = env.function("Print", 1, FunctionKind::Void);
        let mut bindings = Bindings::new(&env);

        assert_eq!(
            bindings.call_external(print, &[1]),
            Err(VmError::UnboundExternal("Print".to_string()))
        );
        assert_eq!(
            bindings.bind("Missing", |_| 0).unwrap_err(),
            VmError::UndeclaredExternal("Missing".to_string())
        );
    }

    #[test]
    fn test_globals() {
        let mut env = Environment::new();
        let g = env.global("bbb");
        let mut bindings = Bindings::new(&env);

        assert_eq!(bindings.global("bbb"), Some(0));
        bindings.set_global("bbb", 30).unwrap();
        assert_eq!(bindings.load_global(g), Ok(30));
        bindings.store_global(g, 31).unwrap();
        assert_eq!(bindings.global("bbb"), Some(31));
        assert!(bindings.set_global("nope", 1).is_err());
    }
}
