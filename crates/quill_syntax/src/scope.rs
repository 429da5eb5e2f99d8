//! Lexical scope stack for the parser.
//!
//! Each scope holds three namespaces: variables (unique per scope),
//! functions (overload sets, appended in declaration order), and type
//! names. Resolution walks from the innermost scope outward and stops at
//! the first hit, so inner declarations shadow outer ones.

use crate::ast::{FunctionFlags, NodeId, Value};
use crate::types::{TypeId, TypeRegistry};
use quill_base::Symbol;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct VariableEntry {
    pub name: Symbol,
    pub type_id: TypeId,
    pub constant: bool,
    /// Literal initializer of a `const` declaration, when known. Used for
    /// constant contexts such as array capacities.
    pub const_value: Option<Value>,
    pub node: NodeId,
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: Symbol,
    pub return_type: TypeId,
    pub parameters: Vec<TypeId>,
    pub flags: FunctionFlags,
    /// The declaration node for functions defined in this unit; `None`
    /// for built-ins and imports.
    pub node: Option<NodeId>,
}

impl FunctionEntry {
    /// A candidate matches when it is variadic, or the arity matches and
    /// every argument equals the parameter type — with the generic
    /// `pointer` parameter accepting any pointer argument.
    pub fn matches(&self, args: &[TypeId], registry: &TypeRegistry) -> bool {
        if self.flags.contains(FunctionFlags::VARIADIC) {
            return true;
        }
        if args.len() != self.parameters.len() {
            return false;
        }
        self.parameters.iter().zip(args).all(|(&param, &arg)| {
            arg == param || (param == TypeId::POINTER && registry.is_pointer(arg))
        })
    }
}

#[derive(Default)]
struct Scope {
    variables: FxHashMap<Symbol, VariableEntry>,
    functions: FxHashMap<Symbol, Vec<FunctionEntry>>,
    types: FxHashMap<Symbol, TypeId>,
}

pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// Starts with one root scope, which hosts built-ins and imports.
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popped the root scope");
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares a variable in the innermost scope. `false` when the name
    /// is already taken there.
    pub fn declare_variable(&mut self, entry: VariableEntry) -> bool {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if scope.variables.contains_key(&entry.name) {
            return false;
        }
        scope.variables.insert(entry.name, entry);
        true
    }

    /// Appends to the innermost scope's overload set. Signature collisions
    /// are not checked here; they surface at call resolution.
    pub fn declare_function(&mut self, entry: FunctionEntry) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        scope.functions.entry(entry.name).or_default().push(entry);
    }

    /// Declares a type name in the innermost scope. `false` on collision.
    pub fn declare_type(&mut self, name: Symbol, id: TypeId) -> bool {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if scope.types.contains_key(&name) {
            return false;
        }
        scope.types.insert(name, id);
        true
    }

    pub fn resolve_variable(&self, name: Symbol) -> Option<&VariableEntry> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(&name))
    }

    pub fn resolve_type(&self, name: Symbol) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.types.get(&name).copied())
    }

    /// First matching overload, walking innermost to outermost and
    /// candidates in declaration order within each scope.
    pub fn resolve_function(
        &self,
        name: Symbol,
        args: &[TypeId],
        registry: &TypeRegistry,
    ) -> Option<&FunctionEntry> {
        for scope in self.scopes.iter().rev() {
            if let Some(candidates) = scope.functions.get(&name) {
                if let Some(entry) = candidates.iter().find(|c| c.matches(args, registry)) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// True when any overload with this name exists, matching or not.
    pub fn function_exists(&self, name: Symbol) -> bool {
        self.scopes
            .iter()
            .rev()
            .any(|scope| scope.functions.contains_key(&name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_base::Interner;

    fn var(name: Symbol, type_id: TypeId) -> VariableEntry {
        VariableEntry {
            name,
            type_id,
            constant: false,
            const_value: None,
            node: crate::ast::Ast::new().root(),
        }
    }

    fn func(name: Symbol, ret: TypeId, params: Vec<TypeId>) -> FunctionEntry {
        FunctionEntry {
            name,
            return_type: ret,
            parameters: params,
            flags: FunctionFlags::empty(),
            node: None,
        }
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut interner = Interner::new();
        let mut scopes = ScopeStack::new();
        let x = interner.intern("x");
        assert!(scopes.declare_variable(var(x, TypeId::INT)));
        assert!(!scopes.declare_variable(var(x, TypeId::INT)));
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut interner = Interner::new();
        let mut scopes = ScopeStack::new();
        let x = interner.intern("x");
        scopes.declare_variable(var(x, TypeId::INT));
        scopes.push();
        scopes.declare_variable(var(x, TypeId::FLOAT));
        assert_eq!(scopes.resolve_variable(x).unwrap().type_id, TypeId::FLOAT);
        scopes.pop();
        assert_eq!(scopes.resolve_variable(x).unwrap().type_id, TypeId::INT);
    }

    #[test]
    fn popped_scope_is_not_resolvable() {
        let mut interner = Interner::new();
        let mut scopes = ScopeStack::new();
        let inner = interner.intern("inner");
        scopes.push();
        scopes.declare_variable(var(inner, TypeId::INT));
        assert!(scopes.resolve_variable(inner).is_some());
        scopes.pop();
        assert!(scopes.resolve_variable(inner).is_none());
    }

    #[test]
    fn overload_resolution_matches_arity_and_types() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new();
        let mut scopes = ScopeStack::new();
        let name = interner.intern("area");
        scopes.declare_function(func(name, TypeId::INT, vec![TypeId::INT]));
        scopes.declare_function(func(name, TypeId::FLOAT, vec![TypeId::FLOAT]));

        let by_int = scopes
            .resolve_function(name, &[TypeId::INT], &registry)
            .unwrap();
        assert_eq!(by_int.return_type, TypeId::INT);

        let by_float = scopes
            .resolve_function(name, &[TypeId::FLOAT], &registry)
            .unwrap();
        assert_eq!(by_float.return_type, TypeId::FLOAT);

        assert!(scopes
            .resolve_function(name, &[TypeId::BOOL], &registry)
            .is_none());
        assert!(scopes
            .resolve_function(name, &[TypeId::INT, TypeId::INT], &registry)
            .is_none());
    }

    #[test]
    fn variadic_matches_any_argument_list() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new();
        let mut scopes = ScopeStack::new();
        let name = interner.intern("print");
        let mut entry = func(name, TypeId::VOID, Vec::new());
        entry.flags = FunctionFlags::VARIADIC;
        scopes.declare_function(entry);

        assert!(scopes.resolve_function(name, &[], &registry).is_some());
        assert!(scopes
            .resolve_function(name, &[TypeId::INT, TypeId::FLOAT, TypeId::BOOL], &registry)
            .is_some());
    }

    #[test]
    fn generic_pointer_parameter_accepts_any_pointer() {
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new();
        let mut scopes = ScopeStack::new();
        let name = interner.intern("free");
        scopes.declare_function(func(name, TypeId::VOID, vec![TypeId::POINTER]));

        let int_ptr = registry.pointer_to(TypeId::INT);
        assert!(scopes
            .resolve_function(name, &[int_ptr], &registry)
            .is_some());
        assert!(scopes
            .resolve_function(name, &[TypeId::CSTR], &registry)
            .is_some());
        assert!(scopes
            .resolve_function(name, &[TypeId::INT], &registry)
            .is_none());
    }

    #[test]
    fn inner_declaration_wins_over_outer() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new();
        let mut scopes = ScopeStack::new();
        let name = interner.intern("f");
        scopes.declare_function(func(name, TypeId::INT, vec![TypeId::INT]));
        scopes.push();
        scopes.declare_function(func(name, TypeId::FLOAT, vec![TypeId::INT]));

        let hit = scopes
            .resolve_function(name, &[TypeId::INT], &registry)
            .unwrap();
        assert_eq!(hit.return_type, TypeId::FLOAT);
    }

    #[test]
    fn adding_less_specific_outer_candidate_keeps_resolution() {
        // Determinism property: an outer variadic never steals a call an
        // inner exact match already handles.
        let mut interner = Interner::new();
        let registry = TypeRegistry::new();
        let mut scopes = ScopeStack::new();
        let name = interner.intern("g");
        let mut outer = func(name, TypeId::VOID, Vec::new());
        outer.flags = FunctionFlags::VARIADIC;
        scopes.declare_function(outer);
        scopes.push();
        scopes.declare_function(func(name, TypeId::INT, vec![TypeId::INT]));

        let hit = scopes
            .resolve_function(name, &[TypeId::INT], &registry)
            .unwrap();
        assert_eq!(hit.return_type, TypeId::INT);
    }
}
