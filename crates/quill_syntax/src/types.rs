//! The type registry.
//!
//! All types live in one registry for the duration of a compilation job:
//! primitives seeded in a fixed, reserved order, a small contiguous range
//! of placeholder types for templating, then derived and user types.
//! Derived types (`pointer_to`, `array_of`, `specialized`) are interned —
//! constructing the same derivation twice yields the same [`TypeId`].
//!
//! The registry is an explicit value threaded through the parser,
//! interpreter, and emitters. Embedders that compile dependency waves in
//! parallel wrap it in a mutex; nothing here assumes global state.

use crate::ast::Value;
use quill_base::Symbol;
use rustc_hash::FxHashMap;

/// Opaque handle to a registered type. Stable for the registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const CHAR: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const U8: TypeId = TypeId(3);
    pub const U16: TypeId = TypeId(4);
    pub const U32: TypeId = TypeId(5);
    pub const U64: TypeId = TypeId(6);
    pub const I8: TypeId = TypeId(7);
    pub const I16: TypeId = TypeId(8);
    pub const I32: TypeId = TypeId(9);
    pub const I64: TypeId = TypeId(10);
    pub const INT: TypeId = TypeId(11);
    /// The generic pointer type; matches any pointer argument in overload
    /// resolution.
    pub const POINTER: TypeId = TypeId(12);
    pub const FLOAT: TypeId = TypeId(13);
    pub const DOUBLE: TypeId = TypeId(14);
    pub const CSTR: TypeId = TypeId(15);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Char,
    Boolean,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Integer,
    Pointer,
    Float,
    Double,
    CString,
}

/// A named member of a user composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Symbol,
    pub type_id: TypeId,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Scalar(Primitive),
    Pointer { pointee: TypeId },
    Array { element: TypeId, capacity: u32 },
    Templated { template: TypeId, parameters: Vec<TypeId> },
    Placeholder(u32),
    Struct { members: Vec<Member> },
}

#[derive(Debug, Clone)]
pub struct TypeRecord {
    pub designation: String,
    pub id: TypeId,
    pub kind: TypeKind,
}

/// Number of reserved placeholder types following the primitives.
pub const PLACEHOLDER_TYPES: u32 = 8;

pub struct TypeRegistry {
    types: Vec<TypeRecord>,
    by_designation: FxHashMap<String, TypeId>,
    pointers_to: FxHashMap<TypeId, TypeId>,
    arrays_of: FxHashMap<(TypeId, u32), TypeId>,
    specialized: FxHashMap<(TypeId, Vec<TypeId>), TypeId>,
    next_placeholder: u32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            types: Vec::with_capacity(2 * (16 + PLACEHOLDER_TYPES as usize)),
            by_designation: FxHashMap::default(),
            pointers_to: FxHashMap::default(),
            arrays_of: FxHashMap::default(),
            specialized: FxHashMap::default(),
            next_placeholder: PLACEHOLDER_TYPES,
        };

        use Primitive::*;
        for (name, primitive) in [
            ("void", Void),
            ("char", Char),
            ("bool", Boolean),
            ("u8", U8),
            ("u16", U16),
            ("u32", U32),
            ("u64", U64),
            ("i8", I8),
            ("i16", I16),
            ("i32", I32),
            ("i64", I64),
            ("int", Integer),
            ("pointer", Pointer),
            ("float", Float),
            ("double", Double),
        ] {
            registry.push_record(name.to_string(), TypeKind::Scalar(primitive));
        }
        registry.push_record(
            "cstr".to_string(),
            TypeKind::Pointer {
                pointee: TypeId::CHAR,
            },
        );
        for i in 0..PLACEHOLDER_TYPES {
            registry.push_record(format!("__placeholder_{}", i), TypeKind::Placeholder(i));
        }
        registry
    }

    fn push_record(&mut self, designation: String, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        match &kind {
            TypeKind::Pointer { pointee } => {
                self.pointers_to.insert(*pointee, id);
            }
            TypeKind::Array { element, capacity } => {
                self.arrays_of.insert((*element, *capacity), id);
            }
            TypeKind::Templated {
                template,
                parameters,
            } => {
                self.specialized.insert((*template, parameters.clone()), id);
            }
            _ => {}
        }
        self.by_designation.insert(designation.clone(), id);
        self.types.push(TypeRecord {
            designation,
            id,
            kind,
        });
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeRecord {
        &self.types[id.index()]
    }

    pub fn designation(&self, id: TypeId) -> &str {
        &self.types[id.index()].designation
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_designation.get(name).copied()
    }

    /// Returns the id for `name`, registering an opaque placeholder when
    /// the name is unknown (interface imports may mention a type before
    /// its declaration is seen).
    pub fn get_or_register(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let slot = self.next_placeholder;
        self.next_placeholder += 1;
        self.push_record(name.to_string(), TypeKind::Placeholder(slot))
    }

    /// Interned pointer-to derivation.
    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        if let Some(&id) = self.pointers_to.get(&pointee) {
            return id;
        }
        let designation = format!("{}*", self.designation(pointee));
        self.push_record(designation, TypeKind::Pointer { pointee })
    }

    /// Interned array-of derivation; the capacity is part of the identity.
    pub fn array_of(&mut self, element: TypeId, capacity: u32) -> TypeId {
        if let Some(&id) = self.arrays_of.get(&(element, capacity)) {
            return id;
        }
        let designation = format!("{}[{}]", self.designation(element), capacity);
        self.push_record(designation, TypeKind::Array { element, capacity })
    }

    /// Interned template specialization, keyed on the parameter list.
    pub fn specialized(&mut self, template: TypeId, parameters: Vec<TypeId>) -> TypeId {
        if let Some(&id) = self.specialized.get(&(template, parameters.clone())) {
            return id;
        }
        let args: Vec<&str> = parameters.iter().map(|p| self.designation(*p)).collect();
        let designation = format!("{}<{}>", self.designation(template), args.join(", "));
        self.push_record(
            designation,
            TypeKind::Templated {
                template,
                parameters,
            },
        )
    }

    /// Registers a user composite type. Idempotent on designation: a
    /// second registration (interface re-import) returns the existing id,
    /// upgrading a placeholder record in place if one was forward-created.
    pub fn register_user_type(&mut self, name: &str, members: Vec<Member>) -> TypeId {
        if let Some(id) = self.lookup(name) {
            if matches!(self.types[id.index()].kind, TypeKind::Placeholder(_)) {
                self.types[id.index()].kind = TypeKind::Struct { members };
            }
            return id;
        }
        self.push_record(name.to_string(), TypeKind::Struct { members })
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        id == TypeId::POINTER || matches!(self.get(id).kind, TypeKind::Pointer { .. })
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(
            self.get(id).kind,
            TypeKind::Scalar(
                Primitive::U8
                    | Primitive::U16
                    | Primitive::U32
                    | Primitive::U64
                    | Primitive::I8
                    | Primitive::I16
                    | Primitive::I32
                    | Primitive::I64
                    | Primitive::Integer
            )
        )
    }

    pub fn is_float(&self, id: TypeId) -> bool {
        matches!(
            self.get(id).kind,
            TypeKind::Scalar(Primitive::Float | Primitive::Double)
        )
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.is_integer(id) || self.is_float(id)
    }

    /// Element type of an array, if `id` is one.
    pub fn element_of(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).kind {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Declared capacity of an array, if `id` is one.
    pub fn capacity_of(&self, id: TypeId) -> Option<u32> {
        match self.get(id).kind {
            TypeKind::Array { capacity, .. } => Some(capacity),
            _ => None,
        }
    }

    pub fn pointee_of(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).kind {
            TypeKind::Pointer { pointee } => Some(pointee),
            _ => None,
        }
    }

    pub fn members_of(&self, id: TypeId) -> Option<&[Member]> {
        match &self.get(id).kind {
            TypeKind::Struct { members } => Some(members),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        false // primitives are always seeded
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_occupy_reserved_ids() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.lookup("void"), Some(TypeId::VOID));
        assert_eq!(registry.lookup("bool"), Some(TypeId::BOOL));
        assert_eq!(registry.lookup("int"), Some(TypeId::INT));
        assert_eq!(registry.lookup("float"), Some(TypeId::FLOAT));
        assert_eq!(registry.lookup("cstr"), Some(TypeId::CSTR));
        assert_eq!(registry.designation(TypeId::I64), "i64");
    }

    #[test]
    fn cstr_is_a_char_pointer() {
        let registry = TypeRegistry::new();
        assert!(registry.is_pointer(TypeId::CSTR));
        assert_eq!(registry.pointee_of(TypeId::CSTR), Some(TypeId::CHAR));
    }

    #[test]
    fn pointer_to_is_interned() {
        let mut registry = TypeRegistry::new();
        let a = registry.pointer_to(TypeId::INT);
        let b = registry.pointer_to(TypeId::INT);
        assert_eq!(a, b);
        assert_eq!(registry.designation(a), "int*");
        assert_ne!(registry.pointer_to(TypeId::FLOAT), a);
    }

    #[test]
    fn array_identity_includes_capacity() {
        let mut registry = TypeRegistry::new();
        let a = registry.array_of(TypeId::INT, 8);
        let b = registry.array_of(TypeId::INT, 8);
        let c = registry.array_of(TypeId::INT, 16);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.designation(a), "int[8]");
        assert_eq!(registry.capacity_of(a), Some(8));
        assert_eq!(registry.element_of(a), Some(TypeId::INT));
    }

    #[test]
    fn specialization_is_keyed_on_parameters() {
        let mut registry = TypeRegistry::new();
        let template = registry.get_or_register("Box");
        let a = registry.specialized(template, vec![TypeId::INT]);
        let b = registry.specialized(template, vec![TypeId::INT]);
        let c = registry.specialized(template, vec![TypeId::FLOAT]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.designation(a), "Box<int>");
    }

    #[test]
    fn user_type_registration_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let first = registry.register_user_type("complex", Vec::new());
        let count = registry.len();
        let second = registry.register_user_type("complex", Vec::new());
        assert_eq!(first, second);
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn forward_placeholder_upgrades_to_struct() {
        let mut registry = TypeRegistry::new();
        let forward = registry.get_or_register("vec2");
        assert!(matches!(
            registry.get(forward).kind,
            TypeKind::Placeholder(_)
        ));
        let registered = registry.register_user_type("vec2", Vec::new());
        assert_eq!(forward, registered);
        assert!(registry.members_of(registered).is_some());
    }

    #[test]
    fn derived_ids_never_collide_with_primitives() {
        let mut registry = TypeRegistry::new();
        let derived = registry.array_of(TypeId::INT, 4);
        assert!(derived.index() >= 16 + PLACEHOLDER_TYPES as usize);
    }

    #[test]
    fn numeric_classification() {
        let registry = TypeRegistry::new();
        assert!(registry.is_integer(TypeId::INT));
        assert!(registry.is_integer(TypeId::U8));
        assert!(!registry.is_integer(TypeId::FLOAT));
        assert!(registry.is_float(TypeId::DOUBLE));
        assert!(registry.is_numeric(TypeId::I32));
        assert!(!registry.is_numeric(TypeId::BOOL));
    }
}
