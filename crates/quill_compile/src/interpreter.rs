//! Tree-walking evaluator for typed quill ASTs.
//!
//! The interpreter mirrors the parser's scope discipline with its own
//! stack of environments, and owns all array storage: declaring an array
//! allocates a slab in the interpreter's heap, and array-typed values
//! are handles into it, so assignment through a subscript is visible to
//! every holder of the handle. The heap is released with the
//! interpreter.
//!
//! Statement execution returns a [`ControlFlow`] signal so `return`
//! unwinds enclosing blocks without unwinding the host stack. The value
//! of the last evaluated statement is retained; running a program yields
//! either an explicit `return` value or that slot.

use crate::optimize;
use quill_base::{error, Interner, Span, Style, Symbol};
use quill_syntax::ast::{Ast, NodeId, NodeKind, UnaryFixity, Value};
use quill_syntax::token::TokenKind;
use quill_syntax::types::{TypeId, TypeKind, TypeRegistry};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    OutOfBounds { index: i64, capacity: usize },
    DivisionByZero,
    NullDereference,
    /// Operations the evaluator cannot perform on the values it was
    /// handed (calls into other modules, bad value kinds). The parser
    /// prevents these for well-typed single-unit programs.
    Unsupported(String),
}

impl RuntimeError {
    fn new(kind: RuntimeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn display_with_source(&self, source: &str) -> String {
        let (line_num, _, line_content) = error::line_context(source, self.span);
        let caret = error::underline(source, self.span);
        format!(
            "{}: {}\n{} {} {}\n     {} {}",
            Style::bold_red("runtime error"),
            self.kind,
            Style::blue(&format!("{:4}", line_num)),
            Style::blue("|"),
            line_content,
            Style::blue("|"),
            Style::red(&caret),
        )
    }
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeErrorKind::OutOfBounds { index, capacity } => {
                write!(f, "index {} out of bounds (capacity {})", index, capacity)
            }
            RuntimeErrorKind::DivisionByZero => write!(f, "division by zero"),
            RuntimeErrorKind::NullDereference => write!(f, "dereference of null pointer"),
            RuntimeErrorKind::Unsupported(message) => write!(f, "{}", message),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.kind, self.span.start, self.span.end)
    }
}

impl std::error::Error for RuntimeError {}

/// A resolved storage location: an environment slot or a heap array
/// element, plus a trail of struct member indices beneath it.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Env {
        scope: usize,
        name: Symbol,
        path: Vec<usize>,
    },
    Heap {
        handle: usize,
        index: usize,
        path: Vec<usize>,
    },
}

impl Place {
    fn push_member(&mut self, index: usize) {
        match self {
            Place::Env { path, .. } | Place::Heap { path, .. } => path.push(index),
        }
    }
}

/// A value live during interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    /// Handle into the interpreter's array heap.
    Array(usize),
    Struct {
        type_id: TypeId,
        fields: Vec<RuntimeValue>,
    },
    Pointer(Option<Place>),
    Void,
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Int(_) => "int",
            RuntimeValue::Float(_) => "float",
            RuntimeValue::Bool(_) => "bool",
            RuntimeValue::Char(_) => "char",
            RuntimeValue::Str(_) => "cstr",
            RuntimeValue::Array(_) => "array",
            RuntimeValue::Struct { .. } => "composite",
            RuntimeValue::Pointer(_) => "pointer",
            RuntimeValue::Void => "void",
        }
    }
}

/// Signal returned from statement execution.
pub enum ControlFlow {
    Continue,
    Return(RuntimeValue),
}

pub struct Interpreter<'a> {
    ast: &'a Ast,
    interner: &'a Interner,
    registry: &'a TypeRegistry,
    env: Vec<FxHashMap<Symbol, RuntimeValue>>,
    heap: Vec<Vec<RuntimeValue>>,
    /// Lines emitted by the `print` built-in, one per argument.
    pub output: Vec<String>,
    last: RuntimeValue,
}

impl<'a> Interpreter<'a> {
    pub fn new(ast: &'a Ast, interner: &'a Interner, registry: &'a TypeRegistry) -> Self {
        Interpreter {
            ast,
            interner,
            registry,
            env: vec![FxHashMap::default()],
            heap: Vec::new(),
            output: Vec::new(),
            last: RuntimeValue::Void,
        }
    }

    /// Executes the program. Yields the explicitly returned value, or
    /// the value of the last evaluated statement.
    pub fn run(&mut self) -> Result<RuntimeValue, RuntimeError> {
        for child in self.ast.node(self.ast.root()).children.clone() {
            if let ControlFlow::Return(value) = self.exec(child)? {
                return Ok(value);
            }
        }
        Ok(self.last.clone())
    }

    fn exec(&mut self, id: NodeId) -> Result<ControlFlow, RuntimeError> {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::Root => self.exec_block(id, false),
            NodeKind::Scope => self.exec_block(id, true),
            NodeKind::If => {
                let children = node.children.clone();
                if self.eval_bool(children[0])? {
                    self.exec(children[1])
                } else if let Some(&else_branch) = children.get(2) {
                    self.exec(else_branch)
                } else {
                    Ok(ControlFlow::Continue)
                }
            }
            NodeKind::While => {
                let children = node.children.clone();
                while self.eval_bool(children[0])? {
                    if let ControlFlow::Return(value) = self.exec(children[1])? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Continue)
            }
            NodeKind::For => {
                let children = node.children.clone();
                self.push_scope();
                let result = (|| {
                    self.exec(children[0])?; // initializer
                    while self.eval_bool(children[1])? {
                        if let ControlFlow::Return(value) = self.exec(children[3])? {
                            return Ok(ControlFlow::Return(value));
                        }
                        self.eval(children[2])?; // step
                    }
                    Ok(ControlFlow::Continue)
                })();
                self.pop_scope();
                result
            }
            NodeKind::Return => {
                let value = match node.children.first().copied() {
                    Some(child) => self.eval(child)?,
                    None => RuntimeValue::Void,
                };
                Ok(ControlFlow::Return(value))
            }
            NodeKind::VariableDeclaration { .. } => {
                let name = node.token.lexeme;
                let type_id = node.type_id;
                let value = match node.children.first().copied() {
                    Some(init) => self.eval(init)?,
                    None => self.default_value(type_id),
                };
                self.define(name, value);
                Ok(ControlFlow::Continue)
            }
            NodeKind::FunctionDeclaration { .. } | NodeKind::TypeDeclaration => {
                Ok(ControlFlow::Continue)
            }
            _ => {
                self.last = self.eval(id)?;
                Ok(ControlFlow::Continue)
            }
        }
    }

    fn exec_block(&mut self, id: NodeId, scoped: bool) -> Result<ControlFlow, RuntimeError> {
        if scoped {
            self.push_scope();
        }
        let mut flow = ControlFlow::Continue;
        for child in self.ast.node(id).children.clone() {
            match self.exec(child)? {
                ControlFlow::Return(value) => {
                    flow = ControlFlow::Return(value);
                    break;
                }
                ControlFlow::Continue => {}
            }
        }
        if scoped {
            self.pop_scope();
        }
        Ok(flow)
    }

    fn eval(&mut self, id: NodeId) -> Result<RuntimeValue, RuntimeError> {
        let node = self.ast.node(id);
        let span = node.token.span;
        match &node.kind {
            NodeKind::ConstantValue(value) => Ok(self.value_from_literal(value)),
            NodeKind::Expression | NodeKind::Statement | NodeKind::LValueToRValue => {
                let child = node.children[0];
                self.eval(child)
            }
            NodeKind::Variable => {
                let place = self.place_for(id)?;
                self.read_place(&place, span)
            }
            NodeKind::Cast => {
                let child = node.children[0];
                let target = node.type_id;
                let value = self.eval(child)?;
                self.cast_value(value, target, span)
            }
            NodeKind::GetPointer => {
                let child = node.children[0];
                let place = self.place_for(child)?;
                Ok(RuntimeValue::Pointer(Some(place)))
            }
            NodeKind::Dereference => {
                let child = node.children[0];
                match self.eval(child)? {
                    RuntimeValue::Pointer(Some(place)) => self.read_place(&place, span),
                    RuntimeValue::Pointer(None) => {
                        Err(RuntimeError::new(RuntimeErrorKind::NullDereference, span))
                    }
                    other => Err(self.unsupported(
                        format!("cannot dereference {}", other.type_name()),
                        span,
                    )),
                }
            }
            NodeKind::UnaryOperator { fixity } => {
                let fixity = *fixity;
                let op = node.token.kind;
                let child = node.children[0];
                self.eval_unary(op, fixity, child, span)
            }
            NodeKind::BinaryOperator => {
                let op = node.token.kind;
                let children = node.children.clone();
                self.eval_binary(op, children[0], children[1], span)
            }
            NodeKind::FunctionCall { resolved } => {
                let resolved = *resolved;
                let args = node.children.clone();
                let name = node.token.lexeme;
                self.eval_call(name, resolved, &args, span)
            }
            other => Err(self.unsupported(
                format!("cannot evaluate {:?} node", other),
                span,
            )),
        }
    }

    fn eval_bool(&mut self, id: NodeId) -> Result<bool, RuntimeError> {
        let span = self.ast.node(id).token.span;
        match self.eval(id)? {
            RuntimeValue::Bool(b) => Ok(b),
            other => Err(self.unsupported(
                format!("condition evaluated to {}, not bool", other.type_name()),
                span,
            )),
        }
    }

    fn eval_unary(
        &mut self,
        op: TokenKind,
        fixity: UnaryFixity,
        child: NodeId,
        span: Span,
    ) -> Result<RuntimeValue, RuntimeError> {
        match op {
            TokenKind::Increment | TokenKind::Decrement => {
                let place = self.place_for(child)?;
                let old = self.read_place(&place, span)?;
                let delta = if op == TokenKind::Increment { 1 } else { -1 };
                let new = match &old {
                    RuntimeValue::Int(v) => RuntimeValue::Int(v + delta as i64),
                    RuntimeValue::Float(v) => RuntimeValue::Float(v + delta as f64),
                    other => {
                        return Err(self.unsupported(
                            format!("cannot increment {}", other.type_name()),
                            span,
                        ))
                    }
                };
                self.write_place(&place, new.clone(), span)?;
                Ok(match fixity {
                    UnaryFixity::Prefix => new,
                    UnaryFixity::Postfix => old,
                })
            }
            TokenKind::Addition => self.eval(child),
            TokenKind::Subtraction => match self.eval(child)? {
                RuntimeValue::Int(v) => Ok(RuntimeValue::Int(-v)),
                RuntimeValue::Float(v) => Ok(RuntimeValue::Float(-v)),
                other => Err(self.unsupported(
                    format!("cannot negate {}", other.type_name()),
                    span,
                )),
            },
            _ => Err(self.unsupported(format!("unary operator {:?}", op), span)),
        }
    }

    fn eval_binary(
        &mut self,
        op: TokenKind,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
    ) -> Result<RuntimeValue, RuntimeError> {
        if op == TokenKind::Assign {
            let value = self.eval(rhs)?;
            let place = self.place_for(lhs)?;
            self.write_place(&place, value.clone(), span)?;
            return Ok(value);
        }
        // Logical connectives short-circuit.
        if op == TokenKind::And {
            return Ok(RuntimeValue::Bool(
                self.eval_bool(lhs)? && self.eval_bool(rhs)?,
            ));
        }
        if op == TokenKind::Or {
            return Ok(RuntimeValue::Bool(
                self.eval_bool(lhs)? || self.eval_bool(rhs)?,
            ));
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;
        self.apply_binary(op, left, right, span)
    }

    fn apply_binary(
        &self,
        op: TokenKind,
        left: RuntimeValue,
        right: RuntimeValue,
        span: Span,
    ) -> Result<RuntimeValue, RuntimeError> {
        use RuntimeValue::{Bool as VBool, Float as VFloat, Int};
        use TokenKind::*;
        let value = match (op, &left, &right) {
            (Addition, Int(l), Int(r)) => Int(l.wrapping_add(*r)),
            (Subtraction, Int(l), Int(r)) => Int(l.wrapping_sub(*r)),
            (Multiplication, Int(l), Int(r)) => Int(l.wrapping_mul(*r)),
            (Division, Int(l), Int(r)) => {
                if *r == 0 {
                    return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, span));
                }
                Int(l / r)
            }
            (Modulus, Int(l), Int(r)) => {
                if *r == 0 {
                    return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero, span));
                }
                Int(l % r)
            }
            (Addition, VFloat(l), VFloat(r)) => VFloat(l + r),
            (Subtraction, VFloat(l), VFloat(r)) => VFloat(l - r),
            (Multiplication, VFloat(l), VFloat(r)) => VFloat(l * r),
            (Division, VFloat(l), VFloat(r)) => VFloat(l / r),
            (Lesser, Int(l), Int(r)) => VBool(l < r),
            (LesserOrEqual, Int(l), Int(r)) => VBool(l <= r),
            (Greater, Int(l), Int(r)) => VBool(l > r),
            (GreaterOrEqual, Int(l), Int(r)) => VBool(l >= r),
            (Lesser, VFloat(l), VFloat(r)) => VBool(l < r),
            (LesserOrEqual, VFloat(l), VFloat(r)) => VBool(l <= r),
            (Greater, VFloat(l), VFloat(r)) => VBool(l > r),
            (GreaterOrEqual, VFloat(l), VFloat(r)) => VBool(l >= r),
            (Equal, _, _) => VBool(left == right),
            (Different, _, _) => VBool(left != right),
            (Xor, VBool(l), VBool(r)) => VBool(l ^ r),
            (And, VBool(l), VBool(r)) => VBool(*l && *r),
            (Or, VBool(l), VBool(r)) => VBool(*l || *r),
            _ => {
                return Err(self.unsupported(
                    format!(
                        "operator {:?} not supported on {} and {}",
                        op,
                        left.type_name(),
                        right.type_name()
                    ),
                    span,
                ))
            }
        };
        Ok(value)
    }

    fn eval_call(
        &mut self,
        name: Symbol,
        resolved: Option<NodeId>,
        args: &[NodeId],
        span: Span,
    ) -> Result<RuntimeValue, RuntimeError> {
        // Arguments evaluate left to right in the caller's scope.
        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            values.push(self.eval(arg)?);
        }

        let Some(declaration) = resolved else {
            if self.interner.resolve(name) == "print" {
                for value in &values {
                    let line = self.display_value(value);
                    self.output.push(line);
                }
                return Ok(RuntimeValue::Void);
            }
            return Err(self.unsupported(
                format!(
                    "function '{}' has no body in this unit",
                    self.interner.resolve(name)
                ),
                span,
            ));
        };

        let decl = self.ast.node(declaration);
        let children = decl.children.clone();
        let (params, body) = match children.split_last() {
            Some((body, params)) => (params, *body),
            None => {
                return Err(self.unsupported("function declaration has no body".to_string(), span))
            }
        };
        if params.len() != values.len() {
            return Err(self.unsupported(
                format!(
                    "expected {} arguments, got {}",
                    params.len(),
                    values.len()
                ),
                span,
            ));
        }

        self.push_scope();
        for (&param, value) in params.iter().zip(values) {
            let param_name = self.ast.node(param).token.lexeme;
            self.define(param_name, value);
        }
        let flow = self.exec(body);
        self.pop_scope();

        match flow? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Continue => Ok(RuntimeValue::Void),
        }
    }

    // ------------------------------------------------------------------
    // Places (storage locations)
    // ------------------------------------------------------------------

    fn place_for(&mut self, id: NodeId) -> Result<Place, RuntimeError> {
        let node = self.ast.node(id);
        let span = node.token.span;
        match &node.kind {
            NodeKind::LValueToRValue => {
                let child = node.children[0];
                self.place_for(child)
            }
            NodeKind::Dereference => {
                let child = node.children[0];
                match self.eval(child)? {
                    RuntimeValue::Pointer(Some(place)) => Ok(place),
                    RuntimeValue::Pointer(None) => {
                        Err(RuntimeError::new(RuntimeErrorKind::NullDereference, span))
                    }
                    other => Err(self.unsupported(
                        format!("cannot dereference {}", other.type_name()),
                        span,
                    )),
                }
            }
            NodeKind::Variable => {
                let name = node.token.lexeme;
                let accesses = node.children.clone();
                let scope = self
                    .env
                    .iter()
                    .rposition(|scope| scope.contains_key(&name))
                    .ok_or_else(|| {
                        self.unsupported(
                            format!("'{}' is not bound", self.interner.resolve(name)),
                            span,
                        )
                    })?;
                let mut place = Place::Env {
                    scope,
                    name,
                    path: Vec::new(),
                };

                for access in accesses {
                    match self.ast.node(access).kind {
                        NodeKind::MemberIdentifier { index } => {
                            match self.read_place(&place, span)? {
                                RuntimeValue::Struct { .. } => place.push_member(index as usize),
                                other => {
                                    return Err(self.unsupported(
                                        format!(
                                            "member access on {}",
                                            other.type_name()
                                        ),
                                        span,
                                    ))
                                }
                            }
                        }
                        _ => {
                            // Subscript index expression.
                            let index = match self.eval(access)? {
                                RuntimeValue::Int(i) => i,
                                other => {
                                    return Err(self.unsupported(
                                        format!("array index is {}", other.type_name()),
                                        span,
                                    ))
                                }
                            };
                            let handle = match self.read_place(&place, span)? {
                                RuntimeValue::Array(handle) => handle,
                                other => {
                                    return Err(self.unsupported(
                                        format!("subscript on {}", other.type_name()),
                                        span,
                                    ))
                                }
                            };
                            let capacity = self.heap[handle].len();
                            if index < 0 || index as usize >= capacity {
                                return Err(RuntimeError::new(
                                    RuntimeErrorKind::OutOfBounds { index, capacity },
                                    span,
                                ));
                            }
                            place = Place::Heap {
                                handle,
                                index: index as usize,
                                path: Vec::new(),
                            };
                        }
                    }
                }
                Ok(place)
            }
            other => Err(self.unsupported(
                format!("{:?} does not denote a storage location", other),
                span,
            )),
        }
    }

    fn read_place(&self, place: &Place, span: Span) -> Result<RuntimeValue, RuntimeError> {
        let (mut value, path) = match place {
            Place::Env { scope, name, path } => {
                let slot = self.env[*scope].get(name).ok_or_else(|| {
                    self.unsupported(
                        format!("'{}' is not bound", self.interner.resolve(*name)),
                        span,
                    )
                })?;
                (slot, path)
            }
            Place::Heap {
                handle,
                index,
                path,
            } => {
                let slab = &self.heap[*handle];
                let slot = slab.get(*index).ok_or_else(|| {
                    RuntimeError::new(
                        RuntimeErrorKind::OutOfBounds {
                            index: *index as i64,
                            capacity: slab.len(),
                        },
                        span,
                    )
                })?;
                (slot, path)
            }
        };
        for &member in path {
            value = match value {
                RuntimeValue::Struct { fields, .. } => &fields[member],
                other => {
                    return Err(self.unsupported(
                        format!("member access on {}", other.type_name()),
                        span,
                    ))
                }
            };
        }
        Ok(value.clone())
    }

    fn write_place(
        &mut self,
        place: &Place,
        value: RuntimeValue,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let (mut slot, path) = match place {
            Place::Env { scope, name, path } => {
                let missing = !self.env[*scope].contains_key(name);
                if missing {
                    return Err(self.unsupported(
                        format!("'{}' is not bound", self.interner.resolve(*name)),
                        span,
                    ));
                }
                (self.env[*scope].get_mut(name).unwrap(), path)
            }
            Place::Heap {
                handle,
                index,
                path,
            } => {
                let capacity = self.heap[*handle].len();
                if *index >= capacity {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::OutOfBounds {
                            index: *index as i64,
                            capacity,
                        },
                        span,
                    ));
                }
                (&mut self.heap[*handle][*index], path)
            }
        };
        for &member in path {
            slot = match slot {
                RuntimeValue::Struct { fields, .. } => &mut fields[member],
                _ => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::Unsupported("member access on non-composite".into()),
                        span,
                    ))
                }
            };
        }
        *slot = value;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn value_from_literal(&self, value: &Value) -> RuntimeValue {
        match value {
            Value::Integer(v) => RuntimeValue::Int(*v),
            Value::Float(v) => RuntimeValue::Float(*v),
            Value::Boolean(v) => RuntimeValue::Bool(*v),
            Value::Char(v) => RuntimeValue::Char(*v),
            Value::Str(s) => RuntimeValue::Str(self.interner.resolve(*s).to_string()),
        }
    }

    fn cast_value(
        &self,
        value: RuntimeValue,
        target: TypeId,
        span: Span,
    ) -> Result<RuntimeValue, RuntimeError> {
        match (&value, target) {
            (RuntimeValue::Int(v), t) if self.registry.is_float(t) => {
                Ok(RuntimeValue::Float(*v as f64))
            }
            (RuntimeValue::Float(_), t) if self.registry.is_float(t) => Ok(value),
            (RuntimeValue::Int(_), t) if self.registry.is_integer(t) => Ok(value),
            (RuntimeValue::Char(v), t) if self.registry.is_integer(t) => {
                Ok(RuntimeValue::Int(*v as i64))
            }
            _ => Err(self.unsupported(
                format!(
                    "cannot cast {} to {}",
                    value.type_name(),
                    self.registry.designation(target)
                ),
                span,
            )),
        }
    }

    /// Zero value for a declared type; allocates array storage.
    fn default_value(&mut self, type_id: TypeId) -> RuntimeValue {
        match self.registry.get(type_id).kind.clone() {
            TypeKind::Scalar(_) if self.registry.is_integer(type_id) => RuntimeValue::Int(0),
            TypeKind::Scalar(_) if self.registry.is_float(type_id) => RuntimeValue::Float(0.0),
            _ if type_id == TypeId::BOOL => RuntimeValue::Bool(false),
            _ if type_id == TypeId::CHAR => RuntimeValue::Char('\0'),
            TypeKind::Pointer { .. } => RuntimeValue::Pointer(None),
            _ if type_id == TypeId::POINTER => RuntimeValue::Pointer(None),
            TypeKind::Array { element, capacity } => {
                let elements = (0..capacity)
                    .map(|_| self.default_value(element))
                    .collect();
                let handle = self.heap.len();
                self.heap.push(elements);
                RuntimeValue::Array(handle)
            }
            TypeKind::Struct { members } => {
                let fields = members
                    .iter()
                    .map(|member| match &member.default {
                        Some(value) => self.value_from_literal(value),
                        None => self.default_value(member.type_id),
                    })
                    .collect();
                RuntimeValue::Struct { type_id, fields }
            }
            _ => RuntimeValue::Void,
        }
    }

    /// Formats a value the way `print` emits it.
    pub fn display_value(&self, value: &RuntimeValue) -> String {
        match value {
            RuntimeValue::Int(v) => v.to_string(),
            RuntimeValue::Float(v) => {
                let formatted = format!("{:.6}", v);
                formatted
                    .trim_end_matches('0')
                    .trim_end_matches('.')
                    .to_string()
            }
            RuntimeValue::Bool(v) => v.to_string(),
            RuntimeValue::Char(v) => v.to_string(),
            RuntimeValue::Str(v) => v.clone(),
            RuntimeValue::Array(handle) => {
                let parts: Vec<String> = self.heap[*handle]
                    .iter()
                    .map(|v| self.display_value(v))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            RuntimeValue::Struct { type_id, fields } => {
                let members = self.registry.members_of(*type_id).unwrap_or(&[]);
                let parts: Vec<String> = members
                    .iter()
                    .zip(fields)
                    .map(|(member, field)| {
                        format!(
                            "{}: {}",
                            self.interner.resolve(member.name),
                            self.display_value(field)
                        )
                    })
                    .collect();
                format!(
                    "{} {{ {} }}",
                    self.registry.designation(*type_id),
                    parts.join(", ")
                )
            }
            RuntimeValue::Pointer(Some(_)) => "<pointer>".to_string(),
            RuntimeValue::Pointer(None) => "<null>".to_string(),
            RuntimeValue::Void => "void".to_string(),
        }
    }

    fn define(&mut self, name: Symbol, value: RuntimeValue) {
        self.env
            .last_mut()
            .expect("environment stack is never empty")
            .insert(name, value);
    }

    fn push_scope(&mut self) {
        self.env.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.env.pop();
    }

    fn unsupported(&self, message: String, span: Span) -> RuntimeError {
        RuntimeError::new(RuntimeErrorKind::Unsupported(message), span)
    }
}

/// Parses, optimizes, and interprets a single in-memory unit. Testing
/// convenience used by the CLI and the integration suite.
pub fn interpret_source(
    source: &str,
) -> Result<(RuntimeValue, Vec<String>), Box<dyn std::error::Error>> {
    let mut interner = Interner::new();
    let mut registry = TypeRegistry::new();
    let tokens = quill_syntax::lexer::Lexer::tokenize(source, &mut interner)?;
    let mut result = quill_syntax::parser::Parser::new(source, &tokens, &mut interner, &mut registry)
        .parse()
        .map_err(|errors| {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        })?;
    optimize::optimize(&mut result.ast);
    let mut interpreter = Interpreter::new(&result.ast, &interner, &registry);
    let value = interpreter.run()?;
    Ok((value, interpreter.output))
}
