//! Recursive-descent parser producing one typed [`Ast`] per translation
//! unit.
//!
//! The parser consumes the token stream, resolves names through the
//! [`ScopeStack`], attaches a [`TypeId`] to every expression node
//! bottom-up, and normalizes reads from storage locations by inserting
//! explicit `LValueToRValue` nodes, so downstream passes never re-derive
//! value category.
//!
//! Expressions use precedence climbing over the table in
//! [`TokenKind::binary_precedence`]: a recursion level consumes every
//! operator binding tighter than its limit, and `=` re-enters at equal
//! precedence to group rightward. Mixed int/float arithmetic inserts a
//! `Cast` on the integer operand.
//!
//! Errors do not abort the unit: statement-level failures are recorded
//! and the parser resynchronizes at the next `;` or `}`, so one pass can
//! report several diagnostics.

use crate::ast::{Ast, FunctionFlags, Node, NodeId, NodeKind, UnaryFixity, Value};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::scope::{FunctionEntry, ScopeStack, VariableEntry};
use crate::token::{Token, TokenKind, MAX_PRECEDENCE, UNARY_PRECEDENCE};
use crate::types::{Member, TypeId, TypeRegistry};
use quill_base::{error, Interner, Span};

/// Everything the parser learned about one translation unit.
#[derive(Debug)]
pub struct ParseResult {
    pub ast: Ast,
    /// Names mentioned by `import` statements, in order of appearance.
    pub dependencies: Vec<String>,
    /// `FunctionDeclaration` nodes flagged `EXPORTED`.
    pub exported_functions: Vec<NodeId>,
    /// `TypeDeclaration` nodes flagged for export.
    pub exported_types: Vec<NodeId>,
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    interner: &'a mut Interner,
    registry: &'a mut TypeRegistry,
    scopes: ScopeStack,
    ast: Ast,
    errors: Vec<SyntaxError>,
    dependencies: Vec<String>,
    exported_functions: Vec<NodeId>,
    exported_types: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        tokens: &'a [Token],
        interner: &'a mut Interner,
        registry: &'a mut TypeRegistry,
    ) -> Self {
        let mut scopes = ScopeStack::new();
        // The root scope hosts the built-ins.
        let print = interner.intern("print");
        scopes.declare_function(FunctionEntry {
            name: print,
            return_type: TypeId::VOID,
            parameters: Vec::new(),
            flags: FunctionFlags::VARIADIC,
            node: None,
        });

        Parser {
            source,
            tokens,
            pos: 0,
            interner,
            registry,
            scopes,
            ast: Ast::new(),
            errors: Vec::new(),
            dependencies: Vec::new(),
            exported_functions: Vec::new(),
            exported_types: Vec::new(),
        }
    }

    /// Introduces a function signature from another module's interface.
    pub fn declare_imported_function(
        &mut self,
        name: &str,
        return_type: TypeId,
        parameters: Vec<TypeId>,
    ) {
        let name = self.interner.intern(name);
        self.scopes.declare_function(FunctionEntry {
            name,
            return_type,
            parameters,
            flags: FunctionFlags::IMPORTED,
            node: None,
        });
    }

    /// Introduces a type name from another module's interface.
    pub fn declare_imported_type(&mut self, name: &str, id: TypeId) {
        let name = self.interner.intern(name);
        self.scopes.declare_type(name, id);
    }

    /// Fast pre-pass over a token stream collecting `import` targets
    /// without building an AST.
    pub fn parse_dependencies(tokens: &[Token], interner: &Interner) -> Vec<String> {
        let mut deps = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].kind == TokenKind::Import
                && i + 1 < tokens.len()
                && tokens[i + 1].kind == TokenKind::Identifier
            {
                deps.push(interner.resolve(tokens[i + 1].lexeme).to_string());
                i += 2;
            } else {
                i += 1;
            }
        }
        deps
    }

    /// Parses the whole unit. Returns every diagnostic collected when any
    /// statement failed.
    pub fn parse(mut self) -> Result<ParseResult, Vec<SyntaxError>> {
        let root = self.ast.root();
        while !self.at_end() {
            if let Err(e) = self.parse_statement(root) {
                self.errors.push(e);
                self.synchronize();
            }
        }
        if self.errors.is_empty() {
            Ok(ParseResult {
                ast: self.ast,
                dependencies: self.dependencies,
                exported_functions: self.exported_functions,
                exported_types: self.exported_types,
            })
        } else {
            Err(self.errors)
        }
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or_else(|| {
            let end = self.source.len();
            Token::new(TokenKind::Eof, quill_base::Symbol::EMPTY, Span::new(end, end))
        })
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: found.kind,
                },
                found.span,
            ))
        }
    }

    fn text(&self, token: Token) -> &str {
        self.interner.resolve(token.lexeme)
    }

    /// Skips ahead to the next statement boundary after an error.
    fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek().kind {
                TokenKind::EndStatement => {
                    self.advance();
                    return;
                }
                TokenKind::CloseScope => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        match self.peek().kind {
            TokenKind::EndStatement => {
                self.advance();
                Ok(())
            }
            TokenKind::OpenScope => self.parse_scope(parent).map(|_| ()),
            TokenKind::If => self.parse_if(parent),
            TokenKind::While => self.parse_while(parent),
            TokenKind::For => self.parse_for(parent),
            TokenKind::Return => self.parse_return(parent),
            TokenKind::Import => self.parse_import(),
            TokenKind::Export => {
                self.advance();
                match self.peek().kind {
                    TokenKind::Function => self.parse_function(parent, true),
                    TokenKind::Type => self.parse_type_declaration(parent, true),
                    _ => {
                        let found = self.peek();
                        Err(SyntaxError::new(
                            SyntaxErrorKind::UnexpectedToken {
                                expected: "'function' or 'type' after 'export'".to_string(),
                                found: found.kind,
                            },
                            found.span,
                        ))
                    }
                }
            }
            TokenKind::Function => self.parse_function(parent, false),
            TokenKind::Type => self.parse_type_declaration(parent, false),
            TokenKind::Let => {
                self.parse_let_declaration(parent, false)?;
                self.expect(TokenKind::EndStatement, "';'").map(|_| ())
            }
            TokenKind::Const => {
                self.advance();
                match self.peek().kind {
                    TokenKind::Let => self.parse_let_declaration(parent, true)?,
                    TokenKind::Identifier if self.starts_declaration() => {
                        self.parse_typed_declaration(parent, true)?
                    }
                    _ => {
                        let found = self.peek();
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnexpectedToken {
                                expected: "declaration after 'const'".to_string(),
                                found: found.kind,
                            },
                            found.span,
                        ));
                    }
                };
                self.expect(TokenKind::EndStatement, "';'").map(|_| ())
            }
            TokenKind::Identifier if self.starts_declaration() => {
                self.parse_typed_declaration(parent, false)?;
                self.expect(TokenKind::EndStatement, "';'").map(|_| ())
            }
            _ => self.parse_expression_statement(parent),
        }
    }

    /// A statement beginning with an identifier is a declaration when the
    /// identifier names a type and a variable name or `[capacity]`
    /// follows.
    fn starts_declaration(&self) -> bool {
        let token = self.peek();
        if token.kind != TokenKind::Identifier || self.type_of_name(token).is_none() {
            return false;
        }
        matches!(
            self.peek_kind(1),
            TokenKind::Identifier | TokenKind::OpenSubscript
        )
    }

    fn type_of_name(&self, token: Token) -> Option<TypeId> {
        self.scopes
            .resolve_type(token.lexeme)
            .or_else(|| self.registry.lookup(self.text(token)))
    }

    fn parse_scope(&mut self, parent: NodeId) -> Result<NodeId, SyntaxError> {
        let open = self.expect(TokenKind::OpenScope, "'{'")?;
        let scope = self
            .ast
            .add_child(parent, Node::new(NodeKind::Scope, open));
        self.scopes.push();

        while !self.at_end() && !self.check(TokenKind::CloseScope) {
            if let Err(e) = self.parse_statement(scope) {
                self.errors.push(e);
                self.synchronize();
            }
        }

        self.scopes.pop();
        if self.eat(TokenKind::CloseScope).is_none() {
            let (opened_line, _) = error::line_column(self.source, open.span);
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnmatchedBrace { opened_line },
                open.span,
            ));
        }
        Ok(scope)
    }

    /// Bodies of `if`/`while`/`for`: either a braced scope or a single
    /// statement wrapped in its own scope.
    fn parse_scope_or_single_statement(&mut self, parent: NodeId) -> Result<NodeId, SyntaxError> {
        if self.check(TokenKind::OpenScope) {
            return self.parse_scope(parent);
        }
        let scope = self
            .ast
            .add_child(parent, Node::new(NodeKind::Scope, self.peek()));
        self.scopes.push();
        let result = self.parse_statement(scope);
        self.scopes.pop();
        result?;
        Ok(scope)
    }

    /// Parses a parenthesis-free boolean expression wrapped in an
    /// `Expression` node.
    fn parse_condition(&mut self, parent: NodeId) -> Result<NodeId, SyntaxError> {
        let wrapper = self
            .ast
            .add_child(parent, Node::new(NodeKind::Expression, self.peek()));
        let expr = self.parse_expression(MAX_PRECEDENCE)?;
        let expr = self.to_rvalue(expr);
        let expr_type = self.ast.node(expr).type_id;
        if expr_type != TypeId::BOOL {
            return Err(SyntaxError::new(
                SyntaxErrorKind::TypeMismatch {
                    expected: "bool".to_string(),
                    found: self.registry.designation(expr_type).to_string(),
                },
                self.ast.node(expr).token.span,
            ));
        }
        self.ast.attach(wrapper, expr);
        self.ast.node_mut(wrapper).type_id = TypeId::BOOL;
        Ok(wrapper)
    }

    fn parse_if(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        let token = self.advance();
        let node = self.ast.add_child(parent, Node::new(NodeKind::If, token));
        let open = self.expect(TokenKind::OpenParen, "'(' after 'if'")?;
        self.parse_condition(node)?;
        if self.eat(TokenKind::CloseParen).is_none() {
            return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedParen, open.span));
        }
        self.parse_scope_or_single_statement(node)?;
        if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                self.parse_if(node)?;
            } else {
                self.parse_scope_or_single_statement(node)?;
            }
        }
        Ok(())
    }

    fn parse_while(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        let token = self.advance();
        let node = self.ast.add_child(parent, Node::new(NodeKind::While, token));
        let open = self.expect(TokenKind::OpenParen, "'(' after 'while'")?;
        self.parse_condition(node)?;
        if self.eat(TokenKind::CloseParen).is_none() {
            return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedParen, open.span));
        }
        self.parse_scope_or_single_statement(node)?;
        Ok(())
    }

    fn parse_for(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        let token = self.advance();
        let node = self.ast.add_child(parent, Node::new(NodeKind::For, token));
        let open = self.expect(TokenKind::OpenParen, "'(' after 'for'")?;

        // The initializer and the loop variable live in the loop's own
        // scope; pop on every exit path.
        self.scopes.push();
        let result = (|| {
            match self.peek().kind {
                TokenKind::Let => {
                    self.parse_let_declaration(node, false)?;
                }
                TokenKind::Const => {
                    self.advance();
                    self.parse_typed_declaration(node, true)?;
                }
                TokenKind::Identifier if self.starts_declaration() => {
                    self.parse_typed_declaration(node, false)?;
                }
                _ => {
                    self.parse_bare_expression_statement(node)?;
                }
            }
            self.expect(TokenKind::EndStatement, "';' after for initializer")?;

            self.parse_condition(node)?;
            self.expect(TokenKind::EndStatement, "';' after for condition")?;

            let step = self
                .ast
                .add_child(node, Node::new(NodeKind::Expression, self.peek()));
            let step_expr = self.parse_expression(MAX_PRECEDENCE)?;
            let step_expr = self.to_rvalue(step_expr);
            self.ast.attach(step, step_expr);
            self.ast.node_mut(step).type_id = self.ast.node(step_expr).type_id;

            if self.eat(TokenKind::CloseParen).is_none() {
                return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedParen, open.span));
            }
            self.parse_scope_or_single_statement(node)?;
            Ok(())
        })();
        self.scopes.pop();
        result
    }

    fn parse_return(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        let token = self.advance();
        let node = self.ast.add_child(parent, Node::new(NodeKind::Return, token));
        if !self.check(TokenKind::EndStatement) {
            let wrapper = self
                .ast
                .add_child(node, Node::new(NodeKind::Expression, self.peek()));
            let value = self.parse_expression(MAX_PRECEDENCE)?;
            let value = self.to_rvalue(value);
            self.ast.attach(wrapper, value);
            let value_type = self.ast.node(value).type_id;
            self.ast.node_mut(wrapper).type_id = value_type;
            self.ast.node_mut(node).type_id = value_type;
        }
        self.expect(TokenKind::EndStatement, "';' after return")?;
        Ok(())
    }

    fn parse_import(&mut self) -> Result<(), SyntaxError> {
        self.advance();
        let name = self.expect_identifier("module name after 'import'")?;
        let dep = self.text(name).to_string();
        self.dependencies.push(dep);
        self.expect(TokenKind::EndStatement, "';' after import")?;
        Ok(())
    }

    fn expect_identifier(&mut self, _context: &str) -> Result<Token, SyntaxError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(SyntaxError::new(
                SyntaxErrorKind::ExpectedIdentifier { found: found.kind },
                found.span,
            ))
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// `let name : Type [= init]`
    fn parse_let_declaration(
        &mut self,
        parent: NodeId,
        constant: bool,
    ) -> Result<NodeId, SyntaxError> {
        self.expect(TokenKind::Let, "'let'")?;
        let name = self.expect_identifier("variable name")?;
        self.expect(TokenKind::Colon, "':' after variable name")?;
        let type_id = self.parse_type_reference()?;
        self.finish_declaration(parent, name, type_id, constant)
    }

    /// `Type[capacity]? name [= init]`
    fn parse_typed_declaration(
        &mut self,
        parent: NodeId,
        constant: bool,
    ) -> Result<NodeId, SyntaxError> {
        let type_id = self.parse_type_reference()?;
        let name = self.expect_identifier("variable name")?;
        self.finish_declaration(parent, name, type_id, constant)
    }

    /// A type name with an optional `[capacity]` derivation.
    fn parse_type_reference(&mut self) -> Result<TypeId, SyntaxError> {
        let token = self.peek();
        if token.kind != TokenKind::Identifier {
            return Err(SyntaxError::new(
                SyntaxErrorKind::ExpectedType {
                    name: self.text(token).to_string(),
                },
                token.span,
            ));
        }
        let base = self.type_of_name(token).ok_or_else(|| {
            SyntaxError::new(
                SyntaxErrorKind::ExpectedType {
                    name: self.text(token).to_string(),
                },
                token.span,
            )
        })?;
        self.advance();

        if let Some(open) = self.eat(TokenKind::OpenSubscript) {
            let capacity = self.parse_constant_capacity()?;
            if self.eat(TokenKind::CloseSubscript).is_none() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnmatchedBracket,
                    open.span,
                ));
            }
            return Ok(self.registry.array_of(base, capacity));
        }
        Ok(base)
    }

    /// Array capacities must reduce to a constant integer at parse time;
    /// `const` variables with literal initializers count.
    fn parse_constant_capacity(&mut self) -> Result<u32, SyntaxError> {
        let expr = self.parse_expression(MAX_PRECEDENCE)?;
        let span = self.ast.node(expr).token.span;
        let value = self.const_eval(expr).ok_or_else(|| {
            SyntaxError::new(
                SyntaxErrorKind::TypeMismatch {
                    expected: "constant integer capacity".to_string(),
                    found: self
                        .registry
                        .designation(self.ast.node(expr).type_id)
                        .to_string(),
                },
                span,
            )
        })?;
        if value <= 0 || value > u32::MAX as i64 {
            return Err(SyntaxError::new(
                SyntaxErrorKind::TypeMismatch {
                    expected: "positive array capacity".to_string(),
                    found: value.to_string(),
                },
                span,
            ));
        }
        Ok(value as u32)
    }

    fn const_eval(&self, id: NodeId) -> Option<i64> {
        let node = self.ast.node(id);
        match &node.kind {
            NodeKind::ConstantValue(Value::Integer(v)) => Some(*v),
            NodeKind::LValueToRValue | NodeKind::Expression => {
                self.const_eval(*node.children.first()?)
            }
            NodeKind::Variable if node.children.is_empty() => {
                match self.scopes.resolve_variable(node.token.lexeme)?.const_value {
                    Some(Value::Integer(v)) => Some(v),
                    _ => None,
                }
            }
            NodeKind::BinaryOperator => {
                let lhs = self.const_eval(*node.children.first()?)?;
                let rhs = self.const_eval(*node.children.get(1)?)?;
                match node.token.kind {
                    TokenKind::Addition => Some(lhs.wrapping_add(rhs)),
                    TokenKind::Subtraction => Some(lhs.wrapping_sub(rhs)),
                    TokenKind::Multiplication => Some(lhs.wrapping_mul(rhs)),
                    TokenKind::Division if rhs != 0 => Some(lhs / rhs),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn finish_declaration(
        &mut self,
        parent: NodeId,
        name: Token,
        type_id: TypeId,
        constant: bool,
    ) -> Result<NodeId, SyntaxError> {
        // Parse the initializer before declaring so `int x = x;` reports
        // an undeclared name instead of reading garbage.
        let mut initializer = None;
        if self.eat(TokenKind::Assign).is_some() {
            let init = self.parse_expression(MAX_PRECEDENCE)?;
            let init = self.to_rvalue(init);
            let init = self.coerce(init, type_id)?;
            initializer = Some(init);
        }

        let const_value = match (constant, initializer) {
            (true, Some(init)) => match &self.ast.node(init).kind {
                NodeKind::ConstantValue(v) => Some(v.clone()),
                _ => None,
            },
            _ => None,
        };

        let node = self.ast.add_child(
            parent,
            Node::with_type(NodeKind::VariableDeclaration { constant }, name, type_id),
        );
        if let Some(init) = initializer {
            self.ast.attach(node, init);
        }

        let declared = self.scopes.declare_variable(VariableEntry {
            name: name.lexeme,
            type_id,
            constant,
            const_value,
            node,
        });
        if !declared {
            return Err(SyntaxError::new(
                SyntaxErrorKind::Redeclaration {
                    name: self.text(name).to_string(),
                },
                name.span,
            ));
        }
        Ok(node)
    }

    /// Inserts a `Cast` when `expr` is an integer feeding a float slot;
    /// fails on any other type mismatch.
    fn coerce(&mut self, expr: NodeId, target: TypeId) -> Result<NodeId, SyntaxError> {
        let found = self.ast.node(expr).type_id;
        if found == target {
            return Ok(expr);
        }
        if self.registry.is_float(target) && self.registry.is_integer(found) {
            return Ok(self.cast(expr, target));
        }
        Err(SyntaxError::new(
            SyntaxErrorKind::TypeMismatch {
                expected: self.registry.designation(target).to_string(),
                found: self.registry.designation(found).to_string(),
            },
            self.ast.node(expr).token.span,
        ))
    }

    fn cast(&mut self, expr: NodeId, target: TypeId) -> NodeId {
        let token = self.ast.node(expr).token;
        let cast = self
            .ast
            .add(Node::with_type(NodeKind::Cast, token, target));
        self.ast.attach(cast, expr);
        cast
    }

    fn parse_type_declaration(
        &mut self,
        parent: NodeId,
        exported: bool,
    ) -> Result<(), SyntaxError> {
        self.advance(); // 'type'
        let name = self.expect_identifier("type name")?;
        let open = self.expect(TokenKind::OpenScope, "'{' after type name")?;

        let node = self
            .ast
            .add_child(parent, Node::new(NodeKind::TypeDeclaration, name));
        let mut members = Vec::new();

        while !self.at_end() && !self.check(TokenKind::CloseScope) {
            self.parse_type_member(node, &mut members)?;
        }
        if self.eat(TokenKind::CloseScope).is_none() {
            let (opened_line, _) = error::line_column(self.source, open.span);
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnmatchedBrace { opened_line },
                open.span,
            ));
        }
        self.eat(TokenKind::EndStatement); // optional trailing ';'

        let name_str = self.text(name).to_string();
        // Primitives and derived types cannot be redefined; an existing
        // struct or forward placeholder re-registers idempotently.
        if let Some(existing) = self.registry.lookup(&name_str) {
            use crate::types::TypeKind;
            if !matches!(
                self.registry.get(existing).kind,
                TypeKind::Struct { .. } | TypeKind::Placeholder(_)
            ) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::Redeclaration { name: name_str },
                    name.span,
                ));
            }
        }
        let id = self.registry.register_user_type(&name_str, members);
        self.ast.node_mut(node).type_id = id;

        if !self.scopes.declare_type(name.lexeme, id) {
            return Err(SyntaxError::new(
                SyntaxErrorKind::Redeclaration { name: name_str },
                name.span,
            ));
        }
        if exported {
            self.exported_types.push(node);
        }
        Ok(())
    }

    /// One member line: `let name : Type [= literal];` or
    /// `Type name [= literal];`.
    fn parse_type_member(
        &mut self,
        type_node: NodeId,
        members: &mut Vec<Member>,
    ) -> Result<(), SyntaxError> {
        let (name, member_type) = if self.eat(TokenKind::Let).is_some() {
            let name = self.expect_identifier("member name")?;
            self.expect(TokenKind::Colon, "':' after member name")?;
            let member_type = self.parse_type_reference()?;
            (name, member_type)
        } else {
            let member_type = self.parse_type_reference()?;
            let name = self.expect_identifier("member name")?;
            (name, member_type)
        };

        let member_node = self.ast.add_child(
            type_node,
            Node::with_type(
                NodeKind::VariableDeclaration { constant: false },
                name,
                member_type,
            ),
        );

        let mut default = None;
        if self.eat(TokenKind::Assign).is_some() {
            let literal = self.parse_primary()?;
            let value = match &self.ast.node(literal).kind {
                NodeKind::ConstantValue(v) => v.clone(),
                _ => {
                    let token = self.ast.node(literal).token;
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnexpectedToken {
                            expected: "literal default value".to_string(),
                            found: token.kind,
                        },
                        token.span,
                    ));
                }
            };
            let value = self.convert_literal(value, member_type, self.ast.node(literal).token)?;
            self.ast
                .node_mut(literal)
                .kind = NodeKind::ConstantValue(value.clone());
            self.ast.node_mut(literal).type_id = member_type;
            self.ast.attach(member_node, literal);
            default = Some(value);
        }
        self.expect(TokenKind::EndStatement, "';' after member")?;

        members.push(Member {
            name: name.lexeme,
            type_id: member_type,
            default,
        });
        Ok(())
    }

    /// Checks a literal against a declared slot type, widening integer
    /// literals to float slots.
    fn convert_literal(
        &self,
        value: Value,
        target: TypeId,
        token: Token,
    ) -> Result<Value, SyntaxError> {
        let ok = match (&value, target) {
            (Value::Integer(_), t) if self.registry.is_integer(t) => true,
            (Value::Integer(v), t) if self.registry.is_float(t) => {
                return Ok(Value::Float(*v as f64))
            }
            (Value::Float(_), t) if self.registry.is_float(t) => true,
            (Value::Boolean(_), TypeId::BOOL) => true,
            (Value::Char(_), TypeId::CHAR) => true,
            (Value::Str(_), TypeId::CSTR) => true,
            _ => false,
        };
        if ok {
            Ok(value)
        } else {
            Err(SyntaxError::new(
                SyntaxErrorKind::TypeMismatch {
                    expected: self.registry.designation(target).to_string(),
                    found: self.text(token).to_string(),
                },
                token.span,
            ))
        }
    }

    fn parse_function(&mut self, parent: NodeId, exported: bool) -> Result<(), SyntaxError> {
        self.advance(); // 'function'
        let name = self.expect_identifier("function name")?;
        let mut flags = FunctionFlags::empty();
        if exported {
            flags |= FunctionFlags::EXPORTED;
        }
        let node = self.ast.add_child(
            parent,
            Node::new(NodeKind::FunctionDeclaration { flags }, name),
        );

        let open = self.expect(TokenKind::OpenParen, "'(' after function name")?;
        let mut parameters = Vec::new();
        while !self.at_end() && !self.check(TokenKind::CloseParen) {
            let param_type = self.parse_type_reference()?;
            let param_name = self.expect_identifier("parameter name")?;
            let param_node = self.ast.add_child(
                node,
                Node::with_type(
                    NodeKind::VariableDeclaration { constant: false },
                    param_name,
                    param_type,
                ),
            );
            parameters.push((param_name, param_type, param_node));
            if self.eat(TokenKind::Comma).is_none() && !self.check(TokenKind::CloseParen) {
                let found = self.peek();
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken {
                        expected: "',' in parameter list".to_string(),
                        found: found.kind,
                    },
                    found.span,
                ));
            }
        }
        if self.eat(TokenKind::CloseParen).is_none() {
            return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedParen, open.span));
        }

        let return_type = if self.eat(TokenKind::Colon).is_some() {
            self.parse_type_reference()?
        } else {
            TypeId::VOID
        };
        self.ast.node_mut(node).type_id = return_type;

        // Declared before the body so recursive calls resolve.
        self.scopes.declare_function(FunctionEntry {
            name: name.lexeme,
            return_type,
            parameters: parameters.iter().map(|(_, t, _)| *t).collect(),
            flags,
            node: Some(node),
        });

        // Parameters live in a scope enclosing the body.
        self.scopes.push();
        for (param_name, param_type, param_node) in &parameters {
            let declared = self.scopes.declare_variable(VariableEntry {
                name: param_name.lexeme,
                type_id: *param_type,
                constant: false,
                const_value: None,
                node: *param_node,
            });
            if !declared {
                self.scopes.pop();
                return Err(SyntaxError::new(
                    SyntaxErrorKind::Redeclaration {
                        name: self.text(*param_name).to_string(),
                    },
                    param_name.span,
                ));
            }
        }
        let body = self.parse_scope(node);
        self.scopes.pop();
        body?;

        if exported {
            self.exported_functions.push(node);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression_statement(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        self.parse_bare_expression_statement(parent)?;
        self.expect(TokenKind::EndStatement, "';'")?;
        Ok(())
    }

    fn parse_bare_expression_statement(&mut self, parent: NodeId) -> Result<(), SyntaxError> {
        let stmt = self
            .ast
            .add_child(parent, Node::new(NodeKind::Statement, self.peek()));
        let wrapper = self
            .ast
            .add_child(stmt, Node::new(NodeKind::Expression, self.peek()));
        let expr = self.parse_expression(MAX_PRECEDENCE)?;
        self.ast.attach(wrapper, expr);
        let expr_type = self.ast.node(expr).type_id;
        self.ast.node_mut(wrapper).type_id = expr_type;
        self.ast.node_mut(stmt).type_id = expr_type;
        Ok(())
    }

    /// Precedence climbing: consumes operators binding tighter than
    /// `limit`; `=` also re-enters at equal precedence (right
    /// associativity).
    fn parse_expression(&mut self, limit: u8) -> Result<NodeId, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let kind = self.peek().kind;
            let Some(precedence) = kind.binary_precedence() else {
                break;
            };
            if precedence < limit || (precedence == limit && kind.is_right_associative()) {
                let op = self.advance();
                let rhs = self.parse_expression(precedence)?;
                lhs = self.make_binary(op, lhs, rhs)?;
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn to_rvalue(&mut self, expr: NodeId) -> NodeId {
        if !self.ast.node(expr).is_lvalue() {
            return expr;
        }
        let token = self.ast.node(expr).token;
        let type_id = self.ast.node(expr).type_id;
        let wrapper = self
            .ast
            .add(Node::with_type(NodeKind::LValueToRValue, token, type_id));
        self.ast.attach(wrapper, expr);
        wrapper
    }

    fn type_mismatch(&self, lhs: TypeId, rhs: TypeId, span: Span) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorKind::TypeMismatch {
                expected: self.registry.designation(lhs).to_string(),
                found: self.registry.designation(rhs).to_string(),
            },
            span,
        )
    }

    fn make_binary(
        &mut self,
        op: Token,
        lhs: NodeId,
        rhs: NodeId,
    ) -> Result<NodeId, SyntaxError> {
        use TokenKind::*;

        if op.kind == Assign {
            if !self.ast.node(lhs).is_lvalue() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::NotAssignable,
                    self.ast.node(lhs).token.span,
                ));
            }
            self.check_mutable(lhs)?;
            let lhs_type = self.ast.node(lhs).type_id;
            let rhs = self.to_rvalue(rhs);
            let rhs = self.coerce(rhs, lhs_type)?;
            let node = self
                .ast
                .add(Node::with_type(NodeKind::BinaryOperator, op, lhs_type));
            self.ast.attach(node, lhs);
            self.ast.attach(node, rhs);
            return Ok(node);
        }

        let lhs = self.to_rvalue(lhs);
        let rhs = self.to_rvalue(rhs);
        let lhs_type = self.ast.node(lhs).type_id;
        let rhs_type = self.ast.node(rhs).type_id;

        let (result, lhs, rhs) = match op.kind {
            Addition | Subtraction | Multiplication | Division => {
                self.unify_arithmetic(op, lhs, rhs)?
            }
            Modulus => {
                if !(self.registry.is_integer(lhs_type) && self.registry.is_integer(rhs_type)) {
                    return Err(self.type_mismatch(lhs_type, rhs_type, op.span));
                }
                let result = if lhs_type == rhs_type { lhs_type } else { TypeId::INT };
                (result, lhs, rhs)
            }
            Lesser | LesserOrEqual | Greater | GreaterOrEqual | Equal | Different => {
                let comparable_as_is = lhs_type == rhs_type
                    && (self.registry.is_numeric(lhs_type)
                        || ((op.kind == Equal || op.kind == Different)
                            && (lhs_type == TypeId::BOOL || lhs_type == TypeId::CHAR)));
                if comparable_as_is {
                    (TypeId::BOOL, lhs, rhs)
                } else if self.registry.is_numeric(lhs_type)
                    && self.registry.is_numeric(rhs_type)
                {
                    let (_, lhs, rhs) = self.unify_arithmetic(op, lhs, rhs)?;
                    (TypeId::BOOL, lhs, rhs)
                } else {
                    return Err(self.type_mismatch(lhs_type, rhs_type, op.span));
                }
            }
            Xor | And | Or => {
                if lhs_type != TypeId::BOOL || rhs_type != TypeId::BOOL {
                    return Err(self.type_mismatch(lhs_type, rhs_type, op.span));
                }
                (TypeId::BOOL, lhs, rhs)
            }
            _ => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken {
                        expected: "binary operator".to_string(),
                        found: op.kind,
                    },
                    op.span,
                ))
            }
        };

        let node = self
            .ast
            .add(Node::with_type(NodeKind::BinaryOperator, op, result));
        self.ast.attach(node, lhs);
        self.ast.attach(node, rhs);
        Ok(node)
    }

    /// Arithmetic typing: int∘int stays integral, float∘int casts the
    /// integer side, float∘double widens to double.
    fn unify_arithmetic(
        &mut self,
        op: Token,
        lhs: NodeId,
        rhs: NodeId,
    ) -> Result<(TypeId, NodeId, NodeId), SyntaxError> {
        let lhs_type = self.ast.node(lhs).type_id;
        let rhs_type = self.ast.node(rhs).type_id;

        if !self.registry.is_numeric(lhs_type) || !self.registry.is_numeric(rhs_type) {
            return Err(self.type_mismatch(lhs_type, rhs_type, op.span));
        }

        if self.registry.is_integer(lhs_type) && self.registry.is_integer(rhs_type) {
            let result = if lhs_type == rhs_type { lhs_type } else { TypeId::INT };
            return Ok((result, lhs, rhs));
        }
        if self.registry.is_float(lhs_type) && self.registry.is_float(rhs_type) {
            if lhs_type == rhs_type {
                return Ok((lhs_type, lhs, rhs));
            }
            let lhs = if lhs_type != TypeId::DOUBLE { self.cast(lhs, TypeId::DOUBLE) } else { lhs };
            let rhs = if rhs_type != TypeId::DOUBLE { self.cast(rhs, TypeId::DOUBLE) } else { rhs };
            return Ok((TypeId::DOUBLE, lhs, rhs));
        }
        if self.registry.is_float(lhs_type) {
            let rhs = self.cast(rhs, lhs_type);
            Ok((lhs_type, lhs, rhs))
        } else {
            let lhs = self.cast(lhs, rhs_type);
            Ok((rhs_type, lhs, rhs))
        }
    }

    fn check_mutable(&self, lvalue: NodeId) -> Result<(), SyntaxError> {
        let node = self.ast.node(lvalue);
        if node.kind == NodeKind::Variable && node.children.is_empty() {
            if let Some(entry) = self.scopes.resolve_variable(node.token.lexeme) {
                if entry.constant {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::NotAssignable,
                        node.token.span,
                    ));
                }
            }
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<NodeId, SyntaxError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Increment | TokenKind::Decrement => {
                self.advance();
                let operand = self.parse_expression(UNARY_PRECEDENCE)?;
                if !self.ast.node(operand).is_lvalue() {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::NotAssignable,
                        self.ast.node(operand).token.span,
                    ));
                }
                self.check_mutable(operand)?;
                let operand_type = self.ast.node(operand).type_id;
                if !self.registry.is_numeric(operand_type) {
                    return Err(self.type_mismatch(TypeId::INT, operand_type, token.span));
                }
                let node = self.ast.add(Node::with_type(
                    NodeKind::UnaryOperator {
                        fixity: UnaryFixity::Prefix,
                    },
                    token,
                    operand_type,
                ));
                self.ast.attach(node, operand);
                Ok(node)
            }
            TokenKind::Addition | TokenKind::Subtraction => {
                self.advance();
                let operand = self.parse_expression(UNARY_PRECEDENCE)?;
                let operand = self.to_rvalue(operand);
                let operand_type = self.ast.node(operand).type_id;
                if !self.registry.is_numeric(operand_type) {
                    return Err(self.type_mismatch(TypeId::INT, operand_type, token.span));
                }
                let node = self.ast.add(Node::with_type(
                    NodeKind::UnaryOperator {
                        fixity: UnaryFixity::Prefix,
                    },
                    token,
                    operand_type,
                ));
                self.ast.attach(node, operand);
                Ok(node)
            }
            TokenKind::Ampersand => {
                self.advance();
                let operand = self.parse_expression(UNARY_PRECEDENCE)?;
                if !self.ast.node(operand).is_lvalue() {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::NotAssignable,
                        self.ast.node(operand).token.span,
                    ));
                }
                let pointer_type = self.registry.pointer_to(self.ast.node(operand).type_id);
                let node = self
                    .ast
                    .add(Node::with_type(NodeKind::GetPointer, token, pointer_type));
                self.ast.attach(node, operand);
                Ok(node)
            }
            TokenKind::Multiplication => {
                self.advance();
                let operand = self.parse_expression(UNARY_PRECEDENCE)?;
                let operand = self.to_rvalue(operand);
                let operand_type = self.ast.node(operand).type_id;
                let pointee = self.registry.pointee_of(operand_type).ok_or_else(|| {
                    SyntaxError::new(
                        SyntaxErrorKind::TypeMismatch {
                            expected: "pointer".to_string(),
                            found: self.registry.designation(operand_type).to_string(),
                        },
                        token.span,
                    )
                })?;
                let node = self
                    .ast
                    .add(Node::with_type(NodeKind::Dereference, token, pointee));
                self.ast.attach(node, operand);
                Ok(node)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<NodeId, SyntaxError> {
        let mut expr = self.parse_primary()?;
        while matches!(
            self.peek().kind,
            TokenKind::Increment | TokenKind::Decrement
        ) {
            let op = self.advance();
            if !self.ast.node(expr).is_lvalue() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::NotAssignable,
                    self.ast.node(expr).token.span,
                ));
            }
            self.check_mutable(expr)?;
            let operand_type = self.ast.node(expr).type_id;
            let node = self.ast.add(Node::with_type(
                NodeKind::UnaryOperator {
                    fixity: UnaryFixity::Postfix,
                },
                op,
                operand_type,
            ));
            self.ast.attach(node, expr);
            expr = node;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<NodeId, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::OpenParen => {
                let expr = self.parse_expression(MAX_PRECEDENCE)?;
                if self.eat(TokenKind::CloseParen).is_none() {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnmatchedParen,
                        token.span,
                    ));
                }
                Ok(expr)
            }
            TokenKind::Digits => {
                let text = self.text(token);
                let digits = text.trim_end_matches(['i', 'u']);
                let value: i64 = digits.parse().map_err(|_| {
                    SyntaxError::new(
                        SyntaxErrorKind::MalformedLiteral { offender: '#' },
                        token.span,
                    )
                })?;
                Ok(self.ast.add(Node::with_type(
                    NodeKind::ConstantValue(Value::Integer(value)),
                    token,
                    TypeId::INT,
                )))
            }
            TokenKind::Float => {
                let text = self.text(token);
                let digits = text.trim_end_matches('f');
                let value: f64 = digits.parse().map_err(|_| {
                    SyntaxError::new(
                        SyntaxErrorKind::MalformedLiteral { offender: '#' },
                        token.span,
                    )
                })?;
                Ok(self.ast.add(Node::with_type(
                    NodeKind::ConstantValue(Value::Float(value)),
                    token,
                    TypeId::FLOAT,
                )))
            }
            TokenKind::Bool => {
                let value = self.text(token) == "true";
                Ok(self.ast.add(Node::with_type(
                    NodeKind::ConstantValue(Value::Boolean(value)),
                    token,
                    TypeId::BOOL,
                )))
            }
            TokenKind::Char => {
                let value = self.decode_char(token)?;
                Ok(self.ast.add(Node::with_type(
                    NodeKind::ConstantValue(Value::Char(value)),
                    token,
                    TypeId::CHAR,
                )))
            }
            TokenKind::Str => {
                let decoded = self.decode_string(token)?;
                let sym = self.interner.intern(&decoded);
                Ok(self.ast.add(Node::with_type(
                    NodeKind::ConstantValue(Value::Str(sym)),
                    token,
                    TypeId::CSTR,
                )))
            }
            TokenKind::Identifier => {
                if self.check(TokenKind::OpenParen) {
                    self.parse_call(token)
                } else {
                    self.parse_variable(token)
                }
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: token.kind,
                },
                token.span,
            )),
        }
    }

    fn parse_call(&mut self, name: Token) -> Result<NodeId, SyntaxError> {
        let open = self.advance(); // '('
        let mut args = Vec::new();
        while !self.at_end() && !self.check(TokenKind::CloseParen) {
            let arg = self.parse_expression(MAX_PRECEDENCE)?;
            let arg = self.to_rvalue(arg);
            args.push(arg);
            if self.eat(TokenKind::Comma).is_none() && !self.check(TokenKind::CloseParen) {
                let found = self.peek();
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken {
                        expected: "',' in argument list".to_string(),
                        found: found.kind,
                    },
                    found.span,
                ));
            }
        }
        if self.eat(TokenKind::CloseParen).is_none() {
            return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedParen, open.span));
        }

        let arg_types: Vec<TypeId> = args.iter().map(|&a| self.ast.node(a).type_id).collect();
        let entry = self
            .scopes
            .resolve_function(name.lexeme, &arg_types, self.registry)
            .ok_or_else(|| {
                SyntaxError::new(
                    SyntaxErrorKind::NoMatchingOverload {
                        name: self.text(name).to_string(),
                    },
                    name.span,
                )
            })?;
        let (resolved, return_type) = (entry.node, entry.return_type);

        let node = self.ast.add(Node::with_type(
            NodeKind::FunctionCall { resolved },
            name,
            return_type,
        ));
        for arg in args {
            self.ast.attach(node, arg);
        }
        Ok(node)
    }

    fn parse_variable(&mut self, name: Token) -> Result<NodeId, SyntaxError> {
        let mut current_type = self
            .scopes
            .resolve_variable(name.lexeme)
            .ok_or_else(|| {
                SyntaxError::new(
                    SyntaxErrorKind::UndeclaredName {
                        name: self.text(name).to_string(),
                    },
                    name.span,
                )
            })?
            .type_id;
        let node = self
            .ast
            .add(Node::with_type(NodeKind::Variable, name, current_type));

        loop {
            match self.peek().kind {
                TokenKind::OpenSubscript => {
                    let open = self.advance();
                    let element = self.registry.element_of(current_type).ok_or_else(|| {
                        SyntaxError::new(
                            SyntaxErrorKind::SubscriptNonArray {
                                type_name: self.registry.designation(current_type).to_string(),
                            },
                            open.span,
                        )
                    })?;
                    let index = self.parse_expression(MAX_PRECEDENCE)?;
                    let index = self.to_rvalue(index);
                    let index_type = self.ast.node(index).type_id;
                    if !self.registry.is_integer(index_type) {
                        return Err(self.type_mismatch(TypeId::INT, index_type, open.span));
                    }
                    if self.eat(TokenKind::CloseSubscript).is_none() {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnmatchedBracket,
                            open.span,
                        ));
                    }
                    self.ast.attach(node, index);
                    current_type = element;
                    self.ast.node_mut(node).type_id = element;
                }
                TokenKind::MemberAccess => {
                    self.advance();
                    let member = self.expect_identifier("member name")?;
                    let members = self.registry.members_of(current_type).ok_or_else(|| {
                        SyntaxError::new(
                            SyntaxErrorKind::TypeMismatch {
                                expected: "composite type".to_string(),
                                found: self.registry.designation(current_type).to_string(),
                            },
                            member.span,
                        )
                    })?;
                    let index = members
                        .iter()
                        .position(|m| m.name == member.lexeme)
                        .ok_or_else(|| {
                            SyntaxError::new(
                                SyntaxErrorKind::UnknownMember {
                                    member: self.text(member).to_string(),
                                    type_name: self
                                        .registry
                                        .designation(current_type)
                                        .to_string(),
                                },
                                member.span,
                            )
                        })?;
                    let member_type = members[index].type_id;
                    let member_node = self.ast.add(Node::with_type(
                        NodeKind::MemberIdentifier {
                            index: index as u32,
                        },
                        member,
                        member_type,
                    ));
                    self.ast.attach(node, member_node);
                    current_type = member_type;
                    self.ast.node_mut(node).type_id = member_type;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn decode_char(&self, token: Token) -> Result<char, SyntaxError> {
        let text = self.text(token);
        let inner = &text[1..text.len() - 1];
        let mut chars = inner.chars();
        let first = chars.next().ok_or_else(|| {
            SyntaxError::new(SyntaxErrorKind::UnterminatedChar, token.span)
        })?;
        if first != '\\' {
            return Ok(first);
        }
        let escape = chars.next().unwrap_or('\0');
        Ok(match escape {
            '\'' => '\'',
            '"' => '"',
            '?' => '?',
            '\\' => '\\',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '0' => '\0',
            other => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidEscape { escape: other },
                    token.span,
                ))
            }
        })
    }

    fn decode_string(&self, token: Token) -> Result<String, SyntaxError> {
        let text = self.text(token);
        let inner = &text[1..text.len() - 1];
        let mut decoded = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                decoded.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => decoded.push('\n'),
                Some('r') => decoded.push('\r'),
                Some('t') => decoded.push('\t'),
                Some('0') => decoded.push('\0'),
                Some('\\') => decoded.push('\\'),
                Some('"') => decoded.push('"'),
                Some('\'') => decoded.push('\''),
                Some(other) => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidEscape { escape: other },
                        token.span,
                    ))
                }
                None => break,
            }
        }
        Ok(decoded)
    }
}
