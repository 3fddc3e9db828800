//! Static resolver pass.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, invalid
//!    `return`, misplaced `this`/`super`).
//! 3. Record, on *each* variable occurrence, whether it is a local (and at
//!    what depth) or a global, so the interpreter never falls back to a
//!    dynamic lookup that would see a later shadowing local.
//!
//! Every scope pushed here has a runtime twin pushed by the interpreter at
//! the same AST position; the recorded depths rely on that pairing.

use crate::ast::{Expr, FunctionDecl, Stmt, VarRef};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// What kind of function body we are in.  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body we are in.  Used to validate `this`/`super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances on the AST.
pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    globals: HashSet<String>, // global names declared so far
    errors: Vec<LoxError>,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self::with_globals(HashSet::new())
    }

    /// A resolver that already knows `globals` are bound, e.g. natives and
    /// definitions from earlier REPL lines.
    pub fn with_globals(globals: HashSet<String>) -> Self {
        info!("Resolver instantiated with {} known global(s)", globals.len());

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            globals,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.  Every rule violation is collected;
    /// resolution carries on past each one.
    pub fn resolve(&mut self, statements: &'a [Stmt]) -> Result<(), Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            Ok(())
        } else {
            info!("Resolve finished with {} error(s)", self.errors.len());

            Err(std::mem::take(&mut self.errors))
        }
    }

    fn resolve_stmts(&mut self, statements: &'a [Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // name is visible *inside* its own body, for recursion
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Resolving class '{}'", name.lexeme);

                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if superclass.name.lexeme == name.lexeme {
                        self.error(&superclass.name, "A class can't inherit from itself.");
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_variable(superclass);

                    self.begin_scope();
                    self.define_implicit("super");
                }

                self.begin_scope();
                self.define_implicit("this");

                for method in methods {
                    let kind: FunctionType = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, kind);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(var) => self.resolve_variable(var),

            Expr::Assign { target, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(target);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(&keyword.name, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(keyword);
            }

            Expr::Super { keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(&keyword.name, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(
                            &keyword.name,
                            "Can't use 'super' in a class with no superclass.",
                        );
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(keyword);
            }
        }
    }

    /// A name read inside its own initializer cannot see the binding being
    /// initialized; it reads the nearest outer binding of the same name, and
    /// is an error only when there is none.
    fn resolve_variable(&mut self, var: &'a VarRef) {
        let name: &str = var.name.lexeme.as_str();

        let in_own_initializer: bool = self
            .scopes
            .last()
            .is_some_and(|scope| scope.get(name) == Some(&false));

        if !in_own_initializer {
            self.resolve_local(var);
            return;
        }

        let outer: Option<usize> = self
            .scopes
            .iter()
            .rev()
            .enumerate()
            .skip(1)
            .find(|(_, scope)| scope.contains_key(name))
            .map(|(depth, _)| depth);

        match outer {
            Some(depth) => {
                debug!("Initializer of '{}' reads outer binding at depth {}", name, depth);

                var.resolve_at(depth);
            }
            None if self.globals.contains(name) => {
                debug!("Initializer of '{}' reads the global", name);
            }
            None => self.error(
                &var.name,
                "Can't read local variable in its own initializer.",
            ),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, declaration: &'a FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) {
        let duplicate: bool = match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.lexeme.as_str(), false).is_some(),
            None => {
                self.globals.insert(name.lexeme.clone());
                false
            }
        };

        if duplicate {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.as_str(), true);
        }
    }

    /// Binds a name the language introduces itself (`this`, `super`).
    fn define_implicit(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in *any* scope (depth stays unset).
    fn resolve_local(&mut self, var: &VarRef) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(var.name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", var.name.lexeme, depth);

                var.resolve_at(depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", var.name.lexeme);
    }
}
