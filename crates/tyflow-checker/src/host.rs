//! The seam between flow analysis and expression typing.
//!
//! Narrowing needs the types of expressions it does not own: the value in
//! `x === value`, the initializer of an assignment, the signature behind a
//! call. A `CheckerHost` supplies them. `ExpressionTypeTable` is a plain
//! table-backed host for embedders that compute types up front.

use rustc_hash::{FxHashMap, FxHashSet};
use tyflow_binder::{NodeIndex, SymbolId};
use tyflow_solver::{FunctionShape, TypeId};

/// Expression typing consumed by `FlowAnalyzer`.
///
/// Every method is a lookup; `None` means "unknown", and the analyzer
/// degrades to the declared type (or skips the narrowing) in that case.
pub trait CheckerHost {
    /// Type of an expression, without flow narrowing applied.
    fn type_of_expression(&self, node: NodeIndex) -> Option<TypeId>;

    /// Declared type of a binding.
    fn declared_type_of_symbol(&self, symbol: SymbolId) -> Option<TypeId>;

    /// Signature that can affect control flow at `call`: one carrying a
    /// type predicate or returning `never`.
    fn effects_signature(&self, call: NodeIndex) -> Option<FunctionShape>;

    /// Instance type constructed by the right operand of `instanceof`.
    fn instance_type_of(&self, constructor: NodeIndex) -> Option<TypeId>;

    /// The `[Symbol.hasInstance]` method of the right operand of
    /// `instanceof`, when it declares one.
    fn has_instance_signature(&self, _constructor: NodeIndex) -> Option<FunctionShape> {
        None
    }

    /// Type of the `prototype` property of a constructor, used for
    /// `x.constructor === C`.
    fn prototype_type_of(&self, constructor: NodeIndex) -> Option<TypeId> {
        self.instance_type_of(constructor)
    }

    /// Type of a `case` expression.
    fn case_clause_type(&self, expression: NodeIndex) -> Option<TypeId> {
        self.type_of_expression(expression)
    }

    /// Whether `call` must run before `this` is usable. `super(...)` calls
    /// always qualify; hosts can add others.
    fn is_required_call(&self, _call: NodeIndex) -> bool {
        false
    }

    /// The global `Function` interface type. `any` is never narrowed to it.
    fn global_function_type(&self) -> Option<TypeId> {
        None
    }

    /// Type of a class constructor value, the narrowing target of
    /// `#staticMember in x`.
    fn constructor_type_of_class(&self, _class: SymbolId) -> Option<TypeId> {
        None
    }

    /// Element type produced by iterating a value of type `type_id`, for
    /// `for...of` and array destructuring. When `None` the analyzer falls
    /// back to array, tuple and string element types.
    fn iterated_type_of(&self, _type_id: TypeId) -> Option<TypeId> {
        None
    }
}

/// A `CheckerHost` backed by precomputed tables.
#[derive(Clone, Debug, Default)]
pub struct ExpressionTypeTable {
    expression_types: FxHashMap<NodeIndex, TypeId>,
    declared_types: FxHashMap<SymbolId, TypeId>,
    effects_signatures: FxHashMap<NodeIndex, FunctionShape>,
    instance_types: FxHashMap<NodeIndex, TypeId>,
    has_instance_signatures: FxHashMap<NodeIndex, FunctionShape>,
    prototype_types: FxHashMap<NodeIndex, TypeId>,
    required_calls: FxHashSet<NodeIndex>,
    constructor_types: FxHashMap<SymbolId, TypeId>,
    global_function_type: Option<TypeId>,
}

impl ExpressionTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_expression_type(&mut self, node: NodeIndex, type_id: TypeId) -> &mut Self {
        self.expression_types.insert(node, type_id);
        self
    }

    pub fn set_declared_type(&mut self, symbol: SymbolId, type_id: TypeId) -> &mut Self {
        self.declared_types.insert(symbol, type_id);
        self
    }

    pub fn set_effects_signature(&mut self, call: NodeIndex, signature: FunctionShape) -> &mut Self {
        self.effects_signatures.insert(call, signature);
        self
    }

    pub fn set_instance_type(&mut self, constructor: NodeIndex, type_id: TypeId) -> &mut Self {
        self.instance_types.insert(constructor, type_id);
        self
    }

    pub fn set_has_instance_signature(
        &mut self,
        constructor: NodeIndex,
        signature: FunctionShape,
    ) -> &mut Self {
        self.has_instance_signatures.insert(constructor, signature);
        self
    }

    pub fn set_prototype_type(&mut self, constructor: NodeIndex, type_id: TypeId) -> &mut Self {
        self.prototype_types.insert(constructor, type_id);
        self
    }

    pub fn mark_required_call(&mut self, call: NodeIndex) -> &mut Self {
        self.required_calls.insert(call);
        self
    }

    pub fn set_constructor_type(&mut self, class: SymbolId, type_id: TypeId) -> &mut Self {
        self.constructor_types.insert(class, type_id);
        self
    }

    pub fn set_global_function_type(&mut self, type_id: TypeId) -> &mut Self {
        self.global_function_type = Some(type_id);
        self
    }
}

impl CheckerHost for ExpressionTypeTable {
    fn type_of_expression(&self, node: NodeIndex) -> Option<TypeId> {
        self.expression_types.get(&node).copied()
    }

    fn declared_type_of_symbol(&self, symbol: SymbolId) -> Option<TypeId> {
        self.declared_types.get(&symbol).copied()
    }

    fn effects_signature(&self, call: NodeIndex) -> Option<FunctionShape> {
        self.effects_signatures.get(&call).cloned()
    }

    fn instance_type_of(&self, constructor: NodeIndex) -> Option<TypeId> {
        self.instance_types.get(&constructor).copied()
    }

    fn has_instance_signature(&self, constructor: NodeIndex) -> Option<FunctionShape> {
        self.has_instance_signatures.get(&constructor).cloned()
    }

    fn prototype_type_of(&self, constructor: NodeIndex) -> Option<TypeId> {
        self.prototype_types
            .get(&constructor)
            .or_else(|| self.instance_types.get(&constructor))
            .copied()
    }

    fn is_required_call(&self, call: NodeIndex) -> bool {
        self.required_calls.contains(&call)
    }

    fn global_function_type(&self) -> Option<TypeId> {
        self.global_function_type
    }

    fn constructor_type_of_class(&self, class: SymbolId) -> Option<TypeId> {
        self.constructor_types.get(&class).copied()
    }
}
