//! Structural type representation.
//!
//! Every type is addressed by a `TypeId` and described by a `TypeKey`. Keys
//! are interned by `TypeInterner`, so two structurally equal keys always get
//! the same `TypeId` and `TypeId` comparison is type identity.

use bitflags::bitflags;
use std::hash::{Hash, Hasher};
use tyflow_common::interner::Atom;

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Placeholder for "no type".
    pub const NONE: TypeId = TypeId(0);
    pub const ERROR: TypeId = TypeId(1);
    pub const NEVER: TypeId = TypeId(2);
    pub const UNKNOWN: TypeId = TypeId(3);
    pub const ANY: TypeId = TypeId(4);
    pub const VOID: TypeId = TypeId(5);
    pub const UNDEFINED: TypeId = TypeId(6);
    pub const NULL: TypeId = TypeId(7);
    /// `boolean`, interned as the union `false | true`.
    pub const BOOLEAN: TypeId = TypeId(8);
    pub const NUMBER: TypeId = TypeId(9);
    pub const STRING: TypeId = TypeId(10);
    pub const BIGINT: TypeId = TypeId(11);
    pub const SYMBOL: TypeId = TypeId(12);
    /// The non-primitive `object` type.
    pub const OBJECT: TypeId = TypeId(13);
    pub const BOOLEAN_FALSE: TypeId = TypeId(14);
    pub const BOOLEAN_TRUE: TypeId = TypeId(15);
    /// `never` produced by an incomplete flow result; does not widen joins.
    pub const SILENT_NEVER: TypeId = TypeId(16);
    /// `never` produced by an assignment on an unreachable path.
    pub const UNREACHABLE_NEVER: TypeId = TypeId(17);
    /// Declared type of a variable whose type evolves with assignments.
    pub const AUTO: TypeId = TypeId(18);
    /// `any[]` of an evolving array (`let a = []`).
    pub const AUTO_ARRAY: TypeId = TypeId(19);
    /// `any` that never becomes an inference candidate.
    pub const NON_INFERRABLE_ANY: TypeId = TypeId(20);
    /// The empty object type `{}`.
    pub const EMPTY_OBJECT: TypeId = TypeId(21);
    pub const FRESH_FALSE: TypeId = TypeId(22);
    pub const FRESH_TRUE: TypeId = TypeId(23);

    /// First id handed out for user types.
    pub const FIRST_USER: u32 = 100;

    #[inline]
    pub fn is_none(self) -> bool {
        self == TypeId::NONE
    }

    #[inline]
    pub fn is_intrinsic(self) -> bool {
        self.0 < TypeId::FIRST_USER
    }

    /// `any`, including the evolving and non-inferrable flavours.
    #[inline]
    pub fn is_any(self) -> bool {
        matches!(self, TypeId::ANY | TypeId::AUTO | TypeId::NON_INFERRABLE_ANY)
    }

    /// Any of the `never` flavours.
    #[inline]
    pub fn is_never(self) -> bool {
        matches!(
            self,
            TypeId::NEVER | TypeId::SILENT_NEVER | TypeId::UNREACHABLE_NEVER
        )
    }

    #[inline]
    pub fn is_nullable(self) -> bool {
        matches!(self, TypeId::NULL | TypeId::UNDEFINED | TypeId::VOID)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Error,
    Never,
    Unknown,
    Any,
    Void,
    Undefined,
    Null,
    Number,
    String,
    Bigint,
    Symbol,
    Object,
    SilentNever,
    UnreachableNever,
    Auto,
    NonInferrableAny,
}

/// `f64` with total equality and hashing, for use inside literal keys.
#[derive(Clone, Copy, Debug)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    fn normalized_bits(self) -> u64 {
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_bits() == other.normalized_bits()
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_bits().hash(state);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(Atom),
    Number(OrderedFloat),
    BigInt(Atom),
    Boolean(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TupleListId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectShapeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConditionalTypeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MappedTypeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TemplateLiteralId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeApplicationId(pub u32);

/// A generic declaration (class, interface or type alias) that applications refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

bitflags! {
    /// Per-element flags of a tuple type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u8 {
        const REQUIRED = 1 << 0;
        const OPTIONAL = 1 << 1;
        const REST = 1 << 2;
        const VARIADIC = 1 << 3;

        const FIXED = Self::REQUIRED.bits() | Self::OPTIONAL.bits();
        const VARIABLE = Self::REST.bits() | Self::VARIADIC.bits();
        const NON_REQUIRED = Self::OPTIONAL.bits() | Self::REST.bits() | Self::VARIADIC.bits();
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u16 {
        /// Type of an object literal expression.
        const OBJECT_LITERAL = 1 << 0;
        /// Object literal type that has not been widened yet.
        const FRESH_LITERAL = 1 << 1;
        /// Type of an array literal expression.
        const ARRAY_LITERAL = 1 << 2;
        /// Never an inference candidate (e.g. a context-sensitive function).
        const NON_INFERRABLE = 1 << 3;
        /// Instance side of a class declaration.
        const CLASS_INSTANCE = 1 << 4;
    }
}

bitflags! {
    /// Declared variance of a generic declaration's type parameter.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Variance: u8 {
        const COVARIANT = 1 << 0;
        const CONTRAVARIANT = 1 << 1;
        const BIVARIANT = Self::COVARIANT.bits() | Self::CONTRAVARIANT.bits();
        const INDEPENDENT = 1 << 2;
        const INVARIANT = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TupleElement {
    pub type_id: TypeId,
    pub name: Option<Atom>,
    pub flags: ElementFlags,
}

impl TupleElement {
    pub fn required(type_id: TypeId) -> Self {
        TupleElement {
            type_id,
            name: None,
            flags: ElementFlags::REQUIRED,
        }
    }

    pub fn optional(type_id: TypeId) -> Self {
        TupleElement {
            type_id,
            name: None,
            flags: ElementFlags::OPTIONAL,
        }
    }

    /// `...T[]`: the element type is the array element, not the array.
    pub fn rest(element_type: TypeId) -> Self {
        TupleElement {
            type_id: element_type,
            name: None,
            flags: ElementFlags::REST,
        }
    }

    /// `...T` where `T` is a generic array-like.
    pub fn variadic(type_id: TypeId) -> Self {
        TupleElement {
            type_id,
            name: None,
            flags: ElementFlags::VARIADIC,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub optional: bool,
    pub readonly: bool,
    pub is_method: bool,
}

impl PropertyInfo {
    pub fn new(name: Atom, type_id: TypeId) -> Self {
        PropertyInfo {
            name,
            type_id,
            optional: false,
            readonly: false,
            is_method: false,
        }
    }

    pub fn opt(name: Atom, type_id: TypeId) -> Self {
        PropertyInfo {
            optional: true,
            ..Self::new(name, type_id)
        }
    }

    pub fn method(name: Atom, type_id: TypeId) -> Self {
        PropertyInfo {
            is_method: true,
            ..Self::new(name, type_id)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexSignature {
    pub key_type: TypeId,
    pub value_type: TypeId,
    pub readonly: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Option<Atom>,
    pub type_id: TypeId,
    pub optional: bool,
    /// `...args: T` (the type is the whole rest array/tuple)
    pub rest: bool,
}

impl ParamInfo {
    pub fn required(name: Option<Atom>, type_id: TypeId) -> Self {
        ParamInfo {
            name,
            type_id,
            optional: false,
            rest: false,
        }
    }

    pub fn unnamed(type_id: TypeId) -> Self {
        Self::required(None, type_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypePredicateKind {
    This,
    Identifier,
    AssertsThis,
    AssertsIdentifier,
}

/// `x is T`, `this is T`, `asserts x is T`, `asserts x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypePredicate {
    pub kind: TypePredicateKind,
    pub parameter_index: Option<usize>,
    /// `None` for the bare `asserts x` form.
    pub type_id: Option<TypeId>,
}

impl TypePredicate {
    pub fn is_asserts(&self) -> bool {
        matches!(
            self.kind,
            TypePredicateKind::AssertsThis | TypePredicateKind::AssertsIdentifier
        )
    }
}

/// A call or construct signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub type_params: Vec<TypeId>,
    pub params: Vec<ParamInfo>,
    pub this_type: Option<TypeId>,
    pub return_type: TypeId,
    pub type_predicate: Option<TypePredicate>,
    /// Declared with method syntax (parameters compare bivariantly).
    pub is_method: bool,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        FunctionShape {
            type_params: Vec::new(),
            params,
            this_type: None,
            return_type,
            type_predicate: None,
            is_method: false,
        }
    }

    /// Number of parameters a caller must supply.
    pub fn min_argument_count(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| !p.optional && !p.rest)
            .count()
    }

    pub fn has_rest_parameter(&self) -> bool {
        self.params.last().is_some_and(|p| p.rest)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ObjectShape {
    /// Sorted by name atom.
    pub properties: Vec<PropertyInfo>,
    pub call_signatures: Vec<FunctionShape>,
    pub construct_signatures: Vec<FunctionShape>,
    pub string_index: Option<IndexSignature>,
    pub number_index: Option<IndexSignature>,
    pub flags: ObjectFlags,
    /// Nominal class identity for instance types.
    pub nominal: Option<DefId>,
}

impl ObjectShape {
    pub fn property(&self, name: Atom) -> Option<&PropertyInfo> {
        self.properties
            .binary_search_by_key(&name, |p| p.name)
            .ok()
            .and_then(|index| self.properties.get(index))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionalType {
    pub check_type: TypeId,
    pub extends_type: TypeId,
    pub true_type: TypeId,
    pub false_type: TypeId,
    pub is_distributive: bool,
    /// Type parameters introduced by `infer X` in `extends_type`.
    pub infer_type_params: Vec<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MappedModifier {
    None,
    Add,
    Remove,
}

/// `{ [K in Constraint as NameType]?: Template }`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MappedType {
    pub type_param: TypeId,
    pub constraint: TypeId,
    pub name_type: Option<TypeId>,
    pub template: TypeId,
    pub optional_modifier: MappedModifier,
    pub readonly_modifier: MappedModifier,
}

/// `` `a${T}b${U}c` ``: `texts` has exactly one more entry than `types`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemplateLiteralType {
    pub texts: Vec<Atom>,
    pub types: Vec<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringIntrinsicKind {
    Uppercase,
    Lowercase,
    Capitalize,
    Uncapitalize,
}

impl StringIntrinsicKind {
    pub fn apply(self, text: &str) -> String {
        match self {
            StringIntrinsicKind::Uppercase => text.to_uppercase(),
            StringIntrinsicKind::Lowercase => text.to_lowercase(),
            StringIntrinsicKind::Capitalize => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            StringIntrinsicKind::Uncapitalize => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// `Base<Args...>` for a registered generic declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeApplication {
    pub base: DefId,
    pub args: Vec<TypeId>,
}

/// Identity of a type parameter. Constraint and default live in the
/// interner's side table so that they may refer back to the parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub id: u32,
    pub is_const: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Interface,
    TypeAlias,
}

/// A generic declaration: its parameters, their variances and its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinitionInfo {
    pub name: Atom,
    pub kind: DefKind,
    pub type_params: Vec<TypeId>,
    pub variances: Vec<Variance>,
    /// Structural expansion in terms of `type_params`.
    pub body: Option<TypeId>,
    /// Base class instance type for `instanceof` derivation checks.
    pub base_class: Option<DefId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Intrinsic(IntrinsicKind),
    /// A regular literal type.
    Literal(LiteralValue),
    /// The fresh flavour of a literal, produced directly by a literal expression.
    FreshLiteral(LiteralValue),
    Union(TypeListId),
    Intersection(TypeListId),
    Object(ObjectShapeId),
    Array(TypeId),
    Tuple(TupleListId),
    Application(TypeApplicationId),
    TypeParameter(TypeParamInfo),
    /// `keyof T`
    Index(TypeId),
    /// `T[K]`
    IndexAccess(TypeId, TypeId),
    Conditional(ConditionalTypeId),
    Mapped(MappedTypeId),
    TemplateLiteral(TemplateLiteralId),
    StringIntrinsic {
        kind: StringIntrinsicKind,
        type_arg: TypeId,
    },
    /// A type variable known to also satisfy `constraint` in a conditional branch.
    Substitution {
        base: TypeId,
        constraint: TypeId,
    },
    /// Placeholder for an array whose element type is still evolving.
    EvolvingArray(TypeId),
}
