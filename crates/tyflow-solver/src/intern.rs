//! Type interning for structural deduplication.
//!
//! `TypeInterner` converts `TypeKey` structures into lightweight `TypeId`
//! handles. Each unique structure is stored once, so type equality is a
//! `TypeId` comparison. Every constructor normalizes before interning
//! (unions are flattened and sorted, intersections reduce disjoint members),
//! which keeps ids canonical.
//!
//! The interner is single-threaded: storage lives behind `RefCell`s and all
//! methods take `&self`, so the checker and solver can share one instance.

use crate::types::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;
use tyflow_common::interner::{Atom, Interner};

const TYPE_LIST_INLINE: usize = 8;
/// Largest cross product produced when distributing an intersection over unions.
const INTERSECTION_DISTRIBUTION_LIMIT: usize = 100;

type TypeListBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PrimitiveClass {
    String,
    Number,
    Boolean,
    Bigint,
    Symbol,
    Null,
    Undefined,
}

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: Vec<T>) -> u32 {
        if items.is_empty() {
            return 0;
        }
        if let Some(&id) = self.map.get(items.as_slice()) {
            return id;
        }
        let arc: Arc<[T]> = items.into();
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Arc<[T]> {
        match self.items.get(id as usize) {
            Some(items) => items.clone(),
            None => Arc::from(Vec::new()),
        }
    }
}

struct ValueInterner<T> {
    items: Vec<Arc<T>>,
    map: FxHashMap<Arc<T>, u32>,
}

impl<T> ValueInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        ValueInterner {
            items: Vec::new(),
            map: FxHashMap::default(),
        }
    }

    fn intern(&mut self, value: T) -> u32 {
        if let Some(&id) = self.map.get(&value) {
            return id;
        }
        let arc = Arc::new(value);
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Option<Arc<T>> {
        self.items.get(id as usize).cloned()
    }
}

struct TypeStore {
    key_to_id: FxHashMap<TypeKey, TypeId>,
    /// Indexed by `TypeId`; reserved slots below `FIRST_USER` hold `None`.
    id_to_key: Vec<Option<TypeKey>>,
}

/// Constraint and default of a type parameter, settable after creation.
#[derive(Clone, Copy, Debug, Default)]
struct TypeParamData {
    constraint: Option<TypeId>,
    default: Option<TypeId>,
}

/// Type interning table.
pub struct TypeInterner {
    atoms: Rc<Interner>,
    types: RefCell<TypeStore>,
    type_lists: RefCell<SliceInterner<TypeId>>,
    tuple_lists: RefCell<SliceInterner<TupleElement>>,
    object_shapes: RefCell<ValueInterner<ObjectShape>>,
    conditional_types: RefCell<ValueInterner<ConditionalType>>,
    mapped_types: RefCell<ValueInterner<MappedType>>,
    template_literals: RefCell<ValueInterner<TemplateLiteralType>>,
    applications: RefCell<ValueInterner<TypeApplication>>,
    type_params: RefCell<Vec<TypeParamData>>,
    definitions: RefCell<Vec<DefinitionInfo>>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::with_atoms(Rc::new(Interner::new()))
    }

    /// Create an interner that shares the binder's string table.
    pub fn with_atoms(atoms: Rc<Interner>) -> Self {
        let interner = TypeInterner {
            atoms,
            types: RefCell::new(TypeStore {
                key_to_id: FxHashMap::default(),
                id_to_key: vec![None; TypeId::FIRST_USER as usize],
            }),
            type_lists: RefCell::new(SliceInterner::new()),
            tuple_lists: RefCell::new(SliceInterner::new()),
            object_shapes: RefCell::new(ValueInterner::new()),
            conditional_types: RefCell::new(ValueInterner::new()),
            mapped_types: RefCell::new(ValueInterner::new()),
            template_literals: RefCell::new(ValueInterner::new()),
            applications: RefCell::new(ValueInterner::new()),
            type_params: RefCell::new(Vec::new()),
            definitions: RefCell::new(Vec::new()),
        };
        interner.register_intrinsics();
        interner
    }

    fn register_intrinsics(&self) {
        use IntrinsicKind as K;
        let intrinsics = [
            (TypeId::ERROR, K::Error),
            (TypeId::NEVER, K::Never),
            (TypeId::UNKNOWN, K::Unknown),
            (TypeId::ANY, K::Any),
            (TypeId::VOID, K::Void),
            (TypeId::UNDEFINED, K::Undefined),
            (TypeId::NULL, K::Null),
            (TypeId::NUMBER, K::Number),
            (TypeId::STRING, K::String),
            (TypeId::BIGINT, K::Bigint),
            (TypeId::SYMBOL, K::Symbol),
            (TypeId::OBJECT, K::Object),
            (TypeId::SILENT_NEVER, K::SilentNever),
            (TypeId::UNREACHABLE_NEVER, K::UnreachableNever),
            (TypeId::AUTO, K::Auto),
            (TypeId::NON_INFERRABLE_ANY, K::NonInferrableAny),
        ];
        for (id, kind) in intrinsics {
            self.reserve(id, TypeKey::Intrinsic(kind));
        }
        self.reserve(
            TypeId::BOOLEAN_FALSE,
            TypeKey::Literal(LiteralValue::Boolean(false)),
        );
        self.reserve(
            TypeId::BOOLEAN_TRUE,
            TypeKey::Literal(LiteralValue::Boolean(true)),
        );
        self.reserve(
            TypeId::FRESH_FALSE,
            TypeKey::FreshLiteral(LiteralValue::Boolean(false)),
        );
        self.reserve(
            TypeId::FRESH_TRUE,
            TypeKey::FreshLiteral(LiteralValue::Boolean(true)),
        );
        let boolean_list = self.intern_type_list(vec![TypeId::BOOLEAN_FALSE, TypeId::BOOLEAN_TRUE]);
        self.reserve(TypeId::BOOLEAN, TypeKey::Union(boolean_list));
        self.reserve(TypeId::AUTO_ARRAY, TypeKey::Array(TypeId::AUTO));
        let empty_shape = self.intern_object_shape(ObjectShape::default());
        self.reserve(TypeId::EMPTY_OBJECT, TypeKey::Object(empty_shape));
    }

    fn reserve(&self, id: TypeId, key: TypeKey) {
        let mut types = self.types.borrow_mut();
        if let Some(slot) = types.id_to_key.get_mut(id.0 as usize) {
            *slot = Some(key.clone());
        }
        types.key_to_id.insert(key, id);
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn atoms(&self) -> &Rc<Interner> {
        &self.atoms
    }

    pub fn intern_string(&self, s: &str) -> Atom {
        self.atoms.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms.resolve(atom)
    }

    // =========================================================================
    // Core interning
    // =========================================================================

    /// Intern a type key and return its `TypeId`.
    ///
    /// Prefer the normalizing constructors below; this performs no
    /// normalization of its own.
    pub fn intern(&self, key: TypeKey) -> TypeId {
        let mut types = self.types.borrow_mut();
        if let Some(&id) = types.key_to_id.get(&key) {
            return id;
        }
        let id = TypeId(types.id_to_key.len() as u32);
        types.id_to_key.push(Some(key.clone()));
        types.key_to_id.insert(key, id);
        id
    }

    /// Look up the `TypeKey` for a given `TypeId`.
    pub fn lookup(&self, id: TypeId) -> Option<TypeKey> {
        self.types
            .borrow()
            .id_to_key
            .get(id.0 as usize)
            .and_then(|key| key.clone())
    }

    /// Number of interned ids, reserved intrinsic slots included.
    pub fn len(&self) -> usize {
        self.types.borrow().id_to_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= TypeId::FIRST_USER as usize
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        self.type_lists.borrow().get(id.0)
    }

    pub fn tuple_list(&self, id: TupleListId) -> Arc<[TupleElement]> {
        self.tuple_lists.borrow().get(id.0)
    }

    pub fn object_shape(&self, id: ObjectShapeId) -> Arc<ObjectShape> {
        self.object_shapes
            .borrow()
            .get(id.0)
            .unwrap_or_else(|| Arc::new(ObjectShape::default()))
    }

    pub fn conditional_type(&self, id: ConditionalTypeId) -> Arc<ConditionalType> {
        self.conditional_types
            .borrow()
            .get(id.0)
            .unwrap_or_else(|| {
                Arc::new(ConditionalType {
                    check_type: TypeId::ERROR,
                    extends_type: TypeId::ERROR,
                    true_type: TypeId::ERROR,
                    false_type: TypeId::ERROR,
                    is_distributive: false,
                    infer_type_params: Vec::new(),
                })
            })
    }

    pub fn mapped_type(&self, id: MappedTypeId) -> Arc<MappedType> {
        self.mapped_types.borrow().get(id.0).unwrap_or_else(|| {
            Arc::new(MappedType {
                type_param: TypeId::ERROR,
                constraint: TypeId::ERROR,
                name_type: None,
                template: TypeId::ERROR,
                optional_modifier: MappedModifier::None,
                readonly_modifier: MappedModifier::None,
            })
        })
    }

    pub fn template_literal_type(&self, id: TemplateLiteralId) -> Arc<TemplateLiteralType> {
        self.template_literals
            .borrow()
            .get(id.0)
            .unwrap_or_else(|| {
                Arc::new(TemplateLiteralType {
                    texts: vec![Atom::NONE],
                    types: Vec::new(),
                })
            })
    }

    pub fn type_application(&self, id: TypeApplicationId) -> Arc<TypeApplication> {
        self.applications.borrow().get(id.0).unwrap_or_else(|| {
            Arc::new(TypeApplication {
                base: DefId(u32::MAX),
                args: Vec::new(),
            })
        })
    }

    fn intern_type_list(&self, members: Vec<TypeId>) -> TypeListId {
        TypeListId(self.type_lists.borrow_mut().intern(members))
    }

    fn intern_tuple_list(&self, elements: Vec<TupleElement>) -> TupleListId {
        TupleListId(self.tuple_lists.borrow_mut().intern(elements))
    }

    fn intern_object_shape(&self, shape: ObjectShape) -> ObjectShapeId {
        ObjectShapeId(self.object_shapes.borrow_mut().intern(shape))
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn literal(&self, value: LiteralValue) -> TypeId {
        self.intern(TypeKey::Literal(value))
    }

    pub fn literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.literal(LiteralValue::String(atom))
    }

    pub fn literal_number(&self, value: f64) -> TypeId {
        self.literal(LiteralValue::Number(OrderedFloat(value)))
    }

    pub fn literal_bigint(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.literal(LiteralValue::BigInt(atom))
    }

    pub fn literal_boolean(&self, value: bool) -> TypeId {
        if value {
            TypeId::BOOLEAN_TRUE
        } else {
            TypeId::BOOLEAN_FALSE
        }
    }

    /// The fresh flavour of a literal, as produced by a literal expression.
    pub fn fresh_literal(&self, value: LiteralValue) -> TypeId {
        self.intern(TypeKey::FreshLiteral(value))
    }

    pub fn fresh_literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.fresh_literal(LiteralValue::String(atom))
    }

    pub fn fresh_literal_number(&self, value: f64) -> TypeId {
        self.fresh_literal(LiteralValue::Number(OrderedFloat(value)))
    }

    /// Regular flavour of a fresh literal; other types are returned unchanged.
    pub fn regular_type_of(&self, type_id: TypeId) -> TypeId {
        match self.lookup(type_id) {
            Some(TypeKey::FreshLiteral(value)) => self.literal(value),
            Some(TypeKey::Object(shape_id)) => {
                let shape = self.object_shape(shape_id);
                if !shape.flags.contains(ObjectFlags::FRESH_LITERAL) {
                    return type_id;
                }
                let mut regular = (*shape).clone();
                regular.flags.remove(ObjectFlags::FRESH_LITERAL);
                self.object_with_shape(regular)
            }
            _ => type_id,
        }
    }

    /// Fresh flavour of a regular literal; other types are returned unchanged.
    pub fn fresh_type_of(&self, type_id: TypeId) -> TypeId {
        match self.lookup(type_id) {
            Some(TypeKey::Literal(value)) => self.fresh_literal(value),
            _ => type_id,
        }
    }

    // =========================================================================
    // Unions
    // =========================================================================

    /// Intern a union type, normalizing and deduplicating members.
    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        self.union_from_iter(members)
    }

    pub fn union2(&self, left: TypeId, right: TypeId) -> TypeId {
        self.union_from_iter([left, right])
    }

    pub fn union3(&self, first: TypeId, second: TypeId, third: TypeId) -> TypeId {
        self.union_from_iter([first, second, third])
    }

    fn union_from_iter<I>(&self, members: I) -> TypeId
    where
        I: IntoIterator<Item = TypeId>,
    {
        let mut iter = members.into_iter();
        let Some(first) = iter.next() else {
            return TypeId::NEVER;
        };
        let Some(second) = iter.next() else {
            return first;
        };

        let mut flat: TypeListBuffer = SmallVec::new();
        self.push_union_member(&mut flat, first);
        self.push_union_member(&mut flat, second);
        for member in iter {
            self.push_union_member(&mut flat, member);
        }
        self.normalize_union(flat)
    }

    fn push_union_member(&self, flat: &mut TypeListBuffer, member: TypeId) {
        if let Some(TypeKey::Union(inner)) = self.lookup(member) {
            flat.extend(self.type_list(inner).iter().copied());
        } else {
            flat.push(member);
        }
    }

    fn normalize_union(&self, mut flat: TypeListBuffer) -> TypeId {
        flat.sort_unstable();
        flat.dedup();

        if flat.is_empty() {
            return TypeId::NEVER;
        }
        if flat.len() == 1 {
            return flat[0];
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        if let Some(&any_like) = flat.iter().find(|id| id.is_any()) {
            return any_like;
        }
        if flat.contains(&TypeId::UNKNOWN) {
            return TypeId::UNKNOWN;
        }
        flat.retain(|id| !id.is_never());
        if flat.is_empty() {
            return TypeId::NEVER;
        }

        self.remove_redundant_literals(&mut flat);

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                let list_id = self.intern_type_list(flat.into_vec());
                self.intern(TypeKey::Union(list_id))
            }
        }
    }

    /// Absorb literals into their primitive, fresh literals into their
    /// regular flavour, and `undefined` into `void`.
    fn remove_redundant_literals(&self, flat: &mut TypeListBuffer) {
        let has_string = flat.contains(&TypeId::STRING);
        let has_number = flat.contains(&TypeId::NUMBER);
        let has_bigint = flat.contains(&TypeId::BIGINT);
        let has_void = flat.contains(&TypeId::VOID);
        let keys: SmallVec<[Option<TypeKey>; TYPE_LIST_INLINE]> =
            flat.iter().map(|&id| self.lookup(id)).collect();
        let regular_values: SmallVec<[LiteralValue; TYPE_LIST_INLINE]> = keys
            .iter()
            .filter_map(|key| match key {
                Some(TypeKey::Literal(value)) => Some(*value),
                _ => None,
            })
            .collect();

        let mut index = 0;
        flat.retain(|id| {
            let key = &keys[index];
            index += 1;
            if *id == TypeId::UNDEFINED && has_void {
                return false;
            }
            let value = match key {
                Some(TypeKey::Literal(value)) => *value,
                Some(TypeKey::FreshLiteral(value)) => {
                    if regular_values.contains(value) {
                        return false;
                    }
                    *value
                }
                Some(TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. }) => {
                    return !has_string;
                }
                _ => return true,
            };
            match value {
                LiteralValue::String(_) => !has_string,
                LiteralValue::Number(_) => !has_number,
                LiteralValue::BigInt(_) => !has_bigint,
                LiteralValue::Boolean(_) => true,
            }
        });
    }

    // =========================================================================
    // Intersections
    // =========================================================================

    /// Intern an intersection type, normalizing and deduplicating members.
    pub fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        self.intersection_from_iter(members)
    }

    pub fn intersection2(&self, left: TypeId, right: TypeId) -> TypeId {
        self.intersection_from_iter([left, right])
    }

    fn intersection_from_iter<I>(&self, members: I) -> TypeId
    where
        I: IntoIterator<Item = TypeId>,
    {
        let mut iter = members.into_iter();
        let Some(first) = iter.next() else {
            return TypeId::UNKNOWN;
        };
        let Some(second) = iter.next() else {
            return first;
        };

        let mut flat: TypeListBuffer = SmallVec::new();
        self.push_intersection_member(&mut flat, first);
        self.push_intersection_member(&mut flat, second);
        for member in iter {
            self.push_intersection_member(&mut flat, member);
        }
        self.normalize_intersection(flat)
    }

    fn push_intersection_member(&self, flat: &mut TypeListBuffer, member: TypeId) {
        if let Some(TypeKey::Intersection(inner)) = self.lookup(member) {
            flat.extend(self.type_list(inner).iter().copied());
        } else {
            flat.push(member);
        }
    }

    fn normalize_intersection(&self, mut flat: TypeListBuffer) -> TypeId {
        flat.sort_unstable();
        flat.dedup();

        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.iter().any(|id| id.is_never()) {
            return TypeId::NEVER;
        }
        if flat.iter().any(|id| id.is_any()) {
            return TypeId::ANY;
        }
        flat.retain(|id| *id != TypeId::UNKNOWN);
        match flat.len() {
            0 => return TypeId::UNKNOWN,
            1 => return flat[0],
            _ => {}
        }

        if let Some(distributed) = self.distribute_intersection(&flat) {
            return distributed;
        }
        if self.intersection_has_disjoint_primitives(&mut flat) {
            return TypeId::NEVER;
        }
        self.merge_plain_objects(&mut flat);

        match flat.len() {
            0 => TypeId::UNKNOWN,
            1 => flat[0],
            _ => {
                let list_id = self.intern_type_list(flat.into_vec());
                self.intern(TypeKey::Intersection(list_id))
            }
        }
    }

    /// `(A | B) & C` becomes `(A & C) | (B & C)` when the product stays small.
    fn distribute_intersection(&self, flat: &[TypeId]) -> Option<TypeId> {
        let lists: Vec<Arc<[TypeId]>> = flat
            .iter()
            .map(|&member| match self.lookup(member) {
                Some(TypeKey::Union(list)) => self.type_list(list),
                _ => Arc::from(vec![member]),
            })
            .collect();
        if lists.iter().all(|list| list.len() == 1) {
            return None;
        }
        let product = lists
            .iter()
            .try_fold(1usize, |acc, list| acc.checked_mul(list.len()))?;
        if product > INTERSECTION_DISTRIBUTION_LIMIT {
            return None;
        }

        let mut combinations: Vec<Vec<TypeId>> = vec![Vec::new()];
        for list in &lists {
            let mut next = Vec::with_capacity(combinations.len() * list.len());
            for prefix in &combinations {
                for &member in list.iter() {
                    let mut combination = prefix.clone();
                    combination.push(member);
                    next.push(combination);
                }
            }
            combinations = next;
        }
        let members: Vec<TypeId> = combinations
            .into_iter()
            .map(|combination| self.intersection(combination))
            .collect();
        Some(self.union(members))
    }

    fn primitive_class_for(&self, type_id: TypeId) -> Option<PrimitiveClass> {
        match type_id {
            TypeId::STRING => return Some(PrimitiveClass::String),
            TypeId::NUMBER => return Some(PrimitiveClass::Number),
            TypeId::BIGINT => return Some(PrimitiveClass::Bigint),
            TypeId::SYMBOL => return Some(PrimitiveClass::Symbol),
            TypeId::NULL => return Some(PrimitiveClass::Null),
            TypeId::UNDEFINED | TypeId::VOID => return Some(PrimitiveClass::Undefined),
            _ => {}
        }
        match self.lookup(type_id)? {
            TypeKey::Literal(value) | TypeKey::FreshLiteral(value) => Some(match value {
                LiteralValue::String(_) => PrimitiveClass::String,
                LiteralValue::Number(_) => PrimitiveClass::Number,
                LiteralValue::BigInt(_) => PrimitiveClass::Bigint,
                LiteralValue::Boolean(_) => PrimitiveClass::Boolean,
            }),
            TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. } => {
                Some(PrimitiveClass::String)
            }
            _ => None,
        }
    }

    fn is_object_like(&self, type_id: TypeId) -> bool {
        type_id == TypeId::OBJECT
            || matches!(
                self.lookup(type_id),
                Some(TypeKey::Object(_) | TypeKey::Array(_) | TypeKey::Tuple(_))
            )
    }

    /// Detect members that can never overlap. Also drops a primitive that is
    /// implied by a literal of the same class (`"a" & string` is `"a"`).
    fn intersection_has_disjoint_primitives(&self, flat: &mut TypeListBuffer) -> bool {
        let mut class: Option<PrimitiveClass> = None;
        let mut literal: Option<LiteralValue> = None;
        let mut has_object_keyword = false;
        let mut has_nullish = false;
        let mut has_object_like = false;

        for &member in flat.iter() {
            if member == TypeId::OBJECT {
                has_object_keyword = true;
            }
            if self.is_object_like(member) {
                has_object_like = true;
            }
            let Some(member_class) = self.primitive_class_for(member) else {
                continue;
            };
            if matches!(member_class, PrimitiveClass::Null | PrimitiveClass::Undefined) {
                has_nullish = true;
            }
            match class {
                Some(existing) if existing != member_class => return true,
                _ => class = Some(member_class),
            }
            if let Some(TypeKey::Literal(value) | TypeKey::FreshLiteral(value)) =
                self.lookup(member)
            {
                match literal {
                    Some(existing) if existing != value => return true,
                    _ => literal = Some(value),
                }
            }
        }

        if class.is_some() && has_object_keyword {
            return true;
        }
        if has_nullish && has_object_like {
            return true;
        }
        if literal.is_some() {
            flat.retain(|id| {
                !matches!(
                    *id,
                    TypeId::STRING | TypeId::NUMBER | TypeId::BIGINT | TypeId::BOOLEAN
                )
            });
        }
        false
    }

    /// Merge plain object members (no signatures, no nominal identity) into one.
    fn merge_plain_objects(&self, flat: &mut TypeListBuffer) {
        let plain: SmallVec<[(TypeId, Arc<ObjectShape>); 4]> = flat
            .iter()
            .filter_map(|&id| match self.lookup(id) {
                Some(TypeKey::Object(shape_id)) => {
                    let shape = self.object_shape(shape_id);
                    let is_plain = shape.call_signatures.is_empty()
                        && shape.construct_signatures.is_empty()
                        && shape.nominal.is_none();
                    is_plain.then_some((id, shape))
                }
                _ => None,
            })
            .collect();
        if plain.len() < 2 {
            return;
        }

        let mut merged = ObjectShape::default();
        for (_, shape) in &plain {
            for prop in &shape.properties {
                if let Some(existing) = merged.properties.iter_mut().find(|p| p.name == prop.name)
                {
                    if existing.type_id != prop.type_id {
                        existing.type_id = self.intersection2(existing.type_id, prop.type_id);
                    }
                    existing.optional = existing.optional && prop.optional;
                    existing.readonly = existing.readonly || prop.readonly;
                } else {
                    merged.properties.push(*prop);
                }
            }
            merged.string_index = self.merge_index(merged.string_index, shape.string_index);
            merged.number_index = self.merge_index(merged.number_index, shape.number_index);
        }

        let merged_id = self.object_with_shape(merged);
        flat.retain(|id| !plain.iter().any(|(plain_id, _)| plain_id == id));
        flat.push(merged_id);
        flat.sort_unstable();
        flat.dedup();
    }

    fn merge_index(
        &self,
        existing: Option<IndexSignature>,
        incoming: Option<IndexSignature>,
    ) -> Option<IndexSignature> {
        match (existing, incoming) {
            (None, other) | (other, None) => other,
            (Some(a), Some(b)) => Some(IndexSignature {
                key_type: a.key_type,
                value_type: self.intersection2(a.value_type, b.value_type),
                readonly: a.readonly || b.readonly,
            }),
        }
    }

    // =========================================================================
    // Structured types
    // =========================================================================

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeKey::Array(element))
    }

    /// Intern a tuple, spreading variadic members that are themselves
    /// concrete tuples or arrays.
    pub fn tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        let mut normalized = Vec::with_capacity(elements.len());
        for element in elements {
            if !element.flags.contains(ElementFlags::VARIADIC) {
                normalized.push(element);
                continue;
            }
            match self.lookup(element.type_id) {
                Some(TypeKey::Tuple(list)) => {
                    normalized.extend(self.tuple_list(list).iter().copied());
                }
                Some(TypeKey::Array(inner)) => normalized.push(TupleElement {
                    type_id: inner,
                    name: element.name,
                    flags: ElementFlags::REST,
                }),
                _ => normalized.push(element),
            }
        }
        let list_id = self.intern_tuple_list(normalized);
        self.intern(TypeKey::Tuple(list_id))
    }

    /// Object type from a property list; properties are sorted by name.
    pub fn object(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_shape(ObjectShape {
            properties,
            ..ObjectShape::default()
        })
    }

    pub fn object_with_shape(&self, mut shape: ObjectShape) -> TypeId {
        shape.properties.sort_by_key(|p| p.name);
        shape.properties.dedup_by_key(|p| p.name);
        let shape_id = self.intern_object_shape(shape);
        self.intern(TypeKey::Object(shape_id))
    }

    /// Object type with a single call signature.
    pub fn function(&self, signature: FunctionShape) -> TypeId {
        self.object_with_shape(ObjectShape {
            call_signatures: vec![signature],
            ..ObjectShape::default()
        })
    }

    pub fn application(&self, base: DefId, args: Vec<TypeId>) -> TypeId {
        let app_id = TypeApplicationId(
            self.applications
                .borrow_mut()
                .intern(TypeApplication { base, args }),
        );
        self.intern(TypeKey::Application(app_id))
    }

    pub fn conditional(&self, conditional: ConditionalType) -> TypeId {
        let id = ConditionalTypeId(self.conditional_types.borrow_mut().intern(conditional));
        self.intern(TypeKey::Conditional(id))
    }

    pub fn mapped(&self, mapped: MappedType) -> TypeId {
        let id = MappedTypeId(self.mapped_types.borrow_mut().intern(mapped));
        self.intern(TypeKey::Mapped(id))
    }

    /// `keyof target`
    pub fn keyof(&self, target: TypeId) -> TypeId {
        self.intern(TypeKey::Index(target))
    }

    /// `object[index]`
    pub fn index_access(&self, object: TypeId, index: TypeId) -> TypeId {
        self.intern(TypeKey::IndexAccess(object, index))
    }

    pub fn substitution(&self, base: TypeId, constraint: TypeId) -> TypeId {
        if constraint == TypeId::UNKNOWN || constraint == base {
            return base;
        }
        self.intern(TypeKey::Substitution { base, constraint })
    }

    pub fn evolving_array(&self, element: TypeId) -> TypeId {
        self.intern(TypeKey::EvolvingArray(element))
    }

    /// `Uppercase<T>` and friends; applied eagerly to string literals and
    /// distributed over unions.
    pub fn string_intrinsic(&self, kind: StringIntrinsicKind, type_arg: TypeId) -> TypeId {
        match self.lookup(type_arg) {
            Some(TypeKey::Literal(LiteralValue::String(atom))) => {
                let text = self.resolve_atom(atom);
                self.literal_string(&kind.apply(&text))
            }
            Some(TypeKey::Union(list)) => {
                let members: Vec<TypeId> = self
                    .type_list(list)
                    .iter()
                    .map(|&member| self.string_intrinsic(kind, member))
                    .collect();
                self.union(members)
            }
            _ if type_arg.is_any() => type_arg,
            _ => self.intern(TypeKey::StringIntrinsic { kind, type_arg }),
        }
    }

    /// Template literal type from `texts.len() == types.len() + 1` pieces.
    /// Literal placeholders are folded into the surrounding text.
    pub fn template_literal(&self, texts: Vec<&str>, types: Vec<TypeId>) -> TypeId {
        let mut folded_texts: Vec<String> = Vec::with_capacity(texts.len());
        let mut folded_types: Vec<TypeId> = Vec::with_capacity(types.len());
        let mut current = texts.first().map_or(String::new(), |t| (*t).to_string());
        for (index, &type_id) in types.iter().enumerate() {
            let next_text = texts.get(index + 1).copied().unwrap_or("");
            if let Some(text) = self.literal_text(type_id) {
                current.push_str(&text);
                current.push_str(next_text);
                continue;
            }
            if type_id.is_never() {
                return TypeId::NEVER;
            }
            folded_texts.push(std::mem::take(&mut current));
            folded_types.push(type_id);
            current.push_str(next_text);
        }
        folded_texts.push(current);

        if folded_types.is_empty() {
            return self.literal_string(folded_texts.first().map_or("", |t| t.as_str()));
        }
        if folded_types.len() == 1
            && folded_types[0] == TypeId::STRING
            && folded_texts.iter().all(|t| t.is_empty())
        {
            return TypeId::STRING;
        }
        let template = TemplateLiteralType {
            texts: folded_texts.iter().map(|t| self.intern_string(t)).collect(),
            types: folded_types,
        };
        let id = TemplateLiteralId(self.template_literals.borrow_mut().intern(template));
        self.intern(TypeKey::TemplateLiteral(id))
    }

    /// Text of a literal as it appears inside a template.
    pub fn literal_text(&self, type_id: TypeId) -> Option<String> {
        match self.lookup(type_id)? {
            TypeKey::Literal(value) | TypeKey::FreshLiteral(value) => Some(match value {
                LiteralValue::String(atom) => self.resolve_atom(atom).to_string(),
                LiteralValue::Number(n) => format_number(n.0),
                LiteralValue::BigInt(atom) => self.resolve_atom(atom).to_string(),
                LiteralValue::Boolean(b) => b.to_string(),
            }),
            _ => match type_id {
                TypeId::NULL => Some("null".to_string()),
                TypeId::UNDEFINED => Some("undefined".to_string()),
                _ => None,
            },
        }
    }

    // =========================================================================
    // Type parameters
    // =========================================================================

    /// Allocate a new, distinct type parameter.
    pub fn type_param(&self, name: &str) -> TypeId {
        self.type_param_with(name, None, None)
    }

    pub fn type_param_with(
        &self,
        name: &str,
        constraint: Option<TypeId>,
        default: Option<TypeId>,
    ) -> TypeId {
        let name = self.intern_string(name);
        let id = {
            let mut params = self.type_params.borrow_mut();
            params.push(TypeParamData {
                constraint,
                default,
            });
            (params.len() - 1) as u32
        };
        self.intern(TypeKey::TypeParameter(TypeParamInfo {
            name,
            id,
            is_const: false,
        }))
    }

    pub fn set_type_param_constraint(&self, param: TypeId, constraint: TypeId) {
        if let Some(TypeKey::TypeParameter(info)) = self.lookup(param) {
            if let Some(data) = self.type_params.borrow_mut().get_mut(info.id as usize) {
                data.constraint = Some(constraint);
            }
        }
    }

    pub fn set_type_param_default(&self, param: TypeId, default: TypeId) {
        if let Some(TypeKey::TypeParameter(info)) = self.lookup(param) {
            if let Some(data) = self.type_params.borrow_mut().get_mut(info.id as usize) {
                data.default = Some(default);
            }
        }
    }

    pub fn type_param_constraint(&self, param: TypeId) -> Option<TypeId> {
        match self.lookup(param)? {
            TypeKey::TypeParameter(info) => self
                .type_params
                .borrow()
                .get(info.id as usize)
                .and_then(|data| data.constraint),
            _ => None,
        }
    }

    pub fn type_param_default(&self, param: TypeId) -> Option<TypeId> {
        match self.lookup(param)? {
            TypeKey::TypeParameter(info) => self
                .type_params
                .borrow()
                .get(info.id as usize)
                .and_then(|data| data.default),
            _ => None,
        }
    }

    // =========================================================================
    // Generic definitions
    // =========================================================================

    /// Register a generic declaration. Its body can be attached later so that
    /// recursive declarations may refer to themselves.
    pub fn define(
        &self,
        name: &str,
        kind: DefKind,
        type_params: Vec<TypeId>,
        variances: Vec<Variance>,
    ) -> DefId {
        let name = self.intern_string(name);
        let mut definitions = self.definitions.borrow_mut();
        definitions.push(DefinitionInfo {
            name,
            kind,
            type_params,
            variances,
            body: None,
            base_class: None,
        });
        DefId((definitions.len() - 1) as u32)
    }

    pub fn set_definition_body(&self, def: DefId, body: TypeId) {
        if let Some(info) = self.definitions.borrow_mut().get_mut(def.0 as usize) {
            info.body = Some(body);
        }
    }

    pub fn set_base_class(&self, def: DefId, base: DefId) {
        if let Some(info) = self.definitions.borrow_mut().get_mut(def.0 as usize) {
            info.base_class = Some(base);
        }
    }

    pub fn definition(&self, def: DefId) -> Option<DefinitionInfo> {
        self.definitions.borrow().get(def.0 as usize).cloned()
    }

    /// Whether `derived` is `base` or inherits from it.
    pub fn def_derives_from(&self, derived: DefId, base: DefId) -> bool {
        let mut current = Some(derived);
        let mut steps = 0;
        while let Some(def) = current {
            if def == base {
                return true;
            }
            steps += 1;
            if steps > self.definitions.borrow().len() {
                return false;
            }
            current = self.definition(def).and_then(|info| info.base_class);
        }
        false
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Number-to-text conversion for numeric literal types.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}
