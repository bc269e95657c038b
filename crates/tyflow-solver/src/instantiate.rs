//! Type instantiation: substituting type parameters.
//!
//! `instantiate_type` rebuilds a type with every mapped type parameter
//! replaced. Rebuilding goes through the interner's normalizing
//! constructors, so substituting into a union or tuple re-normalizes it.
//! Evaluation of the result (conditional types, applications) is left to
//! `evaluate`.

use crate::intern::TypeInterner;
use crate::types::*;
use rustc_hash::FxHashMap;
use tracing::trace;
use tyflow_common::limits::MAX_INSTANTIATION_DEPTH;

/// A mapping from type parameters to the types that replace them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        TypeSubstitution {
            map: FxHashMap::default(),
        }
    }

    /// Pairwise substitution; extra parameters are left unmapped.
    pub fn from_args(type_params: &[TypeId], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (&param, &arg) in type_params.iter().zip(args.iter()) {
            subst.insert(param, arg);
        }
        subst
    }

    pub fn insert(&mut self, param: TypeId, replacement: TypeId) {
        self.map.insert(param, replacement);
    }

    pub fn get(&self, param: TypeId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Substitute type parameters in `type_id`.
pub fn instantiate_type(
    interner: &TypeInterner,
    type_id: TypeId,
    substitution: &TypeSubstitution,
) -> TypeId {
    if substitution.is_empty() {
        return type_id;
    }
    let mut instantiator = TypeInstantiator::new(interner, substitution);
    instantiator.instantiate(type_id)
}

pub struct TypeInstantiator<'a> {
    interner: &'a TypeInterner,
    substitution: &'a TypeSubstitution,
    cache: FxHashMap<TypeId, TypeId>,
    depth: u32,
    /// Set once the depth limit is hit; the result is `error` from then on.
    pub depth_exceeded: bool,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(interner: &'a TypeInterner, substitution: &'a TypeSubstitution) -> Self {
        TypeInstantiator {
            interner,
            substitution,
            cache: FxHashMap::default(),
            depth: 0,
            depth_exceeded: false,
        }
    }

    pub fn instantiate(&mut self, type_id: TypeId) -> TypeId {
        if type_id.is_intrinsic() {
            return type_id;
        }
        if let Some(&cached) = self.cache.get(&type_id) {
            return cached;
        }
        if self.depth >= MAX_INSTANTIATION_DEPTH {
            self.depth_exceeded = true;
            trace!(type_id = type_id.0, "instantiation depth exceeded");
            return TypeId::ERROR;
        }
        self.depth += 1;
        let result = self.instantiate_key(type_id);
        self.depth -= 1;
        self.cache.insert(type_id, result);
        result
    }

    fn instantiate_list(&mut self, members: &[TypeId]) -> Vec<TypeId> {
        members.iter().map(|&member| self.instantiate(member)).collect()
    }

    fn instantiate_signature(&mut self, sig: &FunctionShape) -> FunctionShape {
        FunctionShape {
            type_params: sig.type_params.clone(),
            params: sig
                .params
                .iter()
                .map(|p| ParamInfo {
                    type_id: self.instantiate(p.type_id),
                    ..*p
                })
                .collect(),
            this_type: sig.this_type.map(|t| self.instantiate(t)),
            return_type: self.instantiate(sig.return_type),
            type_predicate: sig.type_predicate.map(|p| TypePredicate {
                type_id: p.type_id.map(|t| self.instantiate(t)),
                ..p
            }),
            is_method: sig.is_method,
        }
    }

    /// `T extends U ? X : Y` with `T` mapped to a union: one conditional per
    /// member, each instantiated with `T` bound to that member.
    fn distribute_conditional(&mut self, type_id: TypeId, check_param: TypeId, members: &[TypeId]) -> TypeId {
        let mut results = Vec::with_capacity(members.len());
        for &member in members {
            let mut substitution = self.substitution.clone();
            substitution.insert(check_param, member);
            let mut nested = TypeInstantiator::new(self.interner, &substitution);
            nested.depth = self.depth;
            results.push(nested.instantiate(type_id));
            self.depth_exceeded |= nested.depth_exceeded;
        }
        self.interner.union(results)
    }

    fn instantiate_key(&mut self, type_id: TypeId) -> TypeId {
        let interner = self.interner;
        let Some(key) = interner.lookup(type_id) else {
            return type_id;
        };
        match key {
            TypeKey::TypeParameter(_) => self.substitution.get(type_id).unwrap_or(type_id),
            TypeKey::Intrinsic(_) | TypeKey::Literal(_) | TypeKey::FreshLiteral(_) => type_id,
            TypeKey::Union(list) => {
                let members = self.instantiate_list(&interner.type_list(list));
                interner.union(members)
            }
            TypeKey::Intersection(list) => {
                let members = self.instantiate_list(&interner.type_list(list));
                interner.intersection(members)
            }
            TypeKey::Array(element) => {
                let element = self.instantiate(element);
                interner.array(element)
            }
            TypeKey::EvolvingArray(element) => {
                let element = self.instantiate(element);
                interner.evolving_array(element)
            }
            TypeKey::Tuple(list) => {
                let elements: Vec<TupleElement> = interner
                    .tuple_list(list)
                    .iter()
                    .map(|e| TupleElement {
                        type_id: self.instantiate(e.type_id),
                        ..*e
                    })
                    .collect();
                interner.tuple(elements)
            }
            TypeKey::Object(shape_id) => {
                let shape = interner.object_shape(shape_id);
                let mut instantiated = ObjectShape {
                    properties: shape
                        .properties
                        .iter()
                        .map(|p| PropertyInfo {
                            type_id: self.instantiate(p.type_id),
                            ..*p
                        })
                        .collect(),
                    call_signatures: Vec::with_capacity(shape.call_signatures.len()),
                    construct_signatures: Vec::with_capacity(shape.construct_signatures.len()),
                    string_index: shape.string_index.map(|i| IndexSignature {
                        value_type: self.instantiate(i.value_type),
                        ..i
                    }),
                    number_index: shape.number_index.map(|i| IndexSignature {
                        value_type: self.instantiate(i.value_type),
                        ..i
                    }),
                    flags: shape.flags,
                    nominal: shape.nominal,
                };
                for sig in &shape.call_signatures {
                    let sig = self.instantiate_signature(sig);
                    instantiated.call_signatures.push(sig);
                }
                for sig in &shape.construct_signatures {
                    let sig = self.instantiate_signature(sig);
                    instantiated.construct_signatures.push(sig);
                }
                interner.object_with_shape(instantiated)
            }
            TypeKey::Application(app_id) => {
                let app = interner.type_application(app_id);
                let args = self.instantiate_list(&app.args);
                interner.application(app.base, args)
            }
            TypeKey::Index(target) => {
                let target = self.instantiate(target);
                interner.keyof(target)
            }
            TypeKey::IndexAccess(object, index) => {
                let object = self.instantiate(object);
                let index = self.instantiate(index);
                interner.index_access(object, index)
            }
            TypeKey::Conditional(id) => {
                let cond = interner.conditional_type(id);
                if cond.is_distributive {
                    if let Some(replacement) = self.substitution.get(cond.check_type) {
                        if replacement.is_never() {
                            return TypeId::NEVER;
                        }
                        if let Some(TypeKey::Union(list)) = interner.lookup(replacement) {
                            return self.distribute_conditional(type_id, cond.check_type, &interner.type_list(list));
                        }
                    }
                }
                let instantiated = ConditionalType {
                    check_type: self.instantiate(cond.check_type),
                    extends_type: self.instantiate(cond.extends_type),
                    true_type: self.instantiate(cond.true_type),
                    false_type: self.instantiate(cond.false_type),
                    is_distributive: cond.is_distributive,
                    infer_type_params: cond.infer_type_params.clone(),
                };
                interner.conditional(instantiated)
            }
            TypeKey::Mapped(id) => {
                let mapped = interner.mapped_type(id);
                let instantiated = MappedType {
                    type_param: mapped.type_param,
                    constraint: self.instantiate(mapped.constraint),
                    name_type: mapped.name_type.map(|t| self.instantiate(t)),
                    template: self.instantiate(mapped.template),
                    optional_modifier: mapped.optional_modifier,
                    readonly_modifier: mapped.readonly_modifier,
                };
                interner.mapped(instantiated)
            }
            TypeKey::TemplateLiteral(id) => {
                let template = interner.template_literal_type(id);
                let types = self.instantiate_list(&template.types);
                let texts: Vec<std::sync::Arc<str>> = template
                    .texts
                    .iter()
                    .map(|&atom| interner.resolve_atom(atom))
                    .collect();
                interner.template_literal(texts.iter().map(|t| &**t).collect(), types)
            }
            TypeKey::StringIntrinsic { kind, type_arg } => {
                let type_arg = self.instantiate(type_arg);
                interner.string_intrinsic(kind, type_arg)
            }
            TypeKey::Substitution { base, constraint } => {
                let base = self.instantiate(base);
                if !crate::type_queries::could_contain_type_variables(interner, base) {
                    return base;
                }
                let constraint = self.instantiate(constraint);
                interner.substitution(base, constraint)
            }
        }
    }
}
