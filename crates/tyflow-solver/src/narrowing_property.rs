//! Property-based narrowing.
//!
//! Discriminant properties (`x.kind === "a"`) and `in` checks
//! (`"name" in x`) narrow a union by looking at the declared members of
//! each constituent.

use crate::evaluate::evaluate_type;
use crate::narrowing::NarrowingContext;
use crate::type_facts::TypeFacts;
use crate::type_queries::{contains_type_parameters, is_unit_type, object_shape_of};
use crate::types::*;
use tracing::{Level, span, trace};
use tyflow_common::interner::Atom;

/// Where an accessed property came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyLookup {
    Declared(PropertyInfo),
    IndexSignature(TypeId),
}

impl<'a> NarrowingContext<'a> {
    /// Resolve `type_id` to the object shape that declares its members.
    fn structural_shape(&self, type_id: TypeId) -> Option<std::sync::Arc<ObjectShape>> {
        if let Some(shape) = object_shape_of(self.interner, type_id) {
            return Some(shape);
        }
        match self.interner.lookup(type_id)? {
            TypeKey::Application(_) | TypeKey::Mapped(_) => {
                let evaluated = evaluate_type(self.interner, self.relation, type_id);
                if evaluated == type_id {
                    return None;
                }
                object_shape_of(self.interner, evaluated)
            }
            TypeKey::TypeParameter(_) => {
                let constraint = self.interner.type_param_constraint(type_id)?;
                self.structural_shape(constraint)
            }
            _ => None,
        }
    }

    /// Look up `name` on a single (non-union) constituent.
    pub fn lookup_property(&self, type_id: TypeId, name: Atom) -> Option<PropertyLookup> {
        let shape = self.structural_shape(type_id)?;
        if let Some(prop) = shape.property(name) {
            return Some(PropertyLookup::Declared(*prop));
        }
        let text = self.interner.resolve_atom(name);
        if let Some(index) = shape.number_index {
            if text.parse::<f64>().is_ok() {
                return Some(PropertyLookup::IndexSignature(index.value_type));
            }
        }
        shape
            .string_index
            .map(|index| PropertyLookup::IndexSignature(index.value_type))
    }

    /// Declared type of `name` read from a single constituent, with
    /// `undefined` added for optional properties. Intersections combine
    /// the members that declare it.
    pub fn property_type_of(&self, type_id: TypeId, name: Atom) -> Option<TypeId> {
        if let Some(TypeKey::Intersection(list)) = self.interner.lookup(type_id) {
            let found: Vec<TypeId> = self
                .interner
                .type_list(list)
                .iter()
                .filter_map(|&member| self.property_type_of(member, name))
                .collect();
            if found.is_empty() {
                return None;
            }
            return Some(self.interner.intersection(found));
        }
        let shape = self.structural_shape(type_id)?;
        let prop = shape.property(name)?;
        if prop.optional {
            Some(self.interner.union2(prop.type_id, TypeId::UNDEFINED))
        } else {
            Some(prop.type_id)
        }
    }

    /// Property type, falling back to an applicable index signature.
    pub fn property_or_index_signature_type(&self, type_id: TypeId, name: Atom) -> Option<TypeId> {
        if let Some(found) = self.property_type_of(type_id, name) {
            return Some(found);
        }
        match self.lookup_property(type_id, name)? {
            PropertyLookup::IndexSignature(value) => Some(value),
            PropertyLookup::Declared(prop) => Some(prop.type_id),
        }
    }

    /// Type of `name` read from `type_id`: for a union, the union of the
    /// property across constituents. `None` when some constituent lacks it.
    pub fn discriminant_property_type(&self, type_id: TypeId, name: Atom) -> Option<TypeId> {
        let mut types = Vec::new();
        for member in self.constituents(type_id) {
            types.push(self.property_type_of(member, name)?);
        }
        Some(self.union_of(types))
    }

    /// A discriminant is a property declared by some constituent of a
    /// union whose types differ across constituents and include a unit
    /// type.
    pub fn is_discriminant_property(&self, type_id: TypeId, name: Atom) -> bool {
        let members = self.constituents(type_id);
        if members.len() < 2 {
            return false;
        }
        let types: Vec<TypeId> = members
            .iter()
            .filter_map(|&member| self.property_type_of(member, name))
            .collect();
        let Some(&first) = types.first() else {
            return false;
        };
        let non_uniform = types.iter().any(|&t| t != first) || types.len() < members.len();
        let has_literal = types.iter().any(|&t| {
            self.constituents(t)
                .iter()
                .any(|&part| is_unit_type(self.interner, part))
        });
        let generic = types
            .iter()
            .any(|&t| contains_type_parameters(self.interner, t));
        non_uniform && has_literal && !generic
    }

    /// Narrow by a check on property `name`: the property type is narrowed
    /// with `narrow` and the constituents whose own property type can no
    /// longer match are dropped.
    ///
    /// `remove_nullable` reads the property through `?.` or `!`; with
    /// `optional_chain` the read may itself produce `undefined`.
    pub fn narrow_type_by_discriminant(
        &self,
        type_id: TypeId,
        name: Atom,
        remove_nullable: bool,
        optional_chain: bool,
        narrow: impl FnOnce(TypeId) -> TypeId,
    ) -> TypeId {
        let _span = span!(
            Level::TRACE,
            "narrow_type_by_discriminant",
            type_id = type_id.0,
            name = name.0
        )
        .entered();

        let remove_nullable =
            remove_nullable && self.strict_null_checks() && self.maybe_nullable(type_id);
        let non_null = if remove_nullable {
            self.type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL)
        } else {
            type_id
        };
        let Some(mut prop_type) = self.discriminant_property_type(non_null, name) else {
            trace!("property missing on some constituent");
            return type_id;
        };
        if remove_nullable && optional_chain {
            prop_type = self.interner.union2(prop_type, TypeId::UNDEFINED);
        }
        let narrowed = narrow(prop_type);
        trace!(prop_type = prop_type.0, narrowed = narrowed.0, "narrowed discriminant");
        self.filter_type(type_id, |t| match self.property_or_index_signature_type(t, name) {
            None => true,
            Some(discriminant) => {
                !discriminant.is_never()
                    && !narrowed.is_never()
                    && self.relation.are_types_comparable(narrowed, discriminant)
            }
        })
    }

    /// Whether a value of `type_id` may (or, with `!assume_true`, may not)
    /// have property `name`.
    pub fn is_type_presence_possible(&self, type_id: TypeId, name: Atom, assume_true: bool) -> bool {
        match self.lookup_property(type_id, name) {
            Some(PropertyLookup::Declared(prop)) => prop.optional || assume_true,
            Some(PropertyLookup::IndexSignature(_)) => true,
            None => !assume_true,
        }
    }

    /// Narrowing for `"name" in x`.
    pub fn narrow_type_by_in_keyword(&self, type_id: TypeId, name: Atom, assume_true: bool) -> TypeId {
        let known = self.some_type(type_id, |t| self.is_type_presence_possible(t, name, true));
        if known {
            return self.filter_type(type_id, |t| self.is_type_presence_possible(t, name, assume_true));
        }
        if assume_true {
            let record = self
                .interner
                .object(vec![PropertyInfo::new(name, TypeId::UNKNOWN)]);
            return self.interner.intersection2(type_id, record);
        }
        type_id
    }
}
