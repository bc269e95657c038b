//! Indexed access type evaluation: `T[K]`.

use crate::evaluate::TypeEvaluator;
use crate::template_literal::is_numeric_text;
use crate::type_queries::{contains_type_parameters, element_type_of_array_like};
use crate::types::*;

impl TypeEvaluator<'_> {
    /// Evaluate `object[index]`, distributing over unions on either side.
    ///
    /// A key that names nothing on a concrete object evaluates to `error`.
    pub fn evaluate_index_access(&mut self, object: TypeId, index: TypeId) -> TypeId {
        let interner = self.interner();
        let object = self.evaluate(object);
        let index = self.evaluate(index);

        if let Some(TypeKey::Union(list)) = interner.lookup(index) {
            let members: Vec<TypeId> = interner
                .type_list(list)
                .iter()
                .map(|&key| self.recurse_index_access(object, key))
                .collect();
            return interner.union(members);
        }
        if let Some(TypeKey::Union(list)) = interner.lookup(object) {
            let members: Vec<TypeId> = interner
                .type_list(list)
                .iter()
                .map(|&member| self.recurse_index_access(member, index))
                .collect();
            return interner.union(members);
        }
        if contains_type_parameters(interner, object) || contains_type_parameters(interner, index) {
            return interner.index_access(object, index);
        }
        if object.is_any() {
            return TypeId::ANY;
        }

        match interner.lookup(object) {
            Some(TypeKey::Object(shape_id)) => {
                let shape = interner.object_shape(shape_id);
                self.object_index_type(&shape, index)
            }
            Some(TypeKey::Array(element) | TypeKey::EvolvingArray(element)) => {
                match self.key_text(index) {
                    Some(text) if text == "length" => TypeId::NUMBER,
                    Some(text) if is_numeric_text(&text) => element,
                    None if index == TypeId::NUMBER => element,
                    _ => TypeId::ERROR,
                }
            }
            Some(TypeKey::Tuple(list)) => {
                let elements = interner.tuple_list(list);
                self.tuple_index_type(object, &elements, index)
            }
            Some(TypeKey::Intersection(list)) => {
                let found: Vec<TypeId> = interner
                    .type_list(list)
                    .iter()
                    .map(|&member| self.recurse_index_access(member, index))
                    .filter(|&t| t != TypeId::ERROR)
                    .collect();
                if found.is_empty() {
                    TypeId::ERROR
                } else {
                    interner.intersection(found)
                }
            }
            Some(TypeKey::Application(_) | TypeKey::Mapped(_) | TypeKey::Conditional(_)) => {
                interner.index_access(object, index)
            }
            _ => TypeId::ERROR,
        }
    }

    fn recurse_index_access(&mut self, object: TypeId, index: TypeId) -> TypeId {
        let access = self.interner().index_access(object, index);
        self.evaluate(access)
    }

    /// Property name for a string or number literal key.
    fn key_text(&self, index: TypeId) -> Option<String> {
        match self.interner().lookup(index)? {
            TypeKey::Literal(LiteralValue::String(_) | LiteralValue::Number(_))
            | TypeKey::FreshLiteral(LiteralValue::String(_) | LiteralValue::Number(_)) => {
                self.interner().literal_text(index)
            }
            _ => None,
        }
    }

    fn object_index_type(&mut self, shape: &ObjectShape, index: TypeId) -> TypeId {
        let interner = self.interner();
        if let Some(text) = self.key_text(index) {
            let name = interner.intern_string(&text);
            if let Some(prop) = shape.property(name) {
                return if prop.optional {
                    interner.union2(prop.type_id, TypeId::UNDEFINED)
                } else {
                    prop.type_id
                };
            }
            if is_numeric_text(&text) {
                if let Some(info) = shape.number_index {
                    return info.value_type;
                }
            }
            return shape.string_index.map_or(TypeId::ERROR, |info| info.value_type);
        }
        match index {
            TypeId::STRING => shape.string_index.map_or(TypeId::ERROR, |info| info.value_type),
            TypeId::NUMBER => shape
                .number_index
                .or(shape.string_index)
                .map_or(TypeId::ERROR, |info| info.value_type),
            _ => TypeId::ERROR,
        }
    }

    fn tuple_index_type(&mut self, tuple: TypeId, elements: &[TupleElement], index: TypeId) -> TypeId {
        let interner = self.interner();
        if index == TypeId::NUMBER {
            return element_type_of_array_like(interner, tuple).unwrap_or(TypeId::ERROR);
        }
        let Some(text) = self.key_text(index) else {
            return TypeId::ERROR;
        };
        if text == "length" {
            let fixed = elements
                .iter()
                .all(|e| e.flags.contains(ElementFlags::REQUIRED));
            return if fixed {
                interner.literal_number(elements.len() as f64)
            } else {
                TypeId::NUMBER
            };
        }
        let Ok(position) = text.parse::<usize>() else {
            return TypeId::ERROR;
        };
        for (offset, element) in elements.iter().enumerate() {
            if element.flags.intersects(ElementFlags::VARIABLE) {
                let rest: Vec<TypeId> = elements[offset..]
                    .iter()
                    .map(|e| {
                        if e.flags.contains(ElementFlags::VARIADIC) {
                            element_type_of_array_like(interner, e.type_id).unwrap_or(TypeId::UNKNOWN)
                        } else {
                            e.type_id
                        }
                    })
                    .collect();
                return interner.union(rest);
            }
            if offset == position {
                return if element.flags.contains(ElementFlags::OPTIONAL) {
                    interner.union2(element.type_id, TypeId::UNDEFINED)
                } else {
                    element.type_id
                };
            }
        }
        TypeId::ERROR
    }
}
