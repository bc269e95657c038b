//! keyof operator evaluation.
//!
//! Handles TypeScript's keyof operator: `keyof T`

use crate::evaluate::TypeEvaluator;
use crate::type_queries::contains_type_parameters;
use crate::types::*;

impl TypeEvaluator<'_> {
    /// Evaluate `keyof operand`.
    ///
    /// - `keyof (A | B)` is `keyof A & keyof B`
    /// - `keyof (A & B)` is `keyof A | keyof B`
    /// - generic operands stay deferred
    pub fn evaluate_keyof(&mut self, type_id: TypeId, operand: TypeId) -> TypeId {
        let interner = self.interner();
        let operand = self.evaluate(operand);

        match interner.lookup(operand) {
            Some(TypeKey::Union(list)) => {
                let keys: Vec<TypeId> = interner
                    .type_list(list)
                    .iter()
                    .map(|&member| self.recurse_keyof(member))
                    .collect();
                return interner.intersection(keys);
            }
            Some(TypeKey::Intersection(list)) => {
                let keys: Vec<TypeId> = interner
                    .type_list(list)
                    .iter()
                    .map(|&member| self.recurse_keyof(member))
                    .collect();
                return interner.union(keys);
            }
            _ => {}
        }

        match operand {
            TypeId::ANY | TypeId::NEVER => {
                return interner.union3(TypeId::STRING, TypeId::NUMBER, TypeId::SYMBOL);
            }
            TypeId::UNKNOWN => return TypeId::NEVER,
            _ => {}
        }

        match interner.lookup(operand) {
            Some(TypeKey::Object(shape_id)) => {
                let shape = interner.object_shape(shape_id);
                let mut keys: Vec<TypeId> = shape
                    .properties
                    .iter()
                    .map(|p| interner.literal(LiteralValue::String(p.name)))
                    .collect();
                if shape.string_index.is_some() {
                    keys.push(TypeId::STRING);
                    keys.push(TypeId::NUMBER);
                } else if shape.number_index.is_some() {
                    keys.push(TypeId::NUMBER);
                }
                interner.union(keys)
            }
            Some(TypeKey::Array(_) | TypeKey::EvolvingArray(_)) => TypeId::NUMBER,
            Some(TypeKey::Tuple(list)) => {
                let elements = interner.tuple_list(list);
                let mut keys: Vec<TypeId> = elements
                    .iter()
                    .take_while(|e| e.flags.intersects(ElementFlags::FIXED))
                    .enumerate()
                    .map(|(index, _)| interner.literal_string(&index.to_string()))
                    .collect();
                keys.push(TypeId::NUMBER);
                interner.union(keys)
            }
            Some(TypeKey::Mapped(id)) => {
                let mapped = interner.mapped_type(id);
                if mapped.name_type.is_none() {
                    mapped.constraint
                } else {
                    type_id
                }
            }
            Some(
                TypeKey::TypeParameter(_)
                | TypeKey::IndexAccess(..)
                | TypeKey::Conditional(_)
                | TypeKey::Application(_),
            ) => {
                if contains_type_parameters(interner, operand) {
                    interner.keyof(operand)
                } else {
                    type_id
                }
            }
            Some(
                TypeKey::Literal(_)
                | TypeKey::FreshLiteral(_)
                | TypeKey::TemplateLiteral(_)
                | TypeKey::StringIntrinsic { .. }
                | TypeKey::Intrinsic(_),
            ) => TypeId::NEVER,
            _ => {
                if operand.is_intrinsic() {
                    TypeId::NEVER
                } else {
                    type_id
                }
            }
        }
    }

    fn recurse_keyof(&mut self, operand: TypeId) -> TypeId {
        let keyof = self.interner().keyof(operand);
        self.evaluate(keyof)
    }
}
