//! Mapped type evaluation: `{ [K in Keys as Name]?: Template }`.

use crate::evaluate::TypeEvaluator;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::type_queries::{contains_type_parameters, property_of, union_members};
use crate::types::*;

impl TypeEvaluator<'_> {
    /// Expand a mapped type over a concrete key set into an object type.
    ///
    /// For `{ [K in keyof T]: ... }` the source `T` supplies the modifiers
    /// of each property, and array or tuple sources map element-wise.
    pub fn evaluate_mapped(&mut self, type_id: TypeId, id: MappedTypeId) -> TypeId {
        let interner = self.interner();
        let mapped = interner.mapped_type(id);

        let homomorphic_source = match interner.lookup(mapped.constraint) {
            Some(TypeKey::Index(source)) => Some(self.evaluate(source)),
            _ => None,
        };
        if let Some(source) = homomorphic_source {
            if mapped.name_type.is_none() {
                match interner.lookup(source) {
                    Some(TypeKey::Array(_)) => return self.map_array(&mapped, TypeId::NUMBER),
                    Some(TypeKey::Tuple(list)) => {
                        let elements = interner.tuple_list(list);
                        return self.map_tuple(&mapped, &elements);
                    }
                    _ => {}
                }
            }
        }

        let constraint = self.evaluate(mapped.constraint);
        if contains_type_parameters(interner, constraint) {
            return type_id;
        }

        let mut shape = ObjectShape::default();
        for key in union_members(interner, constraint) {
            let value = self.map_template(&mapped, key);
            let name_key = match mapped.name_type {
                Some(name_type) => {
                    let renamed = self.instantiate_with_key(&mapped, name_type, key);
                    if renamed.is_never() {
                        continue;
                    }
                    renamed
                }
                None => key,
            };

            match name_key {
                TypeId::STRING => {
                    shape.string_index = Some(IndexSignature {
                        key_type: TypeId::STRING,
                        value_type: value,
                        readonly: mapped.readonly_modifier == MappedModifier::Add,
                    });
                    continue;
                }
                TypeId::NUMBER => {
                    shape.number_index = Some(IndexSignature {
                        key_type: TypeId::NUMBER,
                        value_type: value,
                        readonly: mapped.readonly_modifier == MappedModifier::Add,
                    });
                    continue;
                }
                _ => {}
            }
            let Some(text) = interner.literal_text(name_key) else {
                continue;
            };
            let name = interner.intern_string(&text);
            let source_prop = homomorphic_source.and_then(|source| property_of(interner, source, name));

            let optional = match mapped.optional_modifier {
                MappedModifier::Add => true,
                MappedModifier::Remove => false,
                MappedModifier::None => source_prop.is_some_and(|p| p.optional),
            };
            let readonly = match mapped.readonly_modifier {
                MappedModifier::Add => true,
                MappedModifier::Remove => false,
                MappedModifier::None => source_prop.is_some_and(|p| p.readonly),
            };
            let value = if mapped.optional_modifier == MappedModifier::Remove
                && source_prop.is_some_and(|p| p.optional)
            {
                self.remove_undefined(value)
            } else {
                value
            };
            shape.properties.push(PropertyInfo {
                name,
                type_id: value,
                optional,
                readonly,
                is_method: false,
            });
        }
        interner.object_with_shape(shape)
    }

    fn instantiate_with_key(&mut self, mapped: &MappedType, target: TypeId, key: TypeId) -> TypeId {
        let mut substitution = TypeSubstitution::new();
        substitution.insert(mapped.type_param, key);
        let instantiated = instantiate_type(self.interner(), target, &substitution);
        self.evaluate(instantiated)
    }

    fn map_template(&mut self, mapped: &MappedType, key: TypeId) -> TypeId {
        self.instantiate_with_key(mapped, mapped.template, key)
    }

    fn map_array(&mut self, mapped: &MappedType, key: TypeId) -> TypeId {
        let element = self.map_template(mapped, key);
        let element = if mapped.optional_modifier == MappedModifier::Add {
            self.interner().union2(element, TypeId::UNDEFINED)
        } else {
            element
        };
        self.interner().array(element)
    }

    fn map_tuple(&mut self, mapped: &MappedType, elements: &[TupleElement]) -> TypeId {
        let interner = self.interner();
        let mut mapped_elements = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let key = if element.flags.intersects(ElementFlags::VARIABLE) {
                TypeId::NUMBER
            } else {
                interner.literal_number(index as f64)
            };
            let value = self.map_template(mapped, key);
            let flags = if element.flags.intersects(ElementFlags::FIXED) {
                match mapped.optional_modifier {
                    MappedModifier::Add => ElementFlags::OPTIONAL,
                    MappedModifier::Remove => ElementFlags::REQUIRED,
                    MappedModifier::None => element.flags,
                }
            } else {
                element.flags
            };
            let value = if mapped.optional_modifier == MappedModifier::Remove
                && element.flags.contains(ElementFlags::OPTIONAL)
            {
                self.remove_undefined(value)
            } else {
                value
            };
            let value = if element.flags.contains(ElementFlags::VARIADIC) {
                interner.array(value)
            } else {
                value
            };
            mapped_elements.push(TupleElement {
                type_id: value,
                name: element.name,
                flags,
            });
        }
        interner.tuple(mapped_elements)
    }

    fn remove_undefined(&self, type_id: TypeId) -> TypeId {
        let members: Vec<TypeId> = union_members(self.interner(), type_id)
            .into_iter()
            .filter(|&m| m != TypeId::UNDEFINED)
            .collect();
        self.interner().union(members)
    }
}
