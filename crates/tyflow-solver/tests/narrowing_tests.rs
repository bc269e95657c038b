use super::*;
use crate::narrowing_discriminants::not_equal_facts_from_typeof_switch;
use crate::relation::RelationChecker;
use tyflow_common::options::CheckerOptions;

fn class_instance(interner: &TypeInterner, def: DefId, props: Vec<PropertyInfo>) -> TypeId {
    interner.object_with_shape(ObjectShape {
        properties: props,
        flags: ObjectFlags::CLASS_INSTANCE,
        nominal: Some(def),
        ..ObjectShape::default()
    })
}

#[test]
fn test_typeof_string_true_and_false_branches() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let string_or_number = interner.union2(TypeId::STRING, TypeId::NUMBER);
    assert_eq!(
        ctx.narrow_type_by_typeof(string_or_number, "string", true),
        TypeId::STRING
    );
    assert_eq!(
        ctx.narrow_type_by_typeof(string_or_number, "string", false),
        TypeId::NUMBER
    );
}

#[test]
fn test_typeof_narrows_unknown_to_implied_type() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    assert_eq!(
        ctx.narrow_type_by_typeof(TypeId::UNKNOWN, "number", true),
        TypeId::NUMBER
    );
}

#[test]
fn test_typeof_undefined_keeps_only_undefined() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let maybe = interner.union2(TypeId::STRING, TypeId::UNDEFINED);
    assert_eq!(ctx.narrow_type_by_typeof(maybe, "undefined", true), TypeId::UNDEFINED);
    assert_eq!(ctx.narrow_type_by_typeof(maybe, "undefined", false), TypeId::STRING);
}

#[test]
fn test_truthiness_removes_falsy_constituents() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let maybe = interner.union2(TypeId::STRING, TypeId::UNDEFINED);
    assert_eq!(
        ctx.adjusted_type_with_facts(maybe, TypeFacts::TRUTHY),
        TypeId::STRING
    );
    assert_eq!(
        ctx.adjusted_type_with_facts(TypeId::BOOLEAN, TypeFacts::TRUTHY),
        TypeId::BOOLEAN_TRUE
    );
    assert_eq!(
        ctx.adjusted_type_with_facts(TypeId::BOOLEAN, TypeFacts::FALSY),
        TypeId::BOOLEAN_FALSE
    );
}

#[test]
fn test_non_nullable_is_identity_without_strict_null_checks() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::default());
    let ctx = NarrowingContext::new(&interner, &relation);

    let maybe = interner.union2(TypeId::STRING, TypeId::NULL);
    assert_eq!(ctx.non_nullable(maybe), maybe);
}

#[test]
fn test_strict_equality_with_literal() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let declared = interner.union3(a, b, TypeId::NUMBER);

    assert_eq!(ctx.narrow_type_by_equality(declared, a, false, true), a);
    assert_eq!(
        ctx.narrow_type_by_equality(declared, a, false, false),
        interner.union2(b, TypeId::NUMBER)
    );
}

#[test]
fn test_equality_with_primitive_yields_literal() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let one = interner.literal_number(1.0);
    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    assert_eq!(ctx.narrow_type_by_equality(declared, one, false, true), one);
    // Not a unit type on the false branch for `number`, so nothing is removed.
    assert_eq!(
        ctx.narrow_type_by_equality(declared, one, false, false),
        declared
    );
}

#[test]
fn test_equality_on_unknown_returns_value_type() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let one = interner.literal_number(1.0);
    assert_eq!(ctx.narrow_type_by_equality(TypeId::UNKNOWN, one, false, true), one);
}

#[test]
fn test_null_equality_narrows_nullables() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let maybe = interner.union2(TypeId::STRING, TypeId::NULL);
    assert_eq!(
        ctx.narrow_type_by_equality(maybe, TypeId::NULL, false, false),
        TypeId::STRING
    );
    assert_eq!(
        ctx.narrow_type_by_equality(maybe, TypeId::NULL, false, true),
        TypeId::NULL
    );

    let both = interner.union3(TypeId::STRING, TypeId::NULL, TypeId::UNDEFINED);
    assert_eq!(
        ctx.narrow_type_by_equality(both, TypeId::NULL, true, false),
        TypeId::STRING
    );
}

#[test]
fn test_equality_leaves_any_alone() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let one = interner.literal_number(1.0);
    assert_eq!(ctx.narrow_type_by_equality(TypeId::ANY, one, false, true), TypeId::ANY);
}

#[test]
fn test_type_predicate_narrowing() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    assert_eq!(
        ctx.narrowed_type(declared, TypeId::STRING, true, false),
        TypeId::STRING
    );
    assert_eq!(
        ctx.narrowed_type(declared, TypeId::STRING, false, false),
        TypeId::NUMBER
    );
    assert_eq!(
        ctx.narrowed_type(TypeId::UNKNOWN, TypeId::STRING, true, false),
        TypeId::STRING
    );
}

#[test]
fn test_instanceof_narrows_to_derived_class() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let name = interner.intern_string("name");
    let bark = interner.intern_string("bark");
    let animal_def = interner.define("Animal", DefKind::Class, vec![], vec![]);
    let dog_def = interner.define("Dog", DefKind::Class, vec![], vec![]);
    interner.set_base_class(dog_def, animal_def);
    let animal = class_instance(&interner, animal_def, vec![PropertyInfo::new(name, TypeId::STRING)]);
    let dog = class_instance(
        &interner,
        dog_def,
        vec![
            PropertyInfo::new(name, TypeId::STRING),
            PropertyInfo::new(bark, TypeId::STRING),
        ],
    );

    let declared = interner.union2(animal, TypeId::STRING);
    assert_eq!(ctx.narrowed_type(declared, dog, true, true), dog);
    assert_eq!(ctx.narrowed_type(declared, dog, false, true), declared);
    assert_eq!(ctx.narrowed_type(declared, animal, false, true), TypeId::STRING);

    assert!(ctx.is_type_derived_from(dog, animal));
    assert!(!ctx.is_type_derived_from(animal, dog));
}

#[test]
fn test_constructor_narrowing_uses_class_identity() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let name = interner.intern_string("name");
    let a_def = interner.define("A", DefKind::Class, vec![], vec![]);
    let b_def = interner.define("B", DefKind::Class, vec![], vec![]);
    let a = class_instance(&interner, a_def, vec![PropertyInfo::new(name, TypeId::STRING)]);
    let b = class_instance(&interner, b_def, vec![PropertyInfo::new(name, TypeId::STRING)]);

    let declared = interner.union2(a, b);
    assert_eq!(ctx.narrow_type_by_constructor(declared, a), a);
    assert_eq!(ctx.narrow_type_by_constructor(declared, TypeId::OBJECT), declared);
}

#[test]
fn test_assignment_reduction_keeps_assignable_constituents() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let one = interner.fresh_literal_number(1.0);
    assert_eq!(ctx.assignment_reduced_type(declared, one), TypeId::NUMBER);
    assert_eq!(ctx.assignment_reduced_type(declared, declared), declared);
    assert_eq!(ctx.assignment_reduced_type(declared, TypeId::NEVER), TypeId::NEVER);
}

#[test]
fn test_assignment_reduction_preserves_fresh_boolean() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let declared = interner.union2(TypeId::BOOLEAN, TypeId::STRING);
    assert_eq!(
        ctx.assignment_reduced_type(declared, TypeId::FRESH_TRUE),
        TypeId::FRESH_TRUE
    );
}

#[test]
fn test_assignment_reduction_is_memoized() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let cache = NarrowingCache::new();
    let ctx = NarrowingContext::new(&interner, &relation).with_cache(&cache);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let first = ctx.assignment_reduced_type(declared, TypeId::STRING);
    let second = ctx.assignment_reduced_type(declared, TypeId::STRING);
    assert_eq!(first, second);
    assert_eq!(first, TypeId::STRING);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_in_keyword_selects_declaring_member() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.intern_string("a");
    let b = interner.intern_string("b");
    let with_a = interner.object(vec![PropertyInfo::new(a, TypeId::NUMBER)]);
    let with_b = interner.object(vec![PropertyInfo::new(b, TypeId::STRING)]);
    let declared = interner.union2(with_a, with_b);

    assert_eq!(ctx.narrow_type_by_in_keyword(declared, a, true), with_a);
    assert_eq!(ctx.narrow_type_by_in_keyword(declared, a, false), with_b);
}

#[test]
fn test_in_keyword_optional_property_stays_on_both_branches() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.intern_string("a");
    let b = interner.intern_string("b");
    let maybe_a = interner.object(vec![PropertyInfo::opt(a, TypeId::NUMBER)]);
    let with_b = interner.object(vec![PropertyInfo::new(b, TypeId::STRING)]);
    let declared = interner.union2(maybe_a, with_b);

    assert_eq!(ctx.narrow_type_by_in_keyword(declared, a, true), maybe_a);
    assert_eq!(ctx.narrow_type_by_in_keyword(declared, a, false), declared);
}

#[test]
fn test_in_keyword_unknown_property_adds_record() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.intern_string("a");
    let c = interner.intern_string("c");
    let with_a = interner.object(vec![PropertyInfo::new(a, TypeId::NUMBER)]);

    let narrowed = ctx.narrow_type_by_in_keyword(with_a, c, true);
    assert_ne!(narrowed, with_a);
    assert_eq!(ctx.property_type_of(narrowed, c), Some(TypeId::UNKNOWN));
    assert_eq!(ctx.narrow_type_by_in_keyword(with_a, c, false), with_a);
}

#[test]
fn test_discriminant_property_narrowing() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let kind = interner.intern_string("kind");
    let x = interner.intern_string("x");
    let y = interner.intern_string("y");
    let lit_a = interner.literal_string("a");
    let lit_b = interner.literal_string("b");
    let shape_a = interner.object(vec![
        PropertyInfo::new(kind, lit_a),
        PropertyInfo::new(x, TypeId::NUMBER),
    ]);
    let shape_b = interner.object(vec![
        PropertyInfo::new(kind, lit_b),
        PropertyInfo::new(y, TypeId::STRING),
    ]);
    let declared = interner.union2(shape_a, shape_b);

    assert!(ctx.is_discriminant_property(declared, kind));
    assert!(!ctx.is_discriminant_property(declared, x));
    assert_eq!(
        ctx.discriminant_property_type(declared, kind),
        Some(interner.union2(lit_a, lit_b))
    );
    assert_eq!(ctx.discriminant_property_type(declared, x), None);

    let narrowed = ctx.narrow_type_by_discriminant(declared, kind, false, false, |prop| {
        ctx.narrow_type_by_equality(prop, lit_a, false, true)
    });
    assert_eq!(narrowed, shape_a);

    let excluded = ctx.narrow_type_by_discriminant(declared, kind, false, false, |prop| {
        ctx.narrow_type_by_equality(prop, lit_a, false, false)
    });
    assert_eq!(excluded, shape_b);
}

#[test]
fn test_switch_on_discriminant_case_and_default() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let c = interner.literal_string("c");
    let declared = interner.union3(a, b, c);
    let switch_types = [a, b, TypeId::NEVER];

    assert_eq!(ctx.narrow_type_by_switch_on_discriminant(declared, &switch_types, 0, 1), a);
    assert_eq!(
        ctx.narrow_type_by_switch_on_discriminant(declared, &switch_types, 0, 2),
        interner.union2(a, b)
    );
    assert_eq!(ctx.narrow_type_by_switch_on_discriminant(declared, &switch_types, 2, 3), c);
    // Fall-through past every clause.
    assert_eq!(ctx.narrow_type_by_switch_on_discriminant(declared, &switch_types, 3, 3), c);
}

#[test]
fn test_switch_on_unknown_grounds_case_types() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let one = interner.literal_number(1.0);
    assert_eq!(
        ctx.narrow_type_by_switch_on_discriminant(TypeId::UNKNOWN, &[one], 0, 1),
        one
    );
}

#[test]
fn test_exhaustive_literal_switch() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let operand = interner.union2(a, b);
    assert!(ctx.is_exhaustive_literal_switch(operand, &[a, b]));
    assert!(!ctx.is_exhaustive_literal_switch(operand, &[a]));
    assert!(!ctx.is_exhaustive_literal_switch(TypeId::STRING, &[a, b]));
}

#[test]
fn test_switch_on_typeof() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let declared = interner.union3(TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN);
    let witnesses = vec!["string".to_string(), "number".to_string(), String::new()];

    assert_eq!(
        ctx.narrow_type_by_switch_on_typeof(declared, &witnesses, Some(2), 0, 1),
        TypeId::STRING
    );
    assert_eq!(
        ctx.narrow_type_by_switch_on_typeof(declared, &witnesses, Some(2), 2, 3),
        TypeId::BOOLEAN
    );

    let facts = not_equal_facts_from_typeof_switch(2, 3, &witnesses);
    assert!(facts.contains(TypeFacts::TYPEOF_NE_STRING | TypeFacts::TYPEOF_NE_NUMBER));
    assert!(!facts.contains(TypeFacts::TYPEOF_NE_BOOLEAN));
}

#[test]
fn test_exhaustive_typeof_switch() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let operand = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let both = vec!["string".to_string(), "number".to_string()];
    let only_string = vec!["string".to_string()];
    assert!(ctx.is_exhaustive_typeof_switch(operand, &both));
    assert!(!ctx.is_exhaustive_typeof_switch(operand, &only_string));
    assert!(!ctx.is_exhaustive_typeof_switch(TypeId::UNKNOWN, &both));
}

#[test]
fn test_evolving_array_grows_and_finalizes() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let empty = interner.evolving_array(TypeId::NEVER);
    assert_eq!(ctx.finalize_evolving_array(empty), TypeId::AUTO_ARRAY);

    let numbers = ctx.add_evolving_array_element(empty, interner.fresh_literal_number(1.0));
    assert_eq!(numbers, interner.evolving_array(TypeId::NUMBER));
    assert_eq!(
        ctx.add_evolving_array_element(numbers, interner.fresh_literal_number(2.0)),
        numbers
    );

    let mixed = ctx.add_evolving_array_element(numbers, interner.fresh_literal_string("x"));
    assert_eq!(
        ctx.finalize_evolving_array(mixed),
        interner.array(interner.union2(TypeId::NUMBER, TypeId::STRING))
    );
    assert_eq!(ctx.finalize_evolving_array(TypeId::STRING), TypeId::STRING);
}

#[test]
fn test_union_with_subtype_reduction_drops_strict_subtypes() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());

    let a = interner.intern_string("a");
    let b = interner.intern_string("b");
    let small = interner.object(vec![PropertyInfo::new(a, TypeId::NUMBER)]);
    let big = interner.object(vec![
        PropertyInfo::new(a, TypeId::NUMBER),
        PropertyInfo::new(b, TypeId::STRING),
    ]);

    assert_eq!(union_with_subtype_reduction(&interner, &relation, &[big, small]), small);
    assert_eq!(
        union_with_subtype_reduction(&interner, &relation, &[TypeId::STRING, TypeId::NUMBER]),
        interner.union2(TypeId::STRING, TypeId::NUMBER)
    );
    assert_eq!(
        union_with_subtype_reduction(&interner, &relation, &[small, TypeId::UNKNOWN]),
        TypeId::UNKNOWN
    );
}

#[test]
fn test_filter_and_map_preserve_identity_when_unchanged() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let ctx = NarrowingContext::new(&interner, &relation);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    assert_eq!(ctx.filter_type(declared, |_| true), declared);
    assert_eq!(ctx.map_type(declared, |t| t), declared);
    assert_eq!(ctx.remove_type(declared, TypeId::STRING), TypeId::NUMBER);
    assert!(ctx.every_type(declared, |t| t != TypeId::NULL));
}
