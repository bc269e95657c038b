use crate::intern::{TypeInterner, format_number};
use crate::types::*;

#[test]
fn test_structural_identity() {
    let interner = TypeInterner::new();
    let name = interner.intern_string("name");
    let a = interner.object(vec![PropertyInfo::new(name, TypeId::STRING)]);
    let b = interner.object(vec![PropertyInfo::new(name, TypeId::STRING)]);
    assert_eq!(a, b);
    assert_eq!(interner.array(a), interner.array(b));
    assert_ne!(a, interner.object(vec![PropertyInfo::opt(name, TypeId::STRING)]));
}

#[test]
fn test_object_properties_sorted_on_construction() {
    let interner = TypeInterner::new();
    let x = interner.intern_string("x");
    let y = interner.intern_string("y");
    let forward = interner.object(vec![
        PropertyInfo::new(x, TypeId::NUMBER),
        PropertyInfo::new(y, TypeId::STRING),
    ]);
    let backward = interner.object(vec![
        PropertyInfo::new(y, TypeId::STRING),
        PropertyInfo::new(x, TypeId::NUMBER),
    ]);
    assert_eq!(forward, backward);
}

#[test]
fn test_union_is_order_independent_and_flattened() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let c = interner.literal_string("c");
    assert_eq!(interner.union2(a, b), interner.union2(b, a));
    assert_eq!(
        interner.union2(interner.union2(a, b), c),
        interner.union3(c, b, a)
    );
    assert_eq!(interner.union(vec![a, a]), a);
    assert_eq!(interner.union(vec![]), TypeId::NEVER);
}

#[test]
fn test_union_absorption_rules() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let one = interner.literal_number(1.0);

    assert_eq!(interner.union2(a, TypeId::STRING), TypeId::STRING);
    assert_eq!(interner.union2(one, TypeId::NUMBER), TypeId::NUMBER);
    assert_eq!(interner.union2(TypeId::NEVER, a), a);
    assert_eq!(interner.union2(TypeId::ANY, a), TypeId::ANY);
    assert_eq!(interner.union2(TypeId::UNKNOWN, a), TypeId::UNKNOWN);
    assert_eq!(interner.union2(TypeId::UNDEFINED, TypeId::VOID), TypeId::VOID);
    assert_eq!(interner.union2(interner.fresh_literal_string("a"), a), a);
}

#[test]
fn test_boolean_is_false_or_true() {
    let interner = TypeInterner::new();
    assert_eq!(
        interner.union2(TypeId::BOOLEAN_FALSE, TypeId::BOOLEAN_TRUE),
        TypeId::BOOLEAN
    );
    assert_eq!(
        interner.union2(TypeId::BOOLEAN, TypeId::BOOLEAN_TRUE),
        TypeId::BOOLEAN
    );
    assert_eq!(interner.literal_boolean(true), TypeId::BOOLEAN_TRUE);
}

#[test]
fn test_fresh_and_regular_literals() {
    let interner = TypeInterner::new();
    let fresh = interner.fresh_literal_number(7.0);
    let regular = interner.literal_number(7.0);
    assert_ne!(fresh, regular);
    assert_eq!(interner.regular_type_of(fresh), regular);
    assert_eq!(interner.fresh_type_of(regular), fresh);
    assert_eq!(interner.fresh_type_of(TypeId::BOOLEAN_TRUE), TypeId::FRESH_TRUE);
    assert_eq!(interner.regular_type_of(TypeId::STRING), TypeId::STRING);
}

#[test]
fn test_negative_zero_literal_is_zero() {
    let interner = TypeInterner::new();
    assert_eq!(interner.literal_number(-0.0), interner.literal_number(0.0));
}

#[test]
fn test_intersection_normalization() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");

    assert_eq!(interner.intersection2(TypeId::STRING, TypeId::NEVER), TypeId::NEVER);
    assert_eq!(interner.intersection2(TypeId::STRING, TypeId::UNKNOWN), TypeId::STRING);
    assert_eq!(interner.intersection2(TypeId::STRING, TypeId::NUMBER), TypeId::NEVER);
    assert_eq!(interner.intersection2(a, TypeId::STRING), a);
    assert_eq!(interner.intersection2(TypeId::NULL, TypeId::OBJECT), TypeId::NEVER);
    assert_eq!(interner.intersection(vec![]), TypeId::UNKNOWN);
}

#[test]
fn test_intersection_distributes_over_union() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let one = interner.literal_number(1.0);
    let either = interner.union2(a, one);
    assert_eq!(interner.intersection2(either, TypeId::STRING), a);
}

#[test]
fn test_intersection_merges_plain_objects() {
    let interner = TypeInterner::new();
    let x = interner.intern_string("x");
    let y = interner.intern_string("y");
    let left = interner.object(vec![PropertyInfo::new(x, TypeId::NUMBER)]);
    let right = interner.object(vec![PropertyInfo::new(y, TypeId::STRING)]);
    let both = interner.object(vec![
        PropertyInfo::new(x, TypeId::NUMBER),
        PropertyInfo::new(y, TypeId::STRING),
    ]);
    assert_eq!(interner.intersection2(left, right), both);
}

#[test]
fn test_tuple_spreads_concrete_variadic_members() {
    let interner = TypeInterner::new();
    let inner = interner.tuple(vec![TupleElement::required(TypeId::NUMBER)]);
    let spread = interner.tuple(vec![
        TupleElement::required(TypeId::STRING),
        TupleElement::variadic(inner),
    ]);
    let flat = interner.tuple(vec![
        TupleElement::required(TypeId::STRING),
        TupleElement::required(TypeId::NUMBER),
    ]);
    assert_eq!(spread, flat);

    let with_array = interner.tuple(vec![TupleElement::variadic(interner.array(TypeId::BOOLEAN))]);
    assert_eq!(with_array, interner.tuple(vec![TupleElement::rest(TypeId::BOOLEAN)]));
}

#[test]
fn test_template_literal_folds_literal_placeholders() {
    let interner = TypeInterner::new();
    let b = interner.literal_string("b");
    assert_eq!(
        interner.template_literal(vec!["a", "c"], vec![b]),
        interner.literal_string("abc")
    );
    assert_eq!(interner.template_literal(vec!["", ""], vec![TypeId::STRING]), TypeId::STRING);
    assert_eq!(interner.template_literal(vec!["a", ""], vec![TypeId::NEVER]), TypeId::NEVER);
}

#[test]
fn test_string_intrinsic_applies_to_literals() {
    let interner = TypeInterner::new();
    let text = interner.literal_string("hello");
    assert_eq!(
        interner.string_intrinsic(StringIntrinsicKind::Capitalize, text),
        interner.literal_string("Hello")
    );
    assert_eq!(
        interner.string_intrinsic(StringIntrinsicKind::Uppercase, TypeId::ANY),
        TypeId::ANY
    );
}

#[test]
fn test_type_params_are_distinct() {
    let interner = TypeInterner::new();
    let t1 = interner.type_param("T");
    let t2 = interner.type_param("T");
    assert_ne!(t1, t2);

    interner.set_type_param_constraint(t1, TypeId::STRING);
    assert_eq!(interner.type_param_constraint(t1), Some(TypeId::STRING));
    assert_eq!(interner.type_param_constraint(t2), None);
    assert_eq!(interner.type_param_constraint(TypeId::STRING), None);
}

#[test]
fn test_class_derivation_chain() {
    let interner = TypeInterner::new();
    let base = interner.define("Base", DefKind::Class, vec![], vec![]);
    let mid = interner.define("Mid", DefKind::Class, vec![], vec![]);
    let leaf = interner.define("Leaf", DefKind::Class, vec![], vec![]);
    interner.set_base_class(mid, base);
    interner.set_base_class(leaf, mid);

    assert!(interner.def_derives_from(leaf, base));
    assert!(interner.def_derives_from(leaf, leaf));
    assert!(!interner.def_derives_from(base, leaf));
}

#[test]
fn test_literal_text_and_number_format() {
    let interner = TypeInterner::new();
    assert_eq!(interner.literal_text(interner.literal_number(1.0)).as_deref(), Some("1"));
    assert_eq!(interner.literal_text(TypeId::NULL).as_deref(), Some("null"));
    assert_eq!(interner.literal_text(TypeId::STRING), None);
    assert_eq!(format_number(1.5), "1.5");
    assert_eq!(format_number(f64::NAN), "NaN");
    assert_eq!(format_number(-3.0), "-3");
}
