use crate::intern::TypeInterner;
use crate::relation::RelationChecker;
use crate::types::*;
use crate::{InferenceContext, InferenceFlags, InferencePriority};
use tyflow_common::options::CheckerOptions;

fn infer_one(interner: &TypeInterner, param: TypeId, source: TypeId, target: TypeId) -> TypeId {
    let relation = RelationChecker::new(interner, CheckerOptions::strict());
    let mut ctx = InferenceContext::new(interner, vec![param], None, InferenceFlags::NONE, &relation);
    ctx.infer(source, target, InferencePriority::NONE, false);
    ctx.resolve(0)
}

#[test]
fn test_infer_from_naked_type_parameter() {
    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    assert_eq!(infer_one(&interner, t, TypeId::STRING, t), TypeId::STRING);
}

#[test]
fn test_infer_from_array_element() {
    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    let source = interner.array(TypeId::NUMBER);
    let target = interner.array(t);
    assert_eq!(infer_one(&interner, t, source, target), TypeId::NUMBER);
}

#[test]
fn test_infer_from_object_property() {
    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    let value = interner.intern_string("value");
    let source = interner.object(vec![PropertyInfo::new(value, TypeId::STRING)]);
    let target = interner.object(vec![PropertyInfo::new(value, t)]);
    assert_eq!(infer_one(&interner, t, source, target), TypeId::STRING);
}

#[test]
fn test_infer_from_parameter_is_contravariant() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");
    let source = interner.function(FunctionShape::new(
        vec![ParamInfo::unnamed(TypeId::STRING)],
        TypeId::VOID,
    ));
    let target = interner.function(FunctionShape::new(vec![ParamInfo::unnamed(t)], TypeId::VOID));

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    ctx.infer(source, target, InferencePriority::NONE, false);
    assert!(ctx.inferences()[0].candidates.is_empty());
    assert_eq!(ctx.inferences()[0].contra_candidates, vec![TypeId::STRING]);
    assert_eq!(ctx.resolve(0), TypeId::STRING);
}

#[test]
fn test_infer_matches_application_before_naked_union_member() {
    // T | Promise<T> from Promise<string> infers T = string, not Promise<string>.
    let interner = TypeInterner::new();
    let p = interner.type_param("P");
    let promise = interner.define("Promise", DefKind::Interface, vec![p], vec![Variance::COVARIANT]);
    let t = interner.type_param("T");

    let source = interner.application(promise, vec![TypeId::STRING]);
    let target = interner.union2(t, interner.application(promise, vec![t]));
    assert_eq!(infer_one(&interner, t, source, target), TypeId::STRING);
}

#[test]
fn test_infer_variadic_tuple_tail() {
    // [1, 2, 3] against [A, ...B] gives A = 1 and B = [2, 3].
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let a = interner.type_param("A");
    let b = interner.type_param("B");
    let one = interner.literal_number(1.0);
    let two = interner.literal_number(2.0);
    let three = interner.literal_number(3.0);

    let source = interner.tuple(vec![
        TupleElement::required(one),
        TupleElement::required(two),
        TupleElement::required(three),
    ]);
    let target = interner.tuple(vec![TupleElement::required(a), TupleElement::variadic(b)]);

    let mut ctx = InferenceContext::new(&interner, vec![a, b], None, InferenceFlags::NONE, &relation);
    ctx.infer(source, target, InferencePriority::NONE, false);
    let expected_tail = interner.tuple(vec![TupleElement::required(two), TupleElement::required(three)]);
    assert_eq!(ctx.resolve_all(), vec![one, expected_tail]);
}

#[test]
fn test_lower_priority_candidates_are_discarded() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::NUMBER, t, InferencePriority::RETURN_TYPE, false);
    ctx.infer(TypeId::STRING, t, InferencePriority::NONE, false);
    ctx.infer(TypeId::BOOLEAN, t, InferencePriority::RETURN_TYPE, false);

    assert_eq!(ctx.inferences()[0].candidates, vec![TypeId::STRING]);
    assert_eq!(ctx.inferences()[0].priority, InferencePriority::NONE);
    assert_eq!(ctx.resolve(0), TypeId::STRING);
}

#[test]
fn test_no_candidates_resolves_to_unknown_or_any() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    assert_eq!(ctx.resolve(0), TypeId::UNKNOWN);

    let mut any_ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::ANY_DEFAULT, &relation);
    assert_eq!(any_ctx.resolve(0), TypeId::ANY);
}

#[test]
fn test_non_inferrable_any_is_not_a_candidate() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::NON_INFERRABLE_ANY, t, InferencePriority::NONE, false);
    assert!(!ctx.inferences()[0].has_candidates());
}

#[test]
fn test_fix_freezes_inference() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::STRING, t, InferencePriority::NONE, false);
    assert_eq!(ctx.fix(0), TypeId::STRING);
    ctx.infer(TypeId::NUMBER, t, InferencePriority::NONE, false);
    assert!(ctx.inferences()[0].is_fixed);
    assert_eq!(ctx.resolve(0), TypeId::STRING);

    let mapper = ctx.type_mapper();
    assert_eq!(mapper.get(t), Some(TypeId::STRING));
}

#[test]
fn test_inference_is_deterministic() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");
    let value = interner.intern_string("value");
    let source = interner.object(vec![PropertyInfo::new(
        value,
        interner.union2(TypeId::STRING, TypeId::NUMBER),
    )]);
    let target = interner.object(vec![PropertyInfo::new(value, interner.array(t))]);
    let source = interner.union2(source, interner.array(TypeId::BOOLEAN));

    let run = || {
        let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
        ctx.infer(source, target, InferencePriority::NONE, false);
        ctx.infer(interner.array(TypeId::BOOLEAN), interner.array(t), InferencePriority::NONE, false);
        ctx.resolve_all()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_infer_template_with_same_texts() {
    // `a${string}b` against `a${T}b` gives T = string.
    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    let source = interner.template_literal(vec!["a", "b"], vec![TypeId::STRING]);
    let target = interner.template_literal(vec!["a", "b"], vec![t]);
    assert_eq!(infer_one(&interner, t, source, target), TypeId::STRING);
}

#[test]
fn test_infer_template_from_differing_texts() {
    // `ab${number}` against `a${T}` gives T = `b${number}`.
    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    let source = interner.template_literal(vec!["ab", ""], vec![TypeId::NUMBER]);
    let target = interner.template_literal(vec!["a", ""], vec![t]);
    let expected = interner.template_literal(vec!["b", ""], vec![TypeId::NUMBER]);
    assert_eq!(infer_one(&interner, t, source, target), expected);
}

#[test]
fn test_infer_template_splits_across_source_placeholders() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let a = interner.type_param("A");
    let b = interner.type_param("B");
    let source = interner.template_literal(
        vec!["<<", ">.<", "-", ">>"],
        vec![TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER],
    );
    let target = interner.template_literal(vec!["<", ".", ">"], vec![a, b]);

    let mut ctx = InferenceContext::new(&interner, vec![a, b], None, InferenceFlags::NONE, &relation);
    ctx.infer(source, target, InferencePriority::NONE, false);
    let first = interner.template_literal(vec!["<", ">"], vec![TypeId::STRING]);
    let second = interner.template_literal(vec!["<", "-", ">"], vec![TypeId::NUMBER, TypeId::NUMBER]);
    assert_eq!(ctx.resolve_all(), vec![first, second]);
}

#[test]
fn test_infer_through_substitution_inside_indexed_access() {
    // A substitution standing for `A` in `A[K]` still reaches `A[K]`.
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let a = interner.type_param("A");
    let k = interner.type_param("K");
    let access = interner.index_access(a, k);
    let substituted = interner.substitution(a, TypeId::EMPTY_OBJECT);
    let target = interner.index_access(substituted, k);

    let mut ctx = InferenceContext::new(&interner, vec![access], None, InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::STRING, target, InferencePriority::NONE, false);
    assert_eq!(ctx.inferences()[0].candidates, vec![TypeId::STRING]);
}

#[test]
fn test_infer_distributes_generic_index_over_intersection() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let a = interner.type_param("A");
    let k = interner.type_param("K");
    let x = interner.intern_string("x");
    let extra = interner.object(vec![PropertyInfo::new(x, TypeId::NUMBER)]);
    let access = interner.index_access(a, k);
    let target = interner.index_access(interner.intersection2(a, extra), k);

    let mut ctx = InferenceContext::new(&interner, vec![access], None, InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::STRING, target, InferencePriority::NONE, false);
    assert_eq!(ctx.inferences()[0].candidates, vec![TypeId::STRING]);
}

#[test]
fn test_infer_adjacent_variadics_after_fixed_prefix() {
    // [string, number, boolean, null] against [X, ...T, ...U] with T of
    // implied arity 2.
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let x = interner.type_param("X");
    let t = interner.type_param("T");
    let u = interner.type_param("U");
    let source = interner.tuple(vec![
        TupleElement::required(TypeId::STRING),
        TupleElement::required(TypeId::NUMBER),
        TupleElement::required(TypeId::BOOLEAN),
        TupleElement::required(TypeId::NULL),
    ]);
    let target = interner.tuple(vec![
        TupleElement::required(x),
        TupleElement::variadic(t),
        TupleElement::variadic(u),
    ]);

    let mut ctx = InferenceContext::new(&interner, vec![x, t, u], None, InferenceFlags::NONE, &relation);
    ctx.set_implied_arity(1, 2);
    ctx.infer(source, target, InferencePriority::NONE, false);
    let leading = interner.tuple(vec![TupleElement::required(TypeId::NUMBER)]);
    let trailing = interner.tuple(vec![TupleElement::required(TypeId::NULL)]);
    assert_eq!(ctx.resolve_all(), vec![TypeId::STRING, leading, trailing]);
}

#[test]
fn test_any_default_without_candidates_clamps_to_constraint() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param_with("T", Some(TypeId::STRING), None);

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::ANY_DEFAULT, &relation);
    assert_eq!(ctx.resolve(0), TypeId::STRING);

    let signature = FunctionShape::new(vec![ParamInfo::unnamed(t)], TypeId::VOID);
    let mut ctx =
        InferenceContext::new(&interner, vec![t], Some(signature), InferenceFlags::ANY_DEFAULT, &relation);
    assert_eq!(ctx.resolve(0), TypeId::STRING);
}

#[test]
fn test_cloned_context_resolves_without_fixing_original() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");
    let u = interner.type_param("U");
    let signature = FunctionShape::new(Vec::new(), TypeId::VOID);
    let mut ctx = InferenceContext::new(&interner, vec![t, u], Some(signature), InferenceFlags::NONE, &relation);
    ctx.infer(TypeId::STRING, t, InferencePriority::NONE, false);

    let mut outer = ctx.clone_with_flags(InferenceFlags::NO_DEFAULT);
    assert!(outer.flags().contains(InferenceFlags::NO_DEFAULT));
    assert_eq!(outer.resolve(0), TypeId::STRING);
    assert_eq!(outer.resolve(1), TypeId::SILENT_NEVER);

    assert!(ctx.inferences().iter().all(|info| info.inferred_type.is_none()));
    assert_eq!(ctx.resolve(1), TypeId::UNKNOWN);

    let inferred = ctx.clone_inferred_part().expect("T has a candidate");
    assert_eq!(inferred.type_params(), vec![t]);

    let empty = InferenceContext::new(&interner, vec![u], None, InferenceFlags::NONE, &relation);
    assert!(empty.clone_inferred_part().is_none());
}

#[test]
fn test_merge_inferences_fills_only_empty_parameters() {
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");
    let u = interner.type_param("U");

    let mut target = InferenceContext::new(&interner, vec![t, u], None, InferenceFlags::NONE, &relation);
    target.infer(TypeId::STRING, t, InferencePriority::NONE, false);
    let mut source = InferenceContext::new(&interner, vec![t, u], None, InferenceFlags::NONE, &relation);
    source.infer(TypeId::NUMBER, t, InferencePriority::NONE, false);
    source.infer(TypeId::BOOLEAN, u, InferencePriority::NONE, false);

    target.merge_inferences(source.inferences());
    assert_eq!(target.inferences()[0].candidates, vec![TypeId::STRING]);
    assert_eq!(target.inferences()[1].candidates, vec![TypeId::BOOLEAN]);
    assert_eq!(target.resolve(1), TypeId::BOOLEAN);
}

#[test]
fn test_intra_expression_site_feeds_later_elements() {
    // foo<T>(arg: [(n: number) => T, (x: T) => void]); foo([_ => 0, n => n.toFixed()])
    // The first element's return type is inferred before the second is checked.
    let interner = TypeInterner::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let t = interner.type_param("T");
    let producer = interner.function(FunctionShape::new(
        vec![ParamInfo::unnamed(TypeId::NUMBER)],
        TypeId::NUMBER,
    ));
    let contextual = interner.function(FunctionShape::new(vec![ParamInfo::unnamed(TypeId::NUMBER)], t));

    let mut ctx = InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
    ctx.add_intra_expression_inference_site(producer, contextual);
    assert_eq!(ctx.intra_expression_sites().len(), 1);
    assert!(!ctx.inferences()[0].has_candidates());

    ctx.infer_from_intra_expression_sites();
    assert!(ctx.intra_expression_sites().is_empty());
    assert_eq!(ctx.resolve(0), TypeId::NUMBER);
}
