use tyflow_common::CheckerOptions;

#[test]
fn test_options_default_is_loose() {
    let options = CheckerOptions::default();
    assert!(!options.strict_null_checks);
    assert!(!options.strict_function_types);
}

#[test]
fn test_options_from_json_camel_case() {
    let options = CheckerOptions::from_json(r#"{ "strictNullChecks": true }"#)
        .expect("valid options should parse");
    assert!(options.strict_null_checks);
    assert!(!options.strict_function_types);
}

#[test]
fn test_options_strict_implies_family() {
    let options =
        CheckerOptions::from_json(r#"{ "strict": true }"#).expect("valid options should parse");
    assert!(options.strict_null_checks);
    assert!(options.strict_function_types);
    assert!(options.no_implicit_any);
    assert!(!options.exact_optional_property_types);
    assert_eq!(options, CheckerOptions::strict());
}

#[test]
fn test_options_reject_malformed_json() {
    assert!(CheckerOptions::from_json(r#"{ "strict": "yes" }"#).is_err());
    assert!(CheckerOptions::from_json("not json").is_err());
}
