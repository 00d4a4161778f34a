use emat_scope::{Domain, ScalarValue, Scope, ScopeFormatError};
use proptest::prelude::*;

fn float_scope(min: f64, max: f64, default: f64) -> String {
    format!(
        "scope:\n  name: P\n  desc: property\ninputs:\n  x:\n    ptype: uncertainty\n    dtype: float\n    default: {default:?}\n    min: {min:?}\n    max: {max:?}\noutputs:\n  y:\n    kind: info\n"
    )
}

fn int_scope(min: i64, max: i64, default: i64) -> String {
    format!(
        "scope:\n  name: P\n  desc: property\ninputs:\n  n:\n    ptype: policy lever\n    dtype: int\n    default: {default}\n    min: {min}\n    max: {max}\noutputs:\n  y:\n    kind: info\n"
    )
}

fn cat_scope(values: &[String], default: &str) -> String {
    let list = values.join(", ");
    format!(
        "scope:\n  name: P\n  desc: property\ninputs:\n  c:\n    ptype: policy lever\n    dtype: cat\n    default: {default}\n    values: [{list}]\noutputs:\n  y:\n    kind: info\n"
    )
}

fn category() -> impl Strategy<Value = String> {
    // Prefixed so no generated value reads as a YAML bool or null.
    proptest::string::string_regex("v_[a-z]{1,8}").unwrap()
}

fn categories() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(category(), 1..6).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn float_default_within_bounds_is_accepted(
        min in -1000.0f64..1000.0,
        width in 0.0f64..100.0,
        frac in 0.0f64..=1.0,
    ) {
        let max = min + width;
        let default = min + frac * width;
        let scope = Scope::from_yaml_str(&float_scope(min, max, default)).expect("parse");
        let x = scope.parameter("x").expect("x");
        prop_assert_eq!(&x.domain, &Domain::Float { min: Some(min), max: Some(max) });
        prop_assert_eq!(x.default.clone(), Some(ScalarValue::Float(default)));
    }

    #[test]
    fn float_default_above_max_is_rejected(
        min in -1000.0f64..1000.0,
        width in 0.0f64..100.0,
        excess in 1.0f64..100.0,
    ) {
        let max = min + width;
        let err = Scope::from_yaml_str(&float_scope(min, max, max + excess)).expect_err("should fail");
        let is_out_of_range = matches!(err, ScopeFormatError::OutOfRange { .. });
        prop_assert!(is_out_of_range, "err={}", err);
    }

    #[test]
    fn int_default_must_lie_in_bounds(
        min in -10_000i64..10_000,
        width in 0i64..500,
        offset in -600i64..600,
    ) {
        let max = min + width;
        let default = min + offset;
        let result = Scope::from_yaml_str(&int_scope(min, max, default));
        let in_range = default >= min && default <= max;
        prop_assert_eq!(result.is_ok(), in_range);
    }

    #[test]
    fn categorical_default_must_be_a_listed_value(
        values in categories(),
        pick in any::<prop::sample::Index>(),
        outsider in category(),
    ) {
        let default = values[pick.index(values.len())].clone();
        prop_assert!(Scope::from_yaml_str(&cat_scope(&values, &default)).is_ok());

        let listed = values.contains(&outsider);
        let result = Scope::from_yaml_str(&cat_scope(&values, &outsider));
        prop_assert_eq!(result.is_ok(), listed);
    }
}
