use a2ui_validate::validate;
use a2ui_validate::ReferenceMap;
use a2ui_validate::ValidationCategory;
use a2ui_validate::ValidationError;
use a2ui_validate::Validator;
use serde_json::json;
use serde_json::Value;

fn schema() -> Value {
    serde_json::from_str(include_str!("fixtures/catalog.json")).unwrap()
}

fn column(id: &str, children: &[&str]) -> Value {
    json!({"id": id, "componentProperties": {"Column": {"children": {"explicitList": children}}}})
}

fn text(id: &str) -> Value {
    json!({"id": id, "componentProperties": {"Text": {"text": {"literalString": id}}}})
}

fn update(components: Vec<Value>) -> Value {
    json!({"surfaceId": "main", "components": components})
}

mod scenario {
    use super::*;

    #[test]
    fn root_with_one_child_is_valid() {
        let payload = update(vec![column("root", &["c1"]), text("c1")]);
        assert_eq!(validate(&payload, &schema()), Ok(()));
    }

    #[test]
    fn removing_the_child_dangles() {
        let payload = update(vec![column("root", &["c1"])]);
        assert_eq!(
            validate(&payload, &schema()),
            Err(ValidationError::DanglingReference {
                component: "root".to_string(),
                missing: "c1".to_string(),
                field: "children".to_string(),
            })
        );
    }

    #[test]
    fn child_pointing_back_at_root_is_circular() {
        let payload = update(vec![column("root", &["c1"]), column("c1", &["root"])]);
        assert!(matches!(
            validate(&payload, &schema()),
            Err(ValidationError::CircularReference { .. })
        ));
    }
}

mod properties {
    use super::*;

    #[test]
    fn duplicate_ids_anywhere() {
        let payload = update(vec![
            column("root", &["a", "b"]),
            text("a"),
            text("b"),
            text("b"),
        ]);
        insta::assert_snapshot!(
            validate(&payload, &schema()).unwrap_err().to_string(),
            @"Duplicate component ID found: 'b'"
        );
    }

    #[test]
    fn missing_root_before_references() {
        let payload = update(vec![column("main", &["nowhere"])]);
        assert_eq!(validate(&payload, &schema()), Err(ValidationError::MissingRoot));
    }

    #[test]
    fn self_reference_is_distinct_from_cycle() {
        let payload = update(vec![column("root", &["root"])]);
        assert_eq!(
            validate(&payload, &schema()),
            Err(ValidationError::SelfReference {
                component: "root".to_string(),
                field: "children".to_string(),
            })
        );
    }

    #[test]
    fn unreachable_components_reported_together() {
        let payload = update(vec![column("root", &[]), text("b"), text("a")]);
        assert_eq!(
            validate(&payload, &schema()),
            Err(ValidationError::OrphanComponent {
                orphans: vec!["a".to_string(), "b".to_string()],
            })
        );
    }

    #[test]
    fn bad_path_in_binding() {
        let payload = update(vec![
            json!({"id": "root", "componentProperties": {"Text": {"text": {"path": "/user/~2"}}}}),
        ]);
        assert_eq!(
            validate(&payload, &schema()),
            Err(ValidationError::InvalidPathSyntax {
                path: "/user/~2".to_string()
            })
        );
    }
}

mod payloads {
    use super::*;

    #[test]
    fn each_message_in_a_list_is_checked() {
        let payload = json!([
            update(vec![column("root", &["c1"]), text("c1")]),
            update(vec![text("lonely")]),
        ]);
        let validator = Validator::structural(ReferenceMap::from_schema(&schema()));
        assert_eq!(validator.validate(&payload), Err(ValidationError::MissingRoot));
    }

    #[test]
    fn messages_without_components_only_get_the_depth_pass() {
        let validator = Validator::new(&schema()).unwrap();
        let deep = (0..60).fold(json!(1), |inner, _| json!([inner]));
        let err = validator
            .validate(&json!({"surfaceId": "main", "extra": deep}))
            .unwrap_err();
        assert_eq!(err.category(), ValidationCategory::Recursion);
    }

    #[test]
    fn schema_violation_is_reported_first() {
        let payload = update(vec![json!({"id": "root"})]);
        let err = validate(&payload, &schema()).unwrap_err();
        assert_eq!(err.diagnostic_code(), "S100");
    }
}
