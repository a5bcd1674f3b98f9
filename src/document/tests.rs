//! Document Module Tests
//!
//! Validates the filter grammar, its matching semantics, and patch application.

#[cfg(test)]
mod tests {
    use crate::document::filter::{Condition, Filter, Patch};
    use crate::document::types::{into_document, record_id, scalar_string, truthy};
    use crate::error::ClusterError;
    use serde_json::{Value, json};

    // ============================================================
    // FILTER PARSING
    // ============================================================

    #[test]
    fn test_parse_equality_filter() {
        let filter = Filter::parse(r#"{"id": "u1", "region": "Beijing"}"#).unwrap();

        assert_eq!(filter.clauses().len(), 2);
        assert!(filter.constrains("id"));
        assert!(filter.constrains("region"));
    }

    #[test]
    fn test_parse_empty_filter_matches_everything() {
        let filter = Filter::parse("{}").unwrap();

        assert!(filter.is_empty());
        assert!(filter.matches(&into_document(json!({"anything": 1}))));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        for text in ["[1, 2]", "\"id\"", "42", "null"] {
            let err = Filter::parse(text).unwrap_err();
            assert!(matches!(err, ClusterError::MalformedFilter(_)), "{text}");
        }
    }

    #[test]
    fn test_parse_rejects_code_like_text() {
        let err = Filter::parse("__import__('os').system('ls')").unwrap_err();
        assert!(matches!(err, ClusterError::MalformedFilter(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let err = Filter::parse(r#"{"name": {"$where": "this.x == 1"}}"#).unwrap_err();
        assert!(err.to_string().contains("$where"));
    }

    #[test]
    fn test_parse_rejects_mixed_operator_object() {
        let err = Filter::parse(r#"{"ts": {"$gte": 1, "plain": 2}}"#).unwrap_err();
        assert!(matches!(err, ClusterError::MalformedFilter(_)));
    }

    #[test]
    fn test_parse_rejects_top_level_operator() {
        let err = Filter::parse(r#"{"$or": [{"a": 1}]}"#).unwrap_err();
        assert!(matches!(err, ClusterError::MalformedFilter(_)));
    }

    #[test]
    fn test_in_requires_array() {
        let err = Filter::parse(r#"{"aid": {"$in": "1"}}"#).unwrap_err();
        assert!(err.to_string().contains("expects an array"));
    }

    // ============================================================
    // FILTER MATCHING
    // ============================================================

    #[test]
    fn test_comparison_operators() {
        let doc = into_document(json!({"timestamp": 1506332297, "grade": "grade2"}));

        assert!(Filter::parse(r#"{"timestamp": {"$gte": 1506332297}}"#).unwrap().matches(&doc));
        assert!(!Filter::parse(r#"{"timestamp": {"$gt": 1506332297}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"timestamp": {"$lt": 2000000000, "$gt": 0}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"grade": {"$lte": "grade3"}}"#).unwrap().matches(&doc));
    }

    #[test]
    fn test_comparison_with_mismatched_types_never_matches() {
        let doc = into_document(json!({"timestamp": "1506332297"}));

        assert!(!Filter::parse(r#"{"timestamp": {"$gte": 0}}"#).unwrap().matches(&doc));
        assert!(!Filter::parse(r#"{"missing": {"$lt": 10}}"#).unwrap().matches(&doc));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        let doc = into_document(json!({"readNum": 3}));

        assert!(Filter::eq("readNum", json!(3.0)).matches(&doc));
    }

    #[test]
    fn test_in_and_nin() {
        let doc = into_document(json!({"aid": "7"}));

        assert!(Filter::is_in("aid", vec![json!("1"), json!("7")]).matches(&doc));
        assert!(!Filter::parse(r#"{"aid": {"$nin": ["7"]}}"#).unwrap().matches(&doc));
    }

    #[test]
    fn test_scalar_matches_array_element() {
        let doc = into_document(json!({"readUidList": ["1", "2", "3"]}));

        assert!(Filter::eq("readUidList", "2").matches(&doc));
        assert!(!Filter::eq("readUidList", "9").matches(&doc));
    }

    #[test]
    fn test_null_equality_matches_missing_field() {
        let doc = into_document(json!({"id": "a1"}));

        assert!(Filter::eq("video", Value::Null).matches(&doc));
        assert!(Filter::all().and("video", Condition::Ne(json!("x.flv"))).matches(&doc));
    }

    #[test]
    fn test_filter_survives_wire_encoding() {
        let filter = Filter::parse(r#"{"region": "Beijing", "ts": {"$gte": 5, "$lt": 9}}"#).unwrap();

        let wire = serde_json::to_string(&filter).unwrap();
        let decoded: Filter = serde_json::from_str(&wire).unwrap();

        let inside = into_document(json!({"region": "Beijing", "ts": 6}));
        let outside = into_document(json!({"region": "Beijing", "ts": 9}));
        assert!(decoded.matches(&inside));
        assert!(!decoded.matches(&outside));
    }

    // ============================================================
    // PATCHES
    // ============================================================

    #[test]
    fn test_patch_sets_fields_without_replacing() {
        let mut doc = into_document(json!({"id": "u1", "grade": "grade1", "name": "user1"}));
        let patch = Patch::parse(r#"{"grade": "grade2"}"#).unwrap();

        assert!(patch.apply(&mut doc));
        assert_eq!(doc["grade"], json!("grade2"));
        assert_eq!(doc["name"], json!("user1"));
    }

    #[test]
    fn test_patch_reports_no_change_for_identical_values() {
        let mut doc = into_document(json!({"grade": "grade2"}));
        let patch = Patch::parse(r#"{"grade": "grade2"}"#).unwrap();

        assert!(!patch.apply(&mut doc));
    }

    #[test]
    fn test_patch_rejects_operators_and_empty() {
        assert!(Patch::parse(r#"{"$set": {"grade": "grade2"}}"#).is_err());
        assert!(Patch::parse("{}").is_err());
    }

    // ============================================================
    // FIELD HELPERS
    // ============================================================

    #[test]
    fn test_record_id_prefers_domain_id() {
        let doc = into_document(json!({"id": "r9", "uid": "3", "aid": "4"}));
        assert_eq!(record_id(&doc), "r9");

        let doc = into_document(json!({"aid": "4"}));
        assert_eq!(record_id(&doc), "4");
    }

    #[test]
    fn test_scalar_string_renders_numbers() {
        let doc = into_document(json!({"uid": 5, "empty": ""}));

        assert_eq!(scalar_string(&doc, "uid").as_deref(), Some("5"));
        assert_eq!(scalar_string(&doc, "empty"), None);
    }

    #[test]
    fn test_truthy_encodings() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!("1"))));
        assert!(truthy(Some(&json!(1))));
        assert!(!truthy(Some(&json!("0"))));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(None));
    }
}
