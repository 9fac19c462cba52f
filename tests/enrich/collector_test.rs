#[cfg(test)]
mod tests {
    use joinery::enrich::collect_keys;
    use joinery::model::{Entity, KeyValue};
    use serde_json::{json, Value};

    #[test]
    fn test_distinct_keys_bound_fan_out() {
        let records: Vec<Entity> = ["A", "A", "B", "A", "C", "B"]
            .iter()
            .map(|k| Entity::new().with("project_asset_id", *k))
            .collect();

        let keys = collect_keys(&records, "project_asset_id");
        assert_eq!(keys.len(), 3);
        assert!(keys.len() <= records.len());
    }

    #[test]
    fn test_null_and_missing_are_excluded() {
        let records = vec![
            Entity::new().with("fk", Value::Null),
            Entity::new().with("other", "x"),
            Entity::new().with("fk", ""),
        ];

        assert!(collect_keys(&records, "fk").is_empty());
    }

    #[test]
    fn test_integer_and_text_keys_are_distinct() {
        let records = vec![
            Entity::new().with("fk", 7),
            Entity::new().with("fk", "7"),
            Entity::new().with("fk", 7),
        ];

        let keys = collect_keys(&records, "fk");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&KeyValue::Integer(7)));
        assert!(keys.contains(&KeyValue::from("7")));
    }

    #[test]
    fn test_non_key_values_are_excluded() {
        let records = vec![
            Entity::new().with("fk", json!(1.5)),
            Entity::new().with("fk", true),
            Entity::new().with("fk", json!({"id": 1})),
        ];

        assert!(collect_keys(&records, "fk").is_empty());
    }

    #[test]
    fn test_order_independent() {
        let forward = vec![
            Entity::new().with("fk", "B"),
            Entity::new().with("fk", "A"),
        ];
        let reverse: Vec<Entity> = forward.iter().rev().cloned().collect();

        assert_eq!(collect_keys(&forward, "fk"), collect_keys(&reverse, "fk"));
    }
}
