#[cfg(test)]
mod tests {
    use joinery::query::{Filter, FilterOp, Pagination, QueryBuilder, QueryError, SortDir};
    use joinery::schema::{Capability, Catalog, Relation, TableSchema};

    fn catalog() -> Catalog {
        Catalog::dashboard().unwrap()
    }

    #[test]
    fn test_full_query_string() {
        let catalog = catalog();
        let query = QueryBuilder::new(&catalog, "SmartList")
            .filter_eq("priority", "High")
            .filter_contains("title", "pump")
            .select(["title", "status", "project_asset_id"])
            .expand_select("ProjectAssets", ["sit_completion", "project_id"])
            .order_by("due_date", SortDir::Desc)
            .page(Pagination::new(25, 50))
            .build()
            .unwrap();

        insta::assert_snapshot!(
            query.to_query_string(),
            @"SmartList?$filter=priority eq 'High' and contains(title,'pump')&$select=title,status,project_asset_id&$expand=ProjectAssets($select=sit_completion,project_id)&$orderby=due_date desc&$top=25&$skip=50"
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let catalog = catalog();
        let query = QueryBuilder::new(&catalog, "Projects")
            .filter_eq("name", "O'Brien Yard")
            .build()
            .unwrap();

        insta::assert_snapshot!(
            query.to_query_string(),
            @"Projects?$filter=name eq 'O''Brien Yard'&$top=50&$skip=0"
        );
    }

    #[test]
    fn test_numeric_literal_unquoted() {
        let catalog = catalog();
        let query = QueryBuilder::new(&catalog, "Issues")
            .filter_eq("is_closed", 0)
            .top(5)
            .build()
            .unwrap();

        assert_eq!(
            query.to_query_string(),
            "Issues?$filter=is_closed eq 0&$top=5&$skip=0"
        );
    }

    #[test]
    fn test_rejects_primary_key_filter() {
        let catalog = catalog();
        let result = QueryBuilder::new(&catalog, "ProjectAssets")
            .filter_eq("id", "PA1")
            .build();

        assert_eq!(
            result.unwrap_err(),
            QueryError::UnfilterableField {
                table: "ProjectAssets".into(),
                field: "id".into(),
            }
        );
    }

    #[test]
    fn test_lookup_key_is_filterable() {
        let catalog = catalog();
        let query = QueryBuilder::new(&catalog, "ProjectAssets")
            .filter_eq("record_id", "PA1")
            .build()
            .unwrap();

        assert_eq!(query.filters().len(), 1);
        assert_eq!(query.filters()[0].op, FilterOp::Eq);
    }

    #[test]
    fn test_rejects_client_join_expansion() {
        let catalog = catalog();
        let result = QueryBuilder::new(&catalog, "SmartList")
            .expand("Projects")
            .build();

        assert!(matches!(
            result,
            Err(QueryError::ClientJoinExpansion { ref relation, .. }) if relation == "Projects"
        ));
    }

    #[test]
    fn test_rejects_second_expansion() {
        let catalog = catalog();
        let result = QueryBuilder::new(&catalog, "ProjectAssets")
            .expand("Projects")
            .expand("Assets")
            .build();

        assert!(matches!(result, Err(QueryError::MultipleExpansions { .. })));
    }

    #[test]
    fn test_rejects_unknown_relation() {
        let catalog = catalog();
        let result = QueryBuilder::new(&catalog, "Projects")
            .expand("SmartList")
            .build();

        assert!(matches!(result, Err(QueryError::UnknownRelation { .. })));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let catalog = catalog();

        let bad_select = QueryBuilder::new(&catalog, "Assets").select(["colour"]).build();
        assert!(matches!(bad_select, Err(QueryError::UnknownField { .. })));

        let bad_expand = QueryBuilder::new(&catalog, "SmartList")
            .expand_select("ProjectAssets", ["nope"])
            .build();
        assert!(matches!(
            bad_expand,
            Err(QueryError::UnknownField { ref table, .. }) if table == "ProjectAssets"
        ));

        let bad_sort = QueryBuilder::new(&catalog, "Assets")
            .order_by("colour", SortDir::Asc)
            .build();
        assert!(matches!(bad_sort, Err(QueryError::UnknownField { .. })));
    }

    #[test]
    fn test_rejects_empty_projection() {
        let catalog = catalog();
        let no_fields: [&str; 0] = [];

        let empty_select = QueryBuilder::new(&catalog, "Assets").select(no_fields).build();
        assert_eq!(
            empty_select.unwrap_err(),
            QueryError::EmptyProjection { table: "Assets".into() }
        );

        let empty_expand = QueryBuilder::new(&catalog, "SmartList")
            .expand_select("ProjectAssets", no_fields)
            .build();
        assert_eq!(
            empty_expand.unwrap_err(),
            QueryError::EmptyProjection { table: "ProjectAssets".into() }
        );
    }

    #[test]
    fn test_rejects_bad_operands() {
        let catalog = catalog();

        let set_value = QueryBuilder::new(&catalog, "SmartList")
            .filter(Filter::eq("status", serde_json::json!(["Open", "Closed"])))
            .build();
        assert!(matches!(set_value, Err(QueryError::NonScalarValue { .. })));

        let empty_contains = QueryBuilder::new(&catalog, "SmartList")
            .filter_contains("title", "")
            .build();
        assert!(matches!(
            empty_contains,
            Err(QueryError::InvalidOperand { op: FilterOp::Contains, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_page_and_unknown_table() {
        let catalog = catalog();

        assert!(matches!(
            QueryBuilder::new(&catalog, "Assets").top(0).build(),
            Err(QueryError::EmptyPage { .. })
        ));
        assert_eq!(
            QueryBuilder::new(&catalog, "Nope").build().unwrap_err(),
            QueryError::UnknownTable("Nope".into())
        );
    }

    #[test]
    fn test_custom_unfilterable_field() {
        let catalog = Catalog::new(
            vec![
                TableSchema::new("Orders", "order_no")
                    .with_fields(&["customer_id"])
                    .with_unfilterable("notes"),
                TableSchema::new("Customers", "customer_id").with_fields(&["name"]),
            ],
            vec![Relation::direct("Orders", "Customer", "customer_id", "Customers")],
        )
        .unwrap();

        assert_eq!(
            catalog.capability("Orders", "Customer").unwrap(),
            Capability::Direct
        );
        assert!(QueryBuilder::new(&catalog, "Orders")
            .filter_eq("order_no", 7)
            .build()
            .is_ok());
        assert!(matches!(
            QueryBuilder::new(&catalog, "Orders")
                .filter_contains("notes", "rush")
                .build(),
            Err(QueryError::UnfilterableField { .. })
        ));
    }
}
