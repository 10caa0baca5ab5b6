//! Expression synthesis scenarios driven end to end through the store.

#[cfg(test)]
mod tests {
    use dynakit_core::{
        CmpOp, CursorPaginator, ExpressionBuilder, FieldCondition, KeyConditionBuilder, KeyFields,
        PageRequest, Predicates, Store,
    };
    use dynakit_model::{AttrValue, Literal, QueryRequest};

    use crate::{orders_schema, seeded_store};

    fn partition_request(schema: &dynakit_core::KeySchema) -> QueryRequest {
        let mut builder = KeyConditionBuilder::new(schema);
        let key: KeyFields = [("tenant".to_owned(), "acme".to_owned())].into();
        builder
            .partition(&QueryRequest::new("orders"), &key)
            .unwrap()
    }

    fn sort_fields(pairs: &[(&str, &str)]) -> KeyFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_should_filter_with_two_operators_on_one_field() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let request = partition_request(&schema);

        let mut builder = ExpressionBuilder::new();
        let mut predicates = Predicates::new();
        predicates.insert(
            "amount".to_owned(),
            FieldCondition::Ops(vec![
                (CmpOp::Gt, Literal::from(40)),
                (CmpOp::Lt, Literal::from(80)),
            ]),
        );
        let request = builder.filter(&request, &predicates);

        // Two distinct value placeholders, both clauses joined by AND.
        assert_eq!(
            request.filter_expression.as_deref(),
            Some("#amount > :amount_gt AND #amount < :amount_lt")
        );
        assert_ne!(
            request.expression_attribute_values[":amount_gt"],
            request.expression_attribute_values[":amount_lt"]
        );

        let response = store.query(&request).await.unwrap();
        // Amounts are seq * 10; strictly between 40 and 80 leaves 50..70.
        let amounts: Vec<&str> = response
            .items
            .iter()
            .map(|item| item["amount"].as_n().unwrap())
            .collect();
        assert_eq!(amounts, ["50", "60", "70"]);
    }

    #[tokio::test]
    async fn test_should_combine_filter_and_pagination() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let request = partition_request(&schema);

        let mut builder = ExpressionBuilder::new();
        let mut predicates = Predicates::new();
        predicates.insert("status".to_owned(), FieldCondition::value("open"));
        let request = builder.filter(&request, &predicates);

        let paginator = CursorPaginator::new(&schema);
        let page = paginator
            .run(
                &store,
                &request,
                &PageRequest {
                    limit: Some(6),
                    ..PageRequest::default()
                },
            )
            .await
            .unwrap();

        // The store consumes the limit before filtering: the first window of
        // seven records holds four even-numbered (open) orders.
        assert_eq!(page.count, 4);
        for item in &page.items {
            assert_eq!(item["status"].as_s(), Some("open"));
        }
        // Filtered-out records still consumed the scan window.
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_should_project_requested_and_key_attributes_only() {
        let schema = orders_schema();
        let store = seeded_store(5);
        let request = partition_request(&schema);

        let mut builder = ExpressionBuilder::new();
        let request = builder.projection(&request, &schema, &["amount".to_owned()]);

        let paginator = CursorPaginator::new(&schema);
        let page = paginator
            .run(&store, &request, &PageRequest::default())
            .await
            .unwrap();

        let item = &page.items[0];
        // Key attributes come back decoded into logical fields.
        assert_eq!(item["tenant"].as_s(), Some("acme"));
        assert_eq!(item["kind"].as_s(), Some("order"));
        assert!(item.contains_key("amount"));
        assert!(!item.contains_key("status"));
    }

    #[tokio::test]
    async fn test_should_range_scan_with_begins_with() {
        let schema = orders_schema();
        let store = seeded_store(10);
        store.put(crate::order_record("acme", 99)).unwrap();
        let mut record = crate::order_record("acme", 0);
        record.insert("sk".to_owned(), AttrValue::S("refund#00".to_owned()));
        store.put(record).unwrap();

        let mut builder = KeyConditionBuilder::new(&schema);
        let request = partition_request(&schema);
        let request = builder
            .begins_with(&request, &sort_fields(&[("kind", "order")]))
            .unwrap();

        let paginator = CursorPaginator::new(&schema);
        let page = paginator
            .run(&store, &request, &PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.count, 11);
        for item in &page.items {
            assert_eq!(item["kind"].as_s(), Some("order"));
        }
    }

    #[tokio::test]
    async fn test_should_range_scan_between_boundaries() {
        let schema = orders_schema();
        let store = seeded_store(20);

        let mut builder = KeyConditionBuilder::new(&schema);
        let request = partition_request(&schema);
        let request = builder
            .between(
                &request,
                &sort_fields(&[("kind", "order"), ("seq", "05")]),
                &sort_fields(&[("kind", "order"), ("seq", "08")]),
            )
            .unwrap();

        let paginator = CursorPaginator::new(&schema);
        let page = paginator
            .run(&store, &request, &PageRequest::default())
            .await
            .unwrap();

        let seqs: Vec<&str> = page
            .items
            .iter()
            .map(|item| item["seq"].as_s().unwrap())
            .collect();
        assert_eq!(seqs, ["05", "06", "07", "08"]);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_should_merge_two_filter_invocations() -> anyhow::Result<()> {
        let schema = orders_schema();
        let store = seeded_store(30);
        let request = partition_request(&schema);

        let mut builder = ExpressionBuilder::new();
        let mut first = Predicates::new();
        first.insert("status".to_owned(), FieldCondition::value("open"));
        let request = builder.filter(&request, &first);

        let mut second = Predicates::new();
        second.insert(
            "amount".to_owned(),
            FieldCondition::op(CmpOp::Ge, Literal::from(100)),
        );
        let request = builder.filter(&request, &second);

        assert_eq!(
            request.filter_expression.as_deref(),
            Some("#status = :status_eq AND (#amount >= :amount_ge)")
        );

        let response = store.query(&request).await?;
        for item in &response.items {
            assert_eq!(item["status"].as_s(), Some("open"));
            assert!(item["amount"].as_n().unwrap().parse::<f64>()? >= 100.0);
        }
        Ok(())
    }
}
