//! Cursor pagination scenarios against the in-memory store.

#[cfg(test)]
mod tests {
    use dynakit_core::{
        CursorPaginator, KeyConditionBuilder, KeyFields, MemoryStore, PageRequest,
    };
    use dynakit_model::{Direction, QueryRequest};

    use crate::{orders_schema, seeded_store};

    fn partition_request(schema: &dynakit_core::KeySchema) -> QueryRequest {
        let mut builder = KeyConditionBuilder::new(schema);
        let key: KeyFields = [("tenant".to_owned(), "acme".to_owned())].into();
        builder
            .partition(&QueryRequest::new("orders"), &key)
            .unwrap()
    }

    #[tokio::test]
    async fn test_should_page_forward_through_thirty_items() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let paginator = CursorPaginator::new(&schema);
        let request = partition_request(&schema);

        let page = paginator
            .run(
                &store,
                &request,
                &PageRequest {
                    limit: Some(5),
                    ..PageRequest::default()
                },
            )
            .await
            .unwrap();

        let seqs: Vec<&str> = page
            .items
            .iter()
            .map(|item| item["seq"].as_s().unwrap())
            .collect();
        assert_eq!(seqs, ["00", "01", "02", "03", "04"]);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[tokio::test]
    async fn test_should_walk_backward_consistently_with_forward_prefix() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let paginator = CursorPaginator::new(&schema);
        let request = partition_request(&schema);

        let forward = paginator
            .run(
                &store,
                &request,
                &PageRequest {
                    limit: Some(5),
                    ..PageRequest::default()
                },
            )
            .await
            .unwrap();
        let pivot = forward.last_key.clone().unwrap();
        assert_eq!(pivot["seq"], "04".to_owned());

        let backward = paginator
            .run(
                &store,
                &request,
                &PageRequest {
                    limit: Some(5),
                    direction: Direction::Backward,
                    cursor: Some(pivot),
                },
            )
            .await
            .unwrap();

        let seqs: Vec<&str> = backward
            .items
            .iter()
            .map(|item| item["seq"].as_s().unwrap())
            .collect();
        // Descending from the pivot, matching the forward page minus the pivot.
        assert_eq!(seqs, ["03", "02", "01", "00"]);
        assert!(!backward.has_next);
        assert!(backward.has_previous);
        assert_eq!(backward.direction, Direction::Backward);
    }

    #[tokio::test]
    async fn test_should_visit_each_item_exactly_once_across_pages() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let paginator = CursorPaginator::new(&schema);
        let request = partition_request(&schema);

        let mut seen = Vec::new();
        let mut cursor = None;
        let mut first_page = true;
        loop {
            let page = paginator
                .run(
                    &store,
                    &request,
                    &PageRequest {
                        limit: Some(7),
                        direction: Direction::Forward,
                        cursor: cursor.clone(),
                    },
                )
                .await
                .unwrap();
            assert_eq!(page.has_previous, !first_page);
            first_page = false;
            seen.extend(
                page.items
                    .iter()
                    .map(|item| item["seq"].as_s().unwrap().to_owned()),
            );
            if page.has_next {
                cursor = page.last_key.clone();
            } else {
                break;
            }
        }

        let expected: Vec<String> = (0..30).map(|i| format!("{i:02}")).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_should_report_all_false_for_empty_partition() {
        let schema = orders_schema();
        let store = MemoryStore::new("pk", Some("sk"));
        let paginator = CursorPaginator::new(&schema);
        let request = partition_request(&schema);

        let page = paginator
            .run(&store, &request, &PageRequest::default())
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.count, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[tokio::test]
    async fn test_should_fetch_independent_pages_concurrently() {
        let schema = orders_schema();
        let store = seeded_store(30);
        let paginator = CursorPaginator::new(&schema);
        let request = partition_request(&schema);

        let forward_page = PageRequest {
            limit: Some(10),
            ..PageRequest::default()
        };
        let backward_page = PageRequest {
            limit: Some(10),
            direction: Direction::Backward,
            cursor: None,
        };

        let (forward, backward) = futures::join!(
            paginator.run(&store, &request, &forward_page),
            paginator.run(&store, &request, &backward_page),
        );
        let forward = forward.unwrap();
        let backward = backward.unwrap();

        assert_eq!(forward.items[0]["seq"].as_s(), Some("00"));
        assert_eq!(backward.items[0]["seq"].as_s(), Some("29"));
        assert!(forward.has_next);
        assert!(backward.has_next);
    }

    #[tokio::test]
    async fn test_should_paginate_partition_only_schema() -> anyhow::Result<()> {
        let schema = dynakit_core::KeySchema::new(
            dynakit_core::KeySide::single("pk", "user_id"),
            None,
        )?;
        let store = MemoryStore::new("pk", None);
        let mut record = std::collections::HashMap::new();
        record.insert(
            "pk".to_owned(),
            dynakit_model::AttrValue::S("u-1".to_owned()),
        );
        store.put(record)?;

        let mut builder = KeyConditionBuilder::new(&schema);
        let key: KeyFields = [("user_id".to_owned(), "u-1".to_owned())].into();
        let request = builder.partition(&QueryRequest::new("users"), &key)?;

        let paginator = CursorPaginator::new(&schema);
        let page = paginator.run(&store, &request, &PageRequest::default()).await?;

        assert_eq!(page.count, 1);
        assert!(!page.has_next);
        assert_eq!(
            page.items[0]["user_id"].as_s(),
            Some("u-1")
        );
        Ok(())
    }
}
