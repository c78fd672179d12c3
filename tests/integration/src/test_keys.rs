//! Key listing integration tests.

#[cfg(test)]
mod tests {
    use bytestore_core::{Body, ObjectStore, S3Store};

    use crate::{cleanup_bucket, create_test_bucket, s3_client, store};

    async fn seed_users(store: &S3Store, count: usize) {
        for i in 0..count {
            store
                .put(&format!("users/{i:03}/_.json"), Body::from("{}"))
                .await
                .expect("put");
        }
        store
            .put("groups/001/_.json", Body::from("{}"))
            .await
            .expect("put");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_after_cursor() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "keys").await;
        let store = store(&bucket);
        seed_users(&store, 10).await;

        let keys = store
            .keys("users/", "users/005/_.json", 2)
            .await
            .expect("keys");
        assert_eq!(keys, vec!["users/006/_.json", "users/007/_.json"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_walk_all_pages() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "walk").await;
        let store = store(&bucket);
        seed_users(&store, 7).await;

        let mut seen = Vec::new();
        let mut cursor = String::new();
        loop {
            let page = store.keys("users/", &cursor, 3).await.expect("keys");
            let Some(last) = page.last() else { break };
            cursor.clone_from(last);
            seen.extend(page);
        }

        let expected: Vec<String> = (0..7).map(|i| format!("users/{i:03}/_.json")).collect();
        assert_eq!(seen, expected);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_empty_for_unknown_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nokeys").await;
        let store = store(&bucket);
        seed_users(&store, 2).await;

        let keys = store.keys("orders/", "", 1000).await.expect("keys");
        assert!(keys.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }
}
