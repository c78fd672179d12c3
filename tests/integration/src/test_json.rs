//! JSON put/find integration tests.

#[cfg(test)]
mod tests {
    use bytestore_core::{Body, ObjectStore, StoreError, StoreExt, StoreResult};
    use serde::{Deserialize, Serialize};

    use crate::{cleanup_bucket, create_test_bucket, s3_client, store};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: String,
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_json_and_find_it() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "json").await;
        let store = store(&bucket);

        let user = User {
            id: "ABC".to_owned(),
            name: "Ada".to_owned(),
        };
        store.put_json("users/ABC/_.json", &user).await.expect("put");

        let found: User = store.find("users/ABC/_.json").await.expect("find");
        assert_eq!(found, user);

        let raw = store.get("users/ABC/_.json").await.expect("get");
        assert_eq!(raw.as_ref(), br#"{"id":"ABC","name":"Ada"}"#);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_find_on_non_json_body() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "badjson").await;
        let store = store(&bucket);

        store.put("notes.txt", Body::from("plain text")).await.expect("put");

        let result: StoreResult<User> = store.find("notes.txt").await;
        assert!(matches!(result, Err(StoreError::Decoding { .. })));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_seeded_user_after_cursor() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "seed").await;
        let store = store(&bucket);

        for id in ["ABC", "DEF"] {
            let user = User {
                id: id.to_owned(),
                name: id.to_lowercase(),
            };
            store
                .put_json(&format!("users/{id}/_.json"), &user)
                .await
                .expect("put");
        }

        let keys = store
            .keys("users/", "users/ABC/_.json", 10)
            .await
            .expect("keys");
        assert_eq!(keys, vec!["users/DEF/_.json"]);

        let found: User = store.find(&keys[0]).await.expect("find");
        assert_eq!(found.id, "DEF");

        cleanup_bucket(&client, &bucket).await;
    }
}
