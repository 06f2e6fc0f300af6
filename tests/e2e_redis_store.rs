// tests/e2e_redis_store.rs
mod support;

use pkce_sso::application::ports::kv_store::ExpiringKvStore;
use pkce_sso::config::DeploymentMode;
use pkce_sso::domain::errors::AuthError;
use pkce_sso::infrastructure::store::RedisKvStore;
use std::{env, sync::Arc, time::Duration};
use support::{
    ALICE_ID, RecordingMailer, seeded_directory, services_over, test_settings,
    user_id,
};

// Helper to check whether Redis is reachable at the given URL. Kept separate
// so the test bodies stay short.
async fn redis_available(url: &str) -> bool {
    let host_port = {
        let mut s = url;
        if let Some(i) = s.find("://") {
            s = &s[i + 3..];
        }
        if let Some(i) = s.rfind('/') {
            s = &s[..i];
        }
        if let Some(i) = s.rfind('@') {
            s = &s[i + 1..];
        }
        s.to_string()
    };

    matches!(
        tokio::time::timeout(
            Duration::from_secs(2),
            tokio::net::TcpStream::connect(host_port),
        )
        .await,
        Ok(Ok(_))
    )
}

/// A store under a run-unique prefix, or `None` when Redis is not reachable.
async fn redis_store() -> Option<RedisKvStore> {
    let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    if !redis_available(&url).await {
        eprintln!("Skipping Redis integration test because Redis is not reachable");
        return None;
    }
    let prefix = format!("sso-test:{}:", uuid::Uuid::new_v4());
    let store = RedisKvStore::from_url(&url, prefix).expect("create redis store");
    store.ping().await.expect("ping redis");
    Some(store)
}

#[tokio::test]
async fn basic_operations_against_redis() {
    let Some(store) = redis_store().await else {
        return;
    };

    store.set("k", "v", Duration::from_secs(30)).await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    let ttl = store.ttl("k").await.unwrap().expect("ttl set");
    assert!(ttl <= Duration::from_secs(30));

    assert_eq!(store.take("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(store.take("k").await.unwrap(), None);

    assert_eq!(store.incr("n").await.unwrap(), 1);
    assert_eq!(store.incr("n").await.unwrap(), 2);
    assert_eq!(store.ttl("n").await.unwrap(), None);
    assert!(store.expire("n", Duration::from_secs(5)).await.unwrap());
    assert!(!store.expire("missing", Duration::from_secs(5)).await.unwrap());

    store.set("c", "one", Duration::from_secs(30)).await.unwrap();
    assert!(!store.compare_and_swap("c", "two", "three", Duration::from_secs(30)).await.unwrap());
    assert!(store.compare_and_swap("c", "one", "two", Duration::from_secs(30)).await.unwrap());
    assert!(!store.compare_and_delete("c", "one").await.unwrap());
    assert!(store.compare_and_delete("c", "two").await.unwrap());

    store.set("p:1", "x", Duration::from_secs(30)).await.unwrap();
    store.set("p:2", "x", Duration::from_secs(30)).await.unwrap();
    assert_eq!(store.delete_prefix("p:").await.unwrap(), 2);
    assert!(store.del("n").await.unwrap());
}

#[tokio::test]
async fn concurrent_take_yields_one_value() {
    let Some(store) = redis_store().await else {
        return;
    };
    let store = Arc::new(store);
    store.set("once", "v", Duration::from_secs(30)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.take("once").await.unwrap() }));
    }
    let mut seen = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            seen += 1;
        }
    }
    assert_eq!(seen, 1);
}

#[tokio::test]
async fn refresh_rotation_with_redis_store() {
    let Some(store) = redis_store().await else {
        return;
    };
    let store: Arc<dyn ExpiringKvStore> = Arc::new(store);

    // Real time: Redis expires keys on its own clock.
    let services = services_over(
        store,
        Arc::new(seeded_directory().await),
        Arc::new(RecordingMailer::default()),
        Arc::new(pkce_sso::infrastructure::time::SystemClock),
        test_settings(DeploymentMode::Test),
    );

    let first = services.tokens.issue_pair(user_id(ALICE_ID)).await.unwrap();
    let second = services
        .tokens
        .refresh(&first.refresh_token, &first.access_token)
        .await
        .unwrap();

    let err = services
        .tokens
        .refresh(&first.refresh_token, &first.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.auth_error(), Some(AuthError::RefreshTokenInvalidated));

    assert!(services.tokens.revoke(&second.refresh_token).await.unwrap());
    assert_eq!(services.tokens.clear_all().await.unwrap(), 0);
}
