//! UserStore over SQLite: state survives reopening the database.

use std::sync::Arc;

use keyproof::core::Service;
use keyproof::fetch::MemoryFetcher;
use keyproof::store::SqliteStore;
use keyproof::{MockClock, SearchRequest, UserStatus, UserStore, UserStoreConfig};
use keyproof_testkit::{keypair, names, proof_url, START_MS};

fn open(
    path: &std::path::Path,
    fetcher: Arc<MemoryFetcher>,
    clock: Arc<MockClock>,
) -> UserStore<SqliteStore, Arc<MemoryFetcher>> {
    let store = SqliteStore::open(path).unwrap();
    UserStore::new(store, fetcher, clock, UserStoreConfig::default())
}

#[tokio::test]
async fn test_records_survive_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("keyproof.db");
    let fetcher = Arc::new(MemoryFetcher::new());
    let clock = Arc::new(MockClock::stepping(START_MS, 1));
    let alice = keypair(1);
    let url = proof_url(Service::Github, "alice");

    {
        let users = open(&path, fetcher.clone(), clock.clone());
        let (_, proof) = users
            .create_user(&alice, Service::Github, "alice", url.as_str())
            .await?;
        fetcher.set_body(&url, proof.armor()).await;
        let result = users.update(&alice.kid()).await?.unwrap();
        assert_eq!(result.status, UserStatus::Ok);
    }

    let users = open(&path, fetcher.clone(), clock.clone());
    let chain = users.sigchains().sigchain(&alice.kid()).await?.unwrap();
    assert_eq!(chain.last_seq(), 1);
    assert_eq!(users.sigchains().kids().await?, vec![alice.kid()]);

    let results = users.search(&SearchRequest::new("ali")).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(names(&results[0]), vec!["alice"]);

    // Further claims extend the persisted chain.
    let twitter = proof_url(Service::Twitter, "alice");
    let (statement, proof) = users
        .create_user(&alice, Service::Twitter, "alice", twitter.as_str())
        .await?;
    assert_eq!(statement.seq(), 2);
    fetcher.set_body(&twitter, proof.armor()).await;
    users.update(&alice.kid()).await?;

    let results = users.search(&SearchRequest::new("alice@twitter")).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].results.len(), 2);
    assert_eq!(results[0].match_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_revoke_persists() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("keyproof.db");
    let fetcher = Arc::new(MemoryFetcher::new());
    let clock = Arc::new(MockClock::stepping(START_MS, 1));
    let alice = keypair(1);
    let url = proof_url(Service::Github, "alice");

    {
        let users = open(&path, fetcher.clone(), clock.clone());
        let (_, proof) = users
            .create_user(&alice, Service::Github, "alice", url.as_str())
            .await?;
        fetcher.set_body(&url, proof.armor()).await;
        users.update(&alice.kid()).await?;
        users.revoke(&alice, 1).await?;
    }

    let users = open(&path, fetcher, clock);
    let chain = users.sigchains().sigchain(&alice.kid()).await?.unwrap();
    assert_eq!(chain.last_seq(), 2);
    assert!(chain.is_revoked(1));
    assert!(users.search(&SearchRequest::new("alice")).await?.is_empty());
    assert!(users.kid_record(&alice.kid()).await?.unwrap().results.is_empty());
    Ok(())
}
