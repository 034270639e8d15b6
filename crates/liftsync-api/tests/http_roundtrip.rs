//! Drives the HTTP remote adapter and the sync engine against a live service.

use std::sync::Arc;
use std::time::Duration;

use liftsync_api::{app_router, AppConfig, AppState};
use liftsync_core::{
    HttpRemoteStore, HttpRemoteStoreConfig, LocalStore, NewExecution, RemoteError,
    RemoteExecution, RemoteStore, SyncEngine,
};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use tokio::net::TcpListener;

struct Service {
    _tmp: TempDir,
    base_url: String,
}

async fn spawn_service(api_token: Option<&str>) -> Service {
    let tmp = tempdir().unwrap();
    let config = Arc::new(AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        db_path: tmp.path().join("remote.db"),
        api_token: api_token.map(str::to_string),
        max_page_size: 500,
    });
    let state = AppState::open(config).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app_router(state)).await.unwrap();
    });

    Service {
        _tmp: tmp,
        base_url: format!("http://{addr}"),
    }
}

fn remote(service: &Service, api_token: Option<&str>, page_size: u32) -> HttpRemoteStore {
    HttpRemoteStore::new(HttpRemoteStoreConfig {
        base_url: service.base_url.clone(),
        api_token: api_token.map(str::to_string),
        timeout: Duration::from_secs(5),
        page_size,
    })
    .unwrap()
}

async fn local_store(tmp: &TempDir, name: &str) -> LocalStore {
    LocalStore::open_path(tmp.path().join(name)).await.unwrap()
}

fn execution(owner_id: &str, workout_id: &str, duration_seconds: u32) -> NewExecution {
    NewExecution {
        workout_id: workout_id.to_string(),
        workout_name: format!("Workout {workout_id}"),
        owner_id: owner_id.to_string(),
        duration_seconds,
        ..NewExecution::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn upload_then_download_across_devices() {
    let service = spawn_service(None).await;
    let tmp = tempdir().unwrap();

    let phone = local_store(&tmp, "phone.db").await;
    let logged = phone.log(execution("u1", "w-push", 600)).await.unwrap();
    phone.log(execution("u1", "w-pull", 900)).await.unwrap();
    phone.log(execution("u1", "w-legs", 1_200)).await.unwrap();
    phone.log(execution("u2", "w-run", 1_800)).await.unwrap();

    let phone_engine = SyncEngine::new(phone.clone(), Arc::new(remote(&service, None, 2)));
    let report = phone_engine.upload("u1").await.unwrap().completed().unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(phone.count_dirty("u1").await.unwrap(), 0);
    assert_eq!(phone.count_dirty("u2").await.unwrap(), 1);

    // Page size 2 forces the adapter to follow the cursor.
    let documents = remote(&service, None, 2).query_by_owner("u1").await.unwrap();
    assert_eq!(documents.len(), 3);
    assert!(documents.iter().all(|document| document.synced_at.is_some()));
    assert!(documents.iter().all(|document| document.owner_id == "u1"));

    let tablet = local_store(&tmp, "tablet.db").await;
    let tablet_engine = SyncEngine::new(tablet.clone(), Arc::new(remote(&service, None, 2)));
    let report = tablet_engine.download("u1").await.unwrap().completed().unwrap();
    assert_eq!(report.succeeded, 3);

    let pulled = tablet.get(&logged.id).await.unwrap().unwrap();
    assert_eq!(pulled.duration_seconds, 600);
    assert!(!pulled.dirty);
    assert!(tablet.list_all("u2").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_edit_overwrites_local_copy_on_download() {
    let service = spawn_service(None).await;
    let tmp = tempdir().unwrap();
    let store = local_store(&tmp, "local.db").await;
    let engine = SyncEngine::new(store.clone(), Arc::new(remote(&service, None, 50)));

    let record = store.log(execution("u1", "w-push", 600)).await.unwrap();
    engine.upload("u1").await.unwrap();

    let mut edited = RemoteExecution::from(&record);
    edited.duration_seconds = 900;
    remote(&service, None, 50).put(&edited).await.unwrap();

    engine.download("u1").await.unwrap();
    let local = store.get(&record.id).await.unwrap().unwrap();
    assert_eq!(local.duration_seconds, 900);
    assert!(!local.dirty);
}

#[tokio::test(flavor = "multi_thread")]
async fn service_refusals_surface_as_rejected() {
    let service = spawn_service(None).await;
    let tmp = tempdir().unwrap();
    let store = local_store(&tmp, "local.db").await;
    let record = store.log(execution("u1", "w-push", 600)).await.unwrap();
    let adapter = remote(&service, None, 50);
    adapter.put(&RemoteExecution::from(&record)).await.unwrap();

    let mut stolen = RemoteExecution::from(&record);
    stolen.owner_id = "u2".to_string();
    let conflict = adapter.put(&stolen).await.unwrap_err();
    assert!(matches!(
        &conflict,
        RemoteError::Rejected(message) if message.contains("another owner")
    ));
    assert!(!conflict.is_retryable());

    let mut blank = RemoteExecution::from(&record);
    blank.workout_name = " ".to_string();
    assert!(matches!(
        adapter.put(&blank).await,
        Err(RemoteError::Rejected(message)) if message.contains("workout_name")
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn token_guards_the_collection() {
    let service = spawn_service(Some("s3cret")).await;
    let tmp = tempdir().unwrap();
    let store = local_store(&tmp, "local.db").await;
    store.log(execution("u1", "w-push", 600)).await.unwrap();

    let anonymous = SyncEngine::new(store.clone(), Arc::new(remote(&service, None, 50)));
    let report = anonymous.upload("u1").await.unwrap().completed().unwrap();
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.rejected(), 1);
    assert_eq!(store.count_dirty("u1").await.unwrap(), 1);

    let wrong = remote(&service, Some("guess"), 50);
    assert!(matches!(
        wrong.query_by_owner("u1").await,
        Err(RemoteError::Rejected(_))
    ));

    let authorized = SyncEngine::new(
        store.clone(),
        Arc::new(remote(&service, Some("s3cret"), 50)),
    );
    let report = authorized.upload("u1").await.unwrap().completed().unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(store.count_dirty("u1").await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_service_is_a_network_fault() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let adapter = HttpRemoteStore::new(HttpRemoteStoreConfig {
        base_url: format!("http://{addr}"),
        api_token: None,
        timeout: Duration::from_secs(2),
        page_size: 50,
    })
    .unwrap();

    let error = adapter.query_by_owner("u1").await.unwrap_err();
    assert!(matches!(error, RemoteError::Network(_)));
    assert!(error.is_retryable());
}
