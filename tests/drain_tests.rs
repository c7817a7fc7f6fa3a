
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jobqueue::config::PoolConfig;
use jobqueue::scheduler::{JobStatus, JobStore};
use jobqueue::worker::{CancellationToken, FnExecutor, TaskError, WorkerPool};
use test_harness::{instant_executor, seed_and_submit, sleeping_executor, test_pool_config};

/// Test that stop waits for every accepted job to reach a terminal status.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_drains_queued_jobs() {
    let store = JobStore::new();
    let pool = WorkerPool::new(
        store.clone(),
        test_pool_config(2, 16),
        sleeping_executor(Duration::from_millis(30)),
    )
    .unwrap();

    let mut accepted = Vec::new();
    for i in 0..10 {
        let id = format!("job-{}", i);
        if seed_and_submit(&store, &pool, &id).await {
            accepted.push(id);
        }
    }
    assert_eq!(accepted.len(), 10);

    pool.stop().await;

    for id in &accepted {
        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed, "job {} not drained", id);
    }
}

/// Test that a job still executing when stop is called is allowed to finish.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_waits_for_in_flight_job() {
    let store = JobStore::new();
    let pool = WorkerPool::new(
        store.clone(),
        test_pool_config(1, 4),
        sleeping_executor(Duration::from_millis(200)),
    )
    .unwrap();

    assert!(seed_and_submit(&store, &pool, "in-flight").await);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = Instant::now();
    pool.stop().await;

    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(
        store.get("in-flight").await.unwrap().status,
        JobStatus::Completed
    );
}

/// Test that stop finishes even when executors ignore their deadline.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_completes_with_stuck_executors() {
    let store = JobStore::new();
    let config = PoolConfig::new(2, 8, Duration::from_millis(100));
    let pool = WorkerPool::new(
        store.clone(),
        config,
        sleeping_executor(Duration::from_secs(30)),
    )
    .unwrap();

    for i in 0..4 {
        assert!(seed_and_submit(&store, &pool, &format!("stuck-{}", i)).await);
    }

    let start = Instant::now();
    pool.stop().await;
    let elapsed = start.elapsed();

    // Two rounds of two jobs, each bounded by the 100 ms deadline
    assert!(elapsed < Duration::from_secs(2), "stop took {:?}", elapsed);
    for job in store.list().await {
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}

/// Test that stopping an idle pool returns promptly.
#[tokio::test]
async fn test_stop_idle_pool() {
    let store = JobStore::new();
    let pool = WorkerPool::new(store, test_pool_config(4, 4), instant_executor()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    tokio::time::timeout(Duration::from_secs(1), pool.stop())
        .await
        .expect("idle pool should stop immediately");
}

/// Test that no job starts after stop has returned.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_work_after_stop() {
    let started = Arc::new(AtomicUsize::new(0));
    let executor = {
        let started = started.clone();
        FnExecutor::new(move |_job_id: String, _cancel: CancellationToken| {
            let started = started.clone();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        })
    };

    let store = JobStore::new();
    let pool = WorkerPool::new(store.clone(), test_pool_config(3, 8), Arc::new(executor)).unwrap();
    for i in 0..5 {
        assert!(seed_and_submit(&store, &pool, &format!("job-{}", i)).await);
    }
    pool.stop().await;

    let after_stop = started.load(Ordering::SeqCst);
    assert_eq!(after_stop, 5);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(started.load(Ordering::SeqCst), after_stop);
}
