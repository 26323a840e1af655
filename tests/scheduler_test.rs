//! Tests for the scheduler module

mod common;

use common::{synthetic_csv, write_file};
use smart_asset_scheduler::config::Config;
use smart_asset_scheduler::pipeline::load_scored;
use smart_asset_scheduler::scheduler::{
    maintenance_pipeline_job, Job, JobMetadata, JobStatus, SchedulerConfig, SchedulerError,
    SchedulerService,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

fn counting_job(name: &str, schedule: &str, counter: Arc<AtomicUsize>) -> Job {
    Job::new(JobMetadata::new(name, schedule), move |_ctx| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn test_scheduler_start_stop() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .expect("Failed to create scheduler");

    scheduler.start().await.expect("Failed to start scheduler");
    assert!(scheduler.is_running().await);

    scheduler.shutdown().await.expect("Failed to stop scheduler");
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_job_fires_and_records_history() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .expect("Failed to create scheduler");
    scheduler.start().await.expect("Failed to start scheduler");

    let counter = Arc::new(AtomicUsize::new(0));
    let job_id = scheduler
        .add_job(counting_job("every_second", "* * * * * *", counter.clone()))
        .await
        .expect("Failed to add job");

    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(counter.load(Ordering::SeqCst) >= 1);

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert!(metadata.run_count >= 1);
    assert_eq!(metadata.failure_count, 0);
    assert!(metadata.last_run.is_some());

    let stats = scheduler.get_stats().await;
    assert_eq!(stats.total_jobs, 1);
    assert_eq!(stats.success_rate, 100.0);

    scheduler.shutdown().await.expect("Failed to stop scheduler");
}

#[tokio::test]
async fn test_remove_job_cancels_trigger() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .expect("Failed to create scheduler");
    scheduler.start().await.expect("Failed to start scheduler");

    let counter = Arc::new(AtomicUsize::new(0));
    let job_id = scheduler
        .add_job(counting_job("removed", "* * * * * *", counter.clone()))
        .await
        .unwrap();

    scheduler.remove_job(&job_id).await.expect("Failed to remove job");
    // Let a trigger that fired just before removal finish
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after_removal = counter.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(counter.load(Ordering::SeqCst), after_removal);
    assert!(scheduler.list_jobs().await.is_empty());
    assert!(matches!(
        scheduler.get_job_metadata(&job_id).await,
        Err(SchedulerError::JobNotFound(_))
    ));

    scheduler.shutdown().await.expect("Failed to stop scheduler");
}

#[tokio::test]
async fn test_list_jobs_sorted_by_name() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    scheduler
        .add_job(counting_job("b_job", "0 0 0 * * *", counter.clone()))
        .await
        .unwrap();
    scheduler
        .add_job(counting_job("a_job", "0 0 0 * * *", counter))
        .await
        .unwrap();

    let names: Vec<String> = scheduler
        .list_jobs()
        .await
        .into_iter()
        .map(|j| j.name)
        .collect();
    assert_eq!(names, vec!["a_job", "b_job"]);
}

#[tokio::test]
async fn test_invalid_schedule_rejected() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    let result = scheduler
        .add_job(counting_job("bad", "every day", Arc::new(AtomicUsize::new(0))))
        .await;

    assert!(matches!(result, Err(SchedulerError::JobCreationFailed(_))));
    assert!(scheduler.list_jobs().await.is_empty());
}

#[tokio::test]
async fn test_failing_scheduled_job_keeps_firing() {
    let mut scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .expect("Failed to create scheduler");
    scheduler.start().await.expect("Failed to start scheduler");

    let failing = Job::new(JobMetadata::new("flaky", "* * * * * *"), |_ctx| async {
        Err("sensor feed unavailable".to_string())
    });
    let job_id = scheduler.add_job(failing).await.unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    scheduler.shutdown().await.expect("Failed to stop scheduler");

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert!(metadata.failure_count >= 2);
    assert_eq!(metadata.failure_count, metadata.run_count);
    assert_eq!(metadata.status, JobStatus::Failed);
    assert_eq!(metadata.last_error.as_deref(), Some("sensor feed unavailable"));

    let stats = scheduler.get_stats().await;
    assert_eq!(stats.failed_jobs, 1);
}

#[tokio::test]
async fn test_run_job_now() {
    let scheduler = SchedulerService::new(SchedulerConfig::default())
        .await
        .unwrap();

    let failing = Job::new(JobMetadata::new("failing", "0 0 0 * * *"), |_ctx| async {
        Err("Intentional failure".to_string())
    });
    let job_id = scheduler.add_job(failing).await.unwrap();

    let result = scheduler.run_job_now(&job_id).await;
    assert!(matches!(result, Err(SchedulerError::JobExecutionFailed(_))));

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert_eq!(metadata.status, JobStatus::Failed);
    assert_eq!(metadata.failure_count, 1);
    assert_eq!(metadata.last_error.as_deref(), Some("Intentional failure"));

    let unknown = uuid::Uuid::new_v4();
    assert!(matches!(
        scheduler.run_job_now(&unknown).await,
        Err(SchedulerError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_disabled_scheduler() {
    let config = SchedulerConfig {
        enabled: false,
        ..Default::default()
    };

    let mut scheduler = SchedulerService::new(config)
        .await
        .expect("Failed to create scheduler");

    scheduler.start().await.expect("Disabled start is a no-op");
    assert!(!scheduler.is_running().await);
}

#[tokio::test]
async fn test_maintenance_job_writes_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "readings.csv", &synthetic_csv(3, 20, 5));
    let output = dir.path().join("schedule.csv");

    let mut config = Config::default();
    config.pipeline.input_path = input;
    config.pipeline.output_path = output.clone();
    config.model.n_trees = 10;

    let scheduler = SchedulerService::new(config.scheduler.clone())
        .await
        .unwrap();
    let job_id = scheduler
        .add_job(maintenance_pipeline_job(&config))
        .await
        .unwrap();

    scheduler
        .run_job_now(&job_id)
        .await
        .expect("Pipeline job failed");

    assert_eq!(load_scored(&output).unwrap().len(), 60);

    let metadata = scheduler.get_job_metadata(&job_id).await.unwrap();
    assert_eq!(metadata.status, JobStatus::Completed);
    assert_eq!(metadata.schedule, "0 0 0 * * *");
}
