use hvacpro_shared::{JobStatus, JobType};
use rust_decimal::Decimal;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

use crate::scheduling::{ScheduleOutcome, ScheduleRequest, SchedulingConfig};
use crate::store::{PgStore, SchedulingStore, StorageError};
use crate::tests::{fixtures::*, TestContext};

// These run only when TEST_DATABASE_URL points at a disposable database

fn pg_store(ctx: &TestContext) -> PgStore {
    PgStore::new(ctx.db_pool.clone(), Duration::from_secs(5))
}

#[tokio::test]
#[serial]
async fn test_pg_insert_and_read_back() {
    let Some(ctx) = TestContext::new().await else { return };
    let store = pg_store(&ctx);
    let customer = insert_customer(&ctx.db_pool, "John Smith", &["morning"]).await.unwrap();
    let technician = insert_technician(&ctx.db_pool, "Bob Martinez", &["residential"], true)
        .await
        .unwrap();

    let mut job = booking(customer, technician, monday(), at(9, 0), 90);
    job.job_type = JobType::Maintenance;
    job.notes = Some("Filter swap".to_string());
    let id = store.insert_job(&job).await.unwrap();

    let details = store.job_with_details(id).await.unwrap().unwrap();
    assert_eq!(details.customer_name, "John Smith");
    assert_eq!(details.technician_name.as_deref(), Some("Bob Martinez"));
    assert_eq!(details.job.job_type, JobType::Maintenance);
    assert_eq!(details.job.status, JobStatus::Scheduled);
    assert_eq!(details.job.scheduled_time, at(9, 0));
    assert_eq!(details.job.estimated_duration, 90);
    assert_eq!(details.job.notes.as_deref(), Some("Filter swap"));

    let customers = store.customers().await.unwrap();
    assert_eq!(customers[0].preferred_time, vec!["morning".to_string()]);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn test_pg_exclusion_constraint_reports_slot_taken() {
    let Some(ctx) = TestContext::new().await else { return };
    let store = pg_store(&ctx);
    let customer = insert_customer(&ctx.db_pool, &fake_name(), &[]).await.unwrap();
    let technician = insert_technician(&ctx.db_pool, &fake_name(), &["residential"], true)
        .await
        .unwrap();

    let first = store
        .insert_job(&booking(customer, technician, monday(), at(9, 0), 120))
        .await
        .unwrap();

    let clash = store
        .insert_job(&booking(customer, technician, monday(), at(10, 0), 60))
        .await;
    assert!(matches!(clash, Err(StorageError::SlotTaken { .. })));

    // Half-open ranges: ending at 11:00 leaves 11:00 free
    assert!(store
        .insert_job(&booking(customer, technician, monday(), at(11, 0), 60))
        .await
        .is_ok());

    // Cancelling releases the range
    assert!(store.cancel_job(first).await.unwrap());
    assert!(!store.cancel_job(first).await.unwrap());
    assert!(store
        .insert_job(&booking(customer, technician, monday(), at(9, 30), 60))
        .await
        .is_ok());

    let booked = store.booked_intervals(monday()).await.unwrap();
    assert_eq!(booked.len(), 2);

    let all = store.jobs_on(monday()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].job.scheduled_time <= w[1].job.scheduled_time));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn test_pg_completion_feeds_revenue() {
    let Some(ctx) = TestContext::new().await else { return };
    let store = pg_store(&ctx);
    let customer = insert_customer(&ctx.db_pool, &fake_name(), &[]).await.unwrap();
    let technician = insert_technician(&ctx.db_pool, &fake_name(), &["residential"], true)
        .await
        .unwrap();
    let id = store
        .insert_job(&booking(customer, technician, monday(), at(8, 0), 60))
        .await
        .unwrap();

    assert!(store
        .complete_job(id, Decimal::new(29900, 2), noon_on(monday()))
        .await
        .unwrap());
    assert!(!store
        .complete_job(id, Decimal::new(100, 2), noon_on(monday()))
        .await
        .unwrap());

    let since = noon_on(date(2024, 3, 3));
    assert_eq!(store.completed_revenue_since(since).await.unwrap(), Decimal::new(29900, 2));
    assert_eq!(store.completed_count_since(since).await.unwrap(), 1);

    let later = noon_on(date(2024, 3, 5));
    assert_eq!(store.completed_revenue_since(later).await.unwrap(), Decimal::ZERO);
    assert_eq!(store.completed_count_since(later).await.unwrap(), 0);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn test_pg_auto_schedule_end_to_end() {
    let Some(ctx) = TestContext::new().await else { return };
    let customer = insert_customer(&ctx.db_pool, &fake_name(), &["afternoon"]).await.unwrap();
    insert_technician(&ctx.db_pool, &fake_name(), &["residential"], false)
        .await
        .unwrap();
    let technician = insert_technician(&ctx.db_pool, &fake_name(), &["commercial"], true)
        .await
        .unwrap();
    let service = service_with_config(Arc::new(pg_store(&ctx)), monday(), SchedulingConfig::default());

    let outcome = service
        .auto_schedule_job(ScheduleRequest::new(customer, JobType::Repair))
        .await
        .unwrap();

    match outcome {
        ScheduleOutcome::Scheduled(job) => {
            assert_eq!(job.job.technician_id, Some(technician));
            assert_eq!(job.job.scheduled_date, monday());
            assert_eq!(job.job.scheduled_time, at(13, 0));
        }
        ScheduleOutcome::Unschedulable(reason) => panic!("no slot: {:?}", reason),
    }

    let (a, b) = tokio::join!(
        service.auto_schedule_job(ScheduleRequest::new(customer, JobType::Repair)),
        service.auto_schedule_job(ScheduleRequest::new(customer, JobType::Repair)),
    );
    let mut slots: Vec<_> = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter_map(|outcome| match outcome {
            ScheduleOutcome::Scheduled(job) => Some((job.job.scheduled_date, job.job.scheduled_time)),
            ScheduleOutcome::Unschedulable(_) => None,
        })
        .collect();
    slots.sort();
    // The rest of Monday afternoon holds one more repair
    assert_eq!(slots, vec![(monday(), at(15, 0)), (date(2024, 3, 5), at(13, 0))]);

    ctx.cleanup().await;
}
