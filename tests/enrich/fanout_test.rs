mod support;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use joinery::enrich::{FailureReason, FanOutConfig, FanOutFetcher};
use joinery::executor::MemoryExecutor;
use joinery::model::KeyValue;
use joinery::query::{QueryBuilder, QueryError};
use joinery::schema::Catalog;
use tokio::time::Instant;

use support::{catalog, dashboard_store, row, InstrumentedExecutor};

fn keys(values: &[&str]) -> BTreeSet<KeyValue> {
    values.iter().map(|v| KeyValue::from(*v)).collect()
}

fn config(max_concurrency: usize, fetch_timeout: Duration) -> FanOutConfig {
    FanOutConfig {
        max_concurrency,
        fetch_timeout,
    }
}

fn projects_by_record_id<'a>(
    catalog: &'a Catalog,
) -> impl Fn(&KeyValue) -> Result<joinery::query::QueryDescriptor, QueryError> + 'a {
    move |key| {
        QueryBuilder::new(catalog, "Projects")
            .filter_eq("record_id", key.to_value())
            .top(1)
            .build()
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_bound_two_with_five_keys() {
    let catalog = catalog();
    let store = MemoryExecutor::new(catalog.clone()).with_rows(
        "Projects",
        (1..=5).map(|n| row(&format!("P{n}")).with("name", format!("Project {n}"))).collect(),
    );
    let executor = Arc::new(InstrumentedExecutor::new(store).with_delay(Duration::from_millis(50)));
    let fetcher = FanOutFetcher::new(executor.clone(), config(2, Duration::from_secs(5)));

    let result = fetcher
        .fetch(&keys(&["P1", "P2", "P3", "P4", "P5"]), projects_by_record_id(&catalog))
        .await;

    assert_eq!(executor.max_in_flight(), 2);
    assert_eq!(executor.call_count(), 5);
    assert_eq!(result.issued, 5);
    assert_eq!(result.found.len(), 5);
    assert!(result.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_zero_concurrency_runs_one_at_a_time() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone());
    let executor = Arc::new(InstrumentedExecutor::new(store).with_delay(Duration::from_millis(10)));
    let fetcher = FanOutFetcher::new(executor.clone(), config(0, Duration::from_secs(5)));

    let result = fetcher
        .fetch(&keys(&["P1", "P2", "P3"]), projects_by_record_id(&catalog))
        .await;

    assert_eq!(executor.max_in_flight(), 1);
    assert_eq!(result.found.len(), 3);
}

#[tokio::test]
async fn test_failure_is_isolated_to_its_key() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone()).fail_on("Projects", "record_id", "P2");
    let fetcher = FanOutFetcher::new(Arc::new(store), FanOutConfig::default());

    let result = fetcher
        .fetch(&keys(&["P1", "P2", "P3"]), projects_by_record_id(&catalog))
        .await;

    assert_eq!(result.found.len(), 2);
    assert_eq!(
        result.get(&KeyValue::from("P1")).and_then(|p| p.get_str("name")),
        Some("Alpha")
    );
    assert!(result.get(&KeyValue::from("P2")).is_none());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].key, KeyValue::from("P2"));
    assert!(matches!(result.failures[0].reason, FailureReason::Remote(_)));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_degrades_to_no_match() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone()).stall_on("Projects", "record_id", "P3");
    let timeout = Duration::from_millis(200);
    let fetcher = FanOutFetcher::new(Arc::new(store), config(4, timeout));

    let result = fetcher
        .fetch(&keys(&["P1", "P3"]), projects_by_record_id(&catalog))
        .await;

    assert_eq!(result.found.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].reason, FailureReason::Timeout(timeout));
    assert_eq!(result.issued, 2);
}

#[tokio::test]
async fn test_missing_row_is_not_a_failure() {
    let catalog = catalog();
    let fetcher = FanOutFetcher::new(Arc::new(dashboard_store(catalog.clone())), FanOutConfig::default());

    let result = fetcher
        .fetch(&keys(&["P1", "P404"]), projects_by_record_id(&catalog))
        .await;

    assert_eq!(result.found.len(), 1);
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_unbuildable_query_is_never_sent() {
    let catalog = catalog();
    let executor = Arc::new(InstrumentedExecutor::new(dashboard_store(catalog.clone())));
    let fetcher = FanOutFetcher::new(executor.clone(), FanOutConfig::default());

    // Filtering on the primary key is rejected before anything is sent.
    let result = fetcher
        .fetch(&keys(&["P1", "P2"]), |key| {
            QueryBuilder::new(&catalog, "Projects")
                .filter_eq("id", key.to_value())
                .build()
        })
        .await;

    assert_eq!(executor.call_count(), 0);
    assert_eq!(result.issued, 0);
    assert!(result.found.is_empty());
    assert_eq!(result.failures.len(), 2);
    assert!(result
        .failures
        .iter()
        .all(|f| matches!(f.reason, FailureReason::InvalidQuery(_))));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_keeps_completed_results() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone()).stall_on("Projects", "record_id", "P1");
    let fetcher = FanOutFetcher::new(Arc::new(store), config(4, Duration::from_secs(30)));

    let deadline = Instant::now() + Duration::from_secs(1);
    let result = fetcher
        .fetch_until(&keys(&["P1", "P2", "P3"]), projects_by_record_id(&catalog), Some(deadline))
        .await;

    assert_eq!(result.found.len(), 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].key, KeyValue::from("P1"));
    assert_eq!(result.failures[0].reason, FailureReason::Deadline);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_covers_queued_keys() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone()).stall_on("Projects", "record_id", "P1");
    let fetcher = FanOutFetcher::new(Arc::new(store), config(1, Duration::from_secs(30)));

    let deadline = Instant::now() + Duration::from_secs(1);
    let result = fetcher
        .fetch_until(&keys(&["P1", "P2"]), projects_by_record_id(&catalog), Some(deadline))
        .await;

    // P1 holds the only permit until the deadline, so P2 is never sent.
    assert_eq!(result.issued, 1);
    assert!(result.found.is_empty());
    assert!(result
        .failures
        .iter()
        .all(|f| f.reason == FailureReason::Deadline));
    assert_eq!(result.failures.len(), 2);
}

#[tokio::test]
async fn test_fetch_relation_through_intermediate_table() {
    let catalog = catalog();
    let executor = Arc::new(InstrumentedExecutor::new(dashboard_store(catalog.clone())));
    let fetcher = FanOutFetcher::new(executor.clone(), FanOutConfig::default());
    let relation = catalog.relation("SmartList", "Projects").unwrap();

    let result = fetcher
        .fetch_relation(&catalog, relation, &keys(&["PA1", "PA2"]), &["name".to_string()], None)
        .await;

    assert_eq!(executor.queries_on("ProjectAssets").len(), 2);
    assert!(executor.queries_on("Projects").is_empty());
    assert_eq!(
        result.get(&KeyValue::from("PA2")).and_then(|p| p.get_str("name")),
        Some("Beta")
    );
    assert_eq!(result.found.len(), 2);
}

#[tokio::test]
async fn test_fetch_relation_intermediate_without_target() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone())
        .with_rows("ProjectAssets", vec![row("PA9").with("project_id", "P404")]);
    let fetcher = FanOutFetcher::new(Arc::new(store), FanOutConfig::default());
    let relation = catalog.relation("Issues", "Projects").unwrap();

    let result = fetcher
        .fetch_relation(&catalog, relation, &keys(&["PA9"]), &[], None)
        .await;

    assert!(result.found.is_empty());
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_fetch_relation_single_hop() {
    let catalog = catalog();
    let store = dashboard_store(catalog.clone()).with_rows(
        "Issues",
        vec![row("I1").with("issue_id", "ISS-1").with("priority", "H")],
    );
    let executor = Arc::new(InstrumentedExecutor::new(store));
    let fetcher = FanOutFetcher::new(executor.clone(), FanOutConfig::default());
    let relation = catalog.relation("IssueNotes", "Issues").unwrap();

    let result = fetcher
        .fetch_relation(&catalog, relation, &keys(&["I1"]), &["priority".to_string()], None)
        .await;

    assert_eq!(
        executor.queries(),
        vec!["Issues?$filter=record_id eq 'I1'&$select=priority&$top=1&$skip=0".to_string()]
    );
    assert_eq!(
        result.get(&KeyValue::from("I1")).and_then(|i| i.get_str("priority")),
        Some("H")
    );
}
