//! Apply, refresh and destroy whole manifests against an in-memory cluster.

use std::collections::BTreeMap;
use std::sync::Arc;

use kafkaform_acl::{AclOperation, Grant, ResourcePattern, ResourceType};
use kafkaform_client::{AclGateway, InMemoryCluster, TopicGateway};
use kafkaform_provisioner::{Manifest, Phase, Provisioner};

const MANIFEST: &str = r#"
resources:
  - kind: Connector
    name: orders-sink
    config:
      connector.class: FileStreamSink
      topics: orders
      file: /tmp/orders.txt
  - kind: ConnectAcl
    name: workers
    principal: User:connect
    readTopics: [orders]
    enableTopicCreate: true
  - kind: Topic
    name: orders
    partitions: 3
    replicationFactor: 1
    config:
      retention.ms: "86400000"
  - kind: ConsumerAcl
    name: orders-reader
    project: orders
    principal: User:reader
    group: readers
  - kind: StreamsAcl
    name: enricher
    project: enricher
    principal: User:enricher
    readTopics: [orders]
    writeTopics: [orders-enriched]
"#;

fn manifest() -> Manifest {
    Manifest::from_yaml(MANIFEST).unwrap()
}

fn phases(report: &kafkaform_provisioner::RunReport) -> Vec<(&str, Phase)> {
    report
        .resources
        .iter()
        .map(|s| (s.name.as_str(), s.phase))
        .collect()
}

#[tokio::test]
async fn test_apply_creates_everything_in_order() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster.clone());

    let report = provisioner.apply(&manifest()).await;
    assert!(!report.has_failures(), "{report:?}");
    assert_eq!(
        phases(&report),
        vec![
            ("orders", Phase::Created),
            ("workers", Phase::Applied),
            ("orders-reader", Phase::Applied),
            ("enricher", Phase::Applied),
            ("orders-sink", Phase::Created),
        ]
    );

    // 1 read + 6 internal + create + group, 3 consumer, 2 topic + 2 prefix for streams.
    assert_eq!(report.resources[1].grants, 9);
    assert_eq!(report.resources[1].id.as_deref(), Some("connect-cluster#User:connect"));
    assert_eq!(cluster.grants().await.len(), 9 + 3 + 4);

    let again = provisioner.apply(&manifest()).await;
    assert_eq!(again.resources[0].phase, Phase::Unchanged);
    assert_eq!(again.resources[4].phase, Phase::Unchanged);
    assert_eq!(cluster.grants().await.len(), 16);
}

#[tokio::test]
async fn test_refresh_after_apply_is_in_sync() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster);
    let manifest = manifest();

    let before = provisioner.refresh(&manifest).await;
    assert!(before.resources.iter().all(|s| s.phase == Phase::Missing), "{before:?}");

    provisioner.apply(&manifest).await;
    let after = provisioner.refresh(&manifest).await;
    assert_eq!(after.count(Phase::InSync), 5, "{after:?}");
}

#[tokio::test]
async fn test_refresh_detects_out_of_band_changes() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster.clone());
    let manifest = manifest();
    provisioner.apply(&manifest).await;

    cluster
        .apply_grants(&[Grant::allow(
            ResourcePattern::literal_topic("payments"),
            "User:enricher",
            AclOperation::Write,
        )])
        .await
        .unwrap();
    cluster
        .update_topic_config(
            "orders",
            &BTreeMap::from([("retention.ms".to_string(), Some("1000".to_string()))]),
        )
        .await
        .unwrap();

    let report = provisioner.refresh(&manifest).await;
    let by_name = |name: &str| report.resources.iter().find(|s| s.name == name).unwrap();

    let topic = by_name("orders");
    assert_eq!(topic.phase, Phase::Drifted);
    assert_eq!(topic.drift[0].field, "config.retention.ms");
    assert_eq!(topic.drift[0].observed, "1000");

    // Streams read-back only looks at entities named after the project, so
    // the extra literal grant is not attributed to the intent.
    assert_eq!(by_name("enricher").phase, Phase::InSync);
}

#[tokio::test]
async fn test_refresh_reports_connect_drift() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster.clone());
    let manifest = manifest();
    provisioner.apply(&manifest).await;

    cluster
        .delete_grants_matching(&kafkaform_acl::GrantFilter {
            resource_type: Some(ResourceType::Cluster),
            ..Default::default()
        })
        .await
        .unwrap();

    let report = provisioner.refresh(&manifest).await;
    let workers = report.resources.iter().find(|s| s.name == "workers").unwrap();
    assert_eq!(workers.phase, Phase::Drifted);
    assert_eq!(workers.drift[0].field, "enableTopicCreate");
    assert_eq!(workers.message.as_deref(), Some("1 grant(s) missing"));
}

#[tokio::test]
async fn test_destroy_removes_everything() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster.clone());
    let manifest = manifest();
    provisioner.apply(&manifest).await;

    let report = provisioner.destroy(&manifest).await;
    assert!(!report.has_failures(), "{report:?}");
    assert_eq!(
        phases(&report),
        vec![
            ("orders-sink", Phase::Deleted),
            ("enricher", Phase::Deleted),
            ("orders-reader", Phase::Deleted),
            ("workers", Phase::Deleted),
            ("orders", Phase::Deleted),
        ]
    );
    assert!(cluster.grants().await.is_empty());
    assert!(cluster.list_topics("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_failure_keeps_going() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster.clone());
    cluster.fail_grants_after(5).await;

    let report = provisioner.apply(&manifest()).await;
    let workers = &report.resources[1];
    assert_eq!(workers.phase, Phase::Failed);
    assert!(workers.message.as_deref().unwrap().contains("unavailable"));

    // The grants sent before the failure stay in place.
    assert_eq!(cluster.grants().await.len(), 5);
    assert_eq!(report.resources[0].phase, Phase::Created);
    assert_eq!(report.failures().count(), 3);
}

#[tokio::test]
async fn test_connectors_need_a_connect_gateway() {
    let cluster = Arc::new(InMemoryCluster::new());
    let provisioner = Provisioner::new(cluster.clone(), cluster);

    let report = provisioner.apply(&manifest()).await;
    let sink = report.resources.iter().find(|s| s.name == "orders-sink").unwrap();
    assert_eq!(sink.phase, Phase::Failed);
    assert!(sink.message.as_deref().unwrap().contains("Kafka Connect URL"));
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_partition_decrease_fails_resource() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster);
    provisioner.apply(&manifest()).await;

    let shrunk = Manifest::from_yaml(&MANIFEST.replace("partitions: 3", "partitions: 1")).unwrap();
    let report = provisioner.apply(&shrunk).await;
    assert_eq!(report.resources[0].phase, Phase::Failed);
    assert!(report.resources[0].message.as_deref().unwrap().contains("must be replaced"));
}

#[tokio::test]
async fn test_grants_and_topics_listing() {
    let cluster = InMemoryCluster::new();
    let provisioner = Provisioner::in_memory(cluster);
    provisioner.apply(&manifest()).await;

    let entities = provisioner.grants("User:reader").await.unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].pattern, ResourcePattern::prefixed_topic("orders"));

    let topics = provisioner.topics("ord").await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].config["retention.ms"], "86400000");
}

#[tokio::test]
async fn test_status_serializes_for_output() {
    let cluster = InMemoryCluster::new();
    let report = Provisioner::in_memory(cluster).apply(&manifest()).await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["resources"][0]["kind"], "Topic");
    assert_eq!(json["resources"][0]["phase"], "Created");
    assert!(json["resources"][0].get("drift").is_none());
}
