use moderation_stack::core::composition::{
    OUTPUT_INGEST_JOB_NAME, OUTPUT_OPENSEARCH_ENDPOINT, OUTPUT_PROXY_ADDRESS, OUTPUT_RAG_JOB_NAME,
    OUTPUT_UPLOAD_BUCKET,
};
use moderation_stack::domain::model::{UnitId, UnitKind};
use moderation_stack::{
    CompositionRoot, DeployConfig, DeployError, DeploymentIdentity, EndpointMode, SimulatedProvisioner,
};
use std::collections::HashMap;

fn config(pairs: &[(&str, &str)]) -> DeployConfig {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    DeployConfig::from_map(&values).unwrap()
}

fn identity() -> DeploymentIdentity {
    DeploymentIdentity::new("moderation-stack")
}

#[tokio::test]
async fn test_disabled_search_forwards_endpoint_verbatim() {
    for endpoint in ["", "optional", "http://external:9200", "search.internal"] {
        let mut composition = CompositionRoot::compose(
            &config(&[
                ("region", "us-east-1"),
                ("aos_required", "false"),
                ("aos_existing_endpoint", endpoint),
            ]),
            &identity(),
        )
        .unwrap();

        assert!(composition.graph.units_of_kind(UnitKind::SearchCluster).is_empty());
        assert!(composition.graph.units_of_kind(UnitKind::Proxy).is_empty());

        let provisioner = SimulatedProvisioner::new("us-east-1");
        let outputs = composition.deploy(&provisioner).await.unwrap();
        assert_eq!(outputs.get(OUTPUT_OPENSEARCH_ENDPOINT), Some(endpoint));
        assert!(!outputs.contains(OUTPUT_PROXY_ADDRESS));
    }
}

#[tokio::test]
async fn test_placeholder_endpoint_creates_cluster() {
    for endpoint in ["", "optional"] {
        let mut composition = CompositionRoot::compose(
            &config(&[("region", "us-east-1"), ("aos_existing_endpoint", endpoint)]),
            &identity(),
        )
        .unwrap();

        assert_eq!(composition.endpoint_mode, EndpointMode::CreateNew);
        assert_eq!(composition.graph.units_of_kind(UnitKind::SearchCluster).len(), 1);

        let outputs = composition
            .deploy(&SimulatedProvisioner::new("us-east-1"))
            .await
            .unwrap();
        let published = outputs.get(OUTPUT_OPENSEARCH_ENDPOINT).unwrap();
        assert_ne!(published, endpoint);
        assert!(published.ends_with(".us-east-1.es.amazonaws.com"));

        let cluster = composition
            .graph
            .unit(&UnitId::new("os-chat-dev"))
            .unwrap();
        assert_eq!(cluster.resolved_output("domain_endpoint"), Some(published));
    }
}

#[tokio::test]
async fn test_existing_endpoint_skips_cluster_but_keeps_proxy() {
    let mut composition = CompositionRoot::compose(
        &config(&[
            ("region", "us-east-1"),
            ("aos_required", "true"),
            ("aos_existing_endpoint", "vpc-shared.us-east-1.es.amazonaws.com"),
        ]),
        &identity(),
    )
    .unwrap();

    assert!(composition.graph.units_of_kind(UnitKind::SearchCluster).is_empty());
    let proxies = composition.graph.units_of_kind(UnitKind::Proxy);
    assert_eq!(proxies.len(), 1);

    let user_data = proxies[0].property("user_data").unwrap().template();
    let lines: Vec<&str> = user_data
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|l| l.as_str())
        .collect();
    assert!(lines.contains(&"ENDPOINT=vpc-shared.us-east-1.es.amazonaws.com"));
    assert!(!lines.iter().any(|l| l.contains("os-chat-dev")));

    let outputs = composition
        .deploy(&SimulatedProvisioner::new("us-east-1"))
        .await
        .unwrap();
    assert_eq!(
        outputs.get(OUTPUT_OPENSEARCH_ENDPOINT),
        Some("vpc-shared.us-east-1.es.amazonaws.com")
    );
    assert!(outputs.contains(OUTPUT_PROXY_ADDRESS));
}

#[tokio::test]
async fn test_network_is_materialized_first() {
    for pairs in [
        vec![("region", "us-east-1")],
        vec![("region", "us-east-1"), ("aos_required", "false")],
        vec![("region", "us-east-1"), ("aos_existing_endpoint", "search.internal")],
        vec![("region", "us-east-1"), ("RAG_JOB_ENABLED", "true")],
    ] {
        let mut composition = CompositionRoot::compose(&config(&pairs), &identity()).unwrap();
        let provisioner = SimulatedProvisioner::new("us-east-1");
        composition.deploy(&provisioner).await.unwrap();

        let provisioned = provisioner.provisioned();
        assert_eq!(provisioned[0].as_str(), "vpc-stack");
        assert_eq!(provisioned.len(), composition.graph.units().len());
    }
}

#[test]
fn test_batch_jobs_never_retry() {
    for pairs in [
        vec![("region", "us-east-1")],
        vec![("region", "eu-west-1"), ("RAG_JOB_ENABLED", "true"), ("aos_required", "false")],
    ] {
        let composition = CompositionRoot::compose(&config(&pairs), &identity()).unwrap();
        let jobs = composition.graph.units_of_kind(UnitKind::BatchJob);
        assert!(!jobs.is_empty());

        for job in jobs {
            assert_eq!(
                job.property("max_retries").map(|p| p.template()),
                Some(serde_json::json!(0))
            );
            assert_eq!(
                job.property("max_concurrent_runs").map(|p| p.template()),
                Some(serde_json::json!(100))
            );
        }
    }
}

#[tokio::test]
async fn test_end_to_end_with_new_cluster() {
    let mut composition = CompositionRoot::compose(
        &config(&[
            ("region", "us-east-1"),
            ("aos_required", "true"),
            ("aos_existing_endpoint", ""),
            ("UPLOAD_BUCKET", "my-bucket"),
        ]),
        &identity(),
    )
    .unwrap();

    let outputs = composition
        .deploy(&SimulatedProvisioner::new("us-east-1"))
        .await
        .unwrap();

    assert!(!outputs.get(OUTPUT_OPENSEARCH_ENDPOINT).unwrap().is_empty());
    assert_eq!(outputs.get(OUTPUT_UPLOAD_BUCKET), Some("my-bucket"));
    assert_eq!(outputs.get(OUTPUT_INGEST_JOB_NAME), Some("ingest_knowledge"));
    assert!(!outputs.contains(OUTPUT_RAG_JOB_NAME));

    let address = outputs.get(OUTPUT_PROXY_ADDRESS).unwrap();
    let ip = address
        .strip_prefix("http://")
        .and_then(|rest| rest.strip_suffix("/_dashboards/"))
        .unwrap();
    assert!(ip.parse::<std::net::Ipv4Addr>().is_ok());
}

#[tokio::test]
async fn test_end_to_end_with_search_disabled() {
    let identity = identity().with_default_region("us-east-1");
    let mut composition = CompositionRoot::compose(
        &config(&[
            ("aos_required", "false"),
            ("aos_existing_endpoint", "http://external:9200"),
        ]),
        &identity,
    )
    .unwrap();

    let outputs = composition
        .deploy(&SimulatedProvisioner::new("us-east-1"))
        .await
        .unwrap();

    assert!(!outputs.contains(OUTPUT_PROXY_ADDRESS));
    assert_eq!(outputs.get(OUTPUT_OPENSEARCH_ENDPOINT), Some("http://external:9200"));
}

#[tokio::test]
async fn test_provisioning_failure_aborts_deployment() {
    let mut composition =
        CompositionRoot::compose(&config(&[("region", "us-east-1")]), &identity()).unwrap();
    let provisioner = SimulatedProvisioner::new("us-east-1").failing_on("DocUploadBucket");

    let err = composition.deploy(&provisioner).await.unwrap_err();
    assert!(matches!(err, DeployError::ProvisioningError { ref unit, .. } if unit == "DocUploadBucket"));
    assert!(!provisioner
        .provisioned()
        .iter()
        .any(|id| id.as_str() == "lambda_moderator"));

    // 失敗後不能重新實體化同一張圖
    let retry = composition.deploy(&SimulatedProvisioner::new("us-east-1")).await;
    assert!(matches!(retry, Err(DeployError::AlreadyMaterialized { .. })));
}

#[tokio::test]
async fn test_rag_job_is_published_when_enabled() {
    let mut composition = CompositionRoot::compose(
        &config(&[("region", "us-east-1"), ("RAG_JOB_ENABLED", "true")]),
        &identity(),
    )
    .unwrap();

    let outputs = composition
        .deploy(&SimulatedProvisioner::new("us-east-1"))
        .await
        .unwrap();
    assert_eq!(outputs.get(OUTPUT_RAG_JOB_NAME), Some("rag_based_translate"));
}
