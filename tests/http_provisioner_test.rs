use httpmock::prelude::*;
use moderation_stack::core::composition::{OUTPUT_OPENSEARCH_ENDPOINT, OUTPUT_PROXY_ADDRESS, OUTPUT_VPC_ID};
use moderation_stack::{CompositionRoot, DeployConfig, DeployError, DeploymentIdentity, HttpProvisioner};
use std::collections::HashMap;

fn composition(pairs: &[(&str, &str)]) -> moderation_stack::Composition {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = DeployConfig::from_map(&values).unwrap();
    CompositionRoot::compose(&config, &DeploymentIdentity::new("moderation-stack")).unwrap()
}

fn all_outputs() -> serde_json::Value {
    serde_json::json!({
        "outputs": {
            "vpc_id": "vpc-0abc",
            "subnet_0": "subnet-0a",
            "subnet_1": "subnet-0b",
            "security_group_0": "sg-0a",
            "domain_endpoint": "vpc-os-chat-dev-xyz.us-east-1.es.amazonaws.com",
            "domain_arn": "arn:aws:es:us-east-1:123456789012:domain/os-chat-dev",
            "public_ip": "198.51.100.20",
            "instance_id": "i-0abc",
            "bucket_name": "docuploadbucket-1234",
            "bucket_arn": "arn:aws:s3:::docuploadbucket-1234",
            "connection_name": "GlueJobConnection-1",
            "job_name": "ingest_knowledge",
            "job_arn": "arn:aws:glue:us-east-1:123456789012:job/ingest_knowledge",
            "function_name": "rag_moderator",
            "function_arn": "arn:aws:lambda:us-east-1:123456789012:function:rag_moderator",
            "unrelated": "dropped"
        }
    })
}

#[tokio::test]
async fn test_deploy_through_http_provisioner() {
    let server = MockServer::start();

    let network_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/units")
            .body_contains("\"id\":\"vpc-stack\"");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(all_outputs());
    });
    let units_mock = server.mock(|when, then| {
        when.method(POST).path("/units");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(all_outputs());
    });

    let mut composition = composition(&[("region", "us-east-1")]);
    let provisioner = HttpProvisioner::new(&server.base_url()).unwrap();
    let outputs = composition.deploy(&provisioner).await.unwrap();

    network_mock.assert();
    assert_eq!(network_mock.hits() + units_mock.hits(), composition.graph.units().len());

    assert_eq!(outputs.get(OUTPUT_VPC_ID), Some("vpc-0abc"));
    assert_eq!(
        outputs.get(OUTPUT_OPENSEARCH_ENDPOINT),
        Some("vpc-os-chat-dev-xyz.us-east-1.es.amazonaws.com")
    );
    assert_eq!(
        outputs.get(OUTPUT_PROXY_ADDRESS),
        Some("http://198.51.100.20/_dashboards/")
    );
}

#[tokio::test]
async fn test_resolved_references_are_sent_to_provisioner() {
    let server = MockServer::start();

    let moderator_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/units")
            .body_contains("\"id\":\"lambda_moderator\"")
            .body_contains("vpc-os-chat-dev-xyz.us-east-1.es.amazonaws.com")
            .body_contains("subnet-0b");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(all_outputs());
    });
    let units_mock = server.mock(|when, then| {
        when.method(POST).path("/units");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(all_outputs());
    });

    let mut composition = composition(&[("region", "us-east-1")]);
    let provisioner = HttpProvisioner::new(&server.url("/")).unwrap();
    composition.deploy(&provisioner).await.unwrap();

    moderator_mock.assert();
    assert!(units_mock.hits() > 0);
}

#[tokio::test]
async fn test_provisioner_error_is_not_retried() {
    let server = MockServer::start();

    let failing_mock = server.mock(|when, then| {
        when.method(POST).path("/units");
        then.status(500).body("quota exceeded");
    });

    let mut composition = composition(&[("region", "us-east-1"), ("aos_required", "false")]);
    let provisioner = HttpProvisioner::new(&server.base_url()).unwrap();
    let err = composition.deploy(&provisioner).await.unwrap_err();

    failing_mock.assert_hits(1);
    match err {
        DeployError::ProvisioningError { unit, message } => {
            assert_eq!(unit, "vpc-stack");
            assert!(message.contains("500"));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_declared_output_fails() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/units");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({ "outputs": { "vpc_id": "vpc-0abc" } }));
    });

    let mut composition = composition(&[("region", "us-east-1")]);
    let provisioner = HttpProvisioner::new(&server.base_url()).unwrap();
    let err = composition.deploy(&provisioner).await.unwrap_err();

    assert!(matches!(
        err,
        DeployError::MissingProvisionedOutput { ref unit, .. } if unit == "vpc-stack"
    ));
}
