//! Integration tests for the deployment pipeline

mod common;

use common::*;
use netpilot::agent::PromptTemplate;
use netpilot::device::{InterfaceStatus, REVIEW_PROMPT_HEADER};
use netpilot::pipeline::{DeploymentRequest, PipelineFilter, PipelineType};
use netpilot::providers::ScriptedProvider;
use netpilot::types::TaskFilter;
use netpilot::{ExecutionStatus, NetError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_demo_deployment_reaches_every_device() {
    let engine = demo_engine().await;
    let ids = create_devices(&engine, &["r1", "r2", "r3"]).await;

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("harden the edge routers", ids.clone()))
        .await
        .unwrap();
    assert_eq!(handle.snapshot.status, ExecutionStatus::Pending);
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Completed);
    assert_eq!(pipeline.progress, 100);
    assert!(pipeline
        .stages
        .iter()
        .all(|s| s.status == ExecutionStatus::Completed));

    let output = pipeline.output.unwrap();
    let configuration = output["configuration"].as_str().unwrap();
    for device_id in &ids {
        let device = engine.devices().get_device(device_id).await.unwrap();
        assert_eq!(device.running_config, configuration);
        assert!(output["results"][device_id.as_str()]["success"].as_bool().unwrap());
    }
}

#[tokio::test]
async fn test_applied_interfaces_are_derived() {
    let engine = engine_with(Arc::new(network_provider(SECURE_CONFIG))).await;
    let ids = create_devices(&engine, &["edge"]).await;

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("address the uplink", ids.clone()))
        .await
        .unwrap();
    handle.wait().await.unwrap();

    let device = engine.devices().get_device(&ids[0]).await.unwrap();
    let uplink = device.interface("Gig0/1").unwrap();
    assert_eq!(uplink.address, "10.0.0.1");
    assert_eq!(uplink.mask, "255.255.255.0");
    assert_eq!(uplink.status, InterfaceStatus::Up);
    // startup only changes on save
    assert_ne!(device.startup_config, SECURE_CONFIG);
}

#[tokio::test]
async fn test_validation_issues_stop_before_any_device() {
    let engine = engine_with(Arc::new(network_provider(INSECURE_CONFIG))).await;
    let ids = create_devices(&engine, &["r1", "r2"]).await;
    let mut before = Vec::new();
    for device_id in &ids {
        before.push(engine.devices().get_config(device_id).await.unwrap());
    }

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("open telnet", ids.clone()))
        .await
        .unwrap();
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Failed);
    assert_eq!(pipeline.progress, 50);

    let testing = pipeline.stage("testing").unwrap();
    assert_eq!(testing.status, ExecutionStatus::Failed);
    let issues = testing.output.as_ref().unwrap()["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 3);
    assert!(pipeline.error.as_ref().unwrap().contains("validation failed"));

    // earlier outputs stay visible, later stages never start
    assert!(pipeline.stage("generation").unwrap().output.is_some());
    assert_eq!(
        pipeline.stage("deployment").unwrap().status,
        ExecutionStatus::Pending
    );
    for (device_id, boot) in ids.iter().zip(before) {
        assert_eq!(engine.devices().get_config(device_id).await.unwrap(), boot);
    }
}

#[tokio::test]
async fn test_one_failing_device_fails_the_deployment() {
    let engine = engine_with(Arc::new(network_provider(SECURE_CONFIG))).await;
    let mut ids = create_devices(&engine, &["r1"]).await;
    ids.push("ghost-device".to_string());

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("roll out", ids.clone()))
        .await
        .unwrap();
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Failed);
    assert!(pipeline.error.as_deref().unwrap().contains("ghost-device"));

    // per-device results survive the failure; the good device keeps its change
    let stage = pipeline.stage("deployment").unwrap();
    let results = &stage.output.as_ref().unwrap()["results"];
    assert!(results[ids[0].as_str()]["success"].as_bool().unwrap());
    assert!(!results["ghost-device"]["success"].as_bool().unwrap());
    let applied = engine.devices().get_device(&ids[0]).await.unwrap();
    assert_eq!(applied.running_config, SECURE_CONFIG);
}

#[tokio::test]
async fn test_review_rejection_fails_deployment() {
    let provider = ScriptedProvider::new(|prompt: &str| {
        if prompt.contains(REVIEW_PROMPT_HEADER) {
            Ok(json!({ "valid": false, "issues": ["change window closed"] }).to_string())
        } else if prompt.contains(PromptTemplate::ConfigurationGeneration.header()) {
            Ok(json!({ "configuration": SECURE_CONFIG }).to_string())
        } else {
            Ok(json!({ "plan": "go" }).to_string())
        }
    });
    let engine = engine_with(Arc::new(provider)).await;
    let ids = create_devices(&engine, &["r1"]).await;

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("roll out", ids.clone()))
        .await
        .unwrap();
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Failed);
    let stage = pipeline.stage("deployment").unwrap();
    let result = &stage.output.as_ref().unwrap()["results"][ids[0].as_str()];
    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("change window closed"));
}

#[tokio::test]
async fn test_provider_failure_fails_planning() {
    let engine = engine_with(Arc::new(failing_planner())).await;
    let ids = create_devices(&engine, &["r1"]).await;

    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("anything", ids))
        .await
        .unwrap();
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Failed);
    assert_eq!(pipeline.progress, 0);
    assert_eq!(
        pipeline.stage("planning").unwrap().status,
        ExecutionStatus::Failed
    );
    assert!(pipeline.error.unwrap().contains("model unavailable"));

    // the failed task is kept for audit
    let failed = engine
        .tasks()
        .list_tasks(&TaskFilter {
            status: Some(ExecutionStatus::Failed),
            ..Default::default()
        })
        .await;
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage(), Some("planning"));
}

#[tokio::test]
async fn test_unknown_first_device_fails_planning() {
    let engine = demo_engine().await;
    let handle = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("x", vec!["missing".into()]))
        .await
        .unwrap();
    let id = handle.id.clone();
    handle.wait().await.unwrap();

    let pipeline = engine.pipelines().get_pipeline(&id).await.unwrap();
    assert_eq!(pipeline.status, ExecutionStatus::Failed);
    assert!(pipeline
        .stage("planning")
        .unwrap()
        .error
        .as_deref()
        .unwrap()
        .contains("Device not found"));
}

#[tokio::test]
async fn test_misuse_fails_at_the_call() {
    let engine = demo_engine().await;
    let err = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("x", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::InvalidInput(_)));

    let err = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("  ", vec!["a".into()]))
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::InvalidInput(_)));
    assert!(engine.pipelines().get_pipeline("nope").await.is_err());
}

#[tokio::test]
async fn test_pipeline_listing() {
    let engine = demo_engine().await;
    let ids = create_devices(&engine, &["r1"]).await;

    let deploy = engine
        .pipelines()
        .create_deployment_pipeline(DeploymentRequest::new("harden", ids.clone()))
        .await
        .unwrap();
    deploy.wait().await.unwrap();
    let retrieve = engine
        .pipelines()
        .create_retrieval_pipeline(ids)
        .await
        .unwrap();
    retrieve.wait().await.unwrap();

    let all = engine.pipelines().list_pipelines(&PipelineFilter::default()).await;
    assert_eq!(all.len(), 2);
    let deployments = engine
        .pipelines()
        .list_pipelines(&PipelineFilter {
            pipeline_type: Some(PipelineType::Deployment),
            ..Default::default()
        })
        .await;
    assert_eq!(deployments.len(), 1);
    assert_terminal(deployments[0].status);
}
