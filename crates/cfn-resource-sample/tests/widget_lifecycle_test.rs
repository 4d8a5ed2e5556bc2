use cfn_resource::mock::{MockInvocationContext, RecordingTransport, TestEvent};
use cfn_resource::{
    ClientCache, EngineConfig, LifecycleEngine, Operation, ResourceTypeSpec,
};
use cfn_resource_sample::logs::{CachedLogCleanup, LogsClient, SampleClientFactory};
use cfn_resource_sample::widget::{WidgetRegistry, WidgetResource};
use serde_json::{json, Value};
use std::sync::Arc;

const CALLBACK: &str = "https://callback.example/presigned";

fn engine(
    registry: &WidgetRegistry,
    transport: &RecordingTransport,
) -> LifecycleEngine<WidgetResource> {
    LifecycleEngine::new(
        WidgetResource::new(registry.clone()),
        ResourceTypeSpec::single("Widget"),
    )
    .with_transport(Arc::new(transport.clone()))
}

fn last_response(transport: &RecordingTransport) -> Value {
    let deliveries = transport.deliveries();
    let last = deliveries.last().expect("at least one delivery");
    serde_json::from_str(&last.body).unwrap()
}

#[tokio::test]
async fn full_create_update_delete_cycle() {
    let registry: WidgetRegistry = Arc::default();
    let transport = RecordingTransport::new();
    let ctx = MockInvocationContext::default();

    // Create
    let event = TestEvent::new(Operation::Create, "Widget", json!({"Name": "w"}), CALLBACK)
        .build()
        .unwrap();
    engine(&registry, &transport).handle(event, &ctx).await;

    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("SUCCESS"));
    assert_eq!(response["Data"], json!({"Arn": "arn:example:widget:::w"}));
    let physical_id = response["PhysicalResourceId"].as_str().unwrap().to_string();
    assert!(!physical_id.is_empty());
    assert_eq!(registry.lock().unwrap().len(), 1);

    // Update
    let event = TestEvent::new(Operation::Update, "Widget", json!({"Name": "w2"}), CALLBACK)
        .physical_resource_id(&physical_id)
        .old_properties(json!({"Name": "w"}))
        .build()
        .unwrap();
    engine(&registry, &transport).handle(event, &ctx).await;

    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("SUCCESS"));
    assert_eq!(
        registry.lock().unwrap().get(&physical_id),
        Some(&"w2".to_string())
    );

    // Delete
    let event = TestEvent::new(Operation::Delete, "Widget", json!({}), CALLBACK)
        .physical_resource_id(&physical_id)
        .build()
        .unwrap();
    engine(&registry, &transport).handle(event, &ctx).await;

    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("SUCCESS"));
    assert!(registry.lock().unwrap().is_empty());
    assert_eq!(transport.deliveries().len(), 3);
}

#[tokio::test]
async fn create_without_the_required_property_fails() {
    let registry: WidgetRegistry = Arc::default();
    let transport = RecordingTransport::new();

    // validate() returns false here, which is deliberately not enforced;
    // the failure comes from the create operation itself.
    let event = TestEvent::new(Operation::Create, "Widget", json!({}), CALLBACK)
        .build()
        .unwrap();
    engine(&registry, &transport)
        .handle(event, &MockInvocationContext::default())
        .await;

    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("FAILED"));
    assert!(response["Reason"]
        .as_str()
        .unwrap()
        .contains("missing required property Name"));
    assert!(registry.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_event_without_physical_id_never_reaches_the_engine() {
    let err = TestEvent::new(Operation::Update, "Widget", json!({"Name": "w"}), CALLBACK)
        .old_properties(json!({}))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("physical resource id not set"));
}

#[tokio::test]
async fn delete_of_an_unknown_widget_is_masked_by_default() {
    let registry: WidgetRegistry = Arc::default();
    let transport = RecordingTransport::new();

    let event = TestEvent::new(Operation::Delete, "Widget", json!({}), CALLBACK)
        .physical_resource_id("never-created")
        .build()
        .unwrap();
    engine(&registry, &transport)
        .handle(event, &MockInvocationContext::default())
        .await;

    // The operation failed, but hide_delete_failure (on by default)
    // reports SUCCESS so the owning stack is not stuck.
    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("SUCCESS"));
}

#[tokio::test]
async fn successful_delete_cleans_up_logs_through_the_cache() {
    let registry: WidgetRegistry = Arc::default();
    registry
        .lock()
        .unwrap()
        .insert("widget-1".to_string(), "w".to_string());
    let transport = RecordingTransport::new();
    let cache = Arc::new(ClientCache::new(Arc::new(SampleClientFactory)));
    let ctx = MockInvocationContext::default();

    let mut engine = LifecycleEngine::new(
        WidgetResource::new(registry.clone()),
        ResourceTypeSpec::single("Widget"),
    )
    .with_config(EngineConfig {
        delete_logs_on_stack_deletion: true,
        ..EngineConfig::default()
    })
    .with_transport(Arc::new(transport.clone()))
    .with_log_cleanup(Arc::new(CachedLogCleanup::new(cache.clone())));

    let event = TestEvent::new(Operation::Delete, "Widget", json!({}), CALLBACK)
        .physical_resource_id("widget-1")
        .build()
        .unwrap();
    engine.handle(event, &ctx).await;

    let response = last_response(&transport);
    assert_eq!(response["Status"], json!("SUCCESS"));
    let logs = cache.get_as::<LogsClient>("logs").unwrap();
    assert_eq!(logs.deleted_groups(), vec![ctx.log_group_name.clone()]);
}
