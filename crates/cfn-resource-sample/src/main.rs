//! Drives the widget resource through a full create / update / delete
//! cycle against a recording transport, printing the response bodies the
//! control plane would have received.

use cfn_resource::mock::{MockInvocationContext, RecordingTransport, TestEvent};
use cfn_resource::tracing::setup_tracing;
use cfn_resource::{
    ClientCache, EngineConfig, LifecycleEngine, Operation, ResourceTypeSpec,
};
use cfn_resource_sample::logs::{CachedLogCleanup, SampleClientFactory};
use cfn_resource_sample::widget::{WidgetRegistry, WidgetResource};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const CALLBACK: &str = "https://callback.example/presigned";

fn engine(
    registry: &WidgetRegistry,
    transport: &RecordingTransport,
    cache: &Arc<ClientCache>,
) -> LifecycleEngine<WidgetResource> {
    LifecycleEngine::new(
        WidgetResource::new(registry.clone()),
        ResourceTypeSpec::single("Widget"),
    )
    .with_config(EngineConfig {
        delete_logs_on_stack_deletion: true,
        ..EngineConfig::default()
    })
    .with_transport(Arc::new(transport.clone()))
    .with_log_cleanup(Arc::new(CachedLogCleanup::new(cache.clone())))
}

fn physical_id_of(transport: &RecordingTransport) -> String {
    let last = transport.deliveries().pop().expect("a delivery");
    let body: Value = serde_json::from_str(&last.body).expect("valid response body");
    info!(response = %last.body, "control plane would receive");
    body["PhysicalResourceId"]
        .as_str()
        .expect("a physical id")
        .to_string()
}

#[tokio::main]
async fn main() {
    setup_tracing();

    let registry: WidgetRegistry = Arc::default();
    let transport = RecordingTransport::new();
    let cache = Arc::new(ClientCache::new(Arc::new(SampleClientFactory)));
    let ctx = MockInvocationContext::default();

    // Create
    let event = TestEvent::new(
        Operation::Create,
        "Widget",
        json!({"Name": "demo-widget"}),
        CALLBACK,
    )
    .build()
    .expect("well-formed create event");
    engine(&registry, &transport, &cache).handle(event, &ctx).await;
    let physical_id = physical_id_of(&transport);

    // Update
    let event = TestEvent::new(
        Operation::Update,
        "Widget",
        json!({"Name": "demo-widget-v2"}),
        CALLBACK,
    )
    .physical_resource_id(&physical_id)
    .old_properties(json!({"Name": "demo-widget"}))
    .build()
    .expect("well-formed update event");
    engine(&registry, &transport, &cache).handle(event, &ctx).await;
    physical_id_of(&transport);

    // Delete
    let event = TestEvent::new(Operation::Delete, "Widget", json!({}), CALLBACK)
        .physical_resource_id(&physical_id)
        .build()
        .expect("well-formed delete event");
    engine(&registry, &transport, &cache).handle(event, &ctx).await;
    physical_id_of(&transport);

    info!(
        remaining = registry.lock().expect("registry lock").len(),
        "widgets left in registry"
    );
}
