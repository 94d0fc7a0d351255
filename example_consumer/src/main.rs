//! Example consumer: a separate Rust project that uses resource-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `RESOURCE_SDK_SCHEMA=schema.json cargo run`

use resource_sdk::service::{BroadcastEmitter, EmitterRegistry};
use resource_sdk::{
    app, load_schema_file, telemetry, AppState, EntityRegistry, InMemoryRepository, Settings, SpecCache,
    Synthesizer,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    let settings = Settings::from_env()?;

    let catalog = Arc::new(load_schema_file(&settings.schema_path)?);

    let report = Synthesizer::new(&catalog).run();
    for (type_name, err) in &report.errors {
        tracing::error!(type_name = %type_name, error = %err, "resource not synthesized");
    }
    if let Some(dir) = &settings.artifacts_dir {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("artifacts.json");
        tokio::fs::write(&path, serde_json::to_vec_pretty(&report)?).await?;
        tracing::info!(path = %path.display(), artifacts = report.artifacts.len(), "artifacts written");
    }

    // One table per resource type the registry will serve.
    let served = EntityRegistry::init(&catalog, &SpecCache::new(), &settings.scan_packages)?;
    let repository = InMemoryRepository::new(served.all().iter().map(|e| e.record_type.name.clone()));

    let events = BroadcastEmitter::default();
    let mut feed = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = feed.recv().await {
            tracing::info!(kind = %event.kind, resource = %event.resource, id = ?event.id, "entity event");
        }
    });

    let state = AppState::build(
        catalog,
        Arc::new(repository),
        EmitterRegistry::new(events),
        &settings.scan_packages,
        settings.tokens.clone(),
    )?;
    let router = app(state, settings.body_limit);

    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
