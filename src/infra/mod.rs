// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all I/O that doesn't belong in a business layer:
//
//   artifact.rs           Saving and loading the model artifact
//                          (Burn gzipped MessagePack weights plus the
//                          pipeline JSON)
//
//   metrics.rs            Per-iteration training metrics CSV
//
//   object_store.rs       Bucket/key storage on the filesystem
//
//   endpoint_registry.rs  Endpoint name → URL lookup file
//
//   endpoint_server.rs    axum HTTP server hosting a predictor
//
//   endpoint_client.rs    reqwest client for that server
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model artifact saving and loading
pub mod artifact;

/// Training metrics CSV logger
pub mod metrics;

/// Filesystem-backed object storage
pub mod object_store;

/// Deployed endpoint lookup
pub mod endpoint_registry;

/// HTTP hosting runtime
pub mod endpoint_server;

/// HTTP invocation client
pub mod endpoint_client;
