// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer strings the other layers together into the
// workflows the CLI exposes.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Storage and HTTP only through Layer 6 types
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Hosting entry points: load, decode, predict, encode
pub mod handler;

// CSV in storage → parallel columns
pub mod prepare_data;

// The training entry point
pub mod train_use_case;

// Training in a private job directory
pub mod training_job;

// Prepare → upload → train → deploy → smoke test
pub mod deploy_use_case;

// Client of a deployed endpoint
pub mod invoke_use_case;
