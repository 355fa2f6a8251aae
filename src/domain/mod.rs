// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - NO ML-specific code
//   - Only plain Rust structs, enums, and traits
//
// Think of this layer as the "dictionary" of the system:
// it defines what things ARE, not how they work.

// One (error_message, recommended_action) training example
pub mod training_record;

// Inference request/response shapes and the structured error body
pub mod inference;

// Typed data-shape errors
pub mod errors;

// Core abstractions (traits) that other layers implement
pub mod traits;
