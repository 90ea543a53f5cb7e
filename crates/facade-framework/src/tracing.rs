//! # Observability & Tracing
//!
//! The registry and the service modules log through `tracing`; this module installs the
//! subscriber once per process.
//!
//! ## What Gets Traced
//!
//! - **Registration**: every `Registered` / `Discarded` entry at `info`, duplicates at `warn`
//! - **Lookups**: `Facade not found` at `debug` (an unknown facade is a client mistake, not a defect)
//! - **Dispatch**: the server's `dispatch` span with `name`, `version` and request `id` fields
//! - **Facade methods**: one span per call, named after the method
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run      # registrations and dispatches
//! RUST_LOG=debug cargo run     # plus lookups and method arguments
//! RUST_LOG=facade_framework=debug,info cargo run
//! ```
//!
//! With `RUST_LOG=info` a startup looks like:
//!
//! ```text
//! INFO Registered key=Block(2) facade_type="BlockApi" size=1
//! INFO Registered key=MigrationMaster(1) facade_type="MigrationMasterApiV1" size=2
//! INFO Discarded key=Block(2)
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once, at the top of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
