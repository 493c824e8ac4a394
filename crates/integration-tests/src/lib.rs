//! Shared fixtures for the workspace-level test suites.

use std::sync::Arc;

use auth_adapters::JwtAuthProvider;
use services::Services;
use storage_adapters::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Services over a fresh in-memory store.
pub fn memory_services() -> (Services, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), Arc::new(JwtAuthProvider::new(TEST_SECRET, 1)));
    (services, store)
}
