use std::sync::atomic::{AtomicBool, Ordering};

/// Global readiness flag, set once every configured resource has been loaded.
///
/// The readiness probe endpoint reports on this flag.
static RESOURCES_LOADED: AtomicBool = AtomicBool::new(false);

/// Mark the service as ready after the resource stores have been seeded.
pub fn mark_ready(resource_count: usize) {
    RESOURCES_LOADED.store(true, Ordering::SeqCst);
    log::info!("{resource_count} resource(s) loaded, service is ready");
}

/// Check if the service is ready to handle traffic.
pub fn is_ready() -> bool {
    RESOURCES_LOADED.load(Ordering::SeqCst)
}

/// Reset readiness status (useful for testing)
#[allow(dead_code)]
pub fn reset() {
    RESOURCES_LOADED.store(false, Ordering::SeqCst);
    log::debug!("Readiness status reset");
}
