// =============================================================================
// EmberOS — Synchronization Primitives
// =============================================================================

pub mod spinlock;
