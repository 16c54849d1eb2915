// =============================================================================
// EmberOS — Time Keeping
// =============================================================================

pub mod clock;
