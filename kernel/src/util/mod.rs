// =============================================================================
// EmberOS — Kernel Utilities
// =============================================================================
//
//   logger.rs — kprint!/kprintln! and the `log` facade backend
//   panic.rs  — panic handler for the bare-metal image
// =============================================================================

pub mod logger;
pub mod panic;
