// =============================================================================
// EmberOS — Boot-Critical Drivers
// =============================================================================
//
//   vga.rs      — memory-mapped text-mode console with scrolling
//   keyboard.rs — polled PS/2 scancode input
// =============================================================================

pub mod keyboard;
pub mod vga;
