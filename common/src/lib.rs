//! Shared plumbing for the getting-started samples: a Win32 window host, a
//! Direct3D 11 device with its swap chain and render target, the per-frame
//! renderer and the driver that strings them together.
//!
//! Only the Win32 and Direct3D bindings are Windows specific. The message
//! model, the device lifecycle and the driver state machine are platform
//! neutral so they can be exercised with fakes.

pub mod config;
pub mod driver;
pub mod error;
pub mod gfx;
pub mod os;
pub mod util;
