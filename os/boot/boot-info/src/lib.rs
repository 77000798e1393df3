//! # Static Boot Configuration
//!
//! Compile-time facts shared by the loader, its build script and the
//! hand-off sequencer.
//!
//! ## Overview
//!
//! Nothing in this crate is discovered at run time. The supported platforms
//! are a closed set ([`ArchType`]); every platform carries a fixed
//! [`PlatformLayout`] (where the payloads go, which regions are zeroed and
//! when) and a fixed [`HandoffConvention`] (how the payload entry point is
//! called).
//!
//! ```text
//!                 ┌───────────────────────┐
//!  ArchType ──────┤ layout()              ├──► PlatformLayout
//!                 │ handoff_convention()  ├──► HandoffConvention
//!                 └───────────────────────┘
//! ```
//!
//! ## Build Integration
//!
//! The loader's `build.rs` depends on this crate to validate the layout of
//! the platform it is building for before any payload is embedded.
//!
//! ```rust
//! use boot_info::ArchType;
//!
//! for arch in ArchType::ALL {
//!     let layout = arch.layout();
//!     assert!(layout.hypervisor_load.is_aligned(0x1000));
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod arch;
pub mod handoff;
pub mod layout;
pub mod payload;

pub use arch::ArchType;
pub use handoff::{HandoffConvention, HandoffParams};
pub use layout::{ClearPhase, PlatformLayout};
pub use payload::{OptionalPolicy, Payload, PayloadFormat, PayloadRole};
