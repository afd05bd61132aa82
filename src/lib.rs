//! One-shot, listener-based futures and future groups.
//!
//! Unlike [`std::future::Future`], the [`Future`] in this crate is never
//! polled. It is a completion cell: it starts pending, is resolved exactly
//! once to success, error or cancel, and delivers the outcome by invoking
//! registered listeners. A listener registered after the future has already
//! completed fires immediately, during registration, so observers never have
//! to care whether they arrived early or late.
//!
//! A [`FutureGroup`] aggregates many futures into one combined completion
//! signal. The group only dispatches its own listeners once it is *ready*,
//! which happens either explicitly through [`FutureGroup::mark_ready`] or
//! automatically after a quiet period with no further additions (a debounce
//! window, 250 ms by default). The window exists so that a member completing
//! synchronously does not make the group report completion before the caller
//! has finished adding members.
//!
//! # Examples
//!
//! ```
//! use future_group::{Future, FutureGroup};
//!
//! let group = FutureGroup::new();
//! group.disable_auto_ready();
//!
//! let first = group.new_future().unwrap();
//! let second = group.new_future().unwrap();
//! group.add_success_listener(|group| {
//!     println!("all {} members succeeded", group.futures().len());
//! });
//! group.mark_ready();
//!
//! first.succeed().unwrap();
//! second.succeed().unwrap();
//! assert!(group.is_success());
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub use error::{GroupReady, IllegalTransition};
pub use fault::Fault;
pub use future::{Future, FutureId, State};
pub use group::{FutureGroup, GroupId, Member};

pub mod future;
pub mod group;

mod error;
mod fault;
mod listeners;
