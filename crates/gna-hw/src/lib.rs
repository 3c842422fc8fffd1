//! Silicon model for the GNA fixed-function neural-network accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**; it is a
//! pure model of the silicon: hardware generations, the narrow-memory
//! capacity table (errata-versioned), and datapath constants governing
//! kernel-working-group sizing and micro-threading.
//!
//! Everything here is sourced from the hardware errata sheets for the
//! respective generations; none of it is derived by formula at runtime.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`generation`] | Totally ordered hardware generation identifiers |
//! | [`narrow_mem`] | Narrow-memory capacity table (2 KiB minus reserved overheads) |
//! | [`engine`] | Compute-engine counts, KWG limits, micro-thread valid set |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod generation;
pub mod narrow_mem;

pub use generation::Generation;
