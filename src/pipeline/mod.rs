//! Pipeline stages for batch PDF-to-image conversion.
//!
//! Each submodule implements one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ task ──▶ process ──▶ discover ──▶ aggregate
//! (no I/O)    (args)    (gs child)  (list dir)   (merge, first error)
//! ```
//!
//! 1. [`validate`] checks every input exists and is a PDF before anything
//!    is written.
//! 2. [`task`] owns the per-file output layout and the renderer arguments.
//! 3. [`process`] spawns the renderer and kills it when the scope ends.
//! 4. [`discover`] finds the numbered images the renderer produced.
//! 5. [`aggregate`] merges per-file results under one lock.

pub mod aggregate;
pub mod discover;
pub mod process;
pub mod task;
pub mod validate;
