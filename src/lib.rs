//! Blendcore selects and invokes, at runtime, the fastest available
//! implementation of a pixel compositing operation for a given triple of
//! pixel-buffer formats.
//!
//! The flow is deliberately small:
//!
//! - Build a [`CompositeEngine`] once at startup. It probes host CPU
//!   capabilities and runs the installer chain, populating the kernel
//!   registry (portable baseline first, then capability-gated refinements).
//! - Describe each pixel run with a [`CompositeContext`].
//! - Call [`CompositeEngine::dispatch`] per run. The registry is frozen
//!   after initialization, so dispatch is freely concurrent.
//!
//! Buffers are caller-owned slices; the engine never allocates or retains
//! pixel memory.
#![deny(unsafe_code)]

pub mod context;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod format;
mod kernels;
pub mod operation;
pub mod options;
pub mod provider;
pub mod registry;
pub mod trace;

pub use context::CompositeContext;
pub use cpu::CpuFeatures;
pub use engine::{CompositeEngine, EngineBuilder};
pub use error::{BlendError, BlendResult};
pub use format::PixelFormat;
pub use operation::{CompositeOperation, OperationEffects};
pub use options::EngineOptions;
pub use provider::KernelProvider;
pub use registry::{Kernel, KernelEntry, KernelRegistry};
pub use trace::{StderrSink, TraceSink, TracingSink};
