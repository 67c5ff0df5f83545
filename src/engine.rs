use std::sync::Arc;

use crate::context::CompositeContext;
use crate::cpu::{self, CpuFeatures};
use crate::options::EngineOptions;
use crate::provider;
use crate::registry::KernelRegistry;
use crate::trace::{StderrSink, TraceSink};

/// The compositing dispatch engine: probed capabilities, option bits and the
/// kernel registry, assembled once at startup.
///
/// Construction runs the installer chain, after which the registry is frozen
/// and [`dispatch`](CompositeEngine::dispatch) may be called concurrently
/// from any number of threads.
pub struct CompositeEngine {
    options: EngineOptions,
    features: CpuFeatures,
    registry: KernelRegistry,
    sink: Arc<dyn TraceSink>,
}

/// Builder for [`CompositeEngine`]. The defaults are the production setup:
/// options from [`EngineOptions::default`], features from the host probe,
/// diagnostics on stderr.
pub struct EngineBuilder {
    options: EngineOptions,
    features: Option<CpuFeatures>,
    sink: Arc<dyn TraceSink>,
}

impl EngineBuilder {
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the probed capability set. Meant for tests and capability
    /// simulation; production engines should let the probe decide.
    pub fn features(mut self, features: CpuFeatures) -> Self {
        self.features = Some(features);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> CompositeEngine {
        let features = self.features.unwrap_or_else(cpu::probe);
        let mut engine = CompositeEngine {
            options: self.options,
            features,
            registry: KernelRegistry::new(),
            sink: self.sink,
        };
        engine.initialize();
        engine
    }
}

impl CompositeEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            options: EngineOptions::default(),
            features: None,
            sink: Arc::new(StderrSink),
        }
    }

    pub fn new(options: EngineOptions) -> CompositeEngine {
        CompositeEngine::builder().options(options).build()
    }

    /// Engine configured from the `BLENDCORE_COMPOSITE` environment
    /// override.
    pub fn from_env() -> CompositeEngine {
        CompositeEngine::new(EngineOptions::from_env())
    }

    /// Run the installer chain. Idempotent: the `INITIALISED` option bit
    /// guards re-execution, so a second call changes nothing and emits
    /// nothing.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self) {
        if self.options.initialised() {
            return;
        }
        for provider in provider::chain() {
            if !self.features.contains(provider.requires()) {
                continue;
            }
            let wrote = provider.install(&mut self.registry);
            if self.options.tracing_enabled() {
                self.sink.line(&format!(
                    "composite: installed '{}' kernels ({wrote} cells)",
                    provider.name()
                ));
            }
        }
        self.options.insert(EngineOptions::INITIALISED);
    }

    /// Resolve and invoke the kernel for the context's combination.
    ///
    /// An unsupported combination (or an engine with kernels bypassed) is a
    /// diagnosed no-op: the destination run is left untouched, one line goes
    /// to the sink, and no error is returned. Buffer geometry is the
    /// caller's obligation; it is checked by [`CompositeContext::new`], not
    /// here.
    pub fn dispatch(&self, ctx: &mut CompositeContext<'_>) {
        let entry = if self.options.kernels_enabled() {
            self.registry
                .lookup(ctx.operation, ctx.format_a, ctx.format_b, ctx.format_d)
        } else {
            None
        };
        match entry {
            Some(entry) => {
                if self.options.tracing_enabled() {
                    self.sink.line(&format!(
                        "composite: {} {}+{}->{} via '{}'",
                        ctx.operation, ctx.format_a, ctx.format_b, ctx.format_d, entry.provider
                    ));
                }
                (entry.kernel)(ctx);
            }
            None => {
                self.sink.line(&format!(
                    "composite: no kernel for {} {}+{}->{}",
                    ctx.operation, ctx.format_a, ctx.format_b, ctx.format_d
                ));
            }
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// The capability set the installer chain ran against.
    pub fn features(&self) -> CpuFeatures {
        self.features
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for CompositeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeEngine")
            .field("options", &self.options)
            .field("features", &self.features)
            .field("cells", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_marks_initialised() {
        let engine = CompositeEngine::builder()
            .features(CpuFeatures::BASELINE)
            .build();
        assert!(engine.options().initialised());
        assert!(!engine.registry().is_empty());
    }

    #[test]
    fn preinitialised_options_skip_the_chain() {
        let opts = EngineOptions::from_bits(
            EngineOptions::USE.bits() | EngineOptions::INITIALISED.bits(),
        );
        let engine = CompositeEngine::builder()
            .options(opts)
            .features(CpuFeatures::BASELINE)
            .build();
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn features_accessor_reports_the_override() {
        let engine = CompositeEngine::builder()
            .features(CpuFeatures::BASELINE)
            .build();
        assert_eq!(engine.features(), CpuFeatures::BASELINE);
    }
}
