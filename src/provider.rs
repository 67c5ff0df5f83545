//! The installer chain: registration units that populate the kernel
//! registry, in fixed priority order from least to most specialized.

use crate::cpu::CpuFeatures;
use crate::format::PixelFormat as Px;
use crate::kernels::generic;
use crate::operation::CompositeOperation as Op;
use crate::registry::{Kernel, KernelRegistry};

/// A registration unit: writes kernels for the combinations it supports.
///
/// Providers are monotonic refinements. A provider may replace a cell an
/// earlier provider wrote, with a faster kernel producing identical bytes;
/// it must never leave a previously filled cell empty.
pub trait KernelProvider {
    /// Diagnostic name; also recorded in every cell the provider writes.
    fn name(&self) -> &'static str;

    /// Capability bits that must all be present for the provider to run.
    fn requires(&self) -> CpuFeatures;

    /// Write kernels into the registry; returns the number of cells written.
    fn install(&self, registry: &mut KernelRegistry) -> usize;
}

/// The fixed chain for the running architecture. The generic provider comes
/// first and is the correctness baseline; everything after it refines.
pub fn chain() -> Vec<Box<dyn KernelProvider>> {
    let mut providers: Vec<Box<dyn KernelProvider>> = vec![Box::new(GenericProvider)];
    #[cfg(target_arch = "x86_64")]
    {
        providers.push(Box::new(x86::Sse2Provider));
        providers.push(Box::new(x86::Avx2Provider));
    }
    #[cfg(target_arch = "aarch64")]
    providers.push(Box::new(neon::NeonProvider));
    providers
}

/// Portable kernels for every combination the engine claims to support.
pub struct GenericProvider;

/// Every operation, on rgba8 runs.
const RGBA8_CELLS: &[(Op, Kernel)] = &[
    (Op::Normal, generic::normal),
    (Op::Dissolve, generic::dissolve),
    (Op::Behind, generic::behind),
    (Op::Multiply, generic::multiply),
    (Op::Screen, generic::screen),
    (Op::Overlay, generic::overlay),
    (Op::Difference, generic::difference),
    (Op::Addition, generic::addition),
    (Op::Subtract, generic::subtract),
    (Op::DarkenOnly, generic::darken_only),
    (Op::LightenOnly, generic::lighten_only),
    (Op::Hue, generic::hue),
    (Op::Saturation, generic::saturation),
    (Op::Color, generic::color),
    (Op::Value, generic::value),
    (Op::Divide, generic::divide),
    (Op::Dodge, generic::dodge),
    (Op::Burn, generic::burn),
    (Op::HardLight, generic::hard_light),
    (Op::SoftLight, generic::soft_light),
    (Op::GrainExtract, generic::grain_extract),
    (Op::GrainMerge, generic::grain_merge),
    (Op::ColorErase, generic::color_erase),
    (Op::Erase, generic::erase),
    (Op::Replace, generic::replace),
    (Op::AntiErase, generic::anti_erase),
    (Op::Blend, generic::blend),
    (Op::Shade, generic::shade),
    (Op::Xor, generic::xor),
];

/// Channel and alpha operations that make sense on value+alpha runs.
const VA8_CELLS: &[(Op, Kernel)] = &[
    (Op::Normal, generic::normal),
    (Op::Behind, generic::behind),
    (Op::Dissolve, generic::dissolve),
    (Op::Multiply, generic::multiply),
    (Op::Screen, generic::screen),
    (Op::Overlay, generic::overlay),
    (Op::Difference, generic::difference),
    (Op::Addition, generic::addition),
    (Op::Subtract, generic::subtract),
    (Op::DarkenOnly, generic::darken_only),
    (Op::LightenOnly, generic::lighten_only),
    (Op::Divide, generic::divide),
    (Op::Dodge, generic::dodge),
    (Op::Burn, generic::burn),
    (Op::HardLight, generic::hard_light),
    (Op::SoftLight, generic::soft_light),
    (Op::GrainExtract, generic::grain_extract),
    (Op::GrainMerge, generic::grain_merge),
    (Op::Erase, generic::erase),
    (Op::AntiErase, generic::anti_erase),
    (Op::Replace, generic::replace),
    (Op::Blend, generic::blend),
    (Op::Xor, generic::xor),
];

/// Channel operations for the alpha-free layouts (v8 and rgb8 runs).
const OPAQUE_CELLS: &[(Op, Kernel)] = &[
    (Op::Multiply, generic::multiply),
    (Op::Screen, generic::screen),
    (Op::Overlay, generic::overlay),
    (Op::Difference, generic::difference),
    (Op::Addition, generic::addition),
    (Op::Subtract, generic::subtract),
    (Op::DarkenOnly, generic::darken_only),
    (Op::LightenOnly, generic::lighten_only),
    (Op::Divide, generic::divide),
    (Op::Dodge, generic::dodge),
    (Op::Burn, generic::burn),
    (Op::HardLight, generic::hard_light),
    (Op::SoftLight, generic::soft_light),
    (Op::GrainExtract, generic::grain_extract),
    (Op::GrainMerge, generic::grain_merge),
    (Op::Replace, generic::replace),
    (Op::Blend, generic::blend),
    (Op::Shade, generic::shade),
    (Op::Xor, generic::xor),
];

/// Format conversions, keyed `(source, Any, destination)`.
const CONVERT_CELLS: &[(Px, Px, Kernel)] = &[
    (Px::V8, Px::Va8, generic::convert_v8_va8),
    (Px::V8, Px::Rgb8, generic::convert_v8_rgb8),
    (Px::V8, Px::Rgba8, generic::convert_v8_rgba8),
    (Px::Va8, Px::V8, generic::convert_va8_v8),
    (Px::Va8, Px::Rgba8, generic::convert_va8_rgba8),
    (Px::Rgb8, Px::V8, generic::convert_rgb8_v8),
    (Px::Rgb8, Px::Rgba8, generic::convert_rgb8_rgba8),
    (Px::Rgba8, Px::V8, generic::convert_rgba8_v8),
    (Px::Rgba8, Px::Va8, generic::convert_rgba8_va8),
    (Px::Rgba8, Px::Rgb8, generic::convert_rgba8_rgb8),
    (Px::V8, Px::V8, generic::convert_copy),
    (Px::Va8, Px::Va8, generic::convert_copy),
    (Px::Rgb8, Px::Rgb8, generic::convert_copy),
    (Px::Rgba8, Px::Rgba8, generic::convert_copy),
];

impl KernelProvider for GenericProvider {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn requires(&self) -> CpuFeatures {
        CpuFeatures::BASELINE
    }

    fn install(&self, registry: &mut KernelRegistry) -> usize {
        let name = self.name();
        let mut wrote = 0;

        for &(op, kernel) in RGBA8_CELLS {
            registry.install(op, Px::Rgba8, Px::Rgba8, Px::Rgba8, kernel, name);
            wrote += 1;
        }
        for &(op, kernel) in VA8_CELLS {
            registry.install(op, Px::Va8, Px::Va8, Px::Va8, kernel, name);
            wrote += 1;
        }
        for format in [Px::V8, Px::Rgb8] {
            for &(op, kernel) in OPAQUE_CELLS {
                registry.install(op, format, format, format, kernel, name);
                wrote += 1;
            }
        }
        for &(src, dst, kernel) in CONVERT_CELLS {
            registry.install(Op::Convert, src, Px::Any, dst, kernel, name);
            wrote += 1;
        }
        registry.install(Op::Swap, Px::Any, Px::Any, Px::Any, generic::swap, name);
        registry.install(Op::Scale, Px::Any, Px::Any, Px::Any, generic::scale, name);
        wrote + 2
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::*;
    use crate::kernels::x86 as kernels;

    fn install_rgba8(registry: &mut KernelRegistry, cells: &[(Op, Kernel)], name: &'static str) -> usize {
        for &(op, kernel) in cells {
            registry.install(op, Px::Rgba8, Px::Rgba8, Px::Rgba8, kernel, name);
        }
        cells.len()
    }

    pub struct Sse2Provider;

    impl KernelProvider for Sse2Provider {
        fn name(&self) -> &'static str {
            "sse2"
        }

        fn requires(&self) -> CpuFeatures {
            CpuFeatures::SSE2
        }

        fn install(&self, registry: &mut KernelRegistry) -> usize {
            const CELLS: &[(Op, Kernel)] = &[
                (Op::Addition, kernels::addition_sse2),
                (Op::Subtract, kernels::subtract_sse2),
                (Op::DarkenOnly, kernels::darken_only_sse2),
                (Op::LightenOnly, kernels::lighten_only_sse2),
                (Op::Difference, kernels::difference_sse2),
            ];
            install_rgba8(registry, CELLS, self.name())
        }
    }

    pub struct Avx2Provider;

    impl KernelProvider for Avx2Provider {
        fn name(&self) -> &'static str {
            "avx2"
        }

        fn requires(&self) -> CpuFeatures {
            CpuFeatures::AVX2
        }

        fn install(&self, registry: &mut KernelRegistry) -> usize {
            const CELLS: &[(Op, Kernel)] = &[
                (Op::Addition, kernels::addition_avx2),
                (Op::Subtract, kernels::subtract_avx2),
                (Op::DarkenOnly, kernels::darken_only_avx2),
                (Op::LightenOnly, kernels::lighten_only_avx2),
                (Op::Difference, kernels::difference_avx2),
            ];
            install_rgba8(registry, CELLS, self.name())
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::*;
    use crate::kernels::neon as kernels;

    pub struct NeonProvider;

    impl KernelProvider for NeonProvider {
        fn name(&self) -> &'static str {
            "neon"
        }

        fn requires(&self) -> CpuFeatures {
            CpuFeatures::NEON
        }

        fn install(&self, registry: &mut KernelRegistry) -> usize {
            const CELLS: &[(Op, Kernel)] = &[
                (Op::Addition, kernels::addition_neon),
                (Op::Subtract, kernels::subtract_neon),
                (Op::DarkenOnly, kernels::darken_only_neon),
                (Op::LightenOnly, kernels::lighten_only_neon),
                (Op::Difference, kernels::difference_neon),
            ];
            for &(op, kernel) in CELLS {
                registry.install(op, Px::Rgba8, Px::Rgba8, Px::Rgba8, kernel, self.name());
            }
            CELLS.len()
        }
    }
}
