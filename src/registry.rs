use std::collections::BTreeMap;

use crate::context::CompositeContext;
use crate::format::PixelFormat;
use crate::operation::CompositeOperation;

/// A pixel kernel: fills the context's destination run from its source runs.
pub type Kernel = fn(&mut CompositeContext<'_>);

/// One installed registry cell.
#[derive(Clone, Copy, Debug)]
pub struct KernelEntry {
    pub kernel: Kernel,
    /// Name of the installer that wrote the cell; diagnostics only.
    pub provider: &'static str,
}

type CellKey = (
    CompositeOperation,
    PixelFormat,
    PixelFormat,
    PixelFormat,
);

/// Sparse `(operation, formatA, formatB, formatD)` → kernel table.
///
/// Populated by the installer chain during engine initialization and frozen
/// afterwards. Installers may replace a cell with a faster kernel; there is
/// deliberately no way to clear one.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    cells: BTreeMap<CellKey, KernelEntry>,
}

impl KernelRegistry {
    pub fn new() -> KernelRegistry {
        KernelRegistry::default()
    }

    pub fn install(
        &mut self,
        operation: CompositeOperation,
        format_a: PixelFormat,
        format_b: PixelFormat,
        format_d: PixelFormat,
        kernel: Kernel,
        provider: &'static str,
    ) {
        self.cells
            .insert((operation, format_a, format_b, format_d), KernelEntry {
                kernel,
                provider,
            });
    }

    /// Resolve a combination. Probes, in order: the exact cell, the cell
    /// with input B unconstrained (operations that ignore B, e.g. convert),
    /// and the fully format-agnostic cell (e.g. swap, scale).
    pub fn lookup(
        &self,
        operation: CompositeOperation,
        format_a: PixelFormat,
        format_b: PixelFormat,
        format_d: PixelFormat,
    ) -> Option<KernelEntry> {
        self.cells
            .get(&(operation, format_a, format_b, format_d))
            .or_else(|| {
                self.cells
                    .get(&(operation, format_a, PixelFormat::Any, format_d))
            })
            .or_else(|| {
                self.cells.get(&(
                    operation,
                    PixelFormat::Any,
                    PixelFormat::Any,
                    PixelFormat::Any,
                ))
            })
            .copied()
    }

    /// The exact cell, no wildcard probing.
    pub fn get(
        &self,
        operation: CompositeOperation,
        format_a: PixelFormat,
        format_b: PixelFormat,
        format_d: PixelFormat,
    ) -> Option<&KernelEntry> {
        self.cells.get(&(operation, format_a, format_b, format_d))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Installed cell keys, in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cells.keys().copied()
    }
}
