use crate::error::{BlendError, BlendResult};
use crate::format::PixelFormat;
use crate::operation::CompositeOperation;

/// Everything a kernel needs for one pixel run.
///
/// Constructed immediately before a dispatch call and discarded after; the
/// engine never retains the buffers. All buffers stay caller-owned, and the
/// caller guarantees each one covers `pixels * bytes_per_pixel(format)`
/// bytes. [`CompositeContext::new`] checks that up front; `dispatch` itself
/// never re-validates.
#[derive(Debug)]
pub struct CompositeContext<'a> {
    pub operation: CompositeOperation,
    pub format_a: PixelFormat,
    pub format_b: PixelFormat,
    pub format_d: PixelFormat,
    /// Format of the optional mask run; `Any` when no mask is attached.
    pub format_m: PixelFormat,
    pub src_a: &'a [u8],
    pub src_b: &'a [u8],
    pub dst: &'a mut [u8],
    pub mask: Option<&'a [u8]>,
    /// Number of pixels to process.
    pub pixels: usize,
    /// Scalar parameter for the kernels that take one (blend, shade, scale);
    /// 255 means full effect.
    pub amount: u8,
}

impl<'a> CompositeContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        operation: CompositeOperation,
        format_a: PixelFormat,
        src_a: &'a [u8],
        format_b: PixelFormat,
        src_b: &'a [u8],
        format_d: PixelFormat,
        dst: &'a mut [u8],
        pixels: usize,
    ) -> BlendResult<Self> {
        let ctx = Self {
            operation,
            format_a,
            format_b,
            format_d,
            format_m: PixelFormat::Any,
            src_a,
            src_b,
            dst,
            mask: None,
            pixels,
            amount: 255,
        };
        ctx.validate()?;
        Ok(ctx)
    }

    /// Context whose inputs and destination all share one format.
    pub fn same_format(
        operation: CompositeOperation,
        format: PixelFormat,
        src_a: &'a [u8],
        src_b: &'a [u8],
        dst: &'a mut [u8],
        pixels: usize,
    ) -> BlendResult<Self> {
        Self::new(operation, format, src_a, format, src_b, format, dst, pixels)
    }

    /// Attach a per-pixel mask run.
    pub fn with_mask(mut self, format: PixelFormat, mask: &'a [u8]) -> BlendResult<Self> {
        check_run("mask", format, mask.len(), self.pixels)?;
        self.format_m = format;
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn with_amount(mut self, amount: u8) -> Self {
        self.amount = amount;
        self
    }

    /// Check that every attached buffer covers the declared run.
    pub fn validate(&self) -> BlendResult<()> {
        check_run("input A", self.format_a, self.src_a.len(), self.pixels)?;
        check_run("input B", self.format_b, self.src_b.len(), self.pixels)?;
        check_run("destination", self.format_d, self.dst.len(), self.pixels)?;
        if let Some(mask) = self.mask {
            check_run("mask", self.format_m, mask.len(), self.pixels)?;
        }
        Ok(())
    }
}

fn check_run(role: &str, format: PixelFormat, len: usize, pixels: usize) -> BlendResult<()> {
    let Some(need) = pixels.checked_mul(format.bytes_per_pixel()) else {
        return Err(BlendError::context(format!("{role} run size overflows")));
    };
    if len < need {
        return Err(BlendError::context(format!(
            "{role} buffer holds {len} bytes, a {pixels}-pixel {format} run needs {need}"
        )));
    }
    Ok(())
}
