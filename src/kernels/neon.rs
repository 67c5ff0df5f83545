//! NEON kernels for the whole-pixel arithmetic operations on 4-byte RGBA
//! runs. NEON is part of the aarch64 base profile, so these are plain
//! functions; unsafe is confined to the vector loads and stores.
#![allow(unsafe_code)]

use std::arch::aarch64::*;

use crate::context::CompositeContext;

fn run_len(ctx: &CompositeContext<'_>) -> usize {
    ctx.pixels
        .saturating_mul(4)
        .min(ctx.src_a.len())
        .min(ctx.src_b.len())
        .min(ctx.dst.len())
}

macro_rules! bytewise_neon {
    ($kernel:ident, $intrin:ident, $scalar:expr) => {
        pub fn $kernel(ctx: &mut CompositeContext<'_>) {
            let n = run_len(ctx);
            let (dst, a, b) = (&mut ctx.dst[..n], &ctx.src_a[..n], &ctx.src_b[..n]);
            let mut i = 0;
            while i + 16 <= n {
                // SAFETY: i + 16 <= n bounds all three runs.
                let va = unsafe { vld1q_u8(a.as_ptr().add(i)) };
                let vb = unsafe { vld1q_u8(b.as_ptr().add(i)) };
                let v = $intrin(va, vb);
                unsafe { vst1q_u8(dst.as_mut_ptr().add(i), v) };
                i += 16;
            }
            while i < n {
                dst[i] = $scalar(a[i], b[i]);
                i += 1;
            }
        }
    };
}

bytewise_neon!(addition_neon, vqaddq_u8, u8::saturating_add);
bytewise_neon!(subtract_neon, vqsubq_u8, u8::saturating_sub);
bytewise_neon!(darken_only_neon, vminq_u8, |x: u8, y: u8| x.min(y));
bytewise_neon!(lighten_only_neon, vmaxq_u8, |x: u8, y: u8| x.max(y));
bytewise_neon!(difference_neon, vabdq_u8, |x: u8, y: u8| x.abs_diff(y));
