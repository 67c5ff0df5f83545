//! SSE2 and AVX2 kernels for the whole-pixel arithmetic operations on
//! 4-byte RGBA runs. Byte-identical to the portable versions they replace.
#![allow(unsafe_code)]

use std::arch::x86_64::*;

use crate::context::CompositeContext;

fn run_len(ctx: &CompositeContext<'_>) -> usize {
    ctx.pixels
        .saturating_mul(4)
        .min(ctx.src_a.len())
        .min(ctx.src_b.len())
        .min(ctx.dst.len())
}

macro_rules! bytewise_sse2 {
    ($inner:ident, $kernel:ident, $intrin:ident, $scalar:expr) => {
        #[target_feature(enable = "sse2")]
        fn $inner(dst: &mut [u8], a: &[u8], b: &[u8]) {
            let n = dst.len();
            let mut i = 0;
            while i + 16 <= n {
                // SAFETY: i + 16 <= n bounds all three runs.
                let va = unsafe { _mm_loadu_si128(a.as_ptr().add(i).cast()) };
                let vb = unsafe { _mm_loadu_si128(b.as_ptr().add(i).cast()) };
                let v = $intrin(va, vb);
                unsafe { _mm_storeu_si128(dst.as_mut_ptr().add(i).cast(), v) };
                i += 16;
            }
            while i < n {
                dst[i] = $scalar(a[i], b[i]);
                i += 1;
            }
        }

        pub fn $kernel(ctx: &mut CompositeContext<'_>) {
            let n = run_len(ctx);
            // SAFETY: this kernel is only installed after the probe reported
            // SSE2 on the running CPU.
            unsafe { $inner(&mut ctx.dst[..n], &ctx.src_a[..n], &ctx.src_b[..n]) }
        }
    };
}

macro_rules! bytewise_avx2 {
    ($inner:ident, $kernel:ident, $intrin:ident, $scalar:expr) => {
        #[target_feature(enable = "avx2")]
        fn $inner(dst: &mut [u8], a: &[u8], b: &[u8]) {
            let n = dst.len();
            let mut i = 0;
            while i + 32 <= n {
                // SAFETY: i + 32 <= n bounds all three runs.
                let va = unsafe { _mm256_loadu_si256(a.as_ptr().add(i).cast()) };
                let vb = unsafe { _mm256_loadu_si256(b.as_ptr().add(i).cast()) };
                let v = $intrin(va, vb);
                unsafe { _mm256_storeu_si256(dst.as_mut_ptr().add(i).cast(), v) };
                i += 32;
            }
            while i < n {
                dst[i] = $scalar(a[i], b[i]);
                i += 1;
            }
        }

        pub fn $kernel(ctx: &mut CompositeContext<'_>) {
            let n = run_len(ctx);
            // SAFETY: this kernel is only installed after the probe reported
            // AVX2 on the running CPU.
            unsafe { $inner(&mut ctx.dst[..n], &ctx.src_a[..n], &ctx.src_b[..n]) }
        }
    };
}

bytewise_sse2!(add_sse2, addition_sse2, _mm_adds_epu8, u8::saturating_add);
bytewise_sse2!(sub_sse2, subtract_sse2, _mm_subs_epu8, u8::saturating_sub);
bytewise_sse2!(min_sse2, darken_only_sse2, _mm_min_epu8, |x: u8, y: u8| x.min(y));
bytewise_sse2!(max_sse2, lighten_only_sse2, _mm_max_epu8, |x: u8, y: u8| x.max(y));

bytewise_avx2!(add_avx2, addition_avx2, _mm256_adds_epu8, u8::saturating_add);
bytewise_avx2!(sub_avx2, subtract_avx2, _mm256_subs_epu8, u8::saturating_sub);
bytewise_avx2!(min_avx2, darken_only_avx2, _mm256_min_epu8, |x: u8, y: u8| x.min(y));
bytewise_avx2!(max_avx2, lighten_only_avx2, _mm256_max_epu8, |x: u8, y: u8| x.max(y));

// |a - b| as max(a -| b, b -| a); one saturating difference is always zero.

#[target_feature(enable = "sse2")]
fn absdiff_sse2(dst: &mut [u8], a: &[u8], b: &[u8]) {
    let n = dst.len();
    let mut i = 0;
    while i + 16 <= n {
        // SAFETY: i + 16 <= n bounds all three runs.
        let va = unsafe { _mm_loadu_si128(a.as_ptr().add(i).cast()) };
        let vb = unsafe { _mm_loadu_si128(b.as_ptr().add(i).cast()) };
        let v = _mm_or_si128(_mm_subs_epu8(va, vb), _mm_subs_epu8(vb, va));
        unsafe { _mm_storeu_si128(dst.as_mut_ptr().add(i).cast(), v) };
        i += 16;
    }
    while i < n {
        dst[i] = a[i].abs_diff(b[i]);
        i += 1;
    }
}

pub fn difference_sse2(ctx: &mut CompositeContext<'_>) {
    let n = run_len(ctx);
    // SAFETY: installed only after the probe reported SSE2.
    unsafe { absdiff_sse2(&mut ctx.dst[..n], &ctx.src_a[..n], &ctx.src_b[..n]) }
}

#[target_feature(enable = "avx2")]
fn absdiff_avx2(dst: &mut [u8], a: &[u8], b: &[u8]) {
    let n = dst.len();
    let mut i = 0;
    while i + 32 <= n {
        // SAFETY: i + 32 <= n bounds all three runs.
        let va = unsafe { _mm256_loadu_si256(a.as_ptr().add(i).cast()) };
        let vb = unsafe { _mm256_loadu_si256(b.as_ptr().add(i).cast()) };
        let v = _mm256_or_si256(_mm256_subs_epu8(va, vb), _mm256_subs_epu8(vb, va));
        unsafe { _mm256_storeu_si256(dst.as_mut_ptr().add(i).cast(), v) };
        i += 32;
    }
    while i < n {
        dst[i] = a[i].abs_diff(b[i]);
        i += 1;
    }
}

pub fn difference_avx2(ctx: &mut CompositeContext<'_>) {
    let n = run_len(ctx);
    // SAFETY: installed only after the probe reported AVX2.
    unsafe { absdiff_avx2(&mut ctx.dst[..n], &ctx.src_a[..n], &ctx.src_b[..n]) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;
    use crate::kernels::generic;
    use crate::operation::CompositeOperation;
    use crate::registry::Kernel;

    fn mix64(mut z: u64) -> u64 {
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn pseudo_run(seed: u64, len: usize) -> Vec<u8> {
        (0..len).map(|i| (mix64(seed ^ i as u64) & 0xFF) as u8).collect()
    }

    fn assert_matches_generic(wide: Kernel, portable: Kernel, op: CompositeOperation) {
        // 67 pixels: covers full vectors plus a scalar tail.
        let a = pseudo_run(1, 67 * 4);
        let b = pseudo_run(2, 67 * 4);

        let mut expected = vec![0u8; 67 * 4];
        let mut ctx =
            CompositeContext::same_format(op, PixelFormat::Rgba8, &a, &b, &mut expected, 67)
                .unwrap();
        portable(&mut ctx);

        let mut got = vec![0u8; 67 * 4];
        let mut ctx =
            CompositeContext::same_format(op, PixelFormat::Rgba8, &a, &b, &mut got, 67).unwrap();
        wide(&mut ctx);

        assert_eq!(got, expected);
    }

    #[test]
    fn sse2_matches_generic() {
        if !is_x86_feature_detected!("sse2") {
            return;
        }
        assert_matches_generic(addition_sse2, generic::addition, CompositeOperation::Addition);
        assert_matches_generic(subtract_sse2, generic::subtract, CompositeOperation::Subtract);
        assert_matches_generic(
            darken_only_sse2,
            generic::darken_only,
            CompositeOperation::DarkenOnly,
        );
        assert_matches_generic(
            lighten_only_sse2,
            generic::lighten_only,
            CompositeOperation::LightenOnly,
        );
        assert_matches_generic(
            difference_sse2,
            generic::difference,
            CompositeOperation::Difference,
        );
    }

    #[test]
    fn avx2_matches_generic() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        assert_matches_generic(addition_avx2, generic::addition, CompositeOperation::Addition);
        assert_matches_generic(subtract_avx2, generic::subtract, CompositeOperation::Subtract);
        assert_matches_generic(
            darken_only_avx2,
            generic::darken_only,
            CompositeOperation::DarkenOnly,
        );
        assert_matches_generic(
            lighten_only_avx2,
            generic::lighten_only,
            CompositeOperation::LightenOnly,
        );
        assert_matches_generic(
            difference_avx2,
            generic::difference,
            CompositeOperation::Difference,
        );
    }
}
