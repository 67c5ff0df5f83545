//! Portable pixel kernels.
//!
//! Every kernel reads its channel layout from the context's destination
//! format, so one function body serves all the concrete formats it is
//! registered for. Color math is 8-bit fixed point throughout.

use crate::context::CompositeContext;
use crate::format::PixelFormat;

#[inline]
fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[inline]
fn lerp_u8(a: u8, b: u8, t: u8) -> u8 {
    let a = mul_div255(u16::from(a), 255 - u16::from(t));
    let b = mul_div255(u16::from(b), u16::from(t));
    a.saturating_add(b)
}

/// Channel layout of a destination run.
#[derive(Clone, Copy)]
struct Layout {
    bpp: usize,
    /// Index of the alpha byte, when the format has one.
    alpha: Option<usize>,
    /// Number of color/value channels (alpha excluded).
    channels: usize,
}

fn layout(format: PixelFormat) -> Layout {
    let bpp = format.bytes_per_pixel();
    if format.has_alpha() {
        Layout {
            bpp,
            alpha: Some(bpp - 1),
            channels: bpp - 1,
        }
    } else {
        Layout {
            bpp,
            alpha: None,
            channels: bpp,
        }
    }
}

/// Per-channel composites. All take `(a, b)` and return the destination
/// channel value.
pub(crate) mod comp {
    use super::mul_div255;

    pub fn multiply(a: u8, b: u8) -> u8 {
        mul_div255(u16::from(a), u16::from(b))
    }

    pub fn screen(a: u8, b: u8) -> u8 {
        255 - mul_div255(255 - u16::from(a), 255 - u16::from(b))
    }

    pub fn overlay(a: u8, b: u8) -> u8 {
        if a < 128 {
            mul_div255(2 * u16::from(a), u16::from(b))
        } else {
            255 - mul_div255(2 * (255 - u16::from(a)), 255 - u16::from(b))
        }
    }

    pub fn hard_light(a: u8, b: u8) -> u8 {
        // Overlay with the operands exchanged.
        overlay(b, a)
    }

    pub fn soft_light(a: u8, b: u8) -> u8 {
        let m = mul_div255(u16::from(a), u16::from(b));
        let s = screen(a, b);
        let lo = mul_div255(255 - u16::from(a), u16::from(m));
        let hi = mul_div255(u16::from(a), u16::from(s));
        lo.saturating_add(hi)
    }

    pub fn difference(a: u8, b: u8) -> u8 {
        a.abs_diff(b)
    }

    pub fn addition(a: u8, b: u8) -> u8 {
        a.saturating_add(b)
    }

    pub fn subtract(a: u8, b: u8) -> u8 {
        a.saturating_sub(b)
    }

    pub fn darken(a: u8, b: u8) -> u8 {
        a.min(b)
    }

    pub fn lighten(a: u8, b: u8) -> u8 {
        a.max(b)
    }

    pub fn divide(a: u8, b: u8) -> u8 {
        ((u32::from(a) * 256) / (u32::from(b) + 1)).min(255) as u8
    }

    pub fn dodge(a: u8, b: u8) -> u8 {
        ((u32::from(a) * 256) / (256 - u32::from(b))).min(255) as u8
    }

    pub fn burn(a: u8, b: u8) -> u8 {
        let lifted = ((255 - u32::from(a)) * 256) / (u32::from(b) + 1);
        (255 - lifted.min(255)) as u8
    }

    pub fn grain_extract(a: u8, b: u8) -> u8 {
        (i32::from(a) - i32::from(b) + 128).clamp(0, 255) as u8
    }

    pub fn grain_merge(a: u8, b: u8) -> u8 {
        (i32::from(a) + i32::from(b) - 128).clamp(0, 255) as u8
    }

    pub fn xor(a: u8, b: u8) -> u8 {
        a ^ b
    }
}

/// Apply `op` to the color channels; alpha, when present, becomes the
/// smaller of the two input alphas.
fn separable(ctx: &mut CompositeContext<'_>, op: fn(u8, u8) -> u8) {
    let l = layout(ctx.format_d);
    if l.bpp == 0 {
        return;
    }
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        for i in 0..l.channels {
            d[i] = op(a[i], b[i]);
        }
        if let Some(ai) = l.alpha {
            d[ai] = a[ai].min(b[ai]);
        }
    }
}

/// Apply `op` to every byte of the run, alpha included. The arithmetic
/// kernels use this shape so the vectorized installers can replace them
/// with byte-identical wide versions.
fn uniform(ctx: &mut CompositeContext<'_>, op: fn(u8, u8) -> u8) {
    let n = ctx.pixels.saturating_mul(ctx.format_d.bytes_per_pixel());
    for ((d, a), b) in ctx
        .dst
        .iter_mut()
        .zip(ctx.src_a.iter())
        .zip(ctx.src_b.iter())
        .take(n)
    {
        *d = op(*a, *b);
    }
}

macro_rules! separable_kernels {
    ($($name:ident => $op:path,)*) => {
        $(pub fn $name(ctx: &mut CompositeContext<'_>) {
            separable(ctx, $op);
        })*
    };
}

macro_rules! uniform_kernels {
    ($($name:ident => $op:path,)*) => {
        $(pub fn $name(ctx: &mut CompositeContext<'_>) {
            uniform(ctx, $op);
        })*
    };
}

separable_kernels! {
    multiply => comp::multiply,
    screen => comp::screen,
    overlay => comp::overlay,
    hard_light => comp::hard_light,
    soft_light => comp::soft_light,
    divide => comp::divide,
    dodge => comp::dodge,
    burn => comp::burn,
    grain_extract => comp::grain_extract,
    grain_merge => comp::grain_merge,
    xor => comp::xor,
}

uniform_kernels! {
    addition => comp::addition,
    subtract => comp::subtract,
    darken_only => comp::darken,
    lighten_only => comp::lighten,
    difference => comp::difference,
}

/// Premultiplied source-over: B over A into the destination, alpha included.
pub fn normal(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        let inv = 255 - u16::from(b[ai]);
        for i in 0..l.bpp {
            d[i] = b[i].saturating_add(mul_div255(u16::from(a[i]), inv));
        }
    }
}

/// Premultiplied over with the operands exchanged: A is kept where it has
/// coverage, B shows through behind it.
pub fn behind(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        let inv = 255 - u16::from(a[ai]);
        for i in 0..l.bpp {
            d[i] = a[i].saturating_add(mul_div255(u16::from(b[i]), inv));
        }
    }
}

/// Keep A's color, cut its coverage down by B's alpha.
pub fn erase(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        d[..l.bpp].copy_from_slice(&a[..l.bpp]);
        d[ai] = mul_div255(u16::from(a[ai]), 255 - u16::from(b[ai]));
    }
}

/// Keep A's color, raise its coverage toward opaque by B's alpha.
pub fn anti_erase(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        d[..l.bpp].copy_from_slice(&a[..l.bpp]);
        let gain = mul_div255(255 - u16::from(a[ai]), u16::from(b[ai]));
        d[ai] = a[ai].saturating_add(gain);
    }
}

/// Where B's color matches A's, cut A's coverage in proportion to the match
/// and B's own alpha.
pub fn color_erase(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        let mut worst = 0u8;
        for i in 0..l.channels {
            worst = worst.max(a[i].abs_diff(b[i]));
        }
        let similarity = 255 - u16::from(worst);
        let cut = mul_div255(similarity, u16::from(b[ai]));
        d[..l.bpp].copy_from_slice(&a[..l.bpp]);
        d[ai] = mul_div255(u16::from(a[ai]), 255 - u16::from(cut));
    }
}

/// Deterministic stippled transparency: each pixel takes B fully opaque or
/// keeps A, with B's alpha as the acceptance threshold.
pub fn dissolve(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    let Some(ai) = l.alpha else { return };
    for (index, ((d, a), b)) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
        .enumerate()
    {
        let roll = (mix64(index as u64 ^ 0x9E37_79B9_7F4A_7C15) & 0xFF) as u8;
        if roll <= b[ai] && b[ai] > 0 {
            d[..l.bpp].copy_from_slice(&b[..l.bpp]);
            d[ai] = 255;
        } else {
            d[..l.bpp].copy_from_slice(&a[..l.bpp]);
        }
    }
}

/// D takes B outright; with a mask attached, each pixel moves from A to B by
/// the mask weight instead.
pub fn replace(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    if l.bpp == 0 {
        return;
    }
    match ctx.mask {
        Some(mask) => {
            for (((d, a), b), w) in ctx
                .dst
                .chunks_exact_mut(l.bpp)
                .zip(ctx.src_a.chunks_exact(l.bpp))
                .zip(ctx.src_b.chunks_exact(l.bpp))
                .zip(mask.iter())
                .take(ctx.pixels)
            {
                for i in 0..l.bpp {
                    d[i] = lerp_u8(a[i], b[i], *w);
                }
            }
        }
        None => {
            for (d, b) in ctx
                .dst
                .chunks_exact_mut(l.bpp)
                .zip(ctx.src_b.chunks_exact(l.bpp))
                .take(ctx.pixels)
            {
                d[..l.bpp].copy_from_slice(&b[..l.bpp]);
            }
        }
    }
}

/// Constant-ratio crossfade of A and B at the context amount.
pub fn blend(ctx: &mut CompositeContext<'_>) {
    let t = ctx.amount;
    let n = ctx.pixels.saturating_mul(ctx.format_d.bytes_per_pixel());
    for ((d, a), b) in ctx
        .dst
        .iter_mut()
        .zip(ctx.src_a.iter())
        .zip(ctx.src_b.iter())
        .take(n)
    {
        *d = lerp_u8(*a, *b, t);
    }
}

/// Pull A's color toward its multiply with B, by the context amount. Alpha,
/// when present, is carried from A.
pub fn shade(ctx: &mut CompositeContext<'_>) {
    let l = layout(ctx.format_d);
    if l.bpp == 0 {
        return;
    }
    let t = ctx.amount;
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        for i in 0..l.channels {
            let shaded = comp::multiply(a[i], b[i]);
            d[i] = lerp_u8(a[i], shaded, t);
        }
        if let Some(ai) = l.alpha {
            d[ai] = a[ai];
        }
    }
}

/// Scale every byte of A by the context amount. Input B is ignored;
/// registered format-agnostic.
pub fn scale(ctx: &mut CompositeContext<'_>) {
    let t = u16::from(ctx.amount);
    let n = ctx.pixels.saturating_mul(ctx.format_d.bytes_per_pixel());
    for (d, a) in ctx.dst.iter_mut().zip(ctx.src_a.iter()).take(n) {
        *d = mul_div255(u16::from(*a), t);
    }
}

/// One-sided exchange: the destination run receives A's bytes. The caller
/// performs the symmetric call with the roles reversed to complete a swap;
/// source runs are shared borrows here, so the engine cannot write them.
pub fn swap(ctx: &mut CompositeContext<'_>) {
    let n = ctx.pixels.saturating_mul(ctx.format_d.bytes_per_pixel());
    for (d, a) in ctx.dst.iter_mut().zip(ctx.src_a.iter()).take(n) {
        *d = *a;
    }
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// HSV channel mixing for the non-separable operations.

fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let r = f32::from(rgb[0]) / 255.0;
    let g = f32::from(rgb[1]) / 255.0;
    let b = f32::from(rgb[2]) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    [h, s, max]
}

fn hsv_to_rgb(hsv: [f32; 3]) -> [u8; 3] {
    let [h, s, v] = hsv;
    let c = v * s;
    let hp = (h / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [unit_to_u8(r1 + m), unit_to_u8(g1 + m), unit_to_u8(b1 + m)]
}

fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Replace the selected HSV components of A with B's. Alpha, when present,
/// is carried from A. Needs three color channels; other layouts are left
/// untouched.
fn hsv_mix(ctx: &mut CompositeContext<'_>, take: [bool; 3]) {
    let l = layout(ctx.format_d);
    if l.channels < 3 {
        return;
    }
    for ((d, a), b) in ctx
        .dst
        .chunks_exact_mut(l.bpp)
        .zip(ctx.src_a.chunks_exact(l.bpp))
        .zip(ctx.src_b.chunks_exact(l.bpp))
        .take(ctx.pixels)
    {
        let mut ah = rgb_to_hsv([a[0], a[1], a[2]]);
        let bh = rgb_to_hsv([b[0], b[1], b[2]]);
        for i in 0..3 {
            if take[i] {
                ah[i] = bh[i];
            }
        }
        let out = hsv_to_rgb(ah);
        d[..3].copy_from_slice(&out);
        if let Some(ai) = l.alpha {
            d[ai] = a[ai];
        }
    }
}

pub fn hue(ctx: &mut CompositeContext<'_>) {
    hsv_mix(ctx, [true, false, false]);
}

pub fn saturation(ctx: &mut CompositeContext<'_>) {
    hsv_mix(ctx, [false, true, false]);
}

pub fn color(ctx: &mut CompositeContext<'_>) {
    hsv_mix(ctx, [true, true, false]);
}

pub fn value(ctx: &mut CompositeContext<'_>) {
    hsv_mix(ctx, [false, false, true]);
}

// Format conversions. Input B is ignored; registered with B unconstrained.

fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 77 + u32::from(g) * 151 + u32::from(b) * 28) >> 8) as u8
}

macro_rules! convert_kernels {
    ($($name:ident: $in_bpp:literal -> $out_bpp:literal, |$px:ident| $body:expr,)*) => {
        $(pub fn $name(ctx: &mut CompositeContext<'_>) {
            for (d, $px) in ctx
                .dst
                .chunks_exact_mut($out_bpp)
                .zip(ctx.src_a.chunks_exact($in_bpp))
                .take(ctx.pixels)
            {
                let out: [u8; $out_bpp] = $body;
                d.copy_from_slice(&out);
            }
        })*
    };
}

convert_kernels! {
    convert_v8_va8: 1 -> 2, |p| [p[0], 255],
    convert_v8_rgb8: 1 -> 3, |p| [p[0], p[0], p[0]],
    convert_v8_rgba8: 1 -> 4, |p| [p[0], p[0], p[0], 255],
    convert_va8_v8: 2 -> 1, |p| [p[0]],
    convert_va8_rgba8: 2 -> 4, |p| [p[0], p[0], p[0], p[1]],
    convert_rgb8_v8: 3 -> 1, |p| [luma(p[0], p[1], p[2])],
    convert_rgb8_rgba8: 3 -> 4, |p| [p[0], p[1], p[2], 255],
    convert_rgba8_v8: 4 -> 1, |p| [luma(p[0], p[1], p[2])],
    convert_rgba8_va8: 4 -> 2, |p| [luma(p[0], p[1], p[2]), p[3]],
    convert_rgba8_rgb8: 4 -> 3, |p| [p[0], p[1], p[2]],
}

/// Identity conversion: the destination takes A unchanged.
pub fn convert_copy(ctx: &mut CompositeContext<'_>) {
    swap(ctx);
}
