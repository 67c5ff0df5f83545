mod support;

use std::sync::Arc;

use blendcore::{
    CompositeContext, CompositeEngine, CompositeOperation, CpuFeatures, EngineOptions,
    PixelFormat, TracingSink,
};
use support::CollectSink;

fn engine_with_sink(options: EngineOptions) -> (CompositeEngine, Arc<CollectSink>) {
    let sink = Arc::new(CollectSink::default());
    let engine = CompositeEngine::builder()
        .options(options)
        .features(CpuFeatures::BASELINE)
        .sink(sink.clone())
        .build();
    (engine, sink)
}

#[test]
fn baseline_normal_over_100_rgba8_pixels() {
    let options =
        EngineOptions::from_bits(EngineOptions::USE.bits() | EngineOptions::TRACE.bits());
    let (engine, sink) = engine_with_sink(options);

    let a: Vec<u8> = [0u8, 0, 255, 255].repeat(100);
    let b: Vec<u8> = [255u8, 0, 0, 255].repeat(100);
    let mut dst = vec![0u8; 400];

    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Normal,
        PixelFormat::Rgba8,
        &a,
        &b,
        &mut dst,
        100,
    )
    .unwrap();
    engine.dispatch(&mut ctx);

    // An opaque source replaces the backdrop everywhere.
    assert_eq!(dst, b);

    // Exactly one kernel invocation, and the cell belongs to the generic
    // installer because no optional capability bit was set.
    let dispatches: Vec<_> = sink
        .lines()
        .into_iter()
        .filter(|l| l.contains("via"))
        .collect();
    assert_eq!(dispatches.len(), 1);
    assert!(dispatches[0].contains("via 'generic'"));
    let entry = engine
        .registry()
        .lookup(
            CompositeOperation::Normal,
            PixelFormat::Rgba8,
            PixelFormat::Rgba8,
            PixelFormat::Rgba8,
        )
        .unwrap();
    assert_eq!(entry.provider, "generic");
}

#[test]
fn unsupported_combination_is_a_diagnosed_noop() {
    let (engine, sink) = engine_with_sink(EngineOptions::default());

    let a = vec![7u8; 16];
    let b = vec![9u8; 16];
    let mut dst = vec![0xAB_u8; 16];

    // Hue needs three color channels; no cell exists for single-channel runs.
    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Hue,
        PixelFormat::V8,
        &a,
        &b,
        &mut dst,
        16,
    )
    .unwrap();
    engine.dispatch(&mut ctx);

    assert_eq!(dst, vec![0xAB_u8; 16]);
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("no kernel for hue v8+v8->v8"));
}

#[test]
fn cleared_use_bit_bypasses_every_cell() {
    let (engine, sink) = engine_with_sink(EngineOptions::from_bits(0));

    let a = [10u8, 20, 30, 255];
    let b = [200u8, 100, 50, 255];
    let mut dst = [1u8, 2, 3, 4];

    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Normal,
        PixelFormat::Rgba8,
        &a,
        &b,
        &mut dst,
        1,
    )
    .unwrap();
    engine.dispatch(&mut ctx);

    assert_eq!(dst, [1, 2, 3, 4]);
    assert!(sink.lines()[0].contains("no kernel for"));
}

#[test]
fn addition_saturates_through_dispatch() {
    // Probed features: whichever installer owns the cell must match the
    // portable result bytes.
    let engine = CompositeEngine::new(EngineOptions::default());

    let a: Vec<u8> = (0..=255).collect();
    let b: Vec<u8> = (0..=255).rev().collect();
    let mut dst = vec![0u8; 256];

    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Addition,
        PixelFormat::Rgba8,
        &a,
        &b,
        &mut dst,
        64,
    )
    .unwrap();
    engine.dispatch(&mut ctx);

    for i in 0..256 {
        assert_eq!(dst[i], a[i].saturating_add(b[i]));
    }
}

#[test]
fn convert_resolves_with_unconstrained_input_b() {
    let engine = CompositeEngine::builder()
        .features(CpuFeatures::BASELINE)
        .build();

    let v = vec![200u8; 8];
    let mut dst = vec![0u8; 32];
    let mut ctx = CompositeContext::new(
        CompositeOperation::Convert,
        PixelFormat::V8,
        &v,
        PixelFormat::V8,
        &v,
        PixelFormat::Rgba8,
        &mut dst,
        8,
    )
    .unwrap();
    engine.dispatch(&mut ctx);

    for px in dst.chunks_exact(4) {
        assert_eq!(px, [200, 200, 200, 255]);
    }
}

#[test]
fn swap_and_scale_are_format_agnostic() {
    let engine = CompositeEngine::builder()
        .features(CpuFeatures::BASELINE)
        .build();

    let a = [10u8, 250, 40, 128, 7, 7];
    let b = [0u8; 6];

    let mut dst = [0u8; 6];
    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Swap,
        PixelFormat::Va8,
        &a,
        &b,
        &mut dst,
        3,
    )
    .unwrap();
    engine.dispatch(&mut ctx);
    assert_eq!(dst, a);

    let mut dst = [0u8; 6];
    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Scale,
        PixelFormat::Va8,
        &a,
        &b,
        &mut dst,
        3,
    )
    .unwrap()
    .with_amount(255);
    engine.dispatch(&mut ctx);
    assert_eq!(dst, a);
}

#[test]
fn masked_replace_weights_between_inputs() {
    let engine = CompositeEngine::builder()
        .features(CpuFeatures::BASELINE)
        .build();

    let a = [0u8, 0, 0, 0, 0, 0, 0, 0];
    let b = [255u8; 8];
    let mask = [0u8, 255];
    let mut dst = [9u8; 8];

    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Replace,
        PixelFormat::Rgba8,
        &a,
        &b,
        &mut dst,
        2,
    )
    .unwrap()
    .with_mask(PixelFormat::V8, &mask)
    .unwrap();
    engine.dispatch(&mut ctx);

    assert_eq!(&dst[..4], &[0, 0, 0, 0]);
    assert_eq!(&dst[4..], &[255, 255, 255, 255]);
}

#[test]
fn tracing_sink_smoke() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let engine = CompositeEngine::builder()
        .options(EngineOptions::from_bits(
            EngineOptions::USE.bits() | EngineOptions::TRACE.bits(),
        ))
        .features(CpuFeatures::BASELINE)
        .sink(Arc::new(TracingSink))
        .build();

    let a = [1u8, 2, 3, 4];
    let b = [5u8, 6, 7, 8];
    let mut dst = [0u8; 4];
    let mut ctx = CompositeContext::same_format(
        CompositeOperation::Addition,
        PixelFormat::Rgba8,
        &a,
        &b,
        &mut dst,
        1,
    )
    .unwrap();
    engine.dispatch(&mut ctx);
    assert_eq!(dst, [6, 8, 10, 12]);
}
