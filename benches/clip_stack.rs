/// Clip stack benchmarks.
///
/// **Scenarios:** replays every clip of the scenario catalogue into a fresh stack.
///
/// **Nested layers:** a UI-like pattern of save → clip → pre_apply → restore, several levels
/// deep, where most clips are rects that combine with the level above.
///
/// Run with:
/// ```
/// cargo bench --bench clip_stack
/// ```
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grafo_clip::{irect, rect, ClipOp, ClipStack, PreClipResult, Transform};
use grafo_clip_scenarios::{build_scenarios, device_bounds, make_octagon};

const LAYERS: usize = 8;
const DRAWS_PER_LAYER: usize = 16;

fn bench_scenarios(c: &mut Criterion) {
    let cases = build_scenarios();

    c.bench_function("clip_stack_scenarios", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for case in &cases {
                let mut stack = ClipStack::new(device_bounds());
                stack.save();
                for clip in case.clips() {
                    stack.clip_shape(&clip.local_to_device, clip.shape.clone(), clip.aa, clip.op);
                }
                total += stack.elements().count();
                stack.restore();
            }
            black_box(total)
        });
    });
}

fn bench_nested_layers(c: &mut Criterion) {
    let identity = Transform::identity();
    let rotated = Transform::translation(-500.0, -400.0)
        .then_rotate_degrees(10.0)
        .then_translate(500.0, 400.0);
    let path = make_octagon(&rect(100.0, 100.0, 900.0, 700.0));

    c.bench_function("clip_stack_nested_layers", |b| {
        b.iter(|| {
            let mut stack = ClipStack::new(irect(0, 0, 1000, 800));
            let mut clipped = 0usize;
            for layer in 0..LAYERS {
                stack.save();
                let inset = 10.0 * layer as f32;
                stack.clip_rect(
                    &identity,
                    rect(inset, inset, 1000.0 - inset, 800.0 - inset),
                    true,
                    ClipOp::Intersect,
                );
                if layer == LAYERS / 2 {
                    stack.clip_path(&rotated, path.clone(), true, ClipOp::Intersect);
                }
                for draw in 0..DRAWS_PER_LAYER {
                    let x = 60.0 * draw as f32;
                    let bounds = rect(x, x * 0.5, x + 50.0, x * 0.5 + 40.0);
                    if !matches!(stack.pre_apply(&bounds, true), PreClipResult::Unclipped) {
                        clipped += 1;
                    }
                }
            }
            for _ in 0..LAYERS {
                stack.restore();
            }
            black_box(clipped)
        });
    });
}

criterion_group!(clip_stack_benches, bench_scenarios, bench_nested_layers);
criterion_main!(clip_stack_benches);
