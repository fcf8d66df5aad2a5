use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use text_view_core::{
    Font, HeadlessHost, MonospaceMetrics, Point, StyledText, TextBuffer, TextView, ViewConfig,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 96);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog while the wrap engine keeps up\n"
        ));
    }
    out.pop();
    out
}

fn open(buf: &mut StyledText, line_width: i32) -> TextView<HeadlessHost> {
    let config = ViewConfig {
        line_width,
        ..ViewConfig::default()
    };
    TextView::new(buf, HeadlessHost::new(), MonospaceMetrics::new(8), config)
}

fn bench_full_relayout(c: &mut Criterion) {
    let text = large_text(20_000);
    c.bench_function("full_relayout/20k_lines", |b| {
        b.iter_batched(
            || StyledText::new(&text, Font::default()),
            |mut buf| {
                let view = open(&mut buf, 400);
                black_box(view.layout().line_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(20_000);
    c.bench_function("localized_relayout/100_inserts", |b| {
        b.iter_batched(
            || {
                let mut buf = StyledText::new(&text, Font::default());
                let view = open(&mut buf, 400);
                (buf, view)
            },
            |(mut buf, mut view)| {
                let middle = buf.char_count() / 2;
                view.set_caret(&mut buf, middle);
                for _ in 0..100 {
                    view.type_text(&mut buf, "x");
                }
                black_box(view.layout().line_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_pixel_mapping(c: &mut Criterion) {
    let text = large_text(20_000);
    let mut buf = StyledText::new(&text, Font::default());
    let view = open(&mut buf, 400);
    let height = view.layout().height();

    c.bench_function("pixel_to_caret/1000_points", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let pt = Point::new((i * 37) % 400, (i * 7919) % height);
                black_box(view.pixel_to_caret(&buf, pt));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_full_relayout,
    bench_typing_in_middle,
    bench_pixel_mapping
);
criterion_main!(benches);
