use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use piano_core::{MemoryHost, MountOptions, PianoRoot};
use piano_ui::prelude::*;

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION_SAMPLES: &[usize] = &[8, 16, 32, 64];
const VIEWPORT: Size = Size {
    width: 1080.0,
    height: 1920.0,
};

fn pipeline_content(sections: usize, rows_per_section: usize) -> Widget {
    let sections = (0..sections)
        .map(|section| {
            let mut children: Vec<Widget> = vec![Text::new(format!("Section {section}")).into()];
            for row_index in 0..rows_per_section {
                children.push(
                    row(vec![
                        expanded(1.0, Text::new(format!("Item {section}-{row_index} title"))).into(),
                        Text::new(format!("Detail {section}-{row_index}")).into(),
                    ])
                    .into(),
                );
            }
            Padding::new(EdgeInsets::all(4.0), column(children)).into()
        })
        .collect();
    column(sections).into()
}

fn mount(rows_per_section: usize) -> PianoRoot {
    PianoRoot::mount(
        MemoryHost::new(),
        pipeline_content(SECTION_COUNT, rows_per_section),
        MountOptions::default().with_viewport(VIEWPORT),
    )
    .expect("mount pipeline content")
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| black_box(mount(rows)));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild_home");
    for &rows in ROWS_PER_SECTION_SAMPLES {
        let mut root = mount(rows);
        let home = root.home_element().expect("home");
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                root.tree_mut()
                    .update(home, pipeline_content(SECTION_COUNT, rows))
                    .expect("update");
                root.relayout().expect("relayout");
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mount, bench_rebuild);
criterion_main!(benches);
