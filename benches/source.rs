use std::io::Write;

use criterion::{Criterion, criterion_group, criterion_main};
use dotsource::{Sourcer, TargetEnv};
use tempfile::NamedTempFile;

fn bench_drive_file(c: &mut Criterion) {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(make_env_content(2_000).as_bytes())
        .expect("failed to write bench file");
    let sourcer = Sourcer::new();

    c.bench_function("drive_file_in_memory", |b| {
        b.iter(|| {
            let mut target = TargetEnv::memory();
            sourcer
                .drive_file(file.path(), &mut target)
                .expect("drive should succeed");
            target
        });
    });
}

fn make_env_content(entries: usize) -> String {
    let mut content = String::with_capacity(entries * 24);
    for idx in 0..entries {
        content.push_str("export KEY_");
        content.push_str(&idx.to_string());
        content.push_str("=\"value\"\n");
    }
    content
}

criterion_group!(benches, bench_drive_file);
criterion_main!(benches);
