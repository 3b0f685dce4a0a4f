// Write performance benchmarks for sstkit

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sstkit::sstable::SSTableWriter;
use sstkit::{MemTable, MemTableBackend, Options};
use std::hint::black_box;
use tempfile::TempDir;

fn benchmark_sequential_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_write");
    let options = Options::default().sync_on_close(false);

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let mut writer = SSTableWriter::open_with_options(temp_dir.path(), &options).unwrap();

                for i in 0..size {
                    let key = format!("key{:08}", i);
                    let value = format!("value{:08}", i);
                    writer.write(key.as_bytes(), value.as_bytes()).unwrap();
                }

                black_box(writer.close().unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_large_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_value_write");
    let options = Options::default().sync_on_close(false);

    for value_size in [1024, 16 * 1024, 64 * 1024].iter() {
        let value = vec![b'x'; *value_size];
        group.throughput(Throughput::Bytes((*value_size * 100) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(value_size), value_size, |b, _| {
            b.iter(|| {
                let temp_dir = TempDir::new().unwrap();
                let mut writer = SSTableWriter::open_with_options(temp_dir.path(), &options).unwrap();

                for i in 0..100 {
                    let key = format!("key{:08}", i);
                    writer.write(key.as_bytes(), &value).unwrap();
                }

                black_box(writer.close().unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_memtable_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("memtable_flush");
    let options = Options::default().sync_on_close(false);

    for backend in [MemTableBackend::SkipList, MemTableBackend::BTree] {
        group.bench_function(format!("{:?}", backend), |b| {
            b.iter(|| {
                use rand::Rng;
                let mut rng = rand::rng();

                let memtable = MemTable::new(backend);
                for _ in 0..1000 {
                    let key_num: u32 = rng.random();
                    memtable.put(&format!("key{:010}", key_num), b"value");
                }

                let temp_dir = TempDir::new().unwrap();
                black_box(memtable.flush(temp_dir.path(), &options).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sequential_write, benchmark_large_values, benchmark_memtable_flush);
criterion_main!(benches);
