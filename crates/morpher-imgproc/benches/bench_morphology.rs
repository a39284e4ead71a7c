use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use morpher_image::{Image, ImageSize};
use morpher_imgproc::morphology::{close, dilate, erode, open, Kernel, KernelShape};
use morpher_imgproc::padding::PaddingMode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn create_test_image(width: usize, height: usize) -> Image<u8, 3> {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<u8> = (0..(width * height * 3)).map(|_| rng.random()).collect();
    Image::new(ImageSize { width, height }, data).unwrap()
}

fn bench_morphology(c: &mut Criterion) {
    let mut group = c.benchmark_group("Morphology");
    let kernel = Kernel::new(KernelShape::Box { size: 4 });

    for (w, h) in [(256, 224), (512, 448)] {
        let id = format!("{}x{}", w, h);
        let src = create_test_image(w, h);

        group.bench_with_input(BenchmarkId::new("erode", &id), &src, |b, src| {
            let mut dst = Image::from_size_val(src.size(), 0).unwrap();
            b.iter(|| erode(src, &mut dst, &kernel, PaddingMode::Replicate, [0; 3]).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("dilate", &id), &src, |b, src| {
            let mut dst = Image::from_size_val(src.size(), 0).unwrap();
            b.iter(|| dilate(src, &mut dst, &kernel, PaddingMode::Replicate, [0; 3]).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("open", &id), &src, |b, src| {
            let mut dst = Image::from_size_val(src.size(), 0).unwrap();
            b.iter(|| open(src, &mut dst, &kernel, PaddingMode::Replicate, [0; 3]).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("close", &id), &src, |b, src| {
            let mut dst = Image::from_size_val(src.size(), 0).unwrap();
            b.iter(|| close(src, &mut dst, &kernel, PaddingMode::Replicate, [0; 3]).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_morphology);
criterion_main!(benches);
