//! Benchmarks for sectioning pipelines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sectioner::{
    clean_page_artifacts, normalize_transcript, Caption, ChapterTemplate, DocumentPipeline, TemplatePipeline,
    TranscriptChunker, Vocabulary,
};

fn sample_paper(sections: usize) -> String {
    let headings = [
        "**Abstract**",
        "## 1 Introduction",
        "### 1.1 Faults and Failures",
        "**2** **Describing Load**",
        "## 3 Operability",
        "12",
        "Reliability | 7",
    ];
    let paragraph = "Data systems fail in many ways, and a reliable system tolerates the faults it can anticipate. ";
    let mut text = String::new();
    for i in 0..sections {
        text.push_str(headings[i % headings.len()]);
        text.push('\n');
        for _ in 0..6 {
            text.push_str(paragraph);
        }
        text.push_str("\n\n");
    }
    text.push_str("## References\n[1] M. Kleppmann. Designing Data-Intensive Applications.\n");
    text
}

fn sample_captions(n: usize) -> Vec<Caption> {
    let lines = [
        "so the the key idea here is",
        "[Music]",
        "that attention lets every token",
        "look at every other token.",
        "and that is why it scales",
    ];
    let mut t = 0.0;
    (0..n)
        .map(|i| {
            let gap = if i % 17 == 16 { 6.0 } else { 0.2 };
            let caption = Caption::new(lines[i % lines.len()], t, 2.0);
            t += 2.0 + gap;
            caption
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for sections in [10, 100, 1_000] {
        let text = sample_paper(sections);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("page_artifacts", sections), &text, |b, text| {
            b.iter(|| clean_page_artifacts(black_box(text)))
        });
    }

    let joined = sample_captions(1_000).iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    group.throughput(Throughput::Bytes(joined.len() as u64));
    group.bench_function("transcript", |b| b.iter(|| normalize_transcript(black_box(&joined))));

    group.finish();
}

fn bench_document_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_pipeline");
    let pipeline = DocumentPipeline::new(Vocabulary::ddia_chapter_one());

    for sections in [10, 100, 1_000] {
        let text = sample_paper(sections);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("keyword", sections), &text, |b, text| {
            b.iter(|| pipeline.run("bench", black_box(text)))
        });
    }

    group.finish();
}

fn bench_template_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_pipeline");
    let pipeline = TemplatePipeline::new(&ChapterTemplate::ddia_chapter_one()).expect("builtin template compiles");
    let chapter = format!(
        "**Thinking About Data Systems**\n{body}\n**Reliability**\n{body}\n**Scalability**\n{body}\n\
         **Maintainability**\n{body}\n**Summary**\n{body}",
        body = sample_paper(50)
    );

    group.throughput(Throughput::Bytes(chapter.len() as u64));
    group.bench_function("ddia_ch1", |b| b.iter(|| pipeline.run("bench", black_box(&chapter))));
    group.finish();
}

fn bench_transcript_chunker(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_chunker");
    let chunker = TranscriptChunker::default();

    for n in [100, 1_000, 10_000] {
        let captions = sample_captions(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("captions", n), &captions, |b, captions| {
            b.iter(|| chunker.chunk(black_box(captions)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_document_pipeline,
    bench_template_pipeline,
    bench_transcript_chunker
);
criterion_main!(benches);
