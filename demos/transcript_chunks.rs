//! Transcript Chunking
//!
//! Chunk a caption stream at silences and sentence ends.
//!
//! ```bash
//! cargo run --example transcript_chunks
//! ```

use sectioner::{youtube_resource_id, Caption, TranscriptChunker, TranscriptPipeline};

fn main() -> sectioner::Result<()> {
    let script = [
        "welcome back everyone",
        "[Music]",
        "today we look at attention.",
        "the the the key idea is that",
        "every token can look at every other token",
        "and weigh what it finds.",
        "let's see why that matters for translation",
        "[Applause]",
        "positional encodings come next:",
        "without them attention is order blind.",
    ];

    let mut t = 0.0;
    let captions: Vec<Caption> = script
        .iter()
        .enumerate()
        .map(|(i, text)| {
            // A long pause after the fifth line.
            let gap = if i == 5 { 7.5 } else { 0.3 };
            let caption = Caption::new(*text, t, 2.5);
            t += 2.5 + gap;
            caption
        })
        .collect();

    let resource_id = youtube_resource_id("https://www.youtube.com/watch?v=iDulhoQ2pro")?;
    let pipeline = TranscriptPipeline::new(TranscriptChunker::new(15)?, "to-be-mapped");
    let report = pipeline.run(&resource_id, &captions);

    for section in &report.sections {
        println!("{} [{} words]", section.section_title, section.word_count);
        println!("    {}", section.content_original);
    }

    Ok(())
}
