//! Paper Sectioning
//!
//! Section an extracted paper by its headings and merge the sections by
//! concept.
//!
//! ```bash
//! cargo run --example 01_paper_sections
//! ```

use sectioner::{Concept, DocumentPipeline, Layout, Vocabulary};

fn main() -> sectioner::Result<()> {
    let paper = "\
**Abstract**
Large pre-trained language models store factual knowledge in their parameters,
but their ability to access and precisely manipulate that knowledge is limited.
We explore a fine-tuning recipe for retrieval-augmented generation models which
combine pre-trained parametric and non-parametric memory for generation.

## 1 Introduction
Pre-trained neural language models learn a substantial amount of in-depth
knowledge from data. They can do so without any access to an external memory,
as a parameterized implicit knowledge base. While this development is exciting,
such models cannot easily expand or revise their memory.

### 1.1 Contributions
We endow pre-trained generation models with a differentiable retriever.

2
## 2 Dense Retrieval
The retriever is a bi-encoder: a document encoder and a query encoder produce
dense representations, and the top documents by inner product are retrieved
with maximum inner product search over an index of millions of passages.

## 3 Generation
The generator conditions on the input and the retrieved passages. We compare
two formulations that marginalize over documents, per sequence or per token,
to produce the output sequence one token at a time.

## References
[1] P. Lewis et al. Retrieval-Augmented Generation for Knowledge-Intensive NLP Tasks.";

    let vocabulary = Vocabulary::new(vec![
        Concept::new("retrieval", ["retriev", "search", "index"]),
        Concept::new("generation", ["generat", "decod"]),
    ])?;

    println!("== by concept ==");
    let report = DocumentPipeline::new(vocabulary.clone()).run("arxiv-2005.11401", paper);
    for section in &report.sections {
        println!("{section}");
    }

    println!("\n== per heading ==");
    let report = DocumentPipeline::new(vocabulary)
        .with_layout(Layout::PerSpan)
        .run("arxiv-2005.11401", paper);
    for section in &report.sections {
        println!("{section}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    Ok(())
}
