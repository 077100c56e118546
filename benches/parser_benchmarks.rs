//! Performance benchmarks for skillet hot paths.
//!
//! Benchmarks cover:
//!   - Stream parsing (whole responses vs network-sized fragments)
//!   - Multiline value capture
//!   - Agent turn cycle (full conversation loop)
//!
//! Run: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use skillet::agent::Agent;
use skillet::parser::StreamParser;
use skillet::providers::Provider;

use anyhow::Result;
use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Mock infrastructure (mirrors test mocks, kept local for benchmark isolation)
// ─────────────────────────────────────────────────────────────────────────────

struct BenchProvider;

#[async_trait]
impl Provider for BenchProvider {
    async fn chat_with_system(
        &self,
        _system_prompt: Option<&str>,
        _message: &str,
        _model: &str,
        _temperature: f64,
    ) -> Result<String> {
        Ok("All done.".into())
    }
}

/// A response mixing narrative, two calls, and a multiline payload.
fn mixed_response() -> String {
    let mut body = String::from("I'll write the module and then read it back.\n");
    body.push_str("UTENSIL:write_file\n");
    body.push_str("PARAM:file_path=/tmp/bench/module.py\n");
    body.push_str("PARAM:content=BEGIN_VALUE\n");
    for i in 0..40 {
        body.push_str(&format!("def handler_{i}(payload):\n"));
        body.push_str(&format!("    return payload + {i}\n"));
    }
    body.push_str("END_VALUE\n");
    body.push_str("END_UTENSIL\n");
    body.push_str("Now checking the result.\n");
    body.push_str("UTENSIL:read_file\n");
    body.push_str("PARAM:file_path=/tmp/bench/module.py\n");
    body.push_str("END_UTENSIL\n");
    body.push_str("Done.\n");
    body
}

/// Pure prose with no markers, sized like a long model answer.
fn narrative_response() -> String {
    "The quick brown fox jumps over the lazy dog. ".repeat(200)
}

fn parse_in_fragments(input: &str, step: usize) -> (usize, usize) {
    let mut parser = StreamParser::new();
    let bytes = input.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        let end = (start + step).min(bytes.len());
        parser.ingest(std::str::from_utf8(&bytes[start..end]).unwrap());
        start = end;
    }
    parser.finalize();
    (parser.drain_calls().len(), parser.text().len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Benchmark: stream parsing
// ─────────────────────────────────────────────────────────────────────────────

fn bench_stream_parsing(c: &mut Criterion) {
    let mixed = mixed_response();
    let narrative = narrative_response();

    c.bench_function("stream_parse_whole_response", |b| {
        b.iter(|| {
            let mut parser = StreamParser::new();
            parser.ingest(black_box(&mixed));
            parser.finalize();
            (parser.drain_calls().len(), parser.text().len())
        })
    });

    c.bench_function("stream_parse_fragmented_7b", |b| {
        b.iter(|| parse_in_fragments(black_box(&mixed), 7))
    });

    c.bench_function("stream_parse_char_at_a_time", |b| {
        b.iter(|| parse_in_fragments(black_box(&mixed), 1))
    });

    c.bench_function("stream_parse_narrative_only", |b| {
        b.iter(|| {
            let mut parser = StreamParser::new();
            parser.ingest(black_box(&narrative));
            parser.finalize();
            parser.text().len()
        })
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Benchmark: multiline value capture
// ─────────────────────────────────────────────────────────────────────────────

fn bench_multiline_capture(c: &mut Criterion) {
    let mut body = String::from("UTENSIL:write_file\n");
    body.push_str("PARAM:file_path=/tmp/bench/big.txt\n");
    body.push_str("PARAM:content=BEGIN_VALUE\n");
    for i in 0..400 {
        body.push_str(&format!("line {i}: some payload text that is not a marker\n"));
    }
    body.push_str("END_VALUE\n");
    body.push_str("END_UTENSIL\n");

    c.bench_function("multiline_capture_400_lines", |b| {
        b.iter(|| {
            let mut parser = StreamParser::new();
            parser.ingest(black_box(&body));
            parser.finalize();
            parser
                .drain_calls()
                .pop()
                .and_then(|call| call.params.get("content").map(str::len))
        })
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Benchmark: full agent turn cycle
// ─────────────────────────────────────────────────────────────────────────────

fn bench_agent_turn(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("agent_turn_text_only", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut agent = Agent::builder()
                    .provider(Box::new(BenchProvider))
                    .build()
                    .unwrap();
                agent.run_task(black_box("hello")).await.unwrap()
            })
        });
    });
}

criterion_group!(
    benches,
    bench_stream_parsing,
    bench_multiline_capture,
    bench_agent_turn,
);
criterion_main!(benches);
