#![no_main]
#![forbid(unsafe_code)]
use libfuzzer_sys::fuzz_target;
use skillet::parser::StreamParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Whole-string ingest: arbitrary input must never panic
        let mut parser = StreamParser::new();
        parser.ingest(s);
        parser.finalize();
        let _ = parser.drain_calls();
        let _ = parser.text();

        // Char-at-a-time ingest exercises the fragment reassembly path
        let mut chopped = StreamParser::new();
        let mut buf = [0u8; 4];
        for ch in s.chars() {
            chopped.ingest(ch.encode_utf8(&mut buf));
        }
        chopped.finalize();
        let _ = chopped.drain_calls();
    }
});
