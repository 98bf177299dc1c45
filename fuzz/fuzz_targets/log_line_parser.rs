#![no_main]

use libfuzzer_sys::fuzz_target;
use loggraph::catalog::EventCatalog;
use loggraph::log_parser::LogLineParser;

fuzz_target!(|data: &[u8]| {
    // Arbitrary log text must only ever be skipped, never panic
    let parser = LogLineParser::new();
    let mut catalog = EventCatalog::new();
    if let Ok(input) = std::str::from_utf8(data) {
        for line in input.lines() {
            let _ = parser.parse_allocating(line, &mut catalog);
        }
    }
    let _ = parser.parse_reader(data, &catalog);
});
