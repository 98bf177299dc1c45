#![no_main]

use libfuzzer_sys::fuzz_target;
use loggraph::log_graph::{AnalyzerCommand, AnalyzerRow, RecordReader};

fuzz_target!(|data: &[u8]| {
    // Malformed analyzer output ends in an error, never a panic or a hang
    let mut reader = RecordReader::new(data);
    while let Ok(Some(record)) = reader.next_record() {
        let _ = AnalyzerRow::from_record(AnalyzerCommand::Output, &record);
        let _ = AnalyzerRow::from_record(AnalyzerCommand::Gather, &record);
    }
});
