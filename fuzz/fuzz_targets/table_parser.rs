#![no_main]

use convergent::config::AnalysisConfig;
use convergent::dataset::{
    FluencyEntry, Participant, Response, Table, FLUENCY, PARTICIPANTS, RESPONSES,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary CSV bytes must produce a table or an error, never a panic,
    // and typed parsing of any table must do the same
    let config = AnalysisConfig::default();
    if let Ok(table) = Table::from_reader(PARTICIPANTS, data) {
        let _ = Participant::parse_table(&table, &config);
    }
    if let Ok(table) = Table::from_reader(RESPONSES, data) {
        let _ = Response::parse_table(&table, &config);
    }
    if let Ok(table) = Table::from_reader(FLUENCY, data) {
        let _ = FluencyEntry::parse_table(&table, &config);
    }
});
