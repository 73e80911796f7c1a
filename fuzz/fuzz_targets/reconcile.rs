#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use fortest::backend::executor::ExecutionRecord;
use fortest::results::reconcile::{reconcile_sequence, reconcile_standalone};

fuzz_target!(|input: (u8, i8, bool, &str)| {
    let (count, exit_code, timed_out, output) = input;
    let calls: Vec<String> = (0..count % 8).map(|i| format!("test_{i}")).collect();
    let record = ExecutionRecord {
        output: output.to_string(),
        exit_code: Some(i32::from(exit_code)),
        duration: Duration::ZERO,
        timed_out,
    };
    assert_eq!(reconcile_sequence(&calls, &record).len(), calls.len());
    let _ = reconcile_standalone(&record);
});
