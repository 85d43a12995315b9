#![no_main]

use libfuzzer_sys::fuzz_target;
use joran_interpreter::Pattern;

fuzz_target!(|literal: &str| {
    let pattern = Pattern::parse(literal);
    assert!(pattern.segments().iter().all(|s| !s.is_empty() && !s.contains('/')));

    // 표시 형식은 다시 파싱해도 같은 패턴
    let reparsed = Pattern::parse(&pattern.to_string());
    assert_eq!(reparsed, pattern);
    assert_eq!(pattern.tail_match(&reparsed), pattern.len());

    let mut walked = pattern.clone();
    while walked.pop().is_some() {}
    assert!(walked.is_empty());
});
