#![no_main]

use libfuzzer_sys::fuzz_target;
use joran_core::repository::LoggerRepository;
use joran_interpreter::JoranConfigurator;

fuzz_target!(|data: &[u8]| {
    if let Ok(document) = std::str::from_utf8(data) {
        let repository = LoggerRepository::new_ref();
        // 복구 가능한 에러는 보고서에 담기고, 어떤 입력도 패닉을 일으키면 안 됨
        if let Ok(report) = JoranConfigurator::new().configure_str(document, &repository) {
            assert!(report.skipped <= report.elements);
        }
    }
});
