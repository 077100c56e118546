#![no_main]
#![forbid(unsafe_code)]
use libfuzzer_sys::fuzz_target;
use skillet::config::Config;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Typed config parsing must reject bad input without panicking
        let _ = toml::from_str::<Config>(s);
    }
});
