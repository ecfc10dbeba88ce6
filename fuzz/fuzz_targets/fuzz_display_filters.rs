#![no_main]
use libfuzzer_sys::fuzz_target;
use labportal::format::{DisplayFormatter, FilterRegistry};

fuzz_target!(|data: &[u8]| {
    let registry = FilterRegistry::with_display_filters(DisplayFormatter::default());

    // Raw text as a string value, and as JSON when it parses
    let text = String::from_utf8_lossy(data);
    let mut values = vec![serde_json::Value::String(text.to_string())];
    if let Ok(v) = serde_json::from_slice::<serde_json::Value>(data) {
        values.push(v);
    }

    // Filters must never panic
    for name in registry.names() {
        for value in &values {
            let _ = registry.apply(name, value);
        }
    }
    let _ = registry.render_expression(&text);
});
