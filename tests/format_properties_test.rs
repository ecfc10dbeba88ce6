use labportal::format::{
    format_customer_specimen_status, format_specimen_number, format_timestamp_to_date,
    format_timestamp_to_date_time,
};
use serde_json::{Value, json};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Split `<Month> <DD> <YYYY>[ <hh>:<mm>]` into its parts, checking widths
fn parse_rendered(s: &str) -> (String, u32, i32, Option<(u32, u32)>) {
    let parts: Vec<&str> = s.split(' ').collect();
    assert!(parts.len() == 3 || parts.len() == 4, "unexpected shape: {s}");
    assert!(MONTHS.contains(&parts[0]), "bad month in {s}");
    assert_eq!(parts[1].len(), 2, "day not zero-padded in {s}");
    assert_eq!(parts[2].len(), 4, "year not four digits in {s}");
    let time = parts.get(3).map(|t| {
        let (h, m) = t.split_once(':').unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(m.len(), 2);
        (h.parse().unwrap(), m.parse().unwrap())
    });
    (
        parts[0].to_string(),
        parts[1].parse().unwrap(),
        parts[2].parse().unwrap(),
        time,
    )
}

#[test]
fn status_is_identity_except_received() {
    assert_eq!(
        format_customer_specimen_status(&json!("Received")),
        "Received by Lab"
    );
    for s in [
        "Registered",
        "Arrived",
        "Rejected",
        "QualityControlled",
        "WetWork",
        "ResultReady",
        "received",
        "",
        "Received by Lab",
    ] {
        assert_eq!(format_customer_specimen_status(&json!(s)), s);
    }
}

#[test]
fn well_formed_millis_render_dates() {
    for t in [
        0_i64,
        86_399_999,
        951_782_400_000,   // 2000-02-29
        1_700_000_000_000, // 2023-11-14
        4_102_444_800_000, // 2100-01-01
    ] {
        let rendered = format_timestamp_to_date(&json!(t));
        let (_, day, year, time) = parse_rendered(&rendered);
        assert!((1..=31).contains(&day));
        assert!(year >= 1970);
        assert!(time.is_none());
    }
    assert_eq!(format_timestamp_to_date(&json!(951_782_400_000_i64)), "February 29 2000");
}

#[test]
fn comma_stripping_is_equivalent() {
    assert_eq!(
        format_timestamp_to_date(&json!("1,700,000,000,000")),
        format_timestamp_to_date(&json!(1_700_000_000_000_i64))
    );
    assert_eq!(
        format_timestamp_to_date(&json!("1,,700000000000,")),
        "November 14 2023"
    );
}

#[test]
fn non_coercible_inputs_render_empty() {
    let inputs: [Value; 6] = [
        json!("not-a-date"),
        Value::Null,
        json!({}),
        json!([]),
        json!(false),
        json!(""),
    ];
    for v in &inputs {
        assert_eq!(format_timestamp_to_date(v), "", "{v}");
        assert_eq!(format_timestamp_to_date_time(v), "", "{v}");
    }
}

#[test]
fn out_of_range_inputs_render_empty() {
    assert_eq!(format_timestamp_to_date(&json!(9_000_000_000_000_000_i64)), "");
    assert_eq!(format_timestamp_to_date(&json!("99999999999999999999")), "");
    assert_eq!(format_timestamp_to_date_time(&json!(9_000_000_000_000_i64)), "");
}

#[test]
fn date_time_uses_twelve_hour_clock_without_suffix() {
    let rendered = format_timestamp_to_date_time(&json!(1_700_000_000));
    assert_eq!(rendered, "November 14 2023 10:13");

    for secs in (0..86_400).step_by(1_800) {
        let rendered = format_timestamp_to_date_time(&json!(1_699_920_000 + secs));
        let (_, _, _, time) = parse_rendered(&rendered);
        let (hour, minute) = time.unwrap();
        assert!((1..=12).contains(&hour), "{rendered}");
        assert!(minute < 60);
        assert!(!rendered.contains("AM") && !rendered.contains("PM"));
    }
}

#[test]
fn specimen_number_is_idempotent() {
    let inputs: [Value; 7] = [
        json!("ab12cd34ef"),
        json!("AB12-CD34-EF"),
        json!("  x-1 "),
        json!(""),
        json!("***"),
        json!(987_654_321),
        Value::Null,
    ];
    for x in &inputs {
        let once = format_specimen_number(x);
        let twice = format_specimen_number(&json!(once));
        assert_eq!(twice, once, "not idempotent for {x}");
    }
}

#[test]
fn specimen_number_canonical_form() {
    assert_eq!(format_specimen_number(&json!("ab12cd34ef")), "AB12-CD34-EF");
    assert_eq!(format_specimen_number(&json!(987_654_321)), "9876-5432-1");
}

#[test]
fn five_digit_years_render_without_sign() {
    assert_eq!(
        format_timestamp_to_date(&json!(253_402_300_799_999_i64)),
        "December 31 9999"
    );
    assert_eq!(
        format_timestamp_to_date(&json!(253_402_300_800_000_i64)),
        "January 01 10000"
    );
    assert_eq!(
        format_timestamp_to_date_time(&json!(253_402_300_800_i64)),
        "January 01 10000 12:00"
    );
    assert_eq!(
        format_timestamp_to_date(&json!(-93_692_592_000_000_i64)),
        "January 01 1000"
    );
    for v in [json!(8_640_000_000_000_000_i64), json!(-8_640_000_000_000_000_i64)] {
        let rendered = format_timestamp_to_date(&v);
        assert!(!rendered.is_empty());
        assert!(!rendered.contains(['+', '-']), "{rendered}");
    }
}
