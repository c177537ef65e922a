use agilent_sorter::domain::{MAX_SAMPLE_NAME_CHARS, SampleName, UNNAMED_SAMPLE, is_allowed_char};
use agilent_sorter::extract::{SAMPLE_NAME_LEN, SAMPLE_NAME_OFFSET, decode_sample_window};

const SAMPLES: &[&str] = &[
    "",
    "***",
    "xy Sample One",
    "  ABcd1 Sample\0\0\0",
    "MeOH+H2O=50:50 @ 40°C",
    "a very long sample name that definitely exceeds the limit",
    "Ünïcödé Probe #3",
    "tabs\tand\nnewlines",
    "                              x",
    "*** leading junk",
    "name/with\\slashes:and|pipes?",
    "5 m² ½",
    "a\u{203F}b",
    "e\u{301}x",
];

#[test]
fn sanitize_output_is_short_and_clean() {
    for sample in SAMPLES {
        let name = SampleName::sanitize(sample);
        assert!(!name.as_str().is_empty(), "{sample:?}");
        assert!(name.as_str().chars().count() <= MAX_SAMPLE_NAME_CHARS, "{sample:?}");
        assert!(name.as_str().chars().all(is_allowed_char), "{sample:?} -> {name}");
    }
}

#[test]
fn sanitize_is_idempotent() {
    for sample in SAMPLES {
        let once = SampleName::sanitize(sample);
        let twice = SampleName::sanitize(once.as_str());
        assert_eq!(once, twice, "{sample:?}");
    }
}

#[test]
fn sanitize_blank_inputs() {
    assert_eq!(SampleName::sanitize("").as_str(), UNNAMED_SAMPLE);
    assert_eq!(SampleName::sanitize("***").as_str(), UNNAMED_SAMPLE);
}

#[test]
fn sanitize_word_substitutions() {
    assert_eq!(
        SampleName::sanitize("MeOH+H2O=50:50 @ 40°C").as_str(),
        "MeOHplusH2Oeq5050  40degC"
    );
}

#[test]
fn extracted_window_feeds_sanitizer() {
    let mut buffer = vec![0u8; SAMPLE_NAME_OFFSET as usize];
    let mut window = b"  ABcd1 Sample\x00\x00".to_vec();
    window.resize(SAMPLE_NAME_LEN, 0);
    buffer.extend_from_slice(&window);

    let raw = decode_sample_window(&buffer);
    assert!(raw.replace('\0', "").trim().starts_with("ABcd1 Sample"));
    assert_eq!(SampleName::sanitize(&raw).as_str(), "ABcd1 Sample");
}

#[test]
fn legacy_superscripts_and_fractions_survive() {
    let mut buffer = vec![0u8; SAMPLE_NAME_OFFSET as usize];
    buffer.extend_from_slice(b"xy 5 m\xB2 \xBD conc\x00\x00");

    let raw = decode_sample_window(&buffer);
    assert_eq!(SampleName::sanitize(&raw).as_str(), "xy 5 m² ½ conc");
}
