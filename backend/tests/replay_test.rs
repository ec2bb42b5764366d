use bot_arena_backend::error::AppError;
use bot_arena_backend::replay::{
    BLUE_BROKEN, RED_BROKEN, REPLAY_HEADER, RunnerOutput, scan_output, winner_from_replay,
};

#[test]
fn test_scan_finds_replay_after_header() {
    let body = format!("build log\nnoise\n{REPLAY_HEADER}\n{{\"winner\":\"red\"}}\ntrailer\n");

    let output = scan_output(body.as_bytes()).expect("header should be found");
    assert_eq!(
        output,
        RunnerOutput::Replay {
            replay_line: "{\"winner\":\"red\"}".to_string()
        }
    );
}

#[test]
fn test_scan_red_broken_means_blue_wins() {
    let body = format!("compiling red\n{RED_BROKEN}\nstack trace follows\n");
    let output = scan_output(body.as_bytes()).expect("forfeit sentinel should be found");
    assert_eq!(output, RunnerOutput::Forfeit { winner: 2 });
}

#[test]
fn test_scan_blue_broken_means_red_wins() {
    let body = format!("{BLUE_BROKEN}\n");
    let output = scan_output(body.as_bytes()).expect("forfeit sentinel should be found");
    assert_eq!(output, RunnerOutput::Forfeit { winner: 1 });
}

#[test]
fn test_scan_without_sentinel_is_a_parse_error() {
    let err = scan_output(b"just a build log, no game happened\n").unwrap_err();
    assert!(
        matches!(err, AppError::Parse(_)),
        "garbage output should be a parse error, got {err:?}"
    );
}

#[test]
fn test_scan_header_on_last_line_is_a_parse_error() {
    let body = format!("log\n{REPLAY_HEADER}");
    let err = scan_output(body.as_bytes()).unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn test_scan_rejects_invalid_utf8() {
    let err = scan_output(&[0xff, 0xfe, 0x00]).unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn test_winner_mapping() {
    assert_eq!(winner_from_replay("{\"winner\":\"red\"}").unwrap(), 1);
    assert_eq!(winner_from_replay("{\"winner\":\"blue\"}").unwrap(), 2);
}

#[test]
fn test_winner_ignores_extra_fields() {
    let line = "{\"winner\":\"blue\",\"turns\":412,\"seed\":7}";
    assert_eq!(
        winner_from_replay(line).unwrap(),
        2,
        "extra replay fields should not affect the winner"
    );
}

#[test]
fn test_unknown_winner_is_a_parse_error() {
    let err = winner_from_replay("{\"winner\":\"green\"}").unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn test_non_json_replay_line_is_a_parse_error() {
    let err = winner_from_replay("winner: red").unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn test_winner_classification_survives_reserialization() {
    let line = "{\"winner\":\"red\",\"turns\":9}";
    let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
    let reserialized = parsed.to_string();
    assert_eq!(
        winner_from_replay(line).unwrap(),
        winner_from_replay(&reserialized).unwrap(),
        "round-tripping the replay JSON must not change the winner"
    );
}
