use super::*;

#[test]
fn test_parse_variables() {
    let data = parse_variables(&["name=orders".to_string(), "filter=a=b".to_string()]).unwrap();
    assert_eq!(data["name"], "orders");
    assert_eq!(data["filter"], "a=b");

    assert!(parse_variables(&["novalue".to_string()]).is_err());
    assert!(parse_variables(&["=x".to_string()]).is_err());
}

#[test]
fn test_format_table() {
    let table = format_table(
        &["NAME", "VALUE"],
        &[
            vec!["a".to_string(), "1".to_string()],
            vec!["longer".to_string(), "22".to_string()],
        ],
    );
    assert_eq!(
        table,
        "NAME    VALUE\n------  -----\na       1\nlonger  22"
    );
}

#[test]
fn test_finish_maps_aborts() {
    assert!(finish(Ok(())).is_ok());
    assert!(finish(Err(DeployError::Aborted { exit_code: 0 })).is_ok());

    let err = finish(Err(DeployError::Aborted { exit_code: 1 })).unwrap_err();
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(1));
    assert_eq!(err.to_string(), "");

    let err = finish(Err(DeployError::Usage("bad".to_string()))).unwrap_err();
    assert!(err.downcast_ref::<ExitCode>().is_none());
}

#[test]
fn test_policy_selection() {
    assert!(select_policy(true, false).should_proceed("drop?"));
    assert!(!select_policy(false, false).should_proceed("drop?"));
    assert_eq!(select_policy(false, false).denial_exit_code(false), 1);
}

#[test]
fn test_result_rendering() {
    let result = QueryResult::new(
        ["ID", "NAME"],
        vec![
            vec![Some("1".to_string()), Some("a".to_string())],
            vec![Some("2".to_string()), None],
        ],
    );
    assert_eq!(
        result_cells(&result),
        vec![
            vec!["1".to_string(), "a".to_string()],
            vec!["2".to_string(), "NULL".to_string()],
        ]
    );
    let json = result_json(&result);
    assert_eq!(json[0]["NAME"], "a");
    assert!(json[1]["NAME"].is_null());
}
