use super::*;

#[test]
fn select_all_query_quotes_identifier() {
    assert_eq!(select_all_query("students"), "SELECT * FROM `students`");
}

#[test]
fn select_all_query_escapes_backticks() {
    assert_eq!(select_all_query("odd`name"), "SELECT * FROM `odd``name`");
}

#[test]
fn record_equality_is_structural() {
    let a = Record {
        table: "students".to_string(),
        text: "Table: students, name: Ada".to_string(),
    };
    let b = a.clone();
    assert_eq!(a, b);
}
