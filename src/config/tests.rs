use super::*;

#[test]
fn config_dir_ends_with_app_name() {
    if let Ok(dir) = get_config_dir() {
        assert!(dir.ends_with("dbchat"));
    }
}
