//! Default functions for serde defaults in manifest resources.

pub fn consumer_group() -> String {
    "*".to_string()
}

pub fn connect_group() -> String {
    "connect-cluster".to_string()
}

pub fn status_topic() -> String {
    "connect-status".to_string()
}

pub fn offset_topic() -> String {
    "connect-offsets".to_string()
}

pub fn configs_topic() -> String {
    "connect-configs".to_string()
}
