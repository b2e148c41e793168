pub mod time;

/// Generates a url-safe unique id for nodes.
pub fn longid() -> String {
    nanoid::nanoid!()
}

/// Generates a uuid v4 for persisted documents.
pub fn uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
