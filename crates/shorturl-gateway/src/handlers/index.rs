pub const INDEX_TEXT: &str = "service temporarily unavailable";

pub async fn index_handler() -> &'static str {
    INDEX_TEXT
}
