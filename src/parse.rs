use serde_json::Value;
use tokio::task::spawn_blocking;

use crate::Result;

/// Parses a job search response and re-serializes it pretty-printed (2 space indent),
/// ready to be written to disk. Big listings are parsed off the runtime threads.
pub(crate) async fn pretty_listing(body: Vec<u8>) -> Result<Vec<u8>> {
    let pretty = spawn_blocking(move || -> Result<Vec<u8>> {
        let listing: Value = serde_json::from_slice(&body)?;
        Ok(serde_json::to_vec_pretty(&listing)?)
    })
    .await??;

    Ok(pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_is_pretty_printed() {
        let body = br#"{"noOfJobs":1,"jobDetails":[{"title":"Rust dev"}]}"#.to_vec();
        let pretty = String::from_utf8(pretty_listing(body).await.unwrap()).unwrap();
        assert!(pretty.starts_with("{\n  \""));
        assert!(pretty.contains("\n  \"noOfJobs\": 1"));
        assert!(pretty.contains("\"title\": \"Rust dev\""));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let err = pretty_listing(b"<html>blocked</html>".to_vec()).await;
        assert!(matches!(err, Err(crate::Error::Json(_))));
    }
}
