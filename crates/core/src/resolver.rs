//! Source URI → human-facing URL lookup.

use async_trait::async_trait;

/// Resolves a storage URI to a public URL.
///
/// Resolution is cosmetic: implementations absorb every failure and return
/// an empty string for "unresolved".
#[async_trait]
pub trait UriToUrlResolver: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, uri: &str) -> String;
}
