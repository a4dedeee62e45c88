//! Capability detection and search query construction.

use crate::registry::{
    domain::{ServerQuery, TextMatch, TextSearchSupport},
    ports::ServerRepository,
};
use tokio::sync::OnceCell;
use tracing::info;

/// Resolves, at most once per process, whether the store supports native
/// text search.
///
/// Concurrent first callers share a single probe. Once resolved the value
/// never changes, even if the store's capability does.
#[derive(Debug, Default)]
pub struct CapabilityProbe {
    resolved: OnceCell<TextSearchSupport>,
}

impl CapabilityProbe {
    /// Creates a probe that queries the store on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe that is already resolved and never queries the store.
    #[must_use]
    pub fn preset(supported: bool) -> Self {
        Self {
            resolved: OnceCell::new_with(Some(TextSearchSupport::from(supported))),
        }
    }

    /// Returns the current state without probing.
    #[must_use]
    pub fn state(&self) -> TextSearchSupport {
        self.resolved
            .get()
            .copied()
            .unwrap_or(TextSearchSupport::Unknown)
    }

    /// Returns whether native text search may be used, probing `repository`
    /// on the first call.
    ///
    /// A failed probe is read as "unsupported", never as an error.
    pub async fn is_text_search_supported<R>(&self, repository: &R) -> bool
    where
        R: ServerRepository + ?Sized,
    {
        self.resolved
            .get_or_init(|| async {
                let support = match repository.probe_text_search().await {
                    Ok(()) => TextSearchSupport::Supported,
                    Err(err) => {
                        info!(
                            reason = %err,
                            "native text search unavailable, using substring fallback"
                        );
                        TextSearchSupport::Unsupported
                    }
                };
                info!(text_search = %support, "text search capability resolved");
                support
            })
            .await
            .is_supported()
    }
}

/// Builds store-neutral search queries.
#[derive(Debug, Default)]
pub struct SearchQueryBuilder {
    probe: CapabilityProbe,
}

impl SearchQueryBuilder {
    /// Creates a builder consulting `probe` for the text strategy.
    #[must_use]
    pub const fn new(probe: CapabilityProbe) -> Self {
        Self { probe }
    }

    /// Returns the capability probe.
    #[must_use]
    pub const fn probe(&self) -> &CapabilityProbe {
        &self.probe
    }

    /// Builds a query, probing the store only when a text predicate is
    /// needed.
    pub async fn build_query<R>(
        &self,
        repository: &R,
        text: Option<&str>,
        tool_names: &[String],
    ) -> ServerQuery
    where
        R: ServerRepository + ?Sized,
    {
        let needs_text = text.is_some_and(|value| !value.trim().is_empty());
        let supported = needs_text && self.probe.is_text_search_supported(repository).await;
        Self::build(text, tool_names, supported)
    }

    /// Builds a query for a known capability.
    ///
    /// Blank text adds no predicate. Supported stores get a native
    /// predicate and the rest a literal substring match over the same
    /// fields. Tool names are an any-of filter joined to the text predicate
    /// with AND.
    #[must_use]
    pub fn build(
        text: Option<&str>,
        tool_names: &[String],
        text_search_supported: bool,
    ) -> ServerQuery {
        let mut query = ServerQuery::all();

        if let Some(term) = text.map(str::trim).filter(|term| !term.is_empty()) {
            query = query.with_text(if text_search_supported {
                TextMatch::full_text(term)
            } else {
                TextMatch::contains(term)
            });
        }

        let names: Vec<String> = tool_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        if names.is_empty() {
            query
        } else {
            query.with_tool_names(names)
        }
    }
}
