//! Per-call write context.

use crate::{features::WriterFeatures, filter::Filters, symbol::SymbolTable};
use std::sync::Arc;

/// Transient state for one top-level encode call.
///
/// Carries the caller's feature set, the per-call filter set, and an
/// optional shared symbol table for compact type tagging. A context is
/// cheap to clone and never outlives the call it was built for; persistent
/// configuration belongs on the adapter instead.
#[derive(Clone, Default)]
pub struct Context {
    pub features: WriterFeatures,
    pub filters: Filters,
    pub symbols: Option<Arc<dyn SymbolTable>>,
}

impl Context {
    /// A context with the given features and nothing else.
    pub fn with_features(features: WriterFeatures) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    /// Whether the filtered write path is mandatory for an adapter whose
    /// accessor-backed fields are reported by `contains_accessor`.
    pub(crate) fn has_filter(&self, contains_accessor: bool) -> bool {
        self.filters.any()
            || (contains_accessor
                && self.features.contains(WriterFeatures::IGNORE_NON_FIELD_GETTER))
    }
}
