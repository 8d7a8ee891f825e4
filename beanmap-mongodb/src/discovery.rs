//! Codec discovery.
//!
//! Every `#[derive(Bean)]` type submits a [`CodecCandidate`] that is linked
//! into the final binary. At startup [`DiscoveryScanner::scan`] walks the
//! candidates whose module path lies under one of the configured roots and
//! instantiates a codec for each.
//!
//! A root such as `shop::models` matches candidates declared in
//! `shop::models` itself and, in recursive mode, in any sub-module
//! (`shop::models::billing`). Matching is by whole path segments, so
//! `shop::model` does not match `shop::models`.
//!
//! A candidate that fails to build is logged and skipped; the scan always
//! completes.

use std::borrow::Cow;
use std::sync::Arc;

use beanmap_schema::SchemaError;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::codec::{BeanCodec, Codec};
use crate::registry::CodecSet;
use crate::schema::Bean;

/// Result type for building a single codec.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Why a candidate could not be turned into a codec.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The bean's field table is inconsistent.
    #[error("invalid schema for `{type_path}`: {source}")]
    InvalidSchema {
        type_path: String,
        #[source]
        source: SchemaError,
    },

    /// A custom factory failed.
    #[error("failed to build codec for `{type_path}`: {message}")]
    Factory { type_path: String, message: String },
}

/// Builds the codec for one candidate.
pub type CodecFactory = fn() -> DiscoveryResult<Arc<dyn Codec>>;

/// A bean type that discovery may turn into a codec.
#[derive(Debug, Clone)]
pub struct CodecCandidate {
    type_path: Cow<'static, str>,
    module_path: Cow<'static, str>,
    factory: Option<CodecFactory>,
}

impl CodecCandidate {
    /// A candidate that builds a codec.
    pub const fn codec(
        type_path: &'static str,
        module_path: &'static str,
        factory: CodecFactory,
    ) -> Self {
        Self {
            type_path: Cow::Borrowed(type_path),
            module_path: Cow::Borrowed(module_path),
            factory: Some(factory),
        }
    }

    /// A bean that is only ever nested inside others and has no codec of
    /// its own.
    pub const fn embedded(type_path: &'static str, module_path: &'static str) -> Self {
        Self {
            type_path: Cow::Borrowed(type_path),
            module_path: Cow::Borrowed(module_path),
            factory: None,
        }
    }

    /// A codec candidate for a bean type known at compile time.
    pub fn for_bean<T: Bean>() -> Self {
        let schema = T::schema();
        Self {
            type_path: Cow::Owned(schema.type_path()),
            module_path: Cow::Borrowed(schema.module_path()),
            factory: Some(BeanCodec::<T>::factory),
        }
    }

    /// Fully qualified type path.
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// Module the type is declared in.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Whether this candidate builds a codec.
    pub fn is_codec(&self) -> bool {
        self.factory.is_some()
    }

    /// Whether the candidate lies under `root`.
    pub fn is_under(&self, root: &str, recursive: bool) -> bool {
        module_matches(&self.module_path, root, recursive)
    }
}

inventory::collect!(CodecCandidate);

/// Somewhere candidates come from.
pub trait CandidateSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// All candidates this source knows about.
    fn candidates(&self) -> Vec<CodecCandidate>;
}

/// Candidates submitted by `#[derive(Bean)]` and linked into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedCandidates;

impl CandidateSource for LinkedCandidates {
    fn name(&self) -> &str {
        "linked"
    }

    fn candidates(&self) -> Vec<CodecCandidate> {
        inventory::iter::<CodecCandidate>
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Candidates listed explicitly at startup.
#[derive(Debug, Clone, Default)]
pub struct ExplicitCandidates {
    candidates: Vec<CodecCandidate>,
}

impl ExplicitCandidates {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bean type.
    pub fn bean<T: Bean>(mut self) -> Self {
        self.candidates.push(CodecCandidate::for_bean::<T>());
        self
    }

    /// Add a prepared candidate.
    pub fn candidate(mut self, candidate: CodecCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Number of listed candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl CandidateSource for ExplicitCandidates {
    fn name(&self) -> &str {
        "explicit"
    }

    fn candidates(&self) -> Vec<CodecCandidate> {
        self.candidates.clone()
    }
}

/// Finds and instantiates codecs under a set of module roots.
#[derive(Default)]
pub struct DiscoveryScanner {
    sources: Vec<Box<dyn CandidateSource>>,
}

impl DiscoveryScanner {
    /// Create a scanner with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner over the linked candidates.
    pub fn linked() -> Self {
        Self::new().with_source(LinkedCandidates)
    }

    /// Add a candidate source. Sources are scanned in the order added.
    pub fn with_source(mut self, source: impl CandidateSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Scan the roots and build one codec per bean type.
    ///
    /// Roots may be written with `::` or `.` separators. A type found by
    /// more than one source or root is kept once.
    pub fn scan<S: AsRef<str>>(&self, roots: &[S], recursive: bool) -> CodecSet {
        let roots: Vec<String> = roots.iter().map(|r| normalize_root(r.as_ref())).collect();
        let mut codecs = CodecSet::new();

        for source in &self.sources {
            for candidate in source.candidates() {
                if !roots.iter().any(|root| candidate.is_under(root, recursive)) {
                    continue;
                }

                let Some(factory) = candidate.factory else {
                    debug!(
                        source = source.name(),
                        candidate = candidate.type_path(),
                        "Not a codec, skipped"
                    );
                    continue;
                };

                match factory() {
                    Ok(codec) => {
                        let type_name = codec.type_name();
                        if codecs.insert(codec) {
                            info!(
                                source = source.name(),
                                codec = candidate.type_path(),
                                bean = type_name,
                                "Codec registered"
                            );
                        } else {
                            debug!(
                                source = source.name(),
                                codec = candidate.type_path(),
                                "Duplicate codec skipped"
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            source = source.name(),
                            candidate = candidate.type_path(),
                            error = %e,
                            "Failed to build codec, skipped"
                        );
                    }
                }
            }
        }

        info!(roots = ?roots, recursive, codecs = codecs.len(), "Codec discovery finished");
        codecs
    }
}

/// Normalize a configured root: trim, accept `.` separators, drop a
/// trailing separator.
pub fn normalize_root(root: &str) -> String {
    let root = root.trim().replace('.', "::");
    root.trim_end_matches("::").to_string()
}

fn module_matches(module_path: &str, root: &str, recursive: bool) -> bool {
    if module_path == root {
        return true;
    }
    if !recursive {
        return false;
    }
    if root.is_empty() {
        return true;
    }
    module_path
        .strip_prefix(root)
        .is_some_and(|rest| rest.starts_with("::"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_factory() -> DiscoveryResult<Arc<dyn Codec>> {
        Err(DiscoveryError::Factory {
            type_path: "shop::broken::Bad".to_string(),
            message: "boom".to_string(),
        })
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_root(" shop::models "), "shop::models");
        assert_eq!(normalize_root("shop.models"), "shop::models");
        assert_eq!(normalize_root("shop::models::"), "shop::models");
    }

    #[test]
    fn test_module_matches() {
        assert!(module_matches("shop::models", "shop::models", false));
        assert!(!module_matches("shop::models::billing", "shop::models", false));
        assert!(module_matches("shop::models::billing", "shop::models", true));
        assert!(!module_matches("shop::models_v2", "shop::models", true));
        assert!(!module_matches("shop", "shop::models", true));
        assert!(module_matches("anything::at_all", "", true));
        assert!(!module_matches("anything", "", false));
    }

    #[test]
    fn test_embedded_candidate_is_not_a_codec() {
        let candidate = CodecCandidate::embedded("shop::models::Address", "shop::models");
        assert!(!candidate.is_codec());
        assert!(candidate.is_under("shop", true));

        let codecs = DiscoveryScanner::new()
            .with_source(ExplicitCandidates::new().candidate(candidate))
            .scan(&["shop"], true);
        assert!(codecs.is_empty());
    }

    #[test]
    fn test_failing_factory_is_skipped() {
        let candidate = CodecCandidate::codec("shop::broken::Bad", "shop::broken", failing_factory);
        let source = ExplicitCandidates::new().candidate(candidate);
        assert_eq!(source.len(), 1);

        let codecs = DiscoveryScanner::new()
            .with_source(source)
            .scan(&["shop::broken"], false);
        assert!(codecs.is_empty());
    }

    #[test]
    fn test_discovery_error_display() {
        let err = failing_factory().unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to build codec for `shop::broken::Bad`: boom"
        );
    }
}
