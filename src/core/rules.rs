//! Per-property indexing policy.
//!
//! A [`Rule`] is a bitmask of flags. Rules are interned by mask value, so
//! all properties that share a policy share one `Arc<Rule>`. [`IndexRules`]
//! maps property names to rules and falls back to a default rule for
//! unmapped names. It is built once with [`IndexRulesBuilder`] and is
//! read-only afterwards.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub const SKIP: u32 = 1;
pub const INDEX: u32 = 1 << 1;
pub const ANALYZE: u32 = 1 << 2;
pub const ANALYZE_WITHOUT_NORMS: u32 = 1 << 3;
pub const STORE: u32 = 1 << 4;
pub const STORE_COMPRESSED: u32 = 1 << 5;
pub const FULL_TEXT: u32 = 1 << 6;
pub const TREAT_AS_DATE: u32 = 1 << 7;

/// Mask applied to unmapped property names by default
pub const DEFAULT_MASK: u32 = ANALYZE | STORE | FULL_TEXT;

static INTERNED: Lazy<Mutex<HashMap<u32, Arc<Rule>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// How a property's values are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOption {
    No,
    Yes,
    Compressed,
}

/// How a property's values are indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOption {
    No,
    NotAnalyzed,
    Analyzed,
    AnalyzedNoNorms,
}

/// Immutable indexing policy for one property
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    mask: u32,
}

impl Rule {
    /// Shared rule for `mask`
    pub fn interned(mask: u32) -> Arc<Rule> {
        let mut cache = INTERNED.lock();
        Arc::clone(cache.entry(mask).or_insert_with(|| Arc::new(Rule { mask })))
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    fn has(&self, flag: u32) -> bool {
        self.mask & flag == flag
    }

    pub fn is_skipped(&self) -> bool {
        self.has(SKIP)
    }

    /// Indexed in any form (exact or analyzed)
    pub fn is_indexed(&self) -> bool {
        !self.is_skipped() && self.mask & (INDEX | ANALYZE | ANALYZE_WITHOUT_NORMS) != 0
    }

    pub fn is_analyzed(&self) -> bool {
        !self.is_skipped() && self.mask & (ANALYZE | ANALYZE_WITHOUT_NORMS) != 0
    }

    pub fn is_analyzed_without_norms(&self) -> bool {
        !self.is_skipped() && self.has(ANALYZE_WITHOUT_NORMS)
    }

    pub fn is_stored(&self) -> bool {
        !self.is_skipped() && self.mask & (STORE | STORE_COMPRESSED) != 0
    }

    pub fn is_stored_compressed(&self) -> bool {
        !self.is_skipped() && self.has(STORE_COMPRESSED)
    }

    pub fn is_full_text(&self) -> bool {
        !self.is_skipped() && self.has(FULL_TEXT)
    }

    pub fn is_treated_as_date(&self) -> bool {
        !self.is_skipped() && self.has(TREAT_AS_DATE)
    }

    pub fn store_option(&self) -> StoreOption {
        if self.is_stored_compressed() {
            StoreOption::Compressed
        } else if self.is_stored() {
            StoreOption::Yes
        } else {
            StoreOption::No
        }
    }

    pub fn index_option(&self) -> IndexOption {
        if self.is_analyzed_without_norms() {
            IndexOption::AnalyzedNoNorms
        } else if self.is_analyzed() {
            IndexOption::Analyzed
        } else if self.is_indexed() {
            IndexOption::NotAnalyzed
        } else {
            IndexOption::No
        }
    }
}

/// Property name to rule mapping with a default
#[derive(Debug, Clone)]
pub struct IndexRules {
    rules: HashMap<String, Arc<Rule>>,
    default_rule: Arc<Rule>,
}

impl IndexRules {
    pub fn builder() -> IndexRulesBuilder {
        IndexRulesBuilder::new(DEFAULT_MASK)
    }

    /// Rule for a property; never fails
    pub fn rule_for(&self, name: &str) -> &Rule {
        self.rules
            .get(name)
            .map(Arc::as_ref)
            .unwrap_or(self.default_rule.as_ref())
    }

    pub fn default_rule(&self) -> &Rule {
        &self.default_rule
    }

    /// Rules for the common repository properties
    pub fn standard() -> Self {
        Self::standard_builder().build()
    }

    /// Builder seeded with [`IndexRules::standard`], for further layering
    pub fn standard_builder() -> IndexRulesBuilder {
        let mut builder = IndexRules::builder();
        builder
            .index_and_store(["jcr:uuid", "mode:uuid"])
            .index_and_store(["jcr:created", "jcr:lastModified"])
            .treat_as_dates(["jcr:created", "jcr:lastModified"]);
        builder
    }
}

impl Default for IndexRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Accumulates OR-ed masks per property name
#[derive(Debug, Clone)]
pub struct IndexRulesBuilder {
    masks: HashMap<String, u32>,
    default_mask: u32,
}

impl IndexRulesBuilder {
    pub fn new(default_mask: u32) -> Self {
        Self {
            masks: HashMap::new(),
            default_mask,
        }
    }

    pub fn default_to(&mut self, mask: u32) -> &mut Self {
        self.default_mask = mask;
        self
    }

    fn add<I, S>(&mut self, names: I, flags: u32) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            *self.masks.entry(name.into()).or_insert(0) |= flags;
        }
        self
    }

    /// Replace any accumulated flags for the names with SKIP
    pub fn skip<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.masks.insert(name.into(), SKIP);
        }
        self
    }

    pub fn index<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, names: I) -> &mut Self {
        self.add(names, INDEX)
    }

    pub fn analyze<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, names: I) -> &mut Self {
        self.add(names, ANALYZE)
    }

    pub fn analyze_without_norms<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, ANALYZE_WITHOUT_NORMS)
    }

    pub fn store<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, names: I) -> &mut Self {
        self.add(names, STORE)
    }

    pub fn store_compressed<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, STORE_COMPRESSED)
    }

    pub fn full_text<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, names: I) -> &mut Self {
        self.add(names, FULL_TEXT)
    }

    pub fn treat_as_dates<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, TREAT_AS_DATE)
    }

    pub fn index_and_store<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, INDEX | STORE)
    }

    pub fn analyze_and_store<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, ANALYZE | STORE)
    }

    pub fn analyze_and_store_and_full_text<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        names: I,
    ) -> &mut Self {
        self.add(names, ANALYZE | STORE | FULL_TEXT)
    }

    /// Snapshot the accumulated masks
    pub fn build(&self) -> IndexRules {
        IndexRules {
            rules: self
                .masks
                .iter()
                .map(|(name, mask)| (name.clone(), Rule::interned(*mask)))
                .collect(),
            default_rule: Rule::interned(self.default_mask),
        }
    }
}
