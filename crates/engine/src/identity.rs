//! Subject identity resolution.
//!
//! Historical migrations left some subjects with more than one identifying
//! key (a legacy key plus the canonical id). `subject_aliases` maps every
//! known key to its canonical id; the aggregator takes the resolved id-set
//! as input instead of doing its own lookups.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// All identifying keys of one subject, canonical id first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIdentities {
    pub canonical: String,
    /// Legacy keys that may still appear in `legacy_points`.
    pub legacy: Vec<String>,
}

impl SubjectIdentities {
    /// A subject with no known aliases.
    pub fn sole(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            legacy: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subject_aliases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub alias: String,
    pub canonical_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
