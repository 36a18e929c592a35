//! Query descriptions passed to the backend gateway
//!
//! These are deliberately narrow: the resolver only ever needs equality
//! filters and a single inner join against a fixed relation.

use serde::{Deserialize, Serialize};

/// Equality filter on a (possibly relation-qualified) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field to filter on, e.g. `id` or `delivery_assignments.delivery_partner_id`.
    pub field: String,
    /// Value the field must equal.
    pub value: serde_json::Value,
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Relation the field is qualified with, if any.
    pub fn relation(&self) -> Option<&str> {
        self.field.split_once('.').map(|(relation, _)| relation)
    }

    /// Field name without its relation qualifier.
    pub fn column(&self) -> &str {
        self.field
            .split_once('.')
            .map(|(_, column)| column)
            .unwrap_or(&self.field)
    }
}

/// Inner join of a store against one related relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Related relation, e.g. `delivery_assignments`.
    pub relation: String,
    /// Column on the related relation pointing back at the base store key.
    pub foreign_key: String,
    /// Projection applied to the joined result.
    pub projection: String,
}

impl JoinSpec {
    pub fn inner(
        relation: impl Into<String>,
        foreign_key: impl Into<String>,
        projection: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            foreign_key: foreign_key.into(),
            projection: projection.into(),
        }
    }
}
