use crate::prelude::*;
use std::fmt::{self, Display};

///
/// Index
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub keys: IndexMap<String, Value>,

    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

impl Index {
    #[must_use]
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            name: None,
            keys: keys.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            options: IndexMap::new(),
        }
    }

    /// Rewrite every key as `<prefix>.<key>`, used when an index is lifted
    /// out of an embedded class into its owner.
    #[must_use]
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            name: self.name.clone(),
            keys: self
                .keys
                .iter()
                .map(|(key, order)| (format!("{prefix}.{key}"), order.clone()))
                .collect(),
            options: self.options.clone(),
        }
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self
            .keys
            .iter()
            .map(|(key, order)| format!("{key}: {order}"))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{{{keys}}}")
    }
}
