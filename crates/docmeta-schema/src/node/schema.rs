use crate::prelude::*;

///
/// Schema
///
/// The resolved class set handed to code emitters. Read-only once built.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    classes: BTreeMap<String, ClassConfig>,
}

impl Schema {
    pub(crate) const fn new(classes: BTreeMap<String, ClassConfig>) -> Self {
        Self { classes }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassConfig> {
        self.classes.get(name)
    }

    /// All classes in name order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassConfig)> {
        self.classes.iter().map(|(name, class)| (name.as_str(), class))
    }

    pub fn persistable(&self) -> impl Iterator<Item = (&str, &ClassConfig)> {
        self.classes().filter(|(_, class)| class.is_persistable())
    }

    pub fn embedded(&self) -> impl Iterator<Item = (&str, &ClassConfig)> {
        self.classes().filter(|(_, class)| class.is_embedded)
    }

    /// Direct subclasses of `parent`, in name order.
    pub fn subclasses_of<'a>(
        &'a self,
        parent: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ClassConfig)> + 'a {
        self.classes()
            .filter(move |(_, class)| class.parent() == Some(parent))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
