use crate::prelude::*;

///
/// ClassConfig
///
/// Fully typed configuration of one document class. Created by the
/// normalizer, enriched by each later stage, and frozen inside a [`Schema`]
/// once compilation finishes.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassConfig {
    pub name: String,
    pub is_embedded: bool,

    // persistable only
    pub connection: Option<String>,
    pub collection: Option<String>,
    pub use_batch_insert: bool,
    pub id_generator: Option<IdGenerator>,

    pub is_file: bool,
    pub inheritable: Option<Inheritable>,
    pub inheritance: Option<Inheritance>,

    pub fields: IndexMap<String, Field>,
    pub references_one: IndexMap<String, Reference>,
    pub references_many: IndexMap<String, Reference>,
    pub embeddeds_one: IndexMap<String, Embedded>,
    pub embeddeds_many: IndexMap<String, Embedded>,

    pub relations_one: IndexMap<String, Relation>,
    pub relations_many_one: IndexMap<String, Relation>,
    pub relations_many_many: IndexMap<String, Relation>,
    pub relations_many_through: IndexMap<String, ThroughRelation>,

    pub indexes: Vec<Index>,
    pub events: Events,
    pub parent_events: Events,

    // derived
    pub on_delete_rules: Vec<OnDeleteRule>,
    pub has_references: bool,
    pub has_groups: bool,
    pub resolved_indexes: Vec<Index>,
}

impl ClassConfig {
    #[must_use]
    pub fn new(name: &str, is_embedded: bool) -> Self {
        Self {
            name: name.to_string(),
            is_embedded,
            connection: None,
            collection: None,
            use_batch_insert: false,
            id_generator: None,
            is_file: false,
            inheritable: None,
            inheritance: None,
            fields: IndexMap::new(),
            references_one: IndexMap::new(),
            references_many: IndexMap::new(),
            embeddeds_one: IndexMap::new(),
            embeddeds_many: IndexMap::new(),
            relations_one: IndexMap::new(),
            relations_many_one: IndexMap::new(),
            relations_many_many: IndexMap::new(),
            relations_many_through: IndexMap::new(),
            indexes: Vec::new(),
            events: Events::default(),
            parent_events: Events::default(),
            on_delete_rules: Vec::new(),
            has_references: false,
            has_groups: false,
            resolved_indexes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ClassKind {
        if self.is_embedded {
            ClassKind::Embeddable
        } else if self.inheritance.is_some() {
            ClassKind::PersistableSubclass
        } else {
            ClassKind::PersistableRoot
        }
    }

    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        !self.is_embedded
    }

    #[must_use]
    pub const fn is_subclass(&self) -> bool {
        self.inheritance.is_some()
    }

    /// Parent class name, if this class is a subclass.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.inheritance.as_ref().map(|i| i.class.as_str())
    }

    /// All references, one before many, each in declaration order.
    pub fn references(&self) -> impl Iterator<Item = (Cardinality, &str, &Reference)> {
        let one = self
            .references_one
            .iter()
            .map(|(name, r)| (Cardinality::One, name.as_str(), r));
        let many = self
            .references_many
            .iter()
            .map(|(name, r)| (Cardinality::Many, name.as_str(), r));

        one.chain(many)
    }

    /// All embeds, one before many, each in declaration order.
    pub fn embeddeds(&self) -> impl Iterator<Item = (Cardinality, &str, &Embedded)> {
        let one = self
            .embeddeds_one
            .iter()
            .map(|(name, e)| (Cardinality::One, name.as_str(), e));
        let many = self
            .embeddeds_many
            .iter()
            .map(|(name, e)| (Cardinality::Many, name.as_str(), e));

        one.chain(many)
    }

    /// `(embed name, embedded class)` pairs this class depends on.
    #[must_use]
    pub fn embedded_dependencies(&self) -> Vec<(&str, &str)> {
        self.embeddeds()
            .flat_map(|(_, name, embedded)| {
                embedded
                    .target
                    .known_classes()
                    .into_iter()
                    .map(move |class| (name, class))
            })
            .collect()
    }

    #[must_use]
    pub fn declares_references(&self) -> bool {
        !self.references_one.is_empty() || !self.references_many.is_empty()
    }

    #[must_use]
    pub fn declares_groups(&self) -> bool {
        !self.references_many.is_empty() || !self.embeddeds_many.is_empty()
    }

    /// Every data name the class exposes; relations only count on
    /// persistable classes.
    #[must_use]
    pub fn data_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.fields.keys().map(String::as_str));
        names.extend(self.references_one.keys().map(String::as_str));
        names.extend(self.references_many.keys().map(String::as_str));
        names.extend(self.embeddeds_one.keys().map(String::as_str));
        names.extend(self.embeddeds_many.keys().map(String::as_str));

        if self.is_persistable() {
            names.extend(self.relations_one.keys().map(String::as_str));
            names.extend(self.relations_many_one.keys().map(String::as_str));
            names.extend(self.relations_many_many.keys().map(String::as_str));
            names.extend(self.relations_many_through.keys().map(String::as_str));
        }

        names
    }
}
