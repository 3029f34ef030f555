use crate::prelude::*;
use derive_more::Display;

///
/// Event
/// Lifecycle hooks, in the order they are declared and emitted.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Event {
    #[display("preInsert")]
    PreInsert,
    #[display("postInsert")]
    PostInsert,
    #[display("preUpdate")]
    PreUpdate,
    #[display("postUpdate")]
    PostUpdate,
    #[display("preDelete")]
    PreDelete,
    #[display("postDelete")]
    PostDelete,
}

impl Event {
    pub const ALL: [Self; 6] = [
        Self::PreInsert,
        Self::PostInsert,
        Self::PreUpdate,
        Self::PostUpdate,
        Self::PreDelete,
        Self::PostDelete,
    ];

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.to_string() == key)
    }
}

///
/// Events
/// Handler identifiers per lifecycle hook.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    pub pre_insert: Vec<String>,
    pub post_insert: Vec<String>,
    pub pre_update: Vec<String>,
    pub post_update: Vec<String>,
    pub pre_delete: Vec<String>,
    pub post_delete: Vec<String>,
}

impl Events {
    #[must_use]
    pub fn get(&self, event: Event) -> &[String] {
        match event {
            Event::PreInsert => &self.pre_insert,
            Event::PostInsert => &self.post_insert,
            Event::PreUpdate => &self.pre_update,
            Event::PostUpdate => &self.post_update,
            Event::PreDelete => &self.pre_delete,
            Event::PostDelete => &self.post_delete,
        }
    }

    pub const fn get_mut(&mut self, event: Event) -> &mut Vec<String> {
        match event {
            Event::PreInsert => &mut self.pre_insert,
            Event::PostInsert => &mut self.post_insert,
            Event::PreUpdate => &mut self.pre_update,
            Event::PostUpdate => &mut self.post_update,
            Event::PreDelete => &mut self.pre_delete,
            Event::PostDelete => &mut self.post_delete,
        }
    }

    /// Append every handler of `other` after this one's, hook by hook.
    pub fn append(&mut self, other: &Self) {
        for event in Event::ALL {
            self.get_mut(event).extend(other.get(event).iter().cloned());
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Event::ALL.into_iter().all(|event| self.get(event).is_empty())
    }
}
