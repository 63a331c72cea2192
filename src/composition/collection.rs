use std::collections::BTreeMap;
use std::ops::Add;
use std::sync::Arc;

use crate::composition::dsl::IntoIntent;
use crate::foundation::value::{ParamValue, Params};
use crate::spec::intent::RawIntent;

/// One appended intent together with the defaults stack in force when it was appended.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Entry {
    pub(crate) intent: Arc<RawIntent>,
    /// Outermost frame first.
    pub(crate) frames: Arc<[Arc<Params>]>,
}

/// Ordered, immutable list of content intents.
///
/// Every builder call consumes the collection and returns a new one. Appending to a shared
/// collection copies its entry list shallowly (each entry is a pair of `Arc`s, so no intent
/// or defaults frame is duplicated), and a collection held elsewhere never observes later
/// appends.
/// Combination concatenates entries and is associative.
#[derive(Clone, Debug, Default)]
pub struct ContentCollection {
    entries: Arc<Vec<Entry>>,
    stack: Arc<[Arc<Params>]>,
    labels: Arc<BTreeMap<String, String>>,
}

impl ContentCollection {
    /// Create an empty collection with no defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a defaults frame. Intents appended afterwards inherit it.
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let frame: Params = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut stack = self.stack.to_vec();
        stack.push(Arc::new(frame));
        self.stack = stack.into();
        self
    }

    /// Append one intent.
    pub fn item(mut self, item: impl IntoIntent) -> Self {
        let entry = Entry {
            intent: Arc::new(item.into_intent()),
            frames: Arc::clone(&self.stack),
        };
        Arc::make_mut(&mut self.entries).push(entry);
        self
    }

    /// Append every intent of `inner`, placing this collection's current frames outside
    /// each nested intent's own stack.
    pub fn nest(mut self, inner: ContentCollection) -> Self {
        let entries = Arc::make_mut(&mut self.entries);
        for e in inner.entries.iter() {
            let frames: Vec<Arc<Params>> =
                self.stack.iter().chain(e.frames.iter()).cloned().collect();
            entries.push(Entry {
                intent: Arc::clone(&e.intent),
                frames: frames.into(),
            });
        }
        self.merge_labels(&inner.labels);
        self
    }

    /// Concatenate two collections. Each entry keeps the frames it was appended with; the
    /// left side's active defaults stay active for later appends.
    pub fn combine(mut self, other: ContentCollection) -> Self {
        Arc::make_mut(&mut self.entries).extend(other.entries.iter().cloned());
        self.merge_labels(&other.labels);
        self
    }

    /// Attach display labels for raw path segments. Later labels win.
    pub fn labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = Arc::make_mut(&mut self.labels);
        for (k, v) in labels {
            table.insert(k.into(), v.into());
        }
        self
    }

    fn merge_labels(&mut self, right: &BTreeMap<String, String>) {
        if right.is_empty() {
            return;
        }
        let table = Arc::make_mut(&mut self.labels);
        table.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Number of raw intents (before vector expansion).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw intents in order.
    pub fn intents(&self) -> impl Iterator<Item = &RawIntent> {
        self.entries.iter().map(|e| e.intent.as_ref())
    }

    /// Display labels for raw path segments.
    pub fn label_table(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl Add for ContentCollection {
    type Output = ContentCollection;

    fn add(self, rhs: ContentCollection) -> ContentCollection {
        self.combine(rhs)
    }
}

impl FromIterator<ContentCollection> for ContentCollection {
    fn from_iter<T: IntoIterator<Item = ContentCollection>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ContentCollection::new(), ContentCollection::combine)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/collection.rs"]
mod tests;
