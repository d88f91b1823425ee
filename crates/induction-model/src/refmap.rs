use crate::node::Node;
use rustc_hash::FxHashMap;

/// Identity-keyed map from an original reference-type node's data pointer to
/// its in-progress or finished copy (§3 "Reference map").
///
/// Lives here rather than in `induction-copy` because [`crate::descriptor::CopierThunk`]
/// (the well-known container copiers registered on [`crate::TypeDescriptor`])
/// needs to name the map type without `induction-model` depending back on
/// the crate that consumes it.
#[derive(Default)]
pub struct RefMap {
    seen: FxHashMap<usize, Box<dyn Node>>,
}

impl RefMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&dyn Node> {
        self.seen.get(&id).map(std::convert::AsRef::as_ref)
    }

    pub fn insert(&mut self, id: usize, value: Box<dyn Node>) {
        self.seen.insert(id, value);
    }
}
