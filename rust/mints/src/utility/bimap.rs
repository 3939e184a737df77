use fnv::FnvHashMap;

/// Bidirectional map between names and dense indices.
///
/// Forward lookup (`name -> index`) is hashed; reverse lookup
/// (`index -> name`) is a plain vector since indices are allocated densely
/// starting from zero.
#[derive(Debug, Clone, Default)]
pub struct BidirectionalMap {
    forward: FnvHashMap<String, usize>,
    reverse: Vec<String>,
}

impl BidirectionalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with the next free index. Returns the previously
    /// assigned index when the name is already present.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&index) = self.forward.get(name) {
            return index;
        }
        let index = self.reverse.len();
        self.forward.insert(name.to_string(), index);
        self.reverse.push(name.to_string());
        index
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.forward.get(name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.reverse.get(index).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.forward.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reverse.iter().map(|s| s.as_str())
    }
}
