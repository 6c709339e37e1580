use std::collections::HashMap;

/// Named integer counters for captions and cross-references.
///
/// Unseen names read as 0. There is no removal; counters live for the whole
/// conversion run.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    values: HashMap<String, i64>,
}

impl Counters {
    pub fn new() -> Self {
        Counters::default()
    }

    pub fn get(&self, name: &str) -> i64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), value);
    }

    /// Bump the counter and return its new value.
    pub fn increment(&mut self, name: &str) -> i64 {
        let value = self.values.entry(name.to_string()).or_insert(0);
        *value += 1;
        *value
    }
}
