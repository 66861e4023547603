/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_selection: std::ops::Range<usize>,
    pub version: u64,
}

impl Patch {
    /// The edit neither inserted nor removed any text
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
