//! Side-by-side comparison queue

use serde::Serialize;
use thiserror::Error;

/// Most dynamics that can be compared at once
pub const MAX_COMPARE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("dynamic {0} is already in the comparison")]
    AlreadyQueued(i64),

    #[error("comparison is full ({0} dynamics at most)")]
    Full(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareList {
    ids: Vec<i64>,
}

impl CompareList {
    pub fn add(&mut self, id: i64) -> Result<(), CompareError> {
        if self.ids.contains(&id) {
            return Err(CompareError::AlreadyQueued(id));
        }
        if self.ids.len() >= MAX_COMPARE {
            return Err(CompareError::Full(MAX_COMPARE));
        }
        self.ids.push(id);
        Ok(())
    }

    /// Returns whether the id was queued
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|queued| *queued != id);
        self.ids.len() != before
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicates_and_fourth_entry() {
        let mut list = CompareList::default();
        list.add(1).unwrap();
        assert_eq!(list.add(1), Err(CompareError::AlreadyQueued(1)));
        list.add(2).unwrap();
        list.add(3).unwrap();
        assert_eq!(list.add(4), Err(CompareError::Full(MAX_COMPARE)));
        assert_eq!(list.ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_remove_frees_a_slot() {
        let mut list = CompareList::default();
        for id in 1..=3 {
            list.add(id).unwrap();
        }
        assert!(list.remove(2));
        assert!(!list.remove(2));
        list.add(4).unwrap();
        assert_eq!(list.ids(), &[1, 3, 4]);
    }
}
