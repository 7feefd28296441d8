//! Navigation cursor over the ordered object list

use crate::types::ObjectKey;
use crate::{Error, Result};

/// Outcome of a cursor move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// `advance` on the last object; the index is unchanged
    EndOfList,
    /// `retreat` on the first object; the index is unchanged
    StartOfList,
}

/// Current position in a non-empty object list
#[derive(Debug, Clone)]
pub struct SessionCursor {
    objects: Vec<ObjectKey>,
    index: usize,
}

impl SessionCursor {
    pub fn new(objects: Vec<ObjectKey>) -> Result<Self> {
        if objects.is_empty() {
            return Err(Error::Config("No valid IDs found in the object list".to_string()));
        }
        Ok(Self { objects, index: 0 })
    }

    /// Cursor positioned after `resume_after` when given
    pub fn build(objects: Vec<ObjectKey>, resume_after: Option<&ObjectKey>) -> Result<Self> {
        let mut cursor = Self::new(objects)?;
        if let Some(key) = resume_after {
            cursor.resume_after(key)?;
        }
        Ok(cursor)
    }

    /// Position on the object following `key`
    ///
    /// Fails with `ResumeExhausted` when `key` is the last object and with
    /// `ResumeKeyNotFound` when it is not in the list.
    pub fn resume_after(&mut self, key: &ObjectKey) -> Result<()> {
        let position = self
            .objects
            .iter()
            .position(|object| object == key)
            .ok_or_else(|| Error::ResumeKeyNotFound(key.clone()))?;
        if position + 1 >= self.objects.len() {
            return Err(Error::ResumeExhausted(key.clone()));
        }
        self.index = position + 1;
        Ok(())
    }

    pub fn current(&self) -> &ObjectKey {
        &self.objects[self.index]
    }

    pub fn advance(&mut self) -> Step {
        if self.is_last() {
            Step::EndOfList
        } else {
            self.index += 1;
            Step::Moved
        }
    }

    pub fn retreat(&mut self) -> Step {
        if self.index == 0 {
            Step::StartOfList
        } else {
            self.index -= 1;
            Step::Moved
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects from the current one to the end, inclusive
    pub fn remaining(&self) -> usize {
        self.objects.len() - self.index
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.objects.len()
    }

    pub fn objects(&self) -> &[ObjectKey] {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objects() -> Vec<ObjectKey> {
        vec![ObjectKey::new(5), ObjectKey::new(12), ObjectKey::new(47)]
    }

    #[test]
    fn test_empty_list_is_configuration_error() {
        assert!(matches!(SessionCursor::new(Vec::new()), Err(Error::Config(_))));
    }

    #[test]
    fn test_resume_positions_after_key() {
        let cursor = SessionCursor::build(objects(), Some(&ObjectKey::new(5))).unwrap();
        assert_eq!(cursor.current(), &ObjectKey::new(12));
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_resume_on_last_key_is_exhausted() {
        let result = SessionCursor::build(objects(), Some(&ObjectKey::new(47)));
        assert!(matches!(result, Err(Error::ResumeExhausted(key)) if key == ObjectKey::new(47)));
    }

    #[test]
    fn test_resume_on_unknown_key_fails() {
        let result = SessionCursor::build(objects(), Some(&ObjectKey::new(6)));
        assert!(matches!(result, Err(Error::ResumeKeyNotFound(_))));
    }

    #[test]
    fn test_advance_and_retreat_are_bounded() {
        let mut cursor = SessionCursor::new(objects()).unwrap();
        assert_eq!(cursor.retreat(), Step::StartOfList);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.advance(), Step::Moved);
        assert_eq!(cursor.advance(), Step::Moved);
        assert!(cursor.is_last());
        assert_eq!(cursor.advance(), Step::EndOfList);
        assert_eq!(cursor.current(), &ObjectKey::new(47));
        assert_eq!(cursor.retreat(), Step::Moved);
        assert_eq!(cursor.current(), &ObjectKey::new(12));
    }

    #[test]
    fn test_resume_matches_cluster_and_id() {
        let objects = vec![ObjectKey::in_cluster(3, "A2744"), ObjectKey::in_cluster(3, "A370")];
        let cursor = SessionCursor::build(objects, Some(&ObjectKey::in_cluster(3, "A2744"))).unwrap();
        assert_eq!(cursor.current(), &ObjectKey::in_cluster(3, "A370"));
    }
}
