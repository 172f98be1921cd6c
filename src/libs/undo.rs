use super::task::Task;

/// Single-slot holder for the most recently deleted task.
///
/// A new delete overwrites the slot; there is no history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoBuffer {
    slot: Option<Task>,
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `task` for a later undo, dropping whatever the slot held.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eisen::libs::quadrant::Quadrant;
    /// use eisen::libs::task::Task;
    /// use eisen::libs::undo::UndoBuffer;
    ///
    /// let mut buffer = UndoBuffer::new();
    /// buffer.stash(Task::new("Old", Quadrant::Neither, "inbox"));
    /// buffer.stash(Task::new("New", Quadrant::Neither, "inbox"));
    /// assert_eq!(buffer.peek().map(|t| t.title.as_str()), Some("New"));
    /// ```
    pub fn stash(&mut self, task: Task) {
        self.slot = Some(task);
    }

    /// Empties the slot, returning its task.
    pub fn take(&mut self) -> Option<Task> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<&Task> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::quadrant::Quadrant;

    #[test]
    fn stash_overwrites_previous() {
        let mut buffer = UndoBuffer::new();
        buffer.stash(Task::new("first", Quadrant::Neither, "inbox"));
        buffer.stash(Task::new("second", Quadrant::Neither, "inbox"));
        assert_eq!(buffer.take().map(|t| t.title), Some("second".to_string()));
        assert!(buffer.is_empty());
        assert!(buffer.take().is_none());
    }
}
