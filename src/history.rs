//! Linear edit history over an arbitrary state snapshot.
//!
//! Structurally independent of the canvas engine: the mask/brush collaborator
//! owns one of these over its raster state. `set` commits, `set_present`
//! replaces without committing (live updates like a drag in progress, where
//! only the final state should enter history).

#[derive(Clone, Debug)]
pub struct EditHistory<T: Clone + PartialEq> {
    initial: T,
    past: Vec<T>,
    present: T,
    future: Vec<T>,
}

impl<T: Clone + PartialEq> EditHistory<T> {
    pub fn new(initial: T) -> Self {
        Self {
            initial: initial.clone(),
            past: Vec::new(),
            present: initial,
            future: Vec::new(),
        }
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Commit a new state. A state equal to the current present is a no-op;
    /// any real commit clears the redo stack.
    pub fn set(&mut self, state: T) {
        if state == self.present {
            return;
        }
        self.past.push(std::mem::replace(&mut self.present, state));
        self.future.clear();
    }

    /// Replace the present without creating a history entry.
    pub fn set_present(&mut self, state: T) {
        self.present = state;
    }

    pub fn undo(&mut self) {
        if let Some(previous) = self.past.pop() {
            self.future
                .insert(0, std::mem::replace(&mut self.present, previous));
        }
    }

    pub fn redo(&mut self) {
        if self.future.is_empty() {
            return;
        }
        let next = self.future.remove(0);
        self.past.push(std::mem::replace(&mut self.present, next));
    }

    /// Drop all history. With `None` the present returns to the state the
    /// history was created with.
    pub fn reset(&mut self, new_initial: Option<T>) {
        self.past.clear();
        self.future.clear();
        self.present = new_initial.unwrap_or_else(|| self.initial.clone());
    }
}
