// Todo list state container with local persistence

use crate::filter::FilterMode;
use crate::storage::{DARK_MODE_KEY, Storage, TODOS_KEY};
use crate::todo::{CompletionStats, Todo, next_id};
use eyre::{Context, Result};
use tracing::{debug, info, warn};

/// In-memory todo list plus view preferences, persisted through a [`Storage`]
///
/// Every list mutation writes the whole collection back to storage before
/// returning. Storage failures are logged and swallowed so the in-memory
/// state stays usable.
pub struct TodoStore<S: Storage> {
    storage: S,
    todos: Vec<Todo>,
    filter: FilterMode,
    dark_mode: bool,
}

impl<S: Storage> TodoStore<S> {
    /// Create an empty store; call [`TodoStore::load_todos`] to restore saved state
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            todos: Vec::new(),
            filter: FilterMode::default(),
            dark_mode: false,
        }
    }

    /// Get a reference to the backing storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a mutable reference to the backing storage
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the store and hand back its storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    // ========================================================================
    // State and derived views
    // ========================================================================

    /// The full collection in display order
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Current filter mode
    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Whether dark mode is on
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Items not yet completed
    pub fn active_todos(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|todo| !todo.completed).collect()
    }

    /// Items marked completed
    pub fn completed_todos(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|todo| todo.completed).collect()
    }

    /// Items visible under the current filter, in collection order
    pub fn filtered_todos(&self) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|todo| self.filter.matches(todo.completed))
            .collect()
    }

    /// Replace the whole collection (does not persist)
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        debug!(count = todos.len(), "replace_all: called");
        self.todos = todos;
    }

    /// Completed and total counts with a progress percentage
    pub fn completion_stats(&self) -> CompletionStats {
        let completed = self.todos.iter().filter(|todo| todo.completed).count();
        CompletionStats::from_counts(completed, self.todos.len())
    }

    // ========================================================================
    // List mutations
    // ========================================================================

    /// Append a new incomplete todo after the current highest order
    pub fn add_todo(&mut self, text: impl Into<String>) {
        let max_order = self.todos.iter().map(|todo| todo.order).fold(0, i64::max);
        let order = max_order.saturating_add(1);
        let id = next_id(self.todos.iter().map(|todo| todo.id).max());

        debug!(id, order, "add_todo: called");
        self.todos.push(Todo::new(id, text, order));
        self.save_todos();
    }

    /// Drop the todo with the given id; saves even if nothing matched
    pub fn remove_todo(&mut self, id: i64) {
        debug!(id, "remove_todo: called");
        self.todos.retain(|todo| todo.id != id);
        self.save_todos();
    }

    /// Flip completion of the todo with the given id
    pub fn toggle_todo(&mut self, id: i64) {
        debug!(id, "toggle_todo: called");
        if let Some(todo) = self.find_mut(id) {
            todo.completed = !todo.completed;
            self.save_todos();
        }
    }

    /// Overwrite the text of the todo with the given id
    pub fn update_todo_text(&mut self, id: i64, text: impl Into<String>) {
        debug!(id, "update_todo_text: called");
        if let Some(todo) = self.find_mut(id) {
            todo.text = text.into();
            self.save_todos();
        }
    }

    /// Complete every item, or uncomplete all of them if they are all done
    pub fn toggle_all(&mut self) {
        let all_completed = self.todos.iter().all(|todo| todo.completed);
        debug!(all_completed, "toggle_all: called");

        for todo in &mut self.todos {
            todo.completed = !all_completed;
        }
        self.save_todos();
    }

    /// Remove every completed todo
    pub fn clear_completed(&mut self) {
        debug!("clear_completed: called");
        self.todos.retain(|todo| !todo.completed);
        self.save_todos();
    }

    /// Move an item within the filtered view
    ///
    /// Both indices address the current filtered view. The source item is
    /// taken out of the collection and reinserted where the target item sat,
    /// then every `order` is renumbered to its array index. Indices outside
    /// the filtered view leave the store untouched.
    pub fn reorder_todos(&mut self, from_index: usize, to_index: usize) {
        debug!(from_index, to_index, filter = %self.filter, "reorder_todos: called");

        let (from_id, to_id) = {
            let view = self.filtered_todos();
            match (view.get(from_index), view.get(to_index)) {
                (Some(from), Some(to)) => (from.id, to.id),
                _ => {
                    warn!(
                        from_index,
                        to_index,
                        visible = view.len(),
                        "Reorder index out of range, ignoring"
                    );
                    return;
                }
            }
        };

        let (Some(actual_from), Some(actual_to)) = (self.position(from_id), self.position(to_id)) else {
            return;
        };

        let moved = self.todos.remove(actual_from);
        self.todos.insert(actual_to, moved);

        for (index, todo) in self.todos.iter_mut().enumerate() {
            todo.order = index as i64;
        }
        self.save_todos();
    }

    // ========================================================================
    // View preferences
    // ========================================================================

    /// Change the filter (not persisted)
    pub fn set_filter(&mut self, filter: FilterMode) {
        debug!(%filter, "set_filter: called");
        self.filter = filter;
    }

    /// Flip dark mode and persist it right away
    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        debug!(dark_mode = self.dark_mode, "toggle_dark_mode: called");

        let value = self.dark_mode.to_string();
        if let Err(e) = self.storage.set_item(DARK_MODE_KEY, &value) {
            warn!(error = ?e, "Failed to save dark mode");
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the whole collection under the `todos` key
    pub fn save_todos(&mut self) {
        if let Err(e) = self.try_save_todos() {
            warn!(error = ?e, count = self.todos.len(), "Failed to save todos");
        }
    }

    /// Restore the collection and dark mode from storage
    ///
    /// Absent or empty values keep the current state. A collection that
    /// fails to parse is logged and treated as absent. The filter is never
    /// restored.
    pub fn load_todos(&mut self) {
        match self.read_saved_todos() {
            Ok(Some(todos)) => {
                info!(count = todos.len(), "Loaded saved todos");
                self.todos = todos;
            }
            Ok(None) => debug!("No saved todos"),
            Err(e) => warn!(error = ?e, "Failed to load saved todos, ignoring"),
        }

        match self.storage.get_item(DARK_MODE_KEY) {
            Ok(Some(value)) if !value.is_empty() => {
                self.dark_mode = value == "true";
            }
            Ok(_) => {}
            Err(e) => warn!(error = ?e, "Failed to load dark mode, ignoring"),
        }
    }

    fn try_save_todos(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.todos).context("Failed to serialize todos")?;
        self.storage.set_item(TODOS_KEY, &json)
    }

    fn read_saved_todos(&self) -> Result<Option<Vec<Todo>>> {
        let saved = match self.storage.get_item(TODOS_KEY)? {
            Some(saved) if !saved.is_empty() => saved,
            _ => return Ok(None),
        };

        let todos = serde_json::from_str(&saved).context("Failed to parse saved todos")?;
        Ok(Some(todos))
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == id)
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == id)
    }
}
