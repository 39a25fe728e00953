//! The editor handle: a cheaply clonable reference to one document plus
//! its selection, undo history, and command bus. Handlers and update
//! listeners live outside the document cell so dispatch never re-enters a
//! held borrow.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::command::{Command, CommandKind, CommandPriority};
use crate::edits;
use crate::selection::{Point, RangeSelection, Selection};
use crate::tree::{Alignment, DocumentTree, NodeBody, NodeKey, TextFormat};

/// Languages the code block UI offers. Unknown languages in loaded
/// documents fall back to the configured default.
pub const CODE_LANGUAGES: &[&str] = &[
    "c", "css", "html", "js", "markdown", "plain", "py", "rust", "sql", "xml",
];

#[derive(Debug)]
pub enum EngineError {
    InvalidStructure(String),
    UnknownNode(NodeKey),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidStructure(detail) => {
                write!(f, "invalid document structure: {detail}")
            }
            EngineError::UnknownNode(key) => write!(f, "unknown node key {key}"),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub default_code_language: String,
    pub max_undo: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_code_language: String::new(),
            max_undo: 0,
        }
    }
}

impl EditorConfig {
    /// Fill unset fields with engine defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.default_code_language.is_empty() {
            self.default_code_language = "js".to_string();
        }
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

/// A registered handler or listener. Dropping or cancelling it removes the
/// registration; cancelling twice is a no-op.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

struct HandlerSlot {
    id: u64,
    priority: CommandPriority,
    callback: RefCell<Box<dyn FnMut(&Command) -> bool>>,
}

struct UpdateSlot {
    id: u64,
    callback: RefCell<Box<dyn FnMut()>>,
}

/// Registrations live here, apart from the document cell, so a handler
/// body may freely read the editor it was registered on.
#[derive(Default)]
struct Hooks {
    handlers: RefCell<HashMap<CommandKind, Vec<Rc<HandlerSlot>>>>,
    update_listeners: RefCell<Vec<Rc<UpdateSlot>>>,
    next_id: Cell<u64>,
}

struct Snapshot {
    tree: DocumentTree,
    selection: Selection,
}

struct EditorInner {
    tree: DocumentTree,
    selection: Selection,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    config: EditorConfig,
}

/// Read access to the document within a `read` or `update` scope.
pub struct ReadTx<'a> {
    tree: &'a DocumentTree,
    selection: &'a Selection,
    config: &'a EditorConfig,
}

impl<'a> ReadTx<'a> {
    pub fn tree(&self) -> &DocumentTree {
        self.tree
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        self.config
    }

    pub fn selection_has_format(&self, flag: TextFormat) -> bool {
        edits::selection_has_format(self.tree, self.selection, flag)
    }

    pub fn code_languages(&self) -> &'static [&'static str] {
        CODE_LANGUAGES
    }

    pub fn default_code_language(&self) -> &str {
        &self.config.default_code_language
    }
}

/// Write access within an `update` scope. Mutations mark the transaction
/// dirty; a clean commit produces no notification.
pub struct WriteTx<'a> {
    tree: &'a mut DocumentTree,
    selection: &'a mut Selection,
    config: &'a EditorConfig,
    dirty: bool,
}

impl<'a> WriteTx<'a> {
    pub fn tree(&self) -> &DocumentTree {
        self.tree
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        self.config
    }

    /// Replace each top-level element under the range with an element
    /// from `factory`, keeping the text leaves.
    pub fn wrap_leaves_in(
        &mut self,
        range: &RangeSelection,
        factory: impl Fn() -> NodeBody,
    ) -> Result<(), EngineError> {
        let changed = edits::wrap_leaves_in(self.tree, range, &factory)?;
        self.dirty |= changed;
        Ok(())
    }

    pub fn set_code_language(&mut self, key: NodeKey, language: &str) -> Result<(), EngineError> {
        match self.tree.body_mut(key) {
            Some(NodeBody::Code { language: current }) => {
                if current.as_deref() != Some(language) {
                    *current = Some(language.to_string());
                    self.dirty = true;
                }
                Ok(())
            }
            Some(other) => Err(EngineError::InvalidStructure(format!(
                "{other:?} carries no code language"
            ))),
            None => Err(EngineError::UnknownNode(key)),
        }
    }

    pub fn toggle_format(&mut self, flag: TextFormat) {
        self.dirty |= edits::toggle_format(self.tree, self.selection, flag);
    }

    pub fn toggle_link(&mut self, url: Option<&str>) {
        self.dirty |= edits::toggle_link(self.tree, self.selection, url);
    }

    pub fn insert_list(&mut self, ordered: bool) {
        self.dirty |= edits::insert_list(self.tree, self.selection, ordered);
    }

    pub fn remove_list(&mut self) {
        self.dirty |= edits::remove_list(self.tree, self.selection);
    }

    pub fn set_alignment(&mut self, align: Alignment) {
        self.dirty |= edits::set_alignment(self.tree, self.selection, align);
    }
}

/// The engine handle. `Clone` shares the same document and registrations.
#[derive(Clone)]
pub struct Editor {
    inner: Rc<RefCell<EditorInner>>,
    hooks: Rc<Hooks>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default().with_defaults())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self::from_parts(DocumentTree::new(), config)
    }

    pub(crate) fn from_parts(tree: DocumentTree, config: EditorConfig) -> Self {
        let selection = edits::normalize_selection(&tree, Selection::Caret(Point::new(0, 0)));
        Self {
            inner: Rc::new(RefCell::new(EditorInner {
                tree,
                selection,
                undo_stack: Vec::new(),
                redo_stack: Vec::new(),
                config,
            })),
            hooks: Rc::new(Hooks::default()),
        }
    }

    pub fn config(&self) -> EditorConfig {
        self.inner.borrow().config.clone()
    }

    pub fn can_undo(&self) -> bool {
        !self.inner.borrow().undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.inner.borrow().redo_stack.is_empty()
    }

    /// Run a closure against the current document. The document stays
    /// borrowed for the duration, so the closure must not call `update`.
    pub fn read<R>(&self, f: impl FnOnce(&ReadTx) -> R) -> R {
        let inner = self.inner.borrow();
        let tx = ReadTx {
            tree: &inner.tree,
            selection: &inner.selection,
            config: &inner.config,
        };
        f(&tx)
    }

    /// Run a mutating closure atomically. On error the document and
    /// selection roll back and nothing is notified; on success a dirty
    /// transaction commits one history entry and exactly one update
    /// notification, a clean one commits nothing.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut WriteTx) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let (value, dirty, undo_flip, redo_flip);
        {
            let mut inner = self.inner.borrow_mut();
            let could_undo = !inner.undo_stack.is_empty();
            let could_redo = !inner.redo_stack.is_empty();
            let snapshot = Snapshot {
                tree: inner.tree.clone(),
                selection: inner.selection,
            };

            let outcome = {
                let EditorInner {
                    tree,
                    selection,
                    config,
                    ..
                } = &mut *inner;
                let mut tx = WriteTx {
                    tree,
                    selection,
                    config,
                    dirty: false,
                };
                let result = f(&mut tx);
                (result, tx.dirty)
            };

            match outcome {
                (Ok(result), tx_dirty) => {
                    if tx_dirty {
                        inner.undo_stack.push(snapshot);
                        inner.redo_stack.clear();
                        let cap = inner.config.max_undo;
                        if inner.undo_stack.len() > cap {
                            inner.undo_stack.remove(0);
                        }
                    }
                    value = result;
                    dirty = tx_dirty;
                    undo_flip = could_undo != !inner.undo_stack.is_empty();
                    redo_flip = could_redo != !inner.redo_stack.is_empty();
                }
                (Err(err), _) => {
                    inner.tree = snapshot.tree;
                    inner.selection = snapshot.selection;
                    return Err(err);
                }
            }
        }

        if dirty {
            self.notify_update();
            if undo_flip {
                self.dispatch(Command::CanUndoChanged(self.can_undo()));
            }
            if redo_flip {
                self.dispatch(Command::CanRedoChanged(self.can_redo()));
            }
        }
        Ok(value)
    }

    /// Replace the selection (clamped to live nodes) and announce it.
    pub fn set_selection(&self, selection: Selection) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.selection = edits::normalize_selection(&inner.tree, selection);
        }
        self.dispatch(Command::SelectionChanged);
    }

    pub fn selection(&self) -> Selection {
        self.inner.borrow().selection
    }

    /// Offer the command to registered handlers, highest priority first.
    /// The first handler returning `true` stops propagation; otherwise
    /// the engine default runs. Returns whether anything handled it.
    pub fn dispatch(&self, command: Command) -> bool {
        let slots: Vec<Rc<HandlerSlot>> = {
            let handlers = self.hooks.handlers.borrow();
            handlers.get(&command.kind()).cloned().unwrap_or_default()
        };
        for slot in slots {
            let handled = (slot.callback.borrow_mut())(&command);
            if handled {
                return true;
            }
        }
        self.perform_default(&command)
    }

    fn perform_default(&self, command: &Command) -> bool {
        match command {
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::FormatText(flag) => {
                let flag = *flag;
                self.update(|tx| {
                    tx.toggle_format(flag);
                    Ok(())
                })
                .is_ok()
            }
            Command::FormatElement(align) => {
                let align = *align;
                self.update(|tx| {
                    tx.set_alignment(align);
                    Ok(())
                })
                .is_ok()
            }
            Command::ToggleLink(url) => {
                let url = url.clone();
                self.update(|tx| {
                    tx.toggle_link(url.as_deref());
                    Ok(())
                })
                .is_ok()
            }
            Command::InsertList { ordered } => {
                let ordered = *ordered;
                self.update(|tx| {
                    tx.insert_list(ordered);
                    Ok(())
                })
                .is_ok()
            }
            Command::RemoveList => self
                .update(|tx| {
                    tx.remove_list();
                    Ok(())
                })
                .is_ok(),
            Command::SelectionChanged
            | Command::CanUndoChanged(_)
            | Command::CanRedoChanged(_) => false,
        }
    }

    pub fn undo(&self) -> bool {
        self.step_history(true)
    }

    pub fn redo(&self) -> bool {
        self.step_history(false)
    }

    fn step_history(&self, back: bool) -> bool {
        let (undo_flip, redo_flip);
        {
            let mut inner = self.inner.borrow_mut();
            let could_undo = !inner.undo_stack.is_empty();
            let could_redo = !inner.redo_stack.is_empty();
            let popped = if back {
                inner.undo_stack.pop()
            } else {
                inner.redo_stack.pop()
            };
            let Some(snapshot) = popped else {
                return false;
            };
            let current = Snapshot {
                tree: std::mem::replace(&mut inner.tree, snapshot.tree),
                selection: std::mem::replace(&mut inner.selection, snapshot.selection),
            };
            if back {
                inner.redo_stack.push(current);
            } else {
                inner.undo_stack.push(current);
            }
            undo_flip = could_undo != !inner.undo_stack.is_empty();
            redo_flip = could_redo != !inner.redo_stack.is_empty();
        }

        self.notify_update();
        if undo_flip {
            self.dispatch(Command::CanUndoChanged(self.can_undo()));
        }
        if redo_flip {
            self.dispatch(Command::CanRedoChanged(self.can_redo()));
        }
        true
    }

    fn notify_update(&self) {
        let slots: Vec<Rc<UpdateSlot>> = self.hooks.update_listeners.borrow().clone();
        for slot in slots {
            (slot.callback.borrow_mut())();
        }
    }

    /// Register a command handler at the given priority. Within one
    /// priority, earlier registrations run first.
    pub fn register_handler(
        &self,
        kind: CommandKind,
        priority: CommandPriority,
        callback: impl FnMut(&Command) -> bool + 'static,
    ) -> Subscription {
        let id = self.hooks.next_id.get();
        self.hooks.next_id.set(id + 1);
        let slot = Rc::new(HandlerSlot {
            id,
            priority,
            callback: RefCell::new(Box::new(callback)),
        });

        {
            let mut handlers = self.hooks.handlers.borrow_mut();
            let slots = handlers.entry(kind).or_default();
            let at = slots
                .iter()
                .position(|existing| existing.priority < priority)
                .unwrap_or(slots.len());
            slots.insert(at, slot);
        }

        let hooks = Rc::downgrade(&self.hooks);
        Subscription::new(move || {
            if let Some(hooks) = hooks.upgrade() {
                if let Some(slots) = hooks.handlers.borrow_mut().get_mut(&kind) {
                    slots.retain(|slot| slot.id != id);
                }
            }
        })
    }

    /// Register a listener fired once per committed update, including
    /// undo and redo restores.
    pub fn register_update_listener(&self, callback: impl FnMut() + 'static) -> Subscription {
        let id = self.hooks.next_id.get();
        self.hooks.next_id.set(id + 1);
        let slot = Rc::new(UpdateSlot {
            id,
            callback: RefCell::new(Box::new(callback)),
        });
        self.hooks.update_listeners.borrow_mut().push(slot);

        let hooks = Rc::downgrade(&self.hooks);
        Subscription::new(move || {
            if let Some(hooks) = hooks.upgrade() {
                hooks
                    .update_listeners
                    .borrow_mut()
                    .retain(|slot| slot.id != id);
            }
        })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_order_handlers_high_first() {
        let editor = Editor::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        let _low = editor.register_handler(CommandKind::SelectionChanged, CommandPriority::Low, {
            move |_| {
                o.borrow_mut().push("low");
                false
            }
        });
        let o = order.clone();
        let _high =
            editor.register_handler(CommandKind::SelectionChanged, CommandPriority::High, {
                move |_| {
                    o.borrow_mut().push("high");
                    false
                }
            });

        editor.dispatch(Command::SelectionChanged);
        assert_eq!(*order.borrow(), vec!["high", "low"]);
    }

    #[test]
    fn handler_returning_true_stops_propagation() {
        let editor = Editor::new();
        let reached = Rc::new(Cell::new(false));

        let _first =
            editor.register_handler(CommandKind::SelectionChanged, CommandPriority::High, |_| {
                true
            });
        let r = reached.clone();
        let _second =
            editor.register_handler(CommandKind::SelectionChanged, CommandPriority::Low, {
                move |_| {
                    r.set(true);
                    false
                }
            });

        assert!(editor.dispatch(Command::SelectionChanged));
        assert!(!reached.get());
    }

    #[test]
    fn cancelled_subscription_never_fires() {
        let editor = Editor::new();
        let count = Rc::new(Cell::new(0u32));

        let c = count.clone();
        let sub = editor.register_update_listener(move || c.set(c.get() + 1));
        sub.cancel();

        let leaf = editor.read(|tx| tx.tree().text_leaves()[0]);
        editor
            .update(|tx| {
                let range = RangeSelection::new(Point::new(leaf, 0), Point::new(leaf, 0));
                tx.wrap_leaves_in(&range, || NodeBody::Quote)
            })
            .unwrap();
        assert_eq!(count.get(), 0);
    }
}
