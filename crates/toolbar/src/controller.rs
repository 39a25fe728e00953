//! The toolbar controller: subscribes to an editor, keeps a projected
//! `ToolbarState` current, and translates UI intents into commands and
//! transactions.

use std::cell::RefCell;
use std::rc::Rc;

use inkstone_core::{
    Alignment, Command, CommandKind, CommandPriority, Editor, EngineError, HeadingLevel,
    NodeBody, RangeSelection, Selection, TextFormat,
};

use crate::projector::project;
use crate::state::{ActiveFormats, BlockKind, ToolbarState};
use crate::subscriptions::SubscriptionSet;

/// Placeholder target for a freshly inserted link; the UI edits it
/// afterwards.
pub const DEFAULT_LINK_URL: &str = "https://";

pub struct ToolbarController {
    editor: Editor,
    state: Rc<RefCell<ToolbarState>>,
    subscriptions: SubscriptionSet,
}

impl ToolbarController {
    /// Wire up against an editor: one update listener plus handlers for
    /// selection changes and undo/redo availability. The selection handler
    /// registers at low priority and never stops propagation.
    pub fn new(editor: Editor) -> Self {
        let state = Rc::new(RefCell::new(ToolbarState::initial(
            &editor.config().default_code_language,
        )));
        let mut subscriptions = SubscriptionSet::new();

        let reproject = {
            let editor = editor.clone();
            let state = state.clone();
            move || {
                let next = editor.read(|tx| {
                    let prev = state.borrow();
                    project(tx, &prev)
                });
                *state.borrow_mut() = next;
            }
        };

        subscriptions.push(editor.register_update_listener({
            let reproject = reproject.clone();
            move || reproject()
        }));
        subscriptions.push(editor.register_handler(
            CommandKind::SelectionChanged,
            CommandPriority::Low,
            {
                let reproject = reproject.clone();
                move |_| {
                    reproject();
                    false
                }
            },
        ));
        subscriptions.push(editor.register_handler(
            CommandKind::CanUndoChanged,
            CommandPriority::Low,
            {
                let state = state.clone();
                move |command| {
                    if let Command::CanUndoChanged(available) = command {
                        state.borrow_mut().can_undo = *available;
                    }
                    false
                }
            },
        ));
        subscriptions.push(editor.register_handler(
            CommandKind::CanRedoChanged,
            CommandPriority::Low,
            {
                let state = state.clone();
                move |command| {
                    if let Command::CanRedoChanged(available) = command {
                        state.borrow_mut().can_redo = *available;
                    }
                    false
                }
            },
        ));

        Self {
            editor,
            state,
            subscriptions,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// The state as of the last reprojection.
    pub fn state(&self) -> ToolbarState {
        self.state.borrow().clone()
    }

    /// Change the selected blocks to `kind`. Choosing the kind already
    /// active is a no-op for wrap kinds and toggles lists off. Structural
    /// failures roll the transaction back and surface here.
    pub fn set_block_kind(&self, kind: BlockKind) -> Result<(), EngineError> {
        let current = self.state.borrow().block_kind;

        if kind.is_list() {
            if current == kind {
                self.editor.dispatch(Command::RemoveList);
            } else {
                self.editor.dispatch(Command::InsertList {
                    ordered: kind == BlockKind::OrderedList,
                });
            }
            return Ok(());
        }

        if current == kind {
            return Ok(());
        }
        let Some(range) = self.editor.read(|tx| match *tx.selection() {
            Selection::Range(range) => Some(range),
            Selection::Caret(point) => Some(RangeSelection::new(point, point)),
            Selection::Node(_) => None,
        }) else {
            return Ok(());
        };
        self.editor
            .update(|tx| tx.wrap_leaves_in(&range, element_factory(kind)))
    }

    pub fn toggle_format(&self, flag: TextFormat) {
        self.editor.dispatch(Command::FormatText(flag));
    }

    /// Apply a full format set: dispatch one toggle per flag that differs
    /// from the current state, the link flag via link commands.
    pub fn apply_formats(&self, requested: ActiveFormats) {
        let current = self.state.borrow().active_formats;
        for flag in requested.flipped_against(&current) {
            self.editor.dispatch(Command::FormatText(flag));
        }
        if requested.link != current.link {
            self.toggle_link();
        }
    }

    /// Insert a placeholder link over the selection, or unlink it when the
    /// selection already sits in one.
    pub fn toggle_link(&self) {
        let linked = self.state.borrow().active_formats.link;
        if linked {
            self.editor.dispatch(Command::ToggleLink(None));
        } else {
            self.editor
                .dispatch(Command::ToggleLink(Some(DEFAULT_LINK_URL.to_string())));
        }
    }

    /// Alignment is toolbar-held UI state: remember the choice and forward
    /// it to the engine; it is never read back out of the document.
    pub fn set_alignment(&self, align: Alignment) {
        self.state.borrow_mut().alignment = align;
        self.editor.dispatch(Command::FormatElement(align));
    }

    /// Set the selected code block's language. Outside a code block, or
    /// when the remembered element key no longer names a code block, this
    /// quietly does nothing.
    pub fn set_code_language(&self, language: &str) -> Result<(), EngineError> {
        let (block_kind, element) = {
            let state = self.state.borrow();
            (state.block_kind, state.selected_element)
        };
        if block_kind != BlockKind::Code {
            return Ok(());
        }
        let Some(key) = element else {
            return Ok(());
        };
        let language = language.to_string();
        self.editor.update(|tx| {
            let is_code = matches!(tx.tree().body(key), Some(NodeBody::Code { .. }));
            if !is_code {
                return Ok(());
            }
            tx.set_code_language(key, &language)
        })
    }

    pub fn undo(&self) {
        self.editor.dispatch(Command::Undo);
    }

    pub fn redo(&self) {
        self.editor.dispatch(Command::Redo);
    }

    /// Tear down every registration. The editor outlives the controller;
    /// further document changes no longer touch this state.
    pub fn dispose(&mut self) {
        self.subscriptions.dispose();
    }
}

fn element_factory(kind: BlockKind) -> impl Fn() -> NodeBody {
    move || match kind {
        BlockKind::Paragraph | BlockKind::OrderedList | BlockKind::UnorderedList => {
            NodeBody::Paragraph
        }
        BlockKind::H1 => NodeBody::Heading {
            level: HeadingLevel::H1,
        },
        BlockKind::H2 => NodeBody::Heading {
            level: HeadingLevel::H2,
        },
        BlockKind::Quote => NodeBody::Quote,
        BlockKind::Code => NodeBody::Code { language: None },
    }
}
