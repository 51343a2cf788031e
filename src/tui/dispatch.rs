//! # Input and Message Dispatch
//!
//! [`Screen`] owns the orchestrator and a handle on every component. It is
//! the only place that turns what a component asked for into orchestrator,
//! page or store calls.
//!
//! ## Key routing
//!
//! 1. The quit binding always quits.
//! 2. While an input bar has focus, every other key goes to that bar.
//! 3. Global bindings (help, style picker, key reload).
//! 4. Root bindings move focus between databases and content while one of
//!    them has focus.
//! 5. Anything left goes to the focused component.
//!
//! Every step, drawing included, runs inside [`guard::isolate`]: a
//! panicking handler or renderer is logged and reported in the header, and
//! the loop carries on.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, mpsc};

use crossterm::event::KeyEvent;
use log::{debug, error, info, warn};
use ratatui::Frame;

use crate::core::{App, AppError, ComponentId, Event, Page, guard, id};
use crate::store::{Document, DocumentStore};
use crate::tui::component::{ErrorSink, EventHandler};
use crate::tui::components::{
    Content, ContentEvent, Databases, DatabasesEvent, DocPeeker, Header, Help, HelpEvent,
    HistoryEvent, HistoryModal, InputBar, InputBarEvent, KeyHints, PeekerEvent, StylePicker,
    StylePickerEvent,
};
use crate::tui::event::TuiEvent;
use crate::tui::message::{InputOutcome, UiMessage};
use crate::tui::{tasks, ui};

/// What the run loop should do after a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
    /// Suspend the UI and open a document in the external editor.
    Edit(EditRequest),
}

/// A document to open in the editor. `original` is `None` for a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub db: String,
    pub coll: String,
    pub original: Option<Document>,
}

pub struct Screen {
    pub app: App,
    pub header: Rc<RefCell<Header>>,
    pub databases: Rc<RefCell<Databases>>,
    pub content: Rc<RefCell<Content>>,
    pub query_bar: Rc<RefCell<InputBar>>,
    pub filter_bar: Rc<RefCell<InputBar>>,
    pub history: Rc<RefCell<HistoryModal>>,
    pub peeker: Rc<RefCell<DocPeeker>>,
    pub help: Rc<RefCell<Help>>,
    pub style_picker: Rc<RefCell<StylePicker>>,
    pub key_hints: Rc<RefCell<KeyHints>>,
    store: Arc<dyn DocumentStore>,
    tx: mpsc::Sender<UiMessage>,
}

impl Screen {
    /// Build every component and register it with `app`. Focus starts on
    /// the database tree.
    pub fn new(
        app: App,
        store: Arc<dyn DocumentStore>,
        tx: mpsc::Sender<UiMessage>,
    ) -> Result<Self, AppError> {
        let page_size = app.config().page_size;
        let mut screen = Self {
            app,
            header: Rc::new(RefCell::new(Header::new())),
            databases: Rc::new(RefCell::new(Databases::new())),
            content: Rc::new(RefCell::new(Content::new(page_size))),
            query_bar: Rc::new(RefCell::new(
                InputBar::new(id::QUERY_BAR, "Query").with_history(),
            )),
            filter_bar: Rc::new(RefCell::new(InputBar::new(id::FILTER_BAR, "Filter"))),
            history: Rc::new(RefCell::new(HistoryModal::new())),
            peeker: Rc::new(RefCell::new(DocPeeker::new())),
            help: Rc::new(RefCell::new(Help::new())),
            style_picker: Rc::new(RefCell::new(StylePicker::new())),
            key_hints: Rc::new(RefCell::new(KeyHints::new())),
            store,
            tx,
        };

        screen.app.register(&screen.key_hints)?;
        screen.app.register(&screen.header)?;
        screen.app.register(&screen.databases)?;
        screen.app.register(&screen.content)?;
        screen.app.register(&screen.query_bar)?;
        screen.app.register(&screen.filter_bar)?;
        screen.app.register(&screen.history)?;
        screen.app.register(&screen.peeker)?;
        screen.app.register(&screen.help)?;
        screen.app.register(&screen.style_picker)?;
        info!("Registered {} components", screen.app.bus().len());

        screen.app.set_focus(id::DATABASES);
        Ok(screen)
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Ask the store for the collection tree.
    pub fn load_databases(&self) {
        tasks::spawn_load_databases(self.store(), self.tx.clone());
    }

    /// Draw every visible component.
    pub fn draw(&self, frame: &mut Frame) {
        if let Err(panic) = guard::isolate(|| ui::draw_ui(frame, self)) {
            error!("Render panicked: {}", panic);
            self.report(&id::HEADER, format!("internal error: {panic}"));
        }
    }

    // ------------------------------------------------------------------------
    // Terminal input
    // ------------------------------------------------------------------------

    pub fn handle_input(&mut self, event: &TuiEvent) -> Flow {
        match guard::isolate(|| self.route(event)) {
            Ok(flow) => flow,
            Err(panic) => {
                error!("Input handler panicked: {}", panic);
                self.report(&id::HEADER, format!("internal error: {panic}"));
                Flow::Continue
            }
        }
    }

    fn route(&mut self, event: &TuiEvent) -> Flow {
        let key = match event {
            TuiEvent::Resize => return Flow::Continue,
            TuiEvent::Paste(_) => return self.to_focused(event),
            TuiEvent::Key(key) => key,
        };

        let keys = self.app.keys();
        if keys.global.quit.matches(key) {
            info!("Quit requested");
            return Flow::Quit;
        }

        let focus = self.app.focus().cloned();
        let in_bar = matches!(&focus, Some(f) if *f == id::QUERY_BAR || *f == id::FILTER_BAR);
        if !in_bar && self.handle_global(key) {
            return Flow::Continue;
        }
        if matches!(&focus, Some(f) if *f == id::DATABASES || *f == id::CONTENT)
            && self.handle_root(key)
        {
            return Flow::Continue;
        }
        self.to_focused(event)
    }

    fn handle_global(&mut self, key: &KeyEvent) -> bool {
        let keys = self.app.keys();
        let global = &keys.global;
        if global.toggle_help.matches(key) {
            self.toggle_overlay(id::HELP);
        } else if global.open_style_picker.matches(key) {
            let names = self.app.style_names();
            let current = self.app.config().current_style.clone();
            self.style_picker.borrow_mut().set_names(names, &current);
            self.app.show_page(Page::overlay(id::STYLE_PICKER));
        } else if global.reload_keys.matches(key) {
            if let Err(e) = self.app.reload_keys() {
                self.report(&id::HEADER, e.to_string());
            }
        } else {
            return false;
        }
        true
    }

    fn handle_root(&mut self, key: &KeyEvent) -> bool {
        let keys = self.app.keys();
        let root = &keys.root;
        let target = if root.toggle_focus.matches(key) {
            if self.app.has_focus(&id::DATABASES) {
                id::CONTENT
            } else {
                id::DATABASES
            }
        } else if root.focus_databases.matches(key) {
            id::DATABASES
        } else if root.focus_content.matches(key) {
            id::CONTENT
        } else {
            return false;
        };
        if !self.app.has_focus(&target) {
            self.app.set_focus(target);
        }
        true
    }

    fn toggle_overlay(&mut self, overlay: ComponentId) {
        if self.app.has_page(&overlay) {
            self.app.hide_page(&overlay);
        } else {
            self.app.show_page(Page::overlay(overlay));
        }
    }

    /// Hand `event` to the focused component and act on what it returns.
    fn to_focused(&mut self, event: &TuiEvent) -> Flow {
        let Some(focus) = self.app.focus().cloned() else {
            return Flow::Continue;
        };
        match focus.as_str() {
            "Databases" => {
                let emitted = self.databases.borrow_mut().handle_event(event);
                if let Some(e) = emitted {
                    self.on_databases(e);
                }
            }
            "Content" => {
                let emitted = self.content.borrow_mut().handle_event(event);
                if let Some(e) = emitted {
                    return self.on_content(e);
                }
            }
            "QueryBar" => {
                let emitted = self.query_bar.borrow_mut().handle_event(event);
                if let Some(InputBarEvent::ShowHistory) = emitted {
                    self.app.show_page(Page::overlay(id::HISTORY));
                }
            }
            "FilterBar" => {
                self.filter_bar.borrow_mut().handle_event(event);
            }
            "History" => {
                let emitted = self.history.borrow_mut().handle_event(event);
                if let Some(e) = emitted {
                    self.on_history(e);
                }
            }
            "DocPeeker" => {
                let emitted = self.peeker.borrow_mut().handle_event(event);
                if let Some(e) = emitted {
                    return self.on_peeker(e);
                }
            }
            "Help" => {
                let emitted = self.help.borrow_mut().handle_event(event);
                if let Some(HelpEvent::Close) = emitted {
                    self.app.hide_page(&id::HELP);
                }
            }
            "StylePicker" => {
                let emitted = self.style_picker.borrow_mut().handle_event(event);
                if let Some(e) = emitted {
                    self.on_style_picker(e);
                }
            }
            other => debug!("No input handler for {}", other),
        }
        Flow::Continue
    }

    fn on_databases(&mut self, event: DatabasesEvent) {
        match event {
            DatabasesEvent::Open { db, coll } => {
                let query = self.content.borrow_mut().open_collection(&db, &coll);
                tasks::spawn_load_documents(self.store(), query, self.tx.clone());
                self.app.set_focus(id::CONTENT);
            }
            DatabasesEvent::ToggleFilter => {
                let request = self.filter_bar.borrow_mut().toggle();
                self.app.apply(request);
            }
            DatabasesEvent::Refresh => self.load_databases(),
        }
    }

    fn on_content(&mut self, event: ContentEvent) -> Flow {
        match event {
            ContentEvent::Load(query) => {
                tasks::spawn_load_documents(self.store(), query, self.tx.clone());
            }
            ContentEvent::Peek { db, coll, document } => {
                self.peeker.borrow_mut().peek(&db, &coll, document);
                self.app.show_page(Page::overlay(id::DOC_PEEKER));
            }
            ContentEvent::Edit { db, coll, document } => {
                return Flow::Edit(EditRequest {
                    db,
                    coll,
                    original: Some(document),
                });
            }
            ContentEvent::Add { db, coll } => {
                return Flow::Edit(EditRequest {
                    db,
                    coll,
                    original: None,
                });
            }
            ContentEvent::ToggleQuery => {
                let request = self.query_bar.borrow_mut().toggle();
                self.app.apply(request);
            }
        }
        Flow::Continue
    }

    fn on_history(&mut self, event: HistoryEvent) {
        if let HistoryEvent::Accept(text) = &event {
            self.query_bar.borrow_mut().set_text(text);
        }
        self.app.hide_page(&id::HISTORY);
    }

    fn on_peeker(&mut self, event: PeekerEvent) -> Flow {
        match event {
            PeekerEvent::Refresh { db, coll, id } => {
                tasks::spawn_load_document(self.store(), db, coll, id, self.tx.clone());
            }
            PeekerEvent::Edit { db, coll, document } => {
                return Flow::Edit(EditRequest {
                    db,
                    coll,
                    original: Some(document),
                });
            }
            PeekerEvent::Close => self.app.hide_page(&id::DOC_PEEKER),
        }
        Flow::Continue
    }

    fn on_style_picker(&mut self, event: StylePickerEvent) {
        match event {
            StylePickerEvent::Select(name) => match self.app.set_style(&name) {
                Ok(()) => {
                    self.style_picker.borrow_mut().set_current(&name);
                    self.app.hide_page(&id::STYLE_PICKER);
                }
                Err(e) => {
                    warn!("Style '{}' not applied: {}", name, e);
                    self.report(&id::HEADER, e.to_string());
                }
            },
            StylePickerEvent::Close => self.app.hide_page(&id::STYLE_PICKER),
        }
    }

    // ------------------------------------------------------------------------
    // Background messages
    // ------------------------------------------------------------------------

    pub fn handle_message(&mut self, message: UiMessage) {
        if let Err(panic) = guard::isolate(|| self.apply_message(message)) {
            error!("Message handler panicked: {}", panic);
            self.report(&id::HEADER, format!("internal error: {panic}"));
        }
    }

    fn apply_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::Data(change) => {
                let delivery = self.app.broadcast(Event::DataChanged(change));
                if delivery.failed > 0 {
                    warn!("{} subscriber(s) failed to take new data", delivery.failed);
                }
            }
            UiMessage::Failed { requester, error } => self.report(&requester, error.to_string()),
            UiMessage::InputClosed {
                bar,
                outcome,
                request,
            } => {
                if let Some(request) = request {
                    self.app.apply(request);
                }
                if let InputOutcome::Accepted(text) = outcome {
                    self.accept_input(&bar, &text);
                }
            }
        }
    }

    fn accept_input(&mut self, bar: &ComponentId, text: &str) {
        if *bar == id::QUERY_BAR {
            self.history.borrow_mut().record(text);
            let query = self.content.borrow_mut().set_filter(text);
            if let Some(query) = query {
                tasks::spawn_load_documents(self.store(), query, self.tx.clone());
            }
        } else if *bar == id::FILTER_BAR {
            self.databases.borrow_mut().set_filter(text);
        }
    }

    /// Show `message` in the component that asked for the failed work.
    fn report(&self, requester: &ComponentId, message: String) {
        let sink: &RefCell<dyn ErrorSink> = match requester.as_str() {
            "Databases" => &*self.databases,
            "Content" => &*self.content,
            "DocPeeker" => &*self.peeker,
            _ => &*self.header,
        };
        match sink.try_borrow_mut() {
            Ok(mut sink) => sink.show_error(message),
            Err(_) => warn!("{} busy, dropping error: {}", requester, message),
        }
    }

    // ------------------------------------------------------------------------
    // External editor
    // ------------------------------------------------------------------------

    /// Act on the result of an editor session.
    pub fn finish_edit(
        &mut self,
        request: EditRequest,
        result: Result<Option<Document>, AppError>,
    ) {
        match result {
            Ok(Some(document)) => tasks::spawn_save_document(
                self.store(),
                request.db,
                request.coll,
                request.original,
                document,
                self.tx.clone(),
            ),
            Ok(None) => debug!("Edit of {}.{} abandoned", request.db, request.coll),
            Err(e) => {
                warn!("Edit failed: {}", e);
                let requester = if self.app.has_page(&id::DOC_PEEKER) {
                    id::DOC_PEEKER
                } else {
                    id::CONTENT
                };
                self.report(&requester, e.to_string());
            }
        }
    }
}
