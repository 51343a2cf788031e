//! # Application Orchestrator
//!
//! [`App`] is the single authority for which component holds input focus. It
//! owns the [`PageStack`] and the [`EventBus`], holds the active style and
//! key-binding snapshots, and wires every component to both through
//! [`App::register`].
//!
//! All methods run on the UI thread. Components never call them directly:
//! they return requests from their key handlers and the dispatcher applies
//! them here, after the component's own borrow has ended.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::{ConfigError, ConfigSource, KeyBindings, ResolvedConfig, Styles};

use super::bus::{Delivery, EventBus};
use super::component::{EventSubscriber, Initializable};
use super::event::Event;
use super::id::{self, ComponentId};
use super::pages::{FocusMove, Page, PageRequest, PageStack};

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    /// `register` was called twice for the same component id.
    AlreadyRegistered(ComponentId),
    /// The external editor could not be run.
    Editor(std::io::Error),
    /// Drawing to the terminal failed.
    Terminal(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{e}"),
            AppError::AlreadyRegistered(id) => write!(f, "component {id} is already registered"),
            AppError::Editor(e) => write!(f, "editor error: {e}"),
            AppError::Terminal(e) => write!(f, "terminal error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

pub struct App {
    pages: PageStack,
    bus: EventBus,
    focus: Option<ComponentId>,
    previous_focus: Option<ComponentId>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
    config: ResolvedConfig,
    source: Box<dyn ConfigSource>,
    registered: HashSet<ComponentId>,
}

impl App {
    /// Load styles and key bindings and build the orchestrator.
    ///
    /// Failing to load either is an error: there is no UI to fall back to.
    pub fn new(config: ResolvedConfig, source: Box<dyn ConfigSource>) -> Result<Self, AppError> {
        let styles = source.load_styles(&config.current_style, config.better_symbols)?;
        let keys = source.load_keybindings()?;
        info!("Orchestrator ready with style '{}'", config.current_style);

        Ok(Self {
            pages: PageStack::new(id::ROOT),
            bus: EventBus::new(),
            focus: None,
            previous_focus: None,
            styles: Arc::new(styles),
            keys: Arc::new(keys),
            config,
            source,
            registered: HashSet::new(),
        })
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn styles(&self) -> Arc<Styles> {
        Arc::clone(&self.styles)
    }

    pub fn keys(&self) -> Arc<KeyBindings> {
        Arc::clone(&self.keys)
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Styles the user can switch to.
    pub fn style_names(&self) -> Vec<String> {
        self.source.list_styles()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn pages(&self) -> &PageStack {
        &self.pages
    }

    // ------------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------------

    /// Initialize `component` and subscribe it to the bus. A component id
    /// can be registered once.
    pub fn register<C>(&mut self, component: &Rc<RefCell<C>>) -> Result<(), AppError>
    where
        C: Initializable + EventSubscriber + 'static,
    {
        let id = component.borrow().id();
        if self.registered.contains(&id) {
            warn!("Component {} registered twice", id);
            return Err(AppError::AlreadyRegistered(id));
        }

        component.borrow_mut().init(self)?;
        self.bus.subscribe_component(component);
        debug!("Registered {}", id);
        self.registered.insert(id);
        Ok(())
    }

    pub fn is_registered(&self, id: &ComponentId) -> bool {
        self.registered.contains(id)
    }

    pub fn broadcast(&self, event: Event) -> Delivery {
        self.bus.broadcast(&event)
    }

    // ------------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------------

    pub fn focus(&self) -> Option<&ComponentId> {
        self.focus.as_ref()
    }

    pub fn has_focus(&self, id: &ComponentId) -> bool {
        self.focus.as_ref() == Some(id)
    }

    /// Move focus to `id`, remembering who had it for [`give_back_focus`].
    ///
    /// [`give_back_focus`]: App::give_back_focus
    pub fn set_focus(&mut self, id: ComponentId) {
        self.previous_focus = self.focus.take();
        self.focus_to(id);
    }

    /// Return focus to whoever held it before the last [`set_focus`].
    /// Does nothing when there is no such record.
    ///
    /// [`set_focus`]: App::set_focus
    pub fn give_back_focus(&mut self) {
        match self.previous_focus.take() {
            Some(previous) => self.focus_to(previous),
            None => debug!("No previous focus to give back"),
        }
    }

    fn focus_to(&mut self, id: ComponentId) {
        debug!("Focus → {}", id);
        self.focus = Some(id.clone());
        self.bus.broadcast(&Event::FocusChanged(id));
    }

    fn apply_focus_move(&mut self, moved: FocusMove) {
        match moved {
            FocusMove::Stay => {}
            FocusMove::To(id) => self.focus_to(id),
            FocusMove::Clear => {
                debug!("Focus cleared");
                self.focus = None;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    /// Show `page`, pushing the current focus so [`hide_page`] can restore it.
    ///
    /// [`hide_page`]: App::hide_page
    pub fn show_page(&mut self, page: Page) {
        let moved = self.pages.show(page, self.focus.as_ref());
        self.apply_focus_move(moved);
    }

    /// Remove a page and restore the focus it displaced. A page that was
    /// never shown is ignored.
    pub fn hide_page(&mut self, id: &ComponentId) {
        let moved = self.pages.hide(id);
        self.apply_focus_move(moved);
    }

    pub fn has_page(&self, id: &ComponentId) -> bool {
        self.pages.has_page(id)
    }

    pub fn apply(&mut self, request: PageRequest) {
        match request {
            PageRequest::Show(page) => self.show_page(page),
            PageRequest::Hide(id) => self.hide_page(&id),
        }
    }

    // ------------------------------------------------------------------------
    // Configuration changes
    // ------------------------------------------------------------------------

    /// Switch to the style called `name`, persist the choice and publish
    /// `StyleChanged`.
    ///
    /// On failure nothing changes: the previous style stays active and the
    /// config file is rewritten with the previous name if it had already
    /// been saved.
    pub fn set_style(&mut self, name: &str) -> Result<(), AppError> {
        let previous = std::mem::replace(&mut self.config.current_style, name.to_string());

        let result = self.source.save_config(&self.config).and_then(|()| {
            self.source
                .load_styles(&self.config.current_style, self.config.better_symbols)
        });

        let styles = match result {
            Ok(styles) => styles,
            Err(e) => {
                error!("Failed to switch style to '{}': {}", name, e);
                self.config.current_style = previous;
                if let Err(e) = self.source.save_config(&self.config) {
                    warn!("Failed to restore previous style in config: {}", e);
                }
                return Err(e.into());
            }
        };

        info!("Style changed to '{}'", name);
        self.styles = Arc::new(styles);
        self.bus.broadcast(&Event::StyleChanged(self.styles()));
        Ok(())
    }

    /// Re-read key bindings and publish `KeysChanged`. On failure the
    /// current bindings stay active.
    pub fn reload_keys(&mut self) -> Result<(), AppError> {
        let keys = self.source.load_keybindings().map_err(|e| {
            error!("Failed to reload key bindings: {}", e);
            AppError::from(e)
        })?;

        info!("Key bindings reloaded");
        self.keys = Arc::new(keys);
        self.bus.broadcast(&Event::KeysChanged(self.keys()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::HandlerError;
    use crate::test_support::{StaticSource, test_app, test_app_with};

    fn record_focus(app: &App) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        app.bus().subscribe(id::KEY_HINTS, move |event| {
            if let Event::FocusChanged(id) = event {
                log.borrow_mut().push(id.to_string());
            }
            Ok(())
        });
        seen
    }

    #[test]
    fn test_set_focus_then_give_back() {
        let mut app = test_app();
        app.set_focus(id::DATABASES);
        app.set_focus(id::CONTENT);
        app.give_back_focus();
        assert_eq!(app.focus(), Some(&id::DATABASES));

        // The record is consumed.
        app.give_back_focus();
        assert_eq!(app.focus(), Some(&id::DATABASES));
    }

    #[test]
    fn test_show_and_hide_publish_focus_changes() {
        let mut app = test_app();
        app.set_focus(id::CONTENT);

        let observed = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&observed);
        app.bus().subscribe(id::HEADER, move |event| {
            if let Event::FocusChanged(id) = event {
                log.borrow_mut().push(id.to_string());
            }
            Ok(())
        });

        app.show_page(Page::overlay(id::HELP));
        assert!(app.has_page(&id::HELP));
        app.hide_page(&id::HELP);
        assert_eq!(*observed.borrow(), vec!["Help", "Content"]);
        assert_eq!(app.focus(), Some(&id::CONTENT));
    }

    #[test]
    fn test_hide_never_shown_is_silent() {
        let mut app = test_app();
        app.set_focus(id::CONTENT);
        let seen = record_focus(&app);
        app.hide_page(&id::DOC_PEEKER);
        assert!(seen.borrow().is_empty());
        assert_eq!(app.focus(), Some(&id::CONTENT));
        assert_eq!(app.pages().page_depth(), 1);
    }

    #[test]
    fn test_register_inits_once_and_subscribes() {
        struct Probe {
            inits: usize,
            events: usize,
        }
        impl Initializable for Probe {
            fn init(&mut self, _app: &App) -> Result<(), AppError> {
                self.inits += 1;
                Ok(())
            }
        }
        impl EventSubscriber for Probe {
            fn id(&self) -> ComponentId {
                id::HEADER
            }
            fn on_event(&mut self, _event: &Event) -> Result<(), HandlerError> {
                self.events += 1;
                Ok(())
            }
        }

        let mut app = test_app();
        let probe = Rc::new(RefCell::new(Probe { inits: 0, events: 0 }));
        app.register(&probe).unwrap();
        assert!(matches!(
            app.register(&probe),
            Err(AppError::AlreadyRegistered(id)) if id == id::HEADER
        ));
        assert_eq!(probe.borrow().inits, 1);

        app.set_focus(id::CONTENT);
        assert_eq!(probe.borrow().events, 1);
    }

    #[test]
    fn test_set_style_publishes_and_persists() {
        let source = StaticSource::default();
        let saved = source.saved_styles();
        let mut app = test_app_with(source);
        let styles = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&styles);
        app.bus().subscribe(id::HEADER, move |event| {
            if let Event::StyleChanged(s) = event {
                log.borrow_mut().push(s.global.text.clone());
            }
            Ok(())
        });

        app.set_style("light").unwrap();
        assert_eq!(app.config().current_style, "light");
        assert_eq!(*saved.borrow(), vec!["light".to_string()]);
        assert_eq!(styles.borrow().len(), 1);
        assert_eq!(app.styles().global, Styles::builtin("light").unwrap().global);
    }

    #[test]
    fn test_failed_style_change_keeps_previous() {
        let mut app = test_app();
        let before = app.styles();
        let seen = Rc::new(RefCell::new(0));
        let count = Rc::clone(&seen);
        app.bus().subscribe(id::HEADER, move |_| {
            *count.borrow_mut() += 1;
            Ok(())
        });

        let err = app.set_style("neon").unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::UnknownStyle(_))));
        assert_eq!(app.config().current_style, "default");
        assert_eq!(app.styles(), before);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_failed_key_reload_keeps_previous() {
        let source = StaticSource::default();
        let fail = source.fail_keys();
        let mut app = test_app_with(source);
        let before = app.keys();

        fail.set(true);
        assert!(app.reload_keys().is_err());
        assert_eq!(app.keys(), before);

        fail.set(false);
        app.reload_keys().unwrap();
    }

    #[test]
    fn test_startup_fails_without_styles() {
        let source = StaticSource::default();
        source.fail_styles().set(true);
        let config = crate::test_support::test_config();
        assert!(matches!(
            App::new(config, Box::new(source)),
            Err(AppError::Config(_))
        ));
    }
}
