use chrono::Utc;
use tracing::{debug, info, warn};

use crate::capabilities::{kv, Capabilities};
use crate::config::AppConfig;
use crate::event::Event;
use crate::model::Theme;
use crate::persistence::{decode_items, decode_theme, StorageError};
use crate::store::AppState;
use crate::view::ViewModel;

#[derive(Default)]
pub struct App;

#[derive(Debug, Default)]
pub struct Model {
    pub state: AppState,
    pub config: AppConfig,
    pub items_loaded: bool,
    pub theme_loaded: bool,
    /// A change happened before hydration finished; written once it has.
    pub persist_pending: bool,
    /// The user picked a theme before the stored one arrived; theirs wins.
    pub theme_chosen: bool,
    pub storage_failures: usize,
    pub last_storage_error: Option<StorageError>,
}

impl Model {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.items_loaded && self.theme_loaded
    }

    fn choose_theme(&mut self, theme: Theme) -> AppState {
        if !self.theme_loaded {
            self.theme_chosen = true;
        }
        self.state.set_theme(theme)
    }

    fn record_storage_error(&mut self, error: StorageError) {
        self.storage_failures += 1;
        self.last_storage_error = Some(error);
    }
}

impl App {
    /// Installs `next` and, if items or theme changed, persists and renders.
    fn commit(next: AppState, model: &mut Model, caps: &Capabilities) {
        let previous = std::mem::replace(&mut model.state, next);
        if previous.version() == model.state.version() {
            return;
        }

        let needs_persist = !previous.shares_items_with(&model.state)
            || previous.theme() != model.state.theme();
        if needs_persist {
            Self::persist(model, caps);
        }
        caps.render.render();
    }

    fn persist(model: &mut Model, caps: &Capabilities) {
        // Writing before the stored data is read would overwrite it.
        if !model.is_loaded() {
            debug!("deferring write until persisted state is loaded");
            model.persist_pending = true;
            return;
        }
        model.persist_pending = false;
        if let Err(e) = kv::write_snapshot(&caps.kv, &model.config.storage, &model.state) {
            model.record_storage_error(e);
        }
    }

    fn finish_hydration(model: &mut Model, caps: &Capabilities) {
        if !model.is_loaded() {
            return;
        }
        info!(
            count = model.state.len(),
            theme = model.state.theme().as_str(),
            "persisted state loaded"
        );
        if model.persist_pending {
            Self::persist(model, caps);
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user = event.is_user_initiated(),
            "handling event"
        );

        match event {
            Event::AppStarted => {
                kv::request_snapshot(&caps.kv, &model.config.storage);
                caps.render.render();
            }

            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(
                        items_key = %config.storage.items,
                        theme_key = %config.storage.theme,
                        "configuration applied"
                    );
                    model.config = *config;
                }
                Err(e) => warn!(error = %e, "rejecting invalid configuration"),
            },

            Event::AddTodo(draft) => {
                let draft = model.config.prepare_draft(draft);
                let next = model.state.add_todo(draft, Utc::now());
                Self::commit(next, model, caps);
            }

            Event::ToggleTodo { id } => {
                let next = model.state.toggle_todo(id);
                Self::commit(next, model, caps);
            }

            Event::DeleteTodo { id } => {
                let next = model.state.delete_todo(id);
                Self::commit(next, model, caps);
            }

            Event::UpdateTodo { id, text } => {
                let text = model.config.clamp_text(&text);
                let next = model.state.update_todo(id, &text);
                Self::commit(next, model, caps);
            }

            Event::ClearCompleted => {
                let next = model.state.clear_completed();
                Self::commit(next, model, caps);
            }

            Event::SetFilter(filter) => {
                debug!(filter = filter.as_str(), "filter selected");
                let next = model.state.set_filter(filter);
                Self::commit(next, model, caps);
            }

            Event::SetSearchTerm(term) => {
                let next = model.state.set_search_term(term);
                Self::commit(next, model, caps);
            }

            Event::SetTheme(theme) => {
                let next = model.choose_theme(theme);
                Self::commit(next, model, caps);
            }

            Event::ToggleTheme => {
                let next = model.choose_theme(model.state.theme().toggled());
                Self::commit(next, model, caps);
            }

            Event::SetShowStats(show) => {
                let next = model.state.set_show_stats(show);
                Self::commit(next, model, caps);
            }

            Event::ItemsLoaded(result) => {
                let items = match result {
                    Ok(raw) => decode_items(raw.as_deref()),
                    Err(e) => {
                        warn!(error = %e, "failed to read items, starting empty");
                        Vec::new()
                    }
                };
                model.state = model.state.hydrate_items(items);
                model.items_loaded = true;
                Self::finish_hydration(model, caps);
                caps.render.render();
            }

            Event::ThemeLoaded(result) => {
                let stored = match result {
                    Ok(raw) => decode_theme(raw.as_deref()),
                    Err(e) => {
                        warn!(error = %e, "failed to read theme, using default");
                        Theme::default()
                    }
                };
                if model.theme_chosen {
                    debug!(
                        stored = stored.as_str(),
                        chosen = model.state.theme().as_str(),
                        "keeping theme chosen before load"
                    );
                } else {
                    model.state = model.state.set_theme(stored);
                }
                model.theme_loaded = true;
                Self::finish_hydration(model, caps);
                caps.render.render();
            }

            Event::Persisted { key, result } => match result {
                Ok(()) => debug!(%key, "write acknowledged"),
                Err(e) => {
                    warn!(%key, error = %e, "write to local store failed, keeping in-memory state");
                    model.record_storage_error(e);
                }
            },
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(&model.state, model.is_loaded())
    }
}
