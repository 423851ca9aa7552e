//! State behind the paginated user and patrol management screens
//!
//! [`ListScreen`] knows nothing about egui. The pages feed it input and call
//! [`ListScreen::tick`] once per frame, it talks to the backend through the
//! [`CrudEntity`] implementation.

use std::fmt::Debug;

use futures::{
    channel::oneshot,
    future::BoxFuture,
};
use patrol_client_core::{Client, RequestError, UiCallBack};
use patrol_shared::{
    errors::ValidationError,
    id::EntityId,
    paging::{ListQuery, PagedResult, Pagination},
    log_err_as_warn,
    uac::{gate, GateTag, Role},
};
use patrol_time::{Instant, Millis};
use tracing::{debug, info, warn};

mod debounce;
mod patrols;
mod toasts;
mod users;

pub use debounce::Debouncer;
pub use toasts::{Toast, ToastKind, Toasts};

pub type MutationFuture = BoxFuture<'static, Result<(), RequestError>>;

/// A record type that can be listed, created, edited and deleted
pub trait CrudEntity: Clone + Debug + Send + 'static {
    /// Raw editor contents
    type Form: Clone + Debug + Default;

    /// Used in notices, for example "Usuario creado"
    const LABEL: &'static str;
    /// Whether the editor has a read only mode
    const ALLOWS_VIEW: bool;

    fn id(&self) -> &EntityId;

    fn new_form() -> Self::Form;

    fn edit_form(&self) -> Self::Form;

    fn list(client: &Client, query: ListQuery)
        -> BoxFuture<'static, Result<PagedResult<Self>, RequestError>>;

    fn create(client: &Client, form: &Self::Form) -> Result<MutationFuture, ValidationError>;

    fn update(
        client: &Client,
        id: &EntityId,
        form: &Self::Form,
    ) -> Result<MutationFuture, ValidationError>;

    fn delete(client: &Client, id: &EntityId) -> MutationFuture;

    /// Text for the created / updated / deleted notices
    fn done_message(action: Mutation) -> String {
        let suffix = if Self::LABEL.ends_with('a') { "a" } else { "o" };
        let verb = match action {
            Mutation::Create => "cread",
            Mutation::Update => "actualizad",
            Mutation::Delete => "eliminad",
        };
        format!("{} {verb}{suffix}", Self::LABEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(EntityId),
    View,
}

#[derive(Debug, Clone)]
pub struct Editor<F> {
    pub mode: EditorMode,
    pub form: F,
}

impl<F> Editor<F> {
    pub fn is_read_only(&self) -> bool {
        self.mode == EditorMode::View
    }

    /// Code and email cannot be changed once created
    pub fn is_identity_locked(&self) -> bool {
        !matches!(self.mode, EditorMode::Create)
    }
}

type LoadResult<E> = Result<PagedResult<E>, RequestError>;

#[derive(Debug)]
struct PendingMutation {
    action: Mutation,
    /// Number of rows on the page when a delete was sent
    rows_before: usize,
    rx: oneshot::Receiver<Result<(), RequestError>>,
}

#[derive(Debug)]
pub struct ListScreen<E: CrudEntity> {
    query: ListQuery,
    search_input: String,
    debouncer: Debouncer,
    total: u64,
    items: Vec<E>,
    load_error: Option<String>,
    reload_requested: bool,
    loading: Option<oneshot::Receiver<LoadResult<E>>>,
    mutation: Option<PendingMutation>,
    editor: Option<Editor<E::Form>>,
    pending_delete: Option<E>,
    toasts: Toasts,
    can_edit: bool,
    redirect_to_login: bool,
}

impl<E: CrudEntity> ListScreen<E> {
    pub fn new(debounce: Millis, page_size: u32, toast_duration: Millis) -> Self {
        Self {
            query: ListQuery {
                size: page_size.max(1),
                ..Default::default()
            },
            search_input: String::new(),
            debouncer: Debouncer::new(debounce),
            total: 0,
            items: Vec::new(),
            load_error: None,
            reload_requested: true,
            loading: None,
            mutation: None,
            editor: None,
            pending_delete: None,
            toasts: Toasts::new(toast_duration),
            can_edit: false,
            redirect_to_login: false,
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some() || self.reload_requested
    }

    /// Something is waiting on the backend
    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.mutation.is_some()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.query.page,
            size: self.query.size,
            total: self.total,
        }
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    /// Controls stay on screen but are disabled for non admins
    pub fn on_role_changed(&mut self, role: Role) {
        self.can_edit = gate(GateTag::AdminDisable, role).is_enabled();
        debug!(?role, can_edit = self.can_edit, "role applied to list screen");
    }

    /// Returns true once after an action found the session gone
    pub fn take_redirect_to_login(&mut self) -> bool {
        std::mem::take(&mut self.redirect_to_login)
    }

    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Call on every edit of the search box. The reload happens once typing
    /// pauses for the debounce delay
    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.search_input = text.into();
        self.debouncer.touch(now);
    }

    pub fn set_page_size(&mut self, size: u32) {
        if size == 0 || size == self.query.size {
            return;
        }
        self.query.size = size;
        self.query.page = 1;
        self.reload_requested = true;
    }

    /// Pages outside `1..=page_count` are ignored. Returns true if a reload
    /// was requested
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page == self.query.page || !self.pagination().is_valid_page(page) {
            return false;
        }
        self.query.page = page;
        self.reload_requested = true;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination().has_next() && self.go_to_page(self.query.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.pagination().has_previous() && self.go_to_page(self.query.page - 1)
    }

    pub fn editor(&self) -> Option<&Editor<E::Form>> {
        self.editor.as_ref()
    }

    pub fn editor_form_mut(&mut self) -> Option<&mut E::Form> {
        self.editor
            .as_mut()
            .filter(|editor| !editor.is_read_only())
            .map(|editor| &mut editor.form)
    }

    pub fn open_create(&mut self) {
        if !self.can_edit {
            warn!("create attempted without admin role");
            return;
        }
        self.editor = Some(Editor {
            mode: EditorMode::Create,
            form: E::new_form(),
        });
    }

    pub fn open_edit(&mut self, item: &E) {
        if !self.can_edit {
            warn!("edit attempted without admin role");
            return;
        }
        self.editor = Some(Editor {
            mode: EditorMode::Edit(item.id().clone()),
            form: item.edit_form(),
        });
    }

    /// Only for entities with a read only editor
    pub fn open_view(&mut self, item: &E) {
        if !E::ALLOWS_VIEW {
            return;
        }
        self.editor = Some(Editor {
            mode: EditorMode::View,
            form: item.edit_form(),
        });
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Validates and sends the editor contents. A validation failure becomes a
    /// toast and nothing is sent
    pub fn submit_editor<N: UiCallBack>(&mut self, client: &Client, now: Instant, notify: N) {
        if self.mutation.is_some() {
            debug!("mutation already in flight");
            return;
        }
        let Some(editor) = &self.editor else {
            return;
        };
        let (action, prepared) = match &editor.mode {
            EditorMode::Create => (Mutation::Create, E::create(client, &editor.form)),
            EditorMode::Edit(id) => (Mutation::Update, E::update(client, id, &editor.form)),
            EditorMode::View => return,
        };
        match prepared {
            Ok(fut) => self.start_mutation(client, action, fut, notify),
            Err(e) => {
                info!(%e, "form rejected");
                self.toasts.error(e.to_string(), now);
            }
        }
    }

    pub fn pending_delete(&self) -> Option<&E> {
        self.pending_delete.as_ref()
    }

    /// First step of a delete, nothing is sent until confirmed
    pub fn ask_delete(&mut self, item: &E) {
        if !self.can_edit {
            warn!("delete attempted without admin role");
            return;
        }
        self.pending_delete = Some(item.clone());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete<N: UiCallBack>(&mut self, client: &Client, notify: N) {
        if self.mutation.is_some() {
            return;
        }
        let Some(item) = self.pending_delete.take() else {
            return;
        };
        let fut = E::delete(client, item.id());
        self.start_mutation(client, Mutation::Delete, fut, notify);
    }

    fn start_mutation<N: UiCallBack>(
        &mut self,
        client: &Client,
        action: Mutation,
        fut: MutationFuture,
        notify: N,
    ) {
        info!(?action, entity = E::LABEL, "mutation sent");
        self.mutation = Some(PendingMutation {
            action,
            rows_before: self.items.len(),
            rx: client.spawn_for_ui(fut, notify),
        });
    }

    /// Drives the debounce, the toasts and any outstanding requests
    pub fn tick<N: UiCallBack + Clone>(&mut self, client: &Client, now: Instant, notify: N) {
        self.toasts.tick(now);

        if self.debouncer.fire(now) && self.search_input.trim() != self.query.q.trim() {
            self.query.q = self.search_input.clone();
            self.query.page = 1;
            self.reload_requested = true;
        }

        self.poll_mutation(now);

        if std::mem::take(&mut self.reload_requested) {
            debug!(query = ?self.query, "loading list");
            // Replacing the receiver discards any older response still on its way
            self.loading = Some(client.spawn_for_ui(
                E::list(client, self.query.clone()),
                notify.clone(),
            ));
        }

        self.poll_load();
    }

    fn poll_load(&mut self) {
        let Some(rx) = &mut self.loading else {
            return;
        };
        let result = match log_err_as_warn!(rx.try_recv(), "list request dropped") {
            Some(None) => return,
            Some(Some(result)) => result,
            None => Err(RequestError::Network("request dropped".into())),
        };
        self.loading = None;
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total = page.total;
                self.load_error = None;
            }
            Err(RequestError::Unauthenticated) => self.redirect_to_login = true,
            Err(e) => {
                warn!(%e, entity = E::LABEL, "list failed");
                self.load_error = Some(format!("Error cargando: {e}"));
            }
        }
    }

    fn poll_mutation(&mut self, now: Instant) {
        let Some(pending) = &mut self.mutation else {
            return;
        };
        let result = match log_err_as_warn!(pending.rx.try_recv(), "mutation dropped") {
            Some(None) => return,
            Some(Some(result)) => result,
            None => Err(RequestError::Network("request dropped".into())),
        };
        let action = pending.action;
        let rows_before = pending.rows_before;
        self.mutation = None;

        match result {
            Ok(()) => {
                self.toasts.success(E::done_message(action), now);
                match action {
                    Mutation::Create | Mutation::Update => self.editor = None,
                    Mutation::Delete => {
                        if rows_before == 1 && self.query.page > 1 {
                            self.query.page -= 1;
                        }
                    }
                }
                self.reload_requested = true;
            }
            Err(RequestError::Unauthenticated) => self.redirect_to_login = true,
            Err(e) => {
                warn!(%e, ?action, entity = E::LABEL, "mutation failed");
                self.toasts.error(e.to_string(), now);
            }
        }
    }
}
