use crate::api::{BulkAction, BulkRequest};
use crate::catalog::Catalog;
use crate::config::RuntimeConfigSnapshot;
use crate::draft::{
    DeployDraft, DeploymentPayload, DraftField, DraftOptions, FieldInput, ValidationTicket,
};
use crate::input::Action;
use crate::panel::{ListState, MenuSection, Panel, PanelKind};
use crate::session::{Route, Session, authenticate, known_accounts};
use crate::verify::{VerificationRequest, VerificationResponse};
use tracing::{debug, info, warn};

const PAGE_STEP: isize = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Login,
    Form,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusPane {
    Menu,
    Content,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AdminTab {
    Quotas,
    Tenants,
    Accounts,
}

impl AdminTab {
    pub const ALL: [AdminTab; 3] = [AdminTab::Quotas, AdminTab::Tenants, AdminTab::Accounts];

    pub fn title(self) -> &'static str {
        match self {
            Self::Quotas => "Cluster Quotas",
            Self::Tenants => "Tenants",
            Self::Accounts => "Accounts",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MenuEntry {
    Section(MenuSection),
    Item(PanelKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Verify {
        dialog: u64,
        ticket: ValidationTicket,
        request: VerificationRequest,
    },
    Bulk(BulkRequest),
    SubmitDeployment(DeploymentPayload),
}

#[derive(Debug, Clone)]
struct PendingConfirmation {
    prompt: String,
    command: AppCommand,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    field: Option<LoginField>,
}

impl LoginForm {
    pub fn field(&self) -> LoginField {
        self.field.unwrap_or(LoginField::Username)
    }

    fn input_mut(&mut self) -> &mut String {
        match self.field() {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    fn switch_field(&mut self) {
        self.field = Some(match self.field() {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        });
    }
}

/// Deploy dialog: the draft plus which field has focus. `id` tells dialogs
/// apart so outcomes for a discarded draft never reach a new one.
#[derive(Debug, Clone)]
pub struct DeployDialog {
    pub draft: DeployDraft,
    id: u64,
    focus: usize,
    show_preview: bool,
}

impl DeployDialog {
    fn new(id: u64, draft: DeployDraft) -> Self {
        Self {
            draft,
            id,
            focus: 0,
            show_preview: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn focused_field(&self) -> Option<DraftField> {
        self.draft.fields().get(self.focus).copied()
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.draft.fields().len() as isize;
        if len == 0 {
            self.focus = 0;
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn focus_field(&mut self, field: DraftField) {
        if let Some(index) = self.draft.fields().iter().position(|f| *f == field) {
            self.focus = index;
        }
    }

    fn clamp_focus(&mut self) {
        self.focus = self.focus.min(self.draft.fields().len().saturating_sub(1));
    }
}

#[derive(Debug, Clone)]
pub struct App {
    running: bool,
    mode: InputMode,
    route: Route,
    session: Option<Session>,
    login: LoginForm,
    fixtures: Catalog,
    catalog: Catalog,
    config_source: Option<String>,
    expanded_sections: Vec<MenuSection>,
    menu_cursor: usize,
    focus: FocusPane,
    panel: Panel,
    detail_scroll: u16,
    filter_backup: Option<String>,
    dialog: Option<DeployDialog>,
    dialogs_opened: u64,
    admin_tab: AdminTab,
    admin_cursor: usize,
    pending_confirmation: Option<PendingConfirmation>,
    pending_g: bool,
    show_help: bool,
    status: String,
}

impl App {
    pub fn new(catalog: Catalog, username_hint: Option<String>) -> Self {
        let panel = Panel::open(PanelKind::Applications, &catalog);
        let login = LoginForm {
            username: username_hint.unwrap_or_default(),
            ..LoginForm::default()
        };

        let mut app = Self {
            running: true,
            mode: InputMode::Login,
            route: Route::Login,
            session: None,
            login,
            fixtures: catalog.clone(),
            catalog,
            config_source: None,
            expanded_sections: vec![MenuSection::Argo],
            menu_cursor: 0,
            focus: FocusPane::Content,
            panel,
            detail_scroll: 0,
            filter_backup: None,
            dialog: None,
            dialogs_opened: 0,
            admin_tab: AdminTab::Quotas,
            admin_cursor: 0,
            pending_confirmation: None,
            pending_g: false,
            show_help: false,
            status: "Sign in to continue".to_string(),
        };
        app.sync_menu_cursor();
        app
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn login(&self) -> &LoginForm {
        &self.login
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config_source(&self) -> Option<&str> {
        self.config_source.as_deref()
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn dialog(&self) -> Option<&DeployDialog> {
        self.dialog.as_ref()
    }

    pub fn admin_tab(&self) -> AdminTab {
        self.admin_tab
    }

    pub fn admin_cursor(&self) -> usize {
        self.admin_cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn pending_confirmation_prompt(&self) -> Option<&str> {
        self.pending_confirmation
            .as_ref()
            .map(|pending| pending.prompt.as_str())
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        let mut entries = Vec::new();
        for section in MenuSection::ALL {
            entries.push(MenuEntry::Section(section));
            if section.has_submenu() && self.expanded_sections.contains(&section) {
                entries.extend(section.items().iter().copied().map(MenuEntry::Item));
            }
        }
        entries
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn section_expanded(&self, section: MenuSection) -> bool {
        self.expanded_sections.contains(&section)
    }

    pub fn admin_row_count(&self) -> usize {
        match self.admin_tab {
            AdminTab::Quotas => self.catalog.deploy_targets().len(),
            AdminTab::Tenants => self.catalog.tenants.len(),
            AdminTab::Accounts => known_accounts().len(),
        }
    }

    /// Rebuilds the catalog from fixtures plus the config overrides. Drafts
    /// already open keep the options they were opened with.
    pub fn apply_runtime_config(&mut self, snapshot: &RuntimeConfigSnapshot) {
        let mut catalog = self.fixtures.clone();
        catalog.merge_cluster_overrides(&snapshot.deploy_targets);
        if !snapshot.builtin_templates.is_empty() {
            catalog.builtin_templates = snapshot.builtin_templates.clone();
        }
        self.catalog = catalog;
        self.admin_cursor = self
            .admin_cursor
            .min(self.admin_row_count().saturating_sub(1));

        match (&snapshot.source, &self.config_source) {
            (Some(source), _) => self.status = format!("Config loaded from {source}"),
            (None, Some(_)) => self.status = "Config file removed, using defaults".to_string(),
            (None, None) => {}
        }
        self.config_source = snapshot.source.clone();
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if matches!(action, Action::Quit) {
            self.running = false;
            self.status = "Exit requested".to_string();
            return AppCommand::None;
        }

        if let Some(pending) = self.pending_confirmation.take() {
            match action {
                Action::ConfirmYes | Action::Activate => {
                    self.status = format!("Confirmed: {}", pending.prompt);
                    return self.dispatch(pending.command);
                }
                Action::ConfirmNo | Action::CancelInput | Action::ClearOverlay => {
                    self.status = "Action cancelled".to_string();
                    return AppCommand::None;
                }
                _ => {
                    self.pending_confirmation = Some(pending);
                    self.status =
                        "Pending confirmation: press y to confirm or n to cancel".to_string();
                    return AppCommand::None;
                }
            }
        }

        let g_prefix = matches!(action, Action::GPrefix);
        let top_requested = g_prefix && self.pending_g;
        self.pending_g = g_prefix && !top_requested;

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::ClearOverlay) {
                return AppCommand::None;
            }
        }

        let action = if top_requested { Action::Top } else { action };
        match self.route {
            Route::Login => self.apply_login_action(action),
            Route::Dashboard if self.dialog.is_some() => self.apply_form_action(action),
            Route::Dashboard => self.apply_dashboard_action(action),
            Route::Admin => self.apply_admin_action(action),
        }
    }

    /// Records a verifier outcome for the dialog that asked for it. Outcomes
    /// for a closed dialog or a retired ticket are dropped.
    pub fn apply_verification(
        &mut self,
        dialog_id: u64,
        ticket: ValidationTicket,
        outcome: Result<VerificationResponse, String>,
    ) {
        let Some(dialog) = self.dialog.as_mut().filter(|dialog| dialog.id == dialog_id) else {
            debug!("dropping verification for {:?}: draft {dialog_id} is gone", ticket.target);
            return;
        };

        let response = outcome.unwrap_or_else(VerificationResponse::failed);
        let ok = response.ok;
        let message = response.message.clone();
        if !dialog.draft.finish_validation(ticket, response) {
            debug!("dropping stale verification for {:?}", ticket.target);
            return;
        }
        self.status = if ok {
            format!("Validation passed: {message}")
        } else {
            format!("Validation failed: {message}")
        };
    }

    fn navigate(&mut self, requested: Route) {
        let route = Route::resolve(requested, self.session.as_ref());
        if route != requested {
            debug!("route {} redirected to {}", requested.title(), route.title());
        }
        self.route = route;
        self.mode = match route {
            Route::Login => InputMode::Login,
            Route::Dashboard | Route::Admin => InputMode::Normal,
        };
    }

    fn apply_login_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::InputChar(c) => {
                self.login.input_mut().push(c);
                self.login.error = None;
            }
            Action::Backspace => {
                self.login.input_mut().pop();
            }
            Action::NextField | Action::PrevField => self.login.switch_field(),
            Action::CancelInput => {
                self.login = LoginForm::default();
            }
            Action::SubmitInput => self.submit_login(),
            _ => {}
        }
        AppCommand::None
    }

    fn submit_login(&mut self) {
        let username = self.login.username.trim().to_string();
        match authenticate(&username, &self.login.password) {
            Ok(session) => {
                info!("signed in as {} ({})", session.username, session.role);
                self.status = format!("Signed in as {} ({})", session.username, session.role);
                self.session = Some(session);
                self.login = LoginForm::default();
                self.navigate(Route::Login);
            }
            Err(error) => {
                warn!("sign-in rejected for {username:?}");
                self.login.password.clear();
                self.login.field = Some(LoginField::Password);
                self.login.error = Some(error.to_string());
                self.status = error.to_string();
            }
        }
    }

    fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!("signed out {}", session.username);
        }
        self.dialog = None;
        self.panel = Panel::open(PanelKind::Applications, &self.catalog);
        self.focus = FocusPane::Content;
        self.admin_tab = AdminTab::Quotas;
        self.admin_cursor = 0;
        self.navigate(Route::Dashboard);
        self.status = "Signed out".to_string();
    }

    fn apply_admin_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::NextTab | Action::ToggleFocus => self.switch_admin_tab(1),
            Action::PrevTab => self.switch_admin_tab(-1),
            Action::Down => self.move_admin_cursor(1),
            Action::Up => self.move_admin_cursor(-1),
            Action::PageDown => self.move_admin_cursor(PAGE_STEP),
            Action::PageUp => self.move_admin_cursor(-PAGE_STEP),
            Action::Top => self.admin_cursor = 0,
            Action::Bottom => self.admin_cursor = self.admin_row_count().saturating_sub(1),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Logout => self.logout(),
            _ => {}
        }
        AppCommand::None
    }

    fn switch_admin_tab(&mut self, delta: isize) {
        let tabs = AdminTab::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.admin_tab)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(tabs.len() as isize) as usize;
        self.admin_tab = tabs[next];
        self.admin_cursor = 0;
    }

    fn move_admin_cursor(&mut self, delta: isize) {
        let len = self.admin_row_count();
        if len == 0 {
            self.admin_cursor = 0;
            return;
        }
        let max_index = len.saturating_sub(1) as isize;
        self.admin_cursor = (self.admin_cursor as isize + delta).clamp(0, max_index) as usize;
    }

    fn apply_dashboard_action(&mut self, action: Action) -> AppCommand {
        if self.mode == InputMode::Filter {
            return self.apply_filter_action(action);
        }

        match action {
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Logout => self.logout(),
            Action::NextTab => self.switch_panel_by_offset(1),
            Action::PrevTab => self.switch_panel_by_offset(-1),
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    FocusPane::Menu => FocusPane::Content,
                    FocusPane::Content => FocusPane::Menu,
                };
                self.sync_menu_cursor();
            }
            _ if self.focus == FocusPane::Menu => self.apply_menu_action(action),
            _ => return self.apply_content_action(action),
        }
        AppCommand::None
    }

    fn apply_menu_action(&mut self, action: Action) {
        let entries = self.menu_entries();
        let max_index = entries.len().saturating_sub(1) as isize;
        match action {
            Action::Down => {
                self.menu_cursor = (self.menu_cursor as isize + 1).clamp(0, max_index) as usize
            }
            Action::Up => {
                self.menu_cursor = (self.menu_cursor as isize - 1).clamp(0, max_index) as usize
            }
            Action::Top => self.menu_cursor = 0,
            Action::Bottom => self.menu_cursor = max_index as usize,
            Action::Activate | Action::ToggleExpand => match entries.get(self.menu_cursor) {
                Some(MenuEntry::Section(section)) => self.toggle_section(*section),
                Some(MenuEntry::Item(kind)) => {
                    self.open_panel(*kind);
                    self.focus = FocusPane::Content;
                }
                None => {}
            },
            Action::ClearOverlay => self.focus = FocusPane::Content,
            _ => {}
        }
    }

    /// Activating a section folds or unfolds it and always shows its first item.
    fn toggle_section(&mut self, section: MenuSection) {
        if !section.has_submenu() {
            if let Some(kind) = section.items().first() {
                self.open_panel(*kind);
                self.focus = FocusPane::Content;
            }
            return;
        }

        let was_expanded = self.expanded_sections.contains(&section);
        if let Some(kind) = section.items().first() {
            self.open_panel(*kind);
        }
        if was_expanded {
            self.expanded_sections.retain(|s| *s != section);
        } else if !self.expanded_sections.contains(&section) {
            self.expanded_sections.push(section);
        }
        self.sync_menu_cursor_to(MenuEntry::Section(section));
    }

    fn switch_panel_by_offset(&mut self, delta: isize) {
        let kinds = MenuSection::ALL
            .iter()
            .flat_map(|section| section.items().iter().copied())
            .collect::<Vec<_>>();
        let current = kinds
            .iter()
            .position(|kind| *kind == self.panel.kind())
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(kinds.len() as isize) as usize;
        self.open_panel(kinds[next]);
    }

    /// Panels never carry state across a switch.
    fn open_panel(&mut self, kind: PanelKind) {
        debug!("open panel {}", kind.title());
        self.panel = Panel::open(kind, &self.catalog);
        self.detail_scroll = 0;
        self.filter_backup = None;
        let section = kind.section();
        if section.has_submenu() && !self.expanded_sections.contains(&section) {
            self.expanded_sections.push(section);
        }
        self.sync_menu_cursor();
        self.status = format!("{} / {}", section.title(), kind.title());
    }

    fn sync_menu_cursor(&mut self) {
        let kind = self.panel.kind();
        let entry = if kind.section().has_submenu() {
            MenuEntry::Item(kind)
        } else {
            MenuEntry::Section(kind.section())
        };
        self.sync_menu_cursor_to(entry);
    }

    fn sync_menu_cursor_to(&mut self, entry: MenuEntry) {
        if let Some(index) = self.menu_entries().iter().position(|e| *e == entry) {
            self.menu_cursor = index;
        }
    }

    fn apply_content_action(&mut self, action: Action) -> AppCommand {
        let kind = self.panel.kind();
        let in_detail = self
            .panel
            .list()
            .map(|list| list.in_detail())
            .unwrap_or(false);

        if in_detail {
            match action {
                Action::Down => self.detail_scroll = self.detail_scroll.saturating_add(1),
                Action::Up => self.detail_scroll = self.detail_scroll.saturating_sub(1),
                Action::PageDown => {
                    self.detail_scroll = self.detail_scroll.saturating_add(PAGE_STEP as u16)
                }
                Action::PageUp => {
                    self.detail_scroll = self.detail_scroll.saturating_sub(PAGE_STEP as u16)
                }
                Action::Top => self.detail_scroll = 0,
                Action::ClearOverlay => {
                    if let Some(list) = self.panel.list_mut() {
                        list.close_detail();
                    }
                    self.detail_scroll = 0;
                    self.status = format!("Back to {}", kind.title());
                }
                _ => {}
            }
            return AppCommand::None;
        }

        match action {
            Action::BulkDelete => return self.prepare_bulk(BulkAction::Delete),
            Action::BulkSync => return self.prepare_bulk(BulkAction::Sync),
            Action::OpenDeploy => {
                self.open_deploy_dialog();
                return AppCommand::None;
            }
            Action::ClearOverlay => {
                let cleared_filter = match self.panel.list_mut() {
                    Some(list) if !list.filter().is_empty() => {
                        list.set_filter(String::new());
                        true
                    }
                    _ => false,
                };
                if cleared_filter {
                    self.status = "Filter cleared".to_string();
                } else {
                    self.focus = FocusPane::Menu;
                    self.sync_menu_cursor();
                }
                return AppCommand::None;
            }
            _ => {}
        }

        let Some(list) = self.panel.list_mut() else {
            return AppCommand::None;
        };
        match action {
            Action::Down => list.move_cursor(1),
            Action::Up => list.move_cursor(-1),
            Action::PageDown => list.move_cursor(PAGE_STEP),
            Action::PageUp => list.move_cursor(-PAGE_STEP),
            Action::Top => list.cursor_first(),
            Action::Bottom => list.cursor_last(),
            Action::ToggleSelect => {
                if let Some(id) = list.cursor_id() {
                    list.toggle_selected(id);
                }
            }
            Action::ToggleSelectAll => list.toggle_select_all(),
            Action::ToggleExpand => {
                if let Some(id) = list.cursor_id() {
                    list.toggle_expanded(id);
                }
            }
            Action::Activate | Action::ShowDetails => {
                if let Some(id) = list.cursor_id()
                    && list.open_detail(id)
                {
                    self.detail_scroll = 0;
                    self.status = format!("{} detail, Esc to go back", kind.title());
                }
            }
            Action::StartFilter => {
                self.filter_backup = Some(list.filter().to_string());
                self.mode = InputMode::Filter;
                self.status = format!("Filter {} by {}", kind.title(), kind.search_hint());
            }
            _ => {}
        }
        AppCommand::None
    }

    fn apply_filter_action(&mut self, action: Action) -> AppCommand {
        let backup = self.filter_backup.clone();
        let Some(list) = self.panel.list_mut() else {
            self.mode = InputMode::Normal;
            return AppCommand::None;
        };

        match action {
            Action::InputChar(c) => list.push_filter_char(c),
            Action::Backspace => list.pop_filter_char(),
            Action::Down => list.move_cursor(1),
            Action::Up => list.move_cursor(-1),
            Action::SubmitInput => {
                let filter = list.filter().trim().to_string();
                self.mode = InputMode::Normal;
                self.filter_backup = None;
                self.status = if filter.is_empty() {
                    "Filter cleared".to_string()
                } else {
                    format!("Filter: {filter}")
                };
            }
            Action::CancelInput => {
                list.set_filter(backup.unwrap_or_default());
                self.mode = InputMode::Normal;
                self.filter_backup = None;
                self.status = "Filter cancelled".to_string();
            }
            _ => {}
        }
        AppCommand::None
    }

    fn prepare_bulk(&mut self, action: BulkAction) -> AppCommand {
        let kind = self.panel.kind();
        if !kind.bulk_actions().contains(&action) {
            self.status = format!("{} is not available for {}", action.label(), kind.title());
            return AppCommand::None;
        }

        let Some(list) = self.panel.list() else {
            return AppCommand::None;
        };
        let ids = list.selected_ids();
        if ids.is_empty() {
            self.status = format!("Select {} first (space toggles a row)", kind.resource_name());
            return AppCommand::None;
        }

        let names = list.names_for(&ids);
        let request = BulkRequest {
            action,
            resource: kind,
            ids,
            names,
        };

        if action.requires_confirmation() {
            self.pending_confirmation = Some(PendingConfirmation {
                prompt: format!(
                    "{} {} {}: {}?",
                    capitalize(action.label()),
                    request.ids.len(),
                    kind.resource_name(),
                    request.names.join(", ")
                ),
                command: AppCommand::Bulk(request),
            });
            self.status = "Press y to confirm or n to cancel".to_string();
            return AppCommand::None;
        }

        self.dispatch(AppCommand::Bulk(request))
    }

    /// Bulk requests consume the selection they were built from.
    fn dispatch(&mut self, command: AppCommand) -> AppCommand {
        if let AppCommand::Bulk(request) = &command {
            info!(
                "dispatching {} for {} {}",
                request.action.label(),
                request.ids.len(),
                request.resource.resource_name()
            );
            if request.resource == self.panel.kind()
                && let Some(list) = self.panel.list_mut()
            {
                list.clear_selection();
            }
        }
        command
    }

    fn open_deploy_dialog(&mut self) {
        if !self.panel.kind().offers_deploy() {
            self.status = format!("Deployments are created from {}", PanelKind::Applications.title());
            return;
        }
        let draft = DeployDraft::new(DraftOptions::from_catalog(&self.catalog));
        self.dialogs_opened += 1;
        self.dialog = Some(DeployDialog::new(self.dialogs_opened, draft));
        self.mode = InputMode::Form;
        self.status = "New deployment: Tab moves, Ctrl+S deploys, Esc discards".to_string();
    }

    fn apply_form_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::CancelInput => {
                self.dialog = None;
                self.mode = InputMode::Normal;
                self.status = "Deployment draft discarded".to_string();
                return AppCommand::None;
            }
            Action::SubmitForm => return self.submit_deploy_dialog(),
            _ => {}
        }

        let Some(dialog) = self.dialog.as_mut() else {
            return AppCommand::None;
        };
        let focused = dialog.focused_field();

        match action {
            Action::NextField => dialog.move_focus(1),
            Action::PrevField => dialog.move_focus(-1),
            Action::TogglePreview => dialog.show_preview = !dialog.show_preview,
            Action::InputChar(c) => {
                if let Some(field) = focused {
                    match dialog.draft.input_kind(field) {
                        FieldInput::Text => {
                            dialog.draft.push_char(field, c);
                        }
                        FieldInput::Toggle if c == ' ' => {
                            dialog.draft.toggle(field);
                        }
                        FieldInput::Choice if c == ' ' => {
                            dialog.draft.cycle(field, 1);
                        }
                        _ => {}
                    }
                }
            }
            Action::Backspace => {
                if let Some(field) = focused {
                    dialog.draft.pop_char(field);
                }
            }
            Action::CycleNext | Action::CyclePrev => {
                let delta = if action == Action::CycleNext { 1 } else { -1 };
                if let Some(field) = focused {
                    match dialog.draft.input_kind(field) {
                        FieldInput::Choice => {
                            dialog.draft.cycle(field, delta);
                        }
                        FieldInput::Toggle => {
                            dialog.draft.toggle(field);
                        }
                        FieldInput::Text => {}
                    }
                }
            }
            Action::SubmitInput => {
                if let Some(field) = focused {
                    match dialog.draft.input_kind(field) {
                        FieldInput::Choice => {
                            dialog.draft.cycle(field, 1);
                        }
                        FieldInput::Toggle => {
                            dialog.draft.toggle(field);
                        }
                        FieldInput::Text => dialog.move_focus(1),
                    }
                }
            }
            Action::AddRepository => {
                if dialog.draft.add_repository() {
                    let index = dialog.draft.repositories().len() - 1;
                    dialog.focus_field(DraftField::RepositoryUrl(index));
                    self.status = "Repository added".to_string();
                } else {
                    self.status = "At most two repositories per deployment".to_string();
                }
            }
            Action::AddIngress => {
                if dialog.draft.add_ingress() {
                    let index = dialog.draft.ingress().len() - 1;
                    dialog.focus_field(DraftField::IngressName(index));
                    self.status = "Ingress rule added".to_string();
                } else {
                    self.status = "At most two ingress rules per deployment".to_string();
                }
            }
            Action::RemoveEntry => {
                let removed = match focused {
                    Some(DraftField::RepositoryUrl(index))
                    | Some(DraftField::RepositoryBranch(index)) => {
                        dialog.draft.remove_repository(index)
                    }
                    Some(DraftField::IngressName(index))
                    | Some(DraftField::IngressService(index))
                    | Some(DraftField::IngressPort(index)) => dialog.draft.remove_ingress(index),
                    _ => false,
                };
                dialog.clamp_focus();
                self.status = if removed {
                    "Entry removed".to_string()
                } else {
                    "Nothing to remove here".to_string()
                };
            }
            Action::ValidateField => {
                let Some(target) = focused.and_then(DraftField::validation_target) else {
                    self.status = "Nothing to validate in this field".to_string();
                    return AppCommand::None;
                };
                return match dialog.draft.begin_validation(target) {
                    Some((ticket, request)) => {
                        self.status = format!(
                            "Validating {} {}",
                            request.kind.label(),
                            request.identifier
                        );
                        AppCommand::Verify {
                            dialog: dialog.id,
                            ticket,
                            request,
                        }
                    }
                    None => {
                        self.status = "Enter a value before validating".to_string();
                        AppCommand::None
                    }
                };
            }
            _ => {}
        }
        AppCommand::None
    }

    fn submit_deploy_dialog(&mut self) -> AppCommand {
        let Some(dialog) = self.dialog.as_ref() else {
            return AppCommand::None;
        };
        if dialog.draft.is_validating() {
            self.status = "Validation still running".to_string();
            return AppCommand::None;
        }

        let payload = dialog.draft.submit();
        self.dialog = None;
        self.mode = InputMode::Normal;
        self.status = format!(
            "Submitting deployment {}/{}",
            payload.tenant_name, payload.app_code
        );
        AppCommand::SubmitDeployment(payload)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{AdminTab, App, AppCommand, FocusPane, InputMode, MenuEntry};
    use crate::api::BulkAction;
    use crate::catalog::Catalog;
    use crate::config::RuntimeConfigSnapshot;
    use crate::draft::{DraftField, ValidationStatus, ValidationTarget, ValidationTicket};
    use crate::input::Action;
    use crate::model::ClusterQuota;
    use crate::panel::{MenuSection, PanelKind};
    use crate::session::{Role, Route};
    use crate::verify::{VerificationKind, VerificationResponse};

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.apply_action(Action::InputChar(c));
        }
    }

    fn signed_in(username: &str) -> App {
        let mut app = App::new(Catalog::fixtures(), None);
        type_text(&mut app, username);
        app.apply_action(Action::NextField);
        type_text(&mut app, username);
        app.apply_action(Action::SubmitInput);
        app
    }

    fn selected_ids(app: &App) -> Vec<u32> {
        app.panel()
            .list()
            .map(|list| list.selected_ids())
            .unwrap_or_default()
    }

    #[test]
    fn starts_on_login() {
        let app = App::new(Catalog::fixtures(), Some("user1".to_string()));
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.mode(), InputMode::Login);
        assert_eq!(app.login().username, "user1");
    }

    #[test]
    fn user_lands_on_dashboard_and_admin_on_admin() {
        let user = signed_in("user1");
        assert_eq!(user.route(), Route::Dashboard);
        assert_eq!(user.mode(), InputMode::Normal);
        assert_eq!(user.session().map(|s| s.role), Some(Role::User));

        let admin = signed_in("admin");
        assert_eq!(admin.route(), Route::Admin);
    }

    #[test]
    fn bad_credentials_show_inline_error() {
        let mut app = App::new(Catalog::fixtures(), None);
        type_text(&mut app, "user1");
        app.apply_action(Action::NextField);
        type_text(&mut app, "nope");
        app.apply_action(Action::SubmitInput);

        assert_eq!(app.route(), Route::Login);
        assert!(app.session().is_none());
        assert_eq!(
            app.login().error.as_deref(),
            Some("Invalid username or password")
        );
        assert!(app.login().password.is_empty());
    }

    #[test]
    fn logout_drops_session_and_returns_to_login() {
        let mut app = signed_in("user1");
        app.apply_action(Action::Logout);
        assert!(app.session().is_none());
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.mode(), InputMode::Login);
    }

    #[test]
    fn quit_works_on_every_route() {
        let mut app = App::new(Catalog::fixtures(), None);
        app.apply_action(Action::Quit);
        assert!(!app.running());
    }

    #[test]
    fn delete_waits_for_confirmation_then_clears_selection() {
        let mut app = signed_in("user1");
        app.apply_action(Action::ToggleSelect);
        app.apply_action(Action::Down);
        app.apply_action(Action::ToggleSelect);
        assert_eq!(selected_ids(&app), vec![1, 2]);

        assert_eq!(app.apply_action(Action::BulkDelete), AppCommand::None);
        assert!(app.pending_confirmation_prompt().is_some());

        let command = app.apply_action(Action::ConfirmYes);
        let AppCommand::Bulk(request) = command else {
            panic!("expected bulk command");
        };
        assert_eq!(request.action, BulkAction::Delete);
        assert_eq!(request.resource, PanelKind::Applications);
        assert_eq!(request.ids, vec![1, 2]);
        assert_eq!(request.names, vec!["external secret", "argo-rollout"]);
        assert!(selected_ids(&app).is_empty());
    }

    #[test]
    fn declined_delete_keeps_selection() {
        let mut app = signed_in("user1");
        app.apply_action(Action::ToggleSelect);
        app.apply_action(Action::BulkDelete);
        assert_eq!(app.apply_action(Action::ConfirmNo), AppCommand::None);
        assert_eq!(selected_ids(&app), vec![1]);
        assert!(app.pending_confirmation_prompt().is_none());
    }

    #[test]
    fn sync_dispatches_without_confirmation() {
        let mut app = signed_in("user1");
        app.apply_action(Action::NextTab);
        assert_eq!(app.panel().kind(), PanelKind::Kustomizations);
        app.apply_action(Action::ToggleSelectAll);

        let AppCommand::Bulk(request) = app.apply_action(Action::BulkSync) else {
            panic!("expected bulk command");
        };
        assert_eq!(request.action, BulkAction::Sync);
        assert_eq!(request.ids.len(), 6);
        assert!(selected_ids(&app).is_empty());
    }

    #[test]
    fn bulk_needs_selection_and_a_supported_panel() {
        let mut app = signed_in("user1");
        assert_eq!(app.apply_action(Action::BulkDelete), AppCommand::None);
        assert!(app.pending_confirmation_prompt().is_none());

        app.apply_action(Action::ToggleSelect);
        assert_eq!(app.apply_action(Action::BulkSync), AppCommand::None);
        assert!(app.status().contains("not available"));
    }

    #[test]
    fn switching_panels_resets_list_state() {
        let mut app = signed_in("user1");
        app.apply_action(Action::ToggleSelect);
        app.apply_action(Action::NextTab);
        app.apply_action(Action::PrevTab);
        assert_eq!(app.panel().kind(), PanelKind::Applications);
        assert!(selected_ids(&app).is_empty());
    }

    #[test]
    fn detail_and_back_keep_filter_and_selection() {
        let mut app = signed_in("user1");
        app.apply_action(Action::StartFilter);
        type_text(&mut app, "o");
        app.apply_action(Action::SubmitInput);
        app.apply_action(Action::ToggleSelect);
        app.apply_action(Action::ShowDetails);

        let list = app.panel().list().expect("list panel");
        assert!(list.in_detail());

        app.apply_action(Action::ClearOverlay);
        let list = app.panel().list().expect("list panel");
        assert!(!list.in_detail());
        assert_eq!(list.filter(), "o");
        assert_eq!(list.selected_ids().len(), 1);
    }

    #[test]
    fn cancelled_filter_restores_previous_query() {
        let mut app = signed_in("user1");
        app.apply_action(Action::StartFilter);
        assert_eq!(app.mode(), InputMode::Filter);
        type_text(&mut app, "ray");
        app.apply_action(Action::CancelInput);
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.panel().list().map(|list| list.filter()), Some(""));
    }

    #[test]
    fn menu_sections_expand_and_open_first_item() {
        let mut app = signed_in("user1");
        app.apply_action(Action::ToggleFocus);
        assert_eq!(app.focus(), FocusPane::Menu);

        let position = app
            .menu_entries()
            .iter()
            .position(|entry| *entry == MenuEntry::Section(MenuSection::ResourcePool))
            .expect("resource pool section");
        for _ in 0..position.saturating_sub(app.menu_cursor()) {
            app.apply_action(Action::Down);
        }
        assert_eq!(app.menu_cursor(), position);
        app.apply_action(Action::Activate);

        assert!(app.section_expanded(MenuSection::ResourcePool));
        assert_eq!(app.panel().kind(), PanelKind::Overview);
    }

    #[test]
    fn collapsing_a_section_still_opens_its_first_item() {
        let mut app = signed_in("user1");
        app.apply_action(Action::NextTab);
        assert_eq!(app.panel().kind(), PanelKind::Kustomizations);

        app.apply_action(Action::ToggleFocus);
        app.apply_action(Action::Top);
        assert_eq!(
            app.menu_entries().first(),
            Some(&MenuEntry::Section(MenuSection::Argo))
        );
        app.apply_action(Action::Activate);

        assert!(!app.section_expanded(MenuSection::Argo));
        assert_eq!(app.panel().kind(), PanelKind::Applications);
        assert_eq!(app.menu_cursor(), 0);

        app.apply_action(Action::Activate);
        assert!(app.section_expanded(MenuSection::Argo));
        assert_eq!(app.panel().kind(), PanelKind::Applications);
    }

    #[test]
    fn gg_jumps_to_top() {
        let mut app = signed_in("user1");
        app.apply_action(Action::Bottom);
        app.apply_action(Action::GPrefix);
        app.apply_action(Action::GPrefix);
        assert_eq!(app.panel().list().map(|list| list.cursor()), Some(0));
    }

    #[test]
    fn deploy_dialog_round_trip() {
        let mut app = signed_in("user1");
        app.apply_action(Action::OpenDeploy);
        assert_eq!(app.mode(), InputMode::Form);

        type_text(&mut app, "tenant-a");
        let dialog = app.dialog().expect("dialog open");
        assert_eq!(dialog.draft.value(DraftField::TenantName), "tenant-a");

        for _ in 0..4 {
            app.apply_action(Action::NextField);
        }
        assert_eq!(
            app.dialog().and_then(|d| d.focused_field()),
            Some(DraftField::RepositoryUrl(0))
        );
        type_text(&mut app, "https://github.com/org/app");

        let command = app.apply_action(Action::ValidateField);
        let AppCommand::Verify {
            dialog,
            ticket,
            request,
        } = command
        else {
            panic!("expected verification");
        };
        let target = ticket.target;
        assert_eq!(target, ValidationTarget::Repository(0));
        assert_eq!(request.kind, VerificationKind::Repository);

        app.apply_verification(dialog, ticket, Ok(VerificationResponse::passed("reachable")));
        let dialog = app.dialog().expect("dialog open");
        assert_eq!(
            dialog.draft.validation_status(target),
            &ValidationStatus::Passed("reachable".to_string())
        );

        let AppCommand::SubmitDeployment(payload) = app.apply_action(Action::SubmitForm) else {
            panic!("expected deployment");
        };
        assert_eq!(payload.tenant_name, "tenant-a");
        assert_eq!(payload.repositories.len(), 1);
        assert!(app.dialog().is_none());
        assert_eq!(app.mode(), InputMode::Normal);
    }

    #[test]
    fn verification_errors_mark_the_target_failed() {
        let mut app = signed_in("user1");
        app.apply_action(Action::OpenDeploy);
        for _ in 0..4 {
            app.apply_action(Action::NextField);
        }
        type_text(&mut app, "https://github.com/org/app");
        let (dialog, ticket) = start_validation(&mut app);
        app.apply_verification(dialog, ticket, Err("verifier unavailable".to_string()));
        let dialog = app.dialog().expect("dialog open");
        assert_eq!(
            dialog.draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Failed("verifier unavailable".to_string())
        );
    }

    fn start_validation(app: &mut App) -> (u64, ValidationTicket) {
        match app.apply_action(Action::ValidateField) {
            AppCommand::Verify { dialog, ticket, .. } => (dialog, ticket),
            other => panic!("expected verification, got {other:?}"),
        }
    }

    #[test]
    fn removing_an_entry_mid_check_does_not_block_submit() {
        let mut app = signed_in("user1");
        app.apply_action(Action::OpenDeploy);
        type_text(&mut app, "tenant-a");
        app.apply_action(Action::AddRepository);
        assert_eq!(
            app.dialog().and_then(|d| d.focused_field()),
            Some(DraftField::RepositoryUrl(1))
        );
        type_text(&mut app, "https://github.com/org/second");
        let (dialog, ticket) = start_validation(&mut app);
        assert_eq!(ticket.target, ValidationTarget::Repository(1));

        for _ in 0..8 {
            if app.dialog().and_then(|d| d.focused_field()) == Some(DraftField::RepositoryUrl(0)) {
                break;
            }
            app.apply_action(Action::PrevField);
        }
        app.apply_action(Action::RemoveEntry);
        assert_eq!(app.dialog().map(|d| d.draft.repositories().len()), Some(1));

        app.apply_verification(dialog, ticket, Ok(VerificationResponse::passed("reachable")));
        let draft = &app.dialog().expect("dialog open").draft;
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
        assert!(!draft.is_validating());

        let command = app.apply_action(Action::SubmitForm);
        assert!(matches!(command, AppCommand::SubmitDeployment(_)));
        assert_ne!(app.status(), "Validation still running");
    }

    #[test]
    fn outcomes_for_a_discarded_dialog_skip_the_next_one() {
        let mut app = signed_in("user1");
        app.apply_action(Action::OpenDeploy);
        for _ in 0..4 {
            app.apply_action(Action::NextField);
        }
        type_text(&mut app, "https://github.com/org/old");
        let (old_dialog, ticket) = start_validation(&mut app);
        app.apply_action(Action::CancelInput);

        app.apply_action(Action::OpenDeploy);
        assert_ne!(app.dialog().map(|d| d.id()), Some(old_dialog));
        for _ in 0..4 {
            app.apply_action(Action::NextField);
        }
        type_text(&mut app, "bogus");

        app.apply_verification(
            old_dialog,
            ticket,
            Ok(VerificationResponse::passed("github.com: org/old reachable")),
        );
        let draft = &app.dialog().expect("dialog open").draft;
        assert_eq!(draft.value(DraftField::RepositoryUrl(0)), "bogus");
        assert_eq!(
            draft.validation_status(ValidationTarget::Repository(0)),
            &ValidationStatus::Idle
        );
        assert!(!app.status().starts_with("Validation passed"));
    }

    #[test]
    fn deploy_dialog_caps_entries_and_discards_on_cancel() {
        let mut app = signed_in("user1");
        app.apply_action(Action::OpenDeploy);
        app.apply_action(Action::AddIngress);
        app.apply_action(Action::AddIngress);
        app.apply_action(Action::AddIngress);
        assert_eq!(app.dialog().map(|d| d.draft.ingress().len()), Some(2));
        assert!(app.status().contains("At most two"));

        app.apply_action(Action::CancelInput);
        assert!(app.dialog().is_none());
        app.apply_action(Action::OpenDeploy);
        assert_eq!(app.dialog().map(|d| d.draft.ingress().len()), Some(0));
    }

    #[test]
    fn deploy_dialog_only_opens_from_applications() {
        let mut app = signed_in("user1");
        app.apply_action(Action::NextTab);
        app.apply_action(Action::OpenDeploy);
        assert!(app.dialog().is_none());
        assert_eq!(app.mode(), InputMode::Normal);
    }

    #[test]
    fn admin_tabs_cycle_and_reset_cursor() {
        let mut app = signed_in("admin");
        assert_eq!(app.admin_tab(), AdminTab::Quotas);
        app.apply_action(Action::Down);
        assert_eq!(app.admin_cursor(), 1);
        app.apply_action(Action::NextTab);
        assert_eq!(app.admin_tab(), AdminTab::Tenants);
        assert_eq!(app.admin_cursor(), 0);
        app.apply_action(Action::PrevTab);
        app.apply_action(Action::PrevTab);
        assert_eq!(app.admin_tab(), AdminTab::Accounts);
    }

    #[test]
    fn runtime_config_overrides_cluster_defaults() {
        let mut app = signed_in("admin");
        let mut snapshot = RuntimeConfigSnapshot {
            source: Some("h4deck.yaml".to_string()),
            ..RuntimeConfigSnapshot::default()
        };
        snapshot.deploy_targets.insert(
            "DR".to_string(),
            ClusterQuota {
                cpu: "2".to_string(),
                ..ClusterQuota::default()
            },
        );
        app.apply_runtime_config(&snapshot);
        assert_eq!(app.admin_row_count(), 5);
        assert_eq!(app.config_source(), Some("h4deck.yaml"));

        app.apply_runtime_config(&RuntimeConfigSnapshot::default());
        assert_eq!(app.admin_row_count(), 4);
        assert!(app.status().contains("removed"));
    }
}
