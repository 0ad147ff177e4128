use crate::api::BulkAction;
use crate::catalog::Catalog;
use crate::collection::CollectionView;
use crate::model::{
    Application, BillingLine, Kustomization, Node, NodeStatus, Record, RecordId, Secret,
    VirtualService, Workflow, WorkflowTemplate, parse_quantity,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MenuSection {
    Argo,
    Security,
    ResourcePool,
    Network,
    Bill,
}

impl MenuSection {
    pub const ALL: [MenuSection; 5] = [
        MenuSection::Argo,
        MenuSection::Security,
        MenuSection::ResourcePool,
        MenuSection::Network,
        MenuSection::Bill,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Argo => "Argo",
            Self::Security => "Security",
            Self::ResourcePool => "Resource Pool",
            Self::Network => "Network",
            Self::Bill => "Bill",
        }
    }

    pub fn items(self) -> &'static [PanelKind] {
        match self {
            Self::Argo => &[
                PanelKind::Applications,
                PanelKind::Kustomizations,
                PanelKind::Workflows,
                PanelKind::WorkflowTemplates,
            ],
            Self::Security => &[PanelKind::Secrets],
            Self::ResourcePool => &[PanelKind::Overview, PanelKind::Nodes],
            Self::Network => &[PanelKind::VirtualServices],
            Self::Bill => &[PanelKind::Bill],
        }
    }

    /// Sections with a single item open it directly without a submenu.
    pub fn has_submenu(self) -> bool {
        self != Self::Bill
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PanelKind {
    Applications,
    Kustomizations,
    Workflows,
    WorkflowTemplates,
    Secrets,
    Overview,
    Nodes,
    VirtualServices,
    Bill,
}

impl PanelKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Applications => "Applications",
            Self::Kustomizations => "Kustomizations",
            Self::Workflows => "Workflows",
            Self::WorkflowTemplates => "Workflow Templates",
            Self::Secrets => "Secrets",
            Self::Overview => "Overview",
            Self::Nodes => "Nodes",
            Self::VirtualServices => "Virtual Services",
            Self::Bill => "Bill",
        }
    }

    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Applications => "applications",
            Self::Kustomizations => "kustomizations",
            Self::Workflows => "workflows",
            Self::WorkflowTemplates => "workflow-templates",
            Self::Secrets => "secrets",
            Self::Overview => "overview",
            Self::Nodes => "nodes",
            Self::VirtualServices => "virtual-services",
            Self::Bill => "bill",
        }
    }

    pub fn section(self) -> MenuSection {
        match self {
            Self::Applications | Self::Kustomizations | Self::Workflows | Self::WorkflowTemplates => {
                MenuSection::Argo
            }
            Self::Secrets => MenuSection::Security,
            Self::Overview | Self::Nodes => MenuSection::ResourcePool,
            Self::VirtualServices => MenuSection::Network,
            Self::Bill => MenuSection::Bill,
        }
    }

    pub fn bulk_actions(self) -> &'static [BulkAction] {
        match self {
            Self::Applications | Self::Secrets => &[BulkAction::Delete],
            Self::Kustomizations => &[BulkAction::Sync, BulkAction::Delete],
            _ => &[],
        }
    }

    pub fn offers_deploy(self) -> bool {
        self == Self::Applications
    }

    pub fn search_hint(self) -> &'static str {
        match self {
            Self::Applications => "name or owner",
            Self::Kustomizations => "name, path or owner",
            Self::Workflows => "name or phase",
            Self::WorkflowTemplates => "name or description",
            Self::Secrets => "name or type",
            Self::Nodes => "name or ip",
            Self::VirtualServices => "name or host",
            Self::Overview | Self::Bill => "",
        }
    }
}

/// One table row as the renderer needs it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RowView {
    pub id: RecordId,
    pub columns: Vec<String>,
    pub selected: bool,
    pub expanded: bool,
}

/// Object-safe face of a [`CollectionView`], so the app can drive every list
/// panel without knowing its record type.
pub trait ListState {
    fn filter(&self) -> &str;
    fn set_filter(&mut self, filter: String);
    fn push_filter_char(&mut self, c: char);
    fn pop_filter_char(&mut self);

    fn cursor(&self) -> usize;
    fn cursor_id(&self) -> Option<RecordId>;
    fn move_cursor(&mut self, delta: isize);
    fn cursor_first(&mut self);
    fn cursor_last(&mut self);

    fn toggle_selected(&mut self, id: RecordId);
    fn toggle_select_all(&mut self);
    fn all_visible_selected(&self) -> bool;
    fn selected_ids(&self) -> Vec<RecordId>;
    fn clear_selection(&mut self);

    fn expanded(&self) -> Option<RecordId>;
    fn toggle_expanded(&mut self, id: RecordId);

    fn open_detail(&mut self, id: RecordId) -> bool;
    fn close_detail(&mut self) -> bool;
    fn in_detail(&self) -> bool;

    fn headers(&self) -> &'static [&'static str];
    fn rows(&self) -> Vec<RowView>;
    fn total(&self) -> usize;
    fn lines_for(&self, id: RecordId) -> Vec<String>;
    fn detail(&self) -> Option<(String, Vec<String>)>;
    fn names_for(&self, ids: &[RecordId]) -> Vec<String>;
}

impl<R: Record> ListState for CollectionView<R> {
    fn filter(&self) -> &str {
        CollectionView::filter(self)
    }

    fn set_filter(&mut self, filter: String) {
        CollectionView::set_filter(self, filter);
    }

    fn push_filter_char(&mut self, c: char) {
        CollectionView::push_filter_char(self, c);
    }

    fn pop_filter_char(&mut self) {
        CollectionView::pop_filter_char(self);
    }

    fn cursor(&self) -> usize {
        CollectionView::cursor(self)
    }

    fn cursor_id(&self) -> Option<RecordId> {
        CollectionView::cursor_id(self)
    }

    fn move_cursor(&mut self, delta: isize) {
        CollectionView::move_cursor(self, delta);
    }

    fn cursor_first(&mut self) {
        CollectionView::cursor_first(self);
    }

    fn cursor_last(&mut self) {
        CollectionView::cursor_last(self);
    }

    fn toggle_selected(&mut self, id: RecordId) {
        CollectionView::toggle_selected(self, id);
    }

    fn toggle_select_all(&mut self) {
        CollectionView::toggle_select_all(self);
    }

    fn all_visible_selected(&self) -> bool {
        CollectionView::all_visible_selected(self)
    }

    fn selected_ids(&self) -> Vec<RecordId> {
        CollectionView::selected_ids(self)
    }

    fn clear_selection(&mut self) {
        CollectionView::clear_selection(self);
    }

    fn expanded(&self) -> Option<RecordId> {
        CollectionView::expanded(self)
    }

    fn toggle_expanded(&mut self, id: RecordId) {
        CollectionView::toggle_expanded(self, id);
    }

    fn open_detail(&mut self, id: RecordId) -> bool {
        CollectionView::open_detail(self, id)
    }

    fn close_detail(&mut self) -> bool {
        CollectionView::close_detail(self)
    }

    fn in_detail(&self) -> bool {
        CollectionView::in_detail(self)
    }

    fn headers(&self) -> &'static [&'static str] {
        R::headers()
    }

    fn rows(&self) -> Vec<RowView> {
        let expanded = CollectionView::expanded(self);
        self.visible()
            .into_iter()
            .map(|record| RowView {
                id: record.id(),
                columns: record.columns(),
                selected: self.is_selected(record.id()),
                expanded: expanded == Some(record.id()),
            })
            .collect()
    }

    fn total(&self) -> usize {
        self.records().len()
    }

    fn lines_for(&self, id: RecordId) -> Vec<String> {
        self.record(id)
            .map(Record::detail_lines)
            .unwrap_or_default()
    }

    fn detail(&self) -> Option<(String, Vec<String>)> {
        self.detail_record()
            .map(|record| (record.name().to_string(), record.detail_lines()))
    }

    fn names_for(&self, ids: &[RecordId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.record(*id))
            .map(|record| record.name().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageLine {
    pub name: &'static str,
    pub unit: &'static str,
    pub display: String,
    pub limit: f64,
    pub allocated: f64,
}

impl UsageLine {
    pub fn ratio(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        (self.allocated / self.limit).clamp(0.0, 1.0)
    }
}

/// Namespace quota against what the applications currently request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaSummary {
    pub lines: Vec<UsageLine>,
    pub ready_nodes: usize,
    pub total_nodes: usize,
}

impl QuotaSummary {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let quota = &catalog.resource_quota;
        let cpu_allocated = catalog
            .applications
            .iter()
            .map(|app| parse_quantity(&app.cpu))
            .sum();
        let memory_allocated = catalog
            .applications
            .iter()
            .map(|app| parse_quantity(&app.memory))
            .sum();

        Self {
            lines: vec![
                UsageLine {
                    name: "CPU",
                    unit: "m",
                    display: quota.cpu.clone(),
                    limit: parse_quantity(&quota.cpu),
                    allocated: cpu_allocated,
                },
                UsageLine {
                    name: "Memory",
                    unit: "Mi",
                    display: quota.memory.clone(),
                    limit: parse_quantity(&quota.memory),
                    allocated: memory_allocated,
                },
                UsageLine {
                    name: "Storage",
                    unit: "Mi",
                    display: quota.storage.clone(),
                    limit: parse_quantity(&quota.storage),
                    allocated: 0.0,
                },
            ],
            ready_nodes: catalog
                .nodes
                .iter()
                .filter(|node| node.status == NodeStatus::Ready)
                .count(),
            total_nodes: catalog.nodes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingSummary {
    pub lines: Vec<BillingLine>,
}

impl BillingSummary {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(|line| line.amount).sum()
    }

    pub fn share(&self, line: &BillingLine) -> f64 {
        let total = self.total();
        if total <= 0.0 { 0.0 } else { line.amount / total }
    }
}

/// The content area of the dashboard. Each variant owns its own state, so
/// switching panels drops whatever the previous one held.
#[derive(Debug, Clone)]
pub enum Panel {
    Applications(CollectionView<Application>),
    Kustomizations(CollectionView<Kustomization>),
    Workflows(CollectionView<Workflow>),
    WorkflowTemplates(CollectionView<WorkflowTemplate>),
    Secrets(CollectionView<Secret>),
    Overview(QuotaSummary),
    Nodes(CollectionView<Node>),
    VirtualServices(CollectionView<VirtualService>),
    Bill(BillingSummary),
}

impl Panel {
    pub fn open(kind: PanelKind, catalog: &Catalog) -> Self {
        match kind {
            PanelKind::Applications => {
                Self::Applications(CollectionView::new(catalog.applications.clone()))
            }
            PanelKind::Kustomizations => {
                Self::Kustomizations(CollectionView::new(catalog.kustomizations.clone()))
            }
            PanelKind::Workflows => Self::Workflows(CollectionView::new(catalog.workflows.clone())),
            PanelKind::WorkflowTemplates => {
                Self::WorkflowTemplates(CollectionView::new(catalog.workflow_templates.clone()))
            }
            PanelKind::Secrets => Self::Secrets(CollectionView::new(catalog.secrets.clone())),
            PanelKind::Overview => Self::Overview(QuotaSummary::from_catalog(catalog)),
            PanelKind::Nodes => Self::Nodes(CollectionView::new(catalog.nodes.clone())),
            PanelKind::VirtualServices => {
                Self::VirtualServices(CollectionView::new(catalog.virtual_services.clone()))
            }
            PanelKind::Bill => Self::Bill(BillingSummary {
                lines: catalog.billing.clone(),
            }),
        }
    }

    pub fn kind(&self) -> PanelKind {
        match self {
            Self::Applications(_) => PanelKind::Applications,
            Self::Kustomizations(_) => PanelKind::Kustomizations,
            Self::Workflows(_) => PanelKind::Workflows,
            Self::WorkflowTemplates(_) => PanelKind::WorkflowTemplates,
            Self::Secrets(_) => PanelKind::Secrets,
            Self::Overview(_) => PanelKind::Overview,
            Self::Nodes(_) => PanelKind::Nodes,
            Self::VirtualServices(_) => PanelKind::VirtualServices,
            Self::Bill(_) => PanelKind::Bill,
        }
    }

    pub fn list(&self) -> Option<&dyn ListState> {
        match self {
            Self::Applications(view) => Some(view),
            Self::Kustomizations(view) => Some(view),
            Self::Workflows(view) => Some(view),
            Self::WorkflowTemplates(view) => Some(view),
            Self::Secrets(view) => Some(view),
            Self::Nodes(view) => Some(view),
            Self::VirtualServices(view) => Some(view),
            Self::Overview(_) | Self::Bill(_) => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut dyn ListState> {
        match self {
            Self::Applications(view) => Some(view),
            Self::Kustomizations(view) => Some(view),
            Self::Workflows(view) => Some(view),
            Self::WorkflowTemplates(view) => Some(view),
            Self::Secrets(view) => Some(view),
            Self::Nodes(view) => Some(view),
            Self::VirtualServices(view) => Some(view),
            Self::Overview(_) | Self::Bill(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MenuSection, Panel, PanelKind, QuotaSummary};
    use crate::api::BulkAction;
    use crate::catalog::Catalog;

    #[test]
    fn every_menu_item_maps_back_to_its_section() {
        for section in MenuSection::ALL {
            for kind in section.items() {
                assert_eq!(kind.section(), section);
            }
        }
    }

    #[test]
    fn bulk_actions_per_panel() {
        assert_eq!(
            PanelKind::Applications.bulk_actions(),
            &[BulkAction::Delete]
        );
        assert_eq!(
            PanelKind::Kustomizations.bulk_actions(),
            &[BulkAction::Sync, BulkAction::Delete]
        );
        assert!(PanelKind::Nodes.bulk_actions().is_empty());
        assert!(PanelKind::Applications.offers_deploy());
        assert!(!PanelKind::Secrets.offers_deploy());
    }

    #[test]
    fn reopening_a_panel_starts_fresh() {
        let catalog = Catalog::fixtures();
        let mut panel = Panel::open(PanelKind::Secrets, &catalog);
        let list = panel.list_mut().expect("secrets is a list");
        list.set_filter("tls".to_string());
        list.toggle_selected(1);

        let panel = Panel::open(panel.kind(), &catalog);
        let list = panel.list().expect("secrets is a list");
        assert_eq!(list.filter(), "");
        assert!(list.selected_ids().is_empty());
    }

    #[test]
    fn rows_carry_selection_and_expansion() {
        let catalog = Catalog::fixtures();
        let mut panel = Panel::open(PanelKind::Kustomizations, &catalog);
        let list = panel.list_mut().expect("list");
        list.toggle_selected(2);
        list.toggle_expanded(3);

        let rows = list.rows();
        assert_eq!(rows.len(), catalog.kustomizations.len());
        assert!(rows.iter().any(|row| row.id == 2 && row.selected));
        assert!(rows.iter().any(|row| row.id == 3 && row.expanded));
        assert_eq!(list.names_for(&[1, 99]), vec!["argocd".to_string()]);
    }

    #[test]
    fn summary_panels_have_no_list() {
        let catalog = Catalog::fixtures();
        assert!(Panel::open(PanelKind::Overview, &catalog).list().is_none());
        assert!(Panel::open(PanelKind::Bill, &catalog).list().is_none());
    }

    #[test]
    fn overview_reports_quota_in_base_units() {
        let summary = QuotaSummary::from_catalog(&Catalog::fixtures());
        assert_eq!(summary.lines[0].limit, 10_000.0);
        assert_eq!(summary.lines[1].limit, 32_768.0);
        assert_eq!(summary.ready_nodes, 2);
        assert_eq!(summary.total_nodes, 3);
        assert!(summary.lines.iter().all(|line| line.ratio() <= 1.0));
    }
}
