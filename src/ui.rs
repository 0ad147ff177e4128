use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap};

use crate::app::{AdminTab, App, DeployDialog, FocusPane, InputMode, LoginField, MenuEntry};
use crate::draft::{DraftField, DraftSection, FieldInput, ValidationStatus};
use crate::manifest::render_descriptor;
use crate::panel::{BillingSummary, ListState, Panel, QuotaSummary};
use crate::session::{Route, known_accounts};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);
const PL_E: Color = Color::Rgb(13, 148, 136);
const SIDEBAR_WIDTH: u16 = 26;

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    match app.route() {
        Route::Login => render_login(frame, root[1], app),
        Route::Dashboard => render_dashboard(frame, root[1], app),
        Route::Admin => render_admin(frame, root[1], app),
    }
    render_footer(frame, root[2], app);

    if let Some(dialog) = app.dialog() {
        render_deploy_dialog(frame, app, dialog);
    }
    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    let route_bg = match app.route() {
        Route::Login => PL_B,
        Route::Dashboard => PL_C,
        Route::Admin => PL_D,
    };
    push_powerline_segment(&mut spans, " 󱃾 h4deck ", Color::White, PL_A, route_bg);

    let route_label = match app.route() {
        Route::Dashboard => format!(
            " {} / {} ",
            app.panel().kind().section().title(),
            app.panel().kind().title()
        ),
        Route::Admin => format!(" admin / {} ", app.admin_tab().title()),
        Route::Login => " sign in ".to_string(),
    };
    push_powerline_segment(&mut spans, route_label, Color::White, route_bg, BG);

    let right = build_right_header_line(app);
    let right_width = spans_width(&right.spans) as u16;
    if right_width == 0 || right_width + 20 >= area.width {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right)
            .style(Style::default().bg(BG))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(source) = app.config_source() {
        push_powerline_segment_rtl(
            &mut spans,
            format!(" 󰒓 {} ", compact_text(source, 28)),
            Color::White,
            PL_B,
            BG,
        );
    }
    if let Some(session) = app.session() {
        push_powerline_segment_rtl(
            &mut spans,
            format!(
                " 󰀄 {} ({}) since {} ",
                session.username,
                session.role,
                session.signed_in_at.format("%H:%M")
            ),
            Color::White,
            if session.is_admin() { PL_D } else { PL_E },
            if app.config_source().is_some() {
                PL_B
            } else {
                BG
            },
        );
    }
    Line::from(spans)
}

fn render_login(frame: &mut Frame, area: Rect, app: &App) {
    let form_area = centered_rect(56, 70, area);
    let block = Block::default()
        .title(" H4 Platform ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(4),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                "Sign in to your account",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Tab switches field, Enter signs in",
                Style::default().fg(MUTED),
            )),
        ])
        .alignment(Alignment::Center),
        chunks[0],
    );

    let login = app.login();
    let masked = "•".repeat(login.password.chars().count());
    render_login_field(
        frame,
        chunks[1],
        "Username",
        &login.username,
        login.field() == LoginField::Username,
    );
    render_login_field(
        frame,
        chunks[2],
        "Password",
        &masked,
        login.field() == LoginField::Password,
    );

    if let Some(error) = &login.error {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("󰅚 {error}"),
                Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[3],
        );
    }

    let rows = known_accounts()
        .into_iter()
        .map(|(username, role)| {
            Row::new(vec![
                Cell::from(username.to_string()),
                Cell::from(username.to_string()),
                Cell::from(role.label().to_string()),
            ])
            .style(Style::default().fg(Color::White))
        })
        .collect::<Vec<_>>();
    let table = Table::new(rows, column_constraints(3))
        .header(
            Row::new(vec!["Username", "Password", "Role"])
                .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title("Demo accounts")
                .borders(Borders::TOP)
                .border_style(Style::default().fg(MUTED)),
        );
    frame.render_widget(table, chunks[4]);
}

fn render_login_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let mut content = value.to_string();
    if focused {
        content.push('▌');
    }
    let field = Paragraph::new(content)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(label.to_string())
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(ACCENT)
                } else {
                    Style::default().fg(MUTED)
                }),
        );
    frame.render_widget(field, area);
}

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    render_sidebar(frame, chunks[0], app);
    let focused = app.focus() == FocusPane::Content;
    match app.panel() {
        Panel::Overview(summary) => render_overview(frame, chunks[1], summary, focused),
        Panel::Bill(summary) => render_bill(frame, chunks[1], summary, focused),
        panel => {
            if let Some(list) = panel.list() {
                if list.in_detail() {
                    render_detail(frame, chunks[1], app, list, focused);
                } else {
                    render_list(frame, chunks[1], app, list, focused);
                }
            }
        }
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == FocusPane::Menu;
    let active = app.panel().kind();
    let lines = app
        .menu_entries()
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let under_cursor = focused && index == app.menu_cursor();
            let (text, is_active) = match entry {
                MenuEntry::Section(section) => {
                    let marker = if !section.has_submenu() {
                        "•"
                    } else if app.section_expanded(section) {
                        "▾"
                    } else {
                        "▸"
                    };
                    (
                        format!("{marker} {}", section.title()),
                        !section.has_submenu() && active.section() == section,
                    )
                }
                MenuEntry::Item(kind) => (format!("    {}", kind.title()), kind == active),
            };

            let mut style = match entry {
                MenuEntry::Section(_) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                MenuEntry::Item(_) => Style::default().fg(MUTED),
            };
            if is_active {
                style = style.fg(ACCENT).add_modifier(Modifier::BOLD);
            }
            if under_cursor {
                style = style.bg(Color::Rgb(24, 36, 58));
            }
            Line::from(Span::styled(text, style))
        })
        .collect::<Vec<_>>();

    let block = Block::default()
        .title("Menu")
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_list(frame: &mut Frame, area: Rect, app: &App, list: &dyn ListState, focused: bool) {
    let kind = app.panel().kind();
    let rows = list.rows();
    let expanded = list.expanded().filter(|id| rows.iter().any(|row| row.id == *id));

    let (table_area, expansion_area) = match expanded {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);
            (split[0], Some(split[1]))
        }
        None => (area, None),
    };

    let select_all = if list.all_visible_selected() { "[x]" } else { "[ ]" };
    let mut headers = vec![select_all.to_string()];
    headers.extend(list.headers().iter().map(|header| header.to_string()));
    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(header.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let table_rows = rows.iter().map(|row| {
        let marker = match (row.selected, row.expanded) {
            (true, true) => "[x]▾",
            (true, false) => "[x]",
            (false, true) => "[ ]▾",
            (false, false) => "[ ]",
        };
        let mut cells = vec![Cell::from(marker).style(Style::default().fg(if row.selected {
            ACCENT
        } else {
            MUTED
        }))];
        cells.extend(
            row.columns
                .iter()
                .map(|column| Cell::from(column.clone()).style(Style::default().fg(Color::White))),
        );
        Row::new(cells)
    });

    let mut constraints = vec![Constraint::Length(5)];
    constraints.extend(column_constraints(list.headers().len()));

    let selected_count = list.selected_ids().len();
    let mut title = format!("{} ({}/{})", kind.title(), rows.len(), list.total());
    if !list.filter().is_empty() {
        title.push_str(&format!("  /{}", list.filter()));
    }
    if selected_count > 0 {
        let actions = kind
            .bulk_actions()
            .iter()
            .map(|action| action.label())
            .collect::<Vec<_>>();
        title.push_str(&format!("  {selected_count} selected"));
        if !actions.is_empty() {
            title.push_str(&format!(" [{}]", actions.join("/")));
        }
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));

    let table = Table::new(table_rows, constraints)
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    if !rows.is_empty() {
        state.select(Some(list.cursor()));
    }
    frame.render_stateful_widget(table, table_area, &mut state);

    if let (Some(id), Some(expansion_area)) = (expanded, expansion_area) {
        let lines = list
            .lines_for(id)
            .into_iter()
            .map(Line::from)
            .collect::<Vec<_>>();
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Expanded")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MUTED))
                    .style(Style::default().bg(PANEL)),
            )
            .style(Style::default().fg(Color::White));
        frame.render_widget(paragraph, expansion_area);
    }
}

fn render_detail(frame: &mut Frame, area: Rect, app: &App, list: &dyn ListState, focused: bool) {
    let Some((name, lines)) = list.detail() else {
        return;
    };
    let text = Text::from(
        lines
            .into_iter()
            .map(|line| highlight_detail_line(&line))
            .collect::<Vec<_>>(),
    );
    let block = Block::default()
        .title(format!("{} / {}  (Esc back)", app.panel().kind().title(), name))
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn highlight_detail_line(line: &str) -> Line<'static> {
    match line.split_once(": ") {
        Some((key, value)) if !key.starts_with(' ') => Line::from(vec![
            Span::styled(format!("{key}: "), Style::default().fg(Color::Rgb(103, 232, 249))),
            Span::styled(value.to_string(), Style::default().fg(Color::White)),
        ]),
        _ if line.ends_with(':') => Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        _ => Line::from(line.to_string()),
    }
}

fn render_overview(frame: &mut Frame, area: Rect, summary: &QuotaSummary, focused: bool) {
    let block = Block::default()
        .title("Resource Overview")
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints = summary
        .lines
        .iter()
        .map(|_| Constraint::Length(2))
        .collect::<Vec<_>>();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let colors = [Color::Rgb(0, 136, 254), Color::Rgb(0, 196, 159), Color::Rgb(255, 187, 40)];
    for (index, line) in summary.lines.iter().enumerate() {
        let label = format!(
            "{} {:.0}{} of {:.0}{} (quota {})",
            line.name, line.allocated, line.unit, line.limit, line.unit, line.display
        );
        let percent = (line.ratio() * 100.0).round() as u16;
        render_meter(frame, chunks[index], &label, percent, colors[index % colors.len()]);
    }

    let node_style = if summary.ready_nodes < summary.total_nodes {
        Style::default().fg(WARN)
    } else {
        Style::default().fg(ACCENT)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(
                "Dedicated nodes ready: {}/{}",
                summary.ready_nodes, summary.total_nodes
            ),
            node_style,
        )),
        chunks[summary.lines.len()],
    );
}

fn render_bill(frame: &mut Frame, area: Rect, summary: &BillingSummary, focused: bool) {
    let rows = summary
        .lines
        .iter()
        .map(|line| {
            let share = summary.share(line);
            let bar = "█".repeat((share * 30.0).round() as usize);
            Row::new(vec![
                Cell::from(line.name.to_string()),
                Cell::from(format!("${:.2}", line.amount)),
                Cell::from(format!("{:>3.0}%", share * 100.0)),
                Cell::from(bar).style(Style::default().fg(ACCENT)),
            ])
            .style(Style::default().fg(Color::White))
        })
        .chain(std::iter::once(
            Row::new(vec![
                Cell::from("Total"),
                Cell::from(format!("${:.2}", summary.total())),
                Cell::from(""),
                Cell::from(""),
            ])
            .style(Style::default().fg(WARN).add_modifier(Modifier::BOLD)),
        ))
        .collect::<Vec<_>>();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Item", "Amount", "Share", ""])
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title("Monthly Bill")
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(ACCENT)
            } else {
                Style::default().fg(MUTED)
            })
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(table, area);
}

fn render_admin(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let selected = AdminTab::ALL
        .iter()
        .position(|tab| *tab == app.admin_tab())
        .unwrap_or(0);
    let tabs = Tabs::new(AdminTab::ALL.iter().map(|tab| tab.title()))
        .select(selected)
        .style(Style::default().fg(MUTED))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .title("Administration")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED))
                .style(Style::default().bg(PANEL)),
        );
    frame.render_widget(tabs, chunks[0]);

    let catalog = app.catalog();
    let (headers, rows): (Vec<&str>, Vec<Vec<String>>) = match app.admin_tab() {
        AdminTab::Quotas => (
            vec!["Cluster", "CPU", "Memory (GiB)", "Storage (GiB)", "PVCs", "NodePorts"],
            catalog
                .deploy_targets()
                .into_iter()
                .filter_map(|name| {
                    catalog.cluster_quota(&name).map(|quota| {
                        vec![
                            name.clone(),
                            quota.cpu.clone(),
                            quota.memory.clone(),
                            quota.storage.clone(),
                            quota.pvcs.clone(),
                            quota.nodeports.clone(),
                        ]
                    })
                })
                .collect(),
        ),
        AdminTab::Tenants => (
            vec!["ID", "Name", "Secret Path"],
            catalog
                .tenants
                .iter()
                .map(|tenant| {
                    vec![
                        tenant.id.clone(),
                        tenant.name.clone(),
                        tenant.secret_path.clone(),
                    ]
                })
                .collect(),
        ),
        AdminTab::Accounts => (
            vec!["Username", "Role"],
            known_accounts()
                .into_iter()
                .map(|(username, role)| vec![username.to_string(), role.label().to_string()])
                .collect(),
        ),
    };

    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(header.to_string()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().fg(ACCENT));
    let table_rows = rows.into_iter().map(|columns| {
        Row::new(
            columns
                .into_iter()
                .map(|column| Cell::from(column).style(Style::default().fg(Color::White))),
        )
    });
    let table = Table::new(table_rows, column_constraints(headers.len()))
        .header(header_row)
        .block(
            Block::default()
                .title(format!("{} ({})", app.admin_tab().title(), app.admin_row_count()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(Some(app.admin_cursor()));
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

fn render_deploy_dialog(frame: &mut Frame, app: &App, dialog: &DeployDialog) {
    let area = centered_rect(92, 90, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" New Deployment ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(4)])
        .split(inner);

    let percent = dialog.draft.completion_percent();
    render_meter(
        frame,
        rows[0],
        "Completion",
        u16::from(percent),
        if percent >= 100 { ACCENT } else { PL_E },
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Tab/Shift+Tab move  ←/→ choose  Space toggle  F2 validate  Ctrl+R repo  Ctrl+G ingress  Ctrl+X remove  Ctrl+P preview  Ctrl+S deploy  Esc discard",
            Style::default().fg(MUTED),
        )),
        rows[1],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(rows[2]);

    render_draft_fields(frame, columns[0], dialog);
    if dialog.show_preview() {
        let descriptor = render_descriptor(
            dialog.draft.namespace(),
            dialog.draft.target(),
            &app.catalog().cluster_defaults,
        );
        let paragraph = Paragraph::new(highlight_yaml_text(&descriptor))
            .block(
                Block::default()
                    .title("Deployment descriptor")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MUTED)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, columns[1]);
    } else {
        render_field_help(frame, columns[1], dialog);
    }
}

fn render_draft_fields(frame: &mut Frame, area: Rect, dialog: &DeployDialog) {
    let draft = &dialog.draft;
    let mut lines = Vec::new();
    let mut focused_line = 0usize;
    let mut current_section: Option<DraftSection> = None;

    for (index, field) in draft.fields().into_iter().enumerate() {
        let section = field.section();
        if current_section != Some(section) {
            if current_section.is_some() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                section.title().to_string(),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )));
            current_section = Some(section);
        }

        let focused = index == dialog.focus_index();
        if focused {
            focused_line = lines.len();
        }
        let value = draft.value(field);
        let rendered = match draft.input_kind(field) {
            FieldInput::Text if focused => format!("{value}▌"),
            FieldInput::Text => value,
            FieldInput::Choice if value.is_empty() => "‹ select ›".to_string(),
            FieldInput::Choice => format!("‹ {value} ›"),
            FieldInput::Toggle => {
                if value == "yes" {
                    "[x]".to_string()
                } else {
                    "[ ]".to_string()
                }
            }
        };

        let label_style = if focused {
            Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        let mut spans = vec![
            Span::styled(format!(" {:<18}", field.label()), label_style),
            Span::raw(" "),
            Span::styled(rendered, Style::default().fg(Color::White)),
        ];
        if let Some(badge) = validation_badge(dialog, field) {
            spans.push(Span::raw("  "));
            spans.push(badge);
        }
        lines.push(Line::from(spans));
    }

    let visible = area.height.saturating_sub(2) as usize;
    let scroll = focused_line.saturating_sub(visible.saturating_sub(2)) as u16;
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Draft")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED)),
        )
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Badges sit next to the field holding the identifier that gets validated.
fn validation_badge(dialog: &DeployDialog, field: DraftField) -> Option<Span<'static>> {
    let carries_identifier = matches!(
        field,
        DraftField::RepositoryUrl(_) | DraftField::TemplateValue | DraftField::Target
    );
    if !carries_identifier {
        return None;
    }
    let target = field.validation_target()?;
    match dialog.draft.validation_status(target) {
        ValidationStatus::Idle => None,
        ValidationStatus::Loading => Some(Span::styled("󰔟 checking", Style::default().fg(WARN))),
        ValidationStatus::Passed(message) => Some(Span::styled(
            format!("󰄬 {}", compact_text(message, 32)),
            Style::default().fg(ACCENT),
        )),
        ValidationStatus::Failed(message) => Some(Span::styled(
            format!("󰅚 {}", compact_text(message, 32)),
            Style::default().fg(ERROR),
        )),
    }
}

fn render_field_help(frame: &mut Frame, area: Rect, dialog: &DeployDialog) {
    let mut lines = Vec::new();
    if let Some(field) = dialog.focused_field() {
        lines.push(Line::from(Span::styled(
            field.label(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            field.hint().to_string(),
            Style::default().fg(MUTED),
        )));
        if field.validation_target().is_some() {
            lines.push(Line::from(Span::styled(
                "F2 or Ctrl+V validates this section",
                Style::default().fg(MUTED),
            )));
        }
    }

    let draft = &dialog.draft;
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Repositories {}/2  Ingress rules {}/2",
        draft.repositories().len(),
        draft.ingress().len()
    )));
    if let Some(target) = draft.target() {
        let quota = draft.quota();
        lines.push(Line::from(format!(
            "{target}: {} cores, {} GiB memory, {} GiB storage",
            quota.cpu, quota.memory, quota.storage
        )));
    }
    if draft.use_vault() {
        lines.push(Line::from(format!(
            "Vault path: {}",
            draft.value(DraftField::SecretPath)
        )));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Field")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_meter(frame: &mut Frame, area: Rect, label: &str, percent: u16, color: Color) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let text = Paragraph::new(compact_text(
        label,
        split[0].width.saturating_sub(1).max(1) as usize,
    ))
    .style(Style::default().fg(Color::Rgb(94, 234, 212)));
    frame.render_widget(text, split[0]);

    let bar_width = split[1].width as usize;
    if bar_width == 0 {
        return;
    }

    let percent = percent.min(100);
    let mut filled = bar_width.saturating_mul(percent as usize) / 100;
    if percent > 0 && filled == 0 {
        filled = 1;
    }
    let meter_text = format!("{percent:>3}%");
    let meter_chars = meter_text.chars().collect::<Vec<_>>();
    let text_start = bar_width.saturating_sub(meter_chars.len()) / 2;
    let text_end = text_start.saturating_add(meter_chars.len());

    let mut spans = Vec::with_capacity(bar_width);
    for idx in 0..bar_width {
        let is_filled = idx < filled;
        let bg = if is_filled {
            color
        } else {
            Color::Rgb(30, 41, 59)
        };
        let is_text_cell = idx >= text_start && idx < text_end;
        let ch = if is_text_cell {
            meter_chars[idx - text_start]
        } else {
            ' '
        };
        let fg = if is_filled {
            Color::Rgb(9, 15, 25)
        } else {
            Color::Rgb(148, 163, 184)
        };
        let mut style = Style::default().fg(fg).bg(bg);
        if is_text_cell {
            style = style.add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(ch.to_string(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(PANEL)),
        split[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    let (label, label_fg, label_bg) = match app.mode() {
        InputMode::Normal => (" 󰘳 nrm ", Color::White, PL_A),
        InputMode::Filter => (" 󰈲 flt ", Color::Black, WARN),
        InputMode::Login => (" 󰌾 login ", Color::White, PL_B),
        InputMode::Form => (" 󰏫 form ", Color::Black, ACCENT),
    };

    if app.mode() == InputMode::Filter {
        let filter = app
            .panel()
            .list()
            .map(|list| list.filter().to_string())
            .unwrap_or_default();
        push_powerline_segment(&mut spans, label, label_fg, label_bg, PANEL);
        push_powerline_segment(
            &mut spans,
            format!(" /{filter}▌ "),
            Color::White,
            PANEL,
            BG,
        );
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let pending = app.pending_confirmation_prompt();
    let status_text = pending
        .map(|prompt| format!("{prompt} (y/n)"))
        .unwrap_or_else(|| app.status().to_string());
    let (status_fg, status_bg) = if pending.is_some() {
        (Color::Black, WARN)
    } else {
        (Color::White, PL_B)
    };

    push_powerline_segment(&mut spans, label, label_fg, label_bg, status_bg);
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(&status_text),
            compact_text(&status_text, area.width.saturating_sub(24).max(24) as usize)
        ),
        status_fg,
        status_bg,
        BG,
    );
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = ["failed", "error", "invalid", "not available", "unknown"]
        .iter()
        .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn highlight_yaml_text(input: &str) -> Text<'static> {
    let lines = input
        .lines()
        .map(highlight_yaml_line)
        .collect::<Vec<Line<'static>>>();
    Text::from(lines)
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let indent_len = line
        .as_bytes()
        .iter()
        .take_while(|byte| **byte == b' ')
        .count();
    let mut spans = vec![Span::raw(line[..indent_len].to_string())];
    let trimmed = &line[indent_len..];
    if trimmed.is_empty() {
        return Line::from(spans);
    }

    let content = match trimmed.strip_prefix("- ") {
        Some(rest) => {
            spans.push(Span::styled("- ", Style::default().fg(ACCENT)));
            rest
        }
        None => trimmed,
    };

    match content.split_once(':') {
        Some((key, value)) if !key.is_empty() && !key.contains(' ') => {
            spans.push(Span::styled(
                key.to_string(),
                Style::default().fg(Color::Rgb(103, 232, 249)),
            ));
            spans.push(Span::styled(":", Style::default().fg(MUTED)));
            let value = value.trim();
            if !value.is_empty() {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    value.to_string(),
                    Style::default().fg(yaml_value_color(value)),
                ));
            }
        }
        _ => spans.push(Span::styled(
            content.to_string(),
            Style::default().fg(Color::White),
        )),
    }
    Line::from(spans)
}

fn yaml_value_color(value: &str) -> Color {
    if value.starts_with('"') || value.starts_with('\'') {
        Color::Rgb(125, 211, 252)
    } else if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else {
        Color::Rgb(147, 197, 253)
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(72, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "h4deck help  mode:{}  route:{}",
            help_mode_label(app.mode()),
            app.route().title()
        )),
        Line::from(""),
    ];
    lines.extend(contextual_help_lines(app).into_iter().map(Line::from));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn contextual_help_lines(app: &App) -> Vec<String> {
    let mut lines = vec![
        "Global: ? help  q quit  Ctrl+C quit  L sign out".to_string(),
        "Move: j/k or arrows  gg/G top/bottom  PgUp/PgDn page".to_string(),
    ];
    match app.route() {
        Route::Login => {
            lines.push("Sign in: Tab switch field  Enter submit  Esc clear".to_string());
        }
        Route::Admin => {
            lines.push("Admin: Left/Right or Tab switch tab".to_string());
        }
        Route::Dashboard => {
            lines.push("Menu: Tab focus menu  Enter open section or item  Left/Right previous/next panel".to_string());
            lines.push("Lists: / filter  Space select  a select all  e expand  Enter/d detail  Esc back".to_string());
            let kind = app.panel().kind();
            let actions = kind
                .bulk_actions()
                .iter()
                .map(|action| match action.label() {
                    "delete" => "x delete selected",
                    _ => "s sync selected",
                })
                .collect::<Vec<_>>();
            if !actions.is_empty() {
                lines.push(format!("{}: {}", kind.title(), actions.join("  ")));
            }
            if kind.offers_deploy() {
                lines.push("c new deployment".to_string());
            }
        }
    }
    lines
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Filter => "filter",
        InputMode::Login => "login",
        InputMode::Form => "form",
    }
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    let width = (100 / columns as u16).max(1);
    (0..columns)
        .map(|_| Constraint::Percentage(width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compact_text, render};
    use crate::app::App;
    use crate::catalog::Catalog;
    use crate::input::Action;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    fn sign_in(app: &mut App, username: &str) {
        for c in username.chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::NextField);
        for c in username.chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);
    }

    #[test]
    fn compact_text_truncates_with_ellipsis() {
        assert_eq!(compact_text("kustomization", 6), "kusto…");
        assert_eq!(compact_text("ray", 6), "ray");
    }

    #[test]
    fn login_screen_lists_demo_accounts() {
        let app = App::new(Catalog::fixtures(), None);
        let screen = draw(&app);
        assert!(screen.contains("Demo accounts"));
        assert!(screen.contains("user1"));
    }

    #[test]
    fn every_screen_renders() {
        let mut app = App::new(Catalog::fixtures(), None);
        sign_in(&mut app, "user1");
        assert!(draw(&app).contains("argo-rollout"));

        app.apply_action(Action::OpenDeploy);
        app.apply_action(Action::TogglePreview);
        assert!(draw(&app).contains("New Deployment"));
        app.apply_action(Action::CancelInput);

        for _ in 0..8 {
            app.apply_action(Action::NextTab);
            draw(&app);
        }

        let mut admin = App::new(Catalog::fixtures(), None);
        sign_in(&mut admin, "admin");
        assert!(draw(&admin).contains("Cluster Quotas"));
    }
}
