use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    GPrefix,
    NextTab,
    PrevTab,
    ToggleHelp,
    ToggleFocus,
    Activate,
    ShowDetails,
    ToggleExpand,
    ToggleSelect,
    ToggleSelectAll,
    StartFilter,
    BulkDelete,
    BulkSync,
    OpenDeploy,
    Logout,
    ClearOverlay,
    ConfirmYes,
    ConfirmNo,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
    NextField,
    PrevField,
    CycleNext,
    CyclePrev,
    ValidateField,
    AddRepository,
    AddIngress,
    RemoveEntry,
    SubmitForm,
    TogglePreview,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Filter => map_filter_mode_key(key),
        InputMode::Login => map_login_mode_key(key),
        InputMode::Form => map_form_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Left => Some(Action::PrevTab),
        KeyCode::Right => Some(Action::NextTab),
        KeyCode::Char('g') => Some(Action::GPrefix),
        KeyCode::Char('G') => Some(Action::Bottom),
        KeyCode::Home => Some(Action::Top),
        KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Tab | KeyCode::BackTab => Some(Action::ToggleFocus),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('d') if key.modifiers.is_empty() => Some(Action::ShowDetails),
        KeyCode::Char('e') | KeyCode::Char('o') => Some(Action::ToggleExpand),
        KeyCode::Char(' ') => Some(Action::ToggleSelect),
        KeyCode::Char('a') => Some(Action::ToggleSelectAll),
        KeyCode::Char('x') | KeyCode::Delete => Some(Action::BulkDelete),
        KeyCode::Char('s') => Some(Action::BulkSync),
        KeyCode::Char('c') => Some(Action::OpenDeploy),
        KeyCode::Char('L') => Some(Action::Logout),
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmYes),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::ConfirmNo),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::ClearOverlay),
        _ => None,
    }
}

fn map_filter_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char(c) if text_modifiers(key.modifiers) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn map_login_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
        KeyCode::Char(c) if text_modifiers(key.modifiers) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn map_form_mode_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(Action::SubmitForm),
            KeyCode::Char('v') => Some(Action::ValidateField),
            KeyCode::Char('r') => Some(Action::AddRepository),
            KeyCode::Char('g') => Some(Action::AddIngress),
            KeyCode::Char('x') => Some(Action::RemoveEntry),
            KeyCode::Char('p') => Some(Action::TogglePreview),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
        KeyCode::Right => Some(Action::CycleNext),
        KeyCode::Left => Some(Action::CyclePrev),
        KeyCode::F(2) => Some(Action::ValidateField),
        KeyCode::Char(c) if text_modifiers(key.modifiers) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn text_modifiers(modifiers: KeyModifiers) -> bool {
    modifiers.is_empty() || modifiers == KeyModifiers::SHIFT
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn normal_mode_maps_quit() {
        let action = map_key(InputMode::Normal, key(KeyCode::Char('q')));
        assert_eq!(action, Some(Action::Quit));
    }

    #[test]
    fn ctrl_c_quits_in_every_mode() {
        for mode in [
            InputMode::Normal,
            InputMode::Filter,
            InputMode::Login,
            InputMode::Form,
        ] {
            assert_eq!(map_key(mode, ctrl('c')), Some(Action::Quit), "{mode:?}");
        }
    }

    #[test]
    fn normal_mode_maps_selection_keys() {
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char(' '))),
            Some(Action::ToggleSelect)
        );
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char('a'))),
            Some(Action::ToggleSelectAll)
        );
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char('x'))),
            Some(Action::BulkDelete)
        );
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char('d'))),
            Some(Action::ShowDetails)
        );
    }

    #[test]
    fn typing_modes_keep_letters_as_text() {
        for mode in [InputMode::Filter, InputMode::Login, InputMode::Form] {
            assert_eq!(
                map_key(mode, key(KeyCode::Char('q'))),
                Some(Action::InputChar('q')),
                "{mode:?}"
            );
        }
        let upper = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Login, upper), Some(Action::InputChar('A')));
    }

    #[test]
    fn filter_mode_rejects_alt_chords() {
        let key = KeyEvent::new(KeyCode::Char('f'), KeyModifiers::ALT);
        assert_eq!(map_key(InputMode::Filter, key), None);
    }

    #[test]
    fn form_mode_maps_control_chords() {
        assert_eq!(map_key(InputMode::Form, ctrl('s')), Some(Action::SubmitForm));
        assert_eq!(map_key(InputMode::Form, ctrl('g')), Some(Action::AddIngress));
        assert_eq!(
            map_key(InputMode::Form, ctrl('r')),
            Some(Action::AddRepository)
        );
        assert_eq!(
            map_key(InputMode::Form, key(KeyCode::Right)),
            Some(Action::CycleNext)
        );
        assert_eq!(
            map_key(InputMode::Form, key(KeyCode::Esc)),
            Some(Action::CancelInput)
        );
    }

    #[test]
    fn login_mode_moves_between_fields() {
        assert_eq!(
            map_key(InputMode::Login, key(KeyCode::Tab)),
            Some(Action::NextField)
        );
        assert_eq!(
            map_key(InputMode::Login, key(KeyCode::Enter)),
            Some(Action::SubmitInput)
        );
    }
}
