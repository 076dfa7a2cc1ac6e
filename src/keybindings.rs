//! Keybinding registry: maps key events to actions per view context.
//!
//! Input dispatch and the help overlay both read from the same table, so the
//! help screen always lists the keys that actually work.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    ShowHelp,
    ToggleSidebar,
    GoContent,
    GoPublish,
    Logout,

    NavDown,
    NavUp,
    OpenDetail,
    EditArticle,
    DeleteArticle,
    CycleStatusFilter,
    CycleChannelFilter,
    HeaderLeft,
    HeaderRight,
    ToggleSort,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GoToPage,
    Refresh,

    Back,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    OpenCover,

    Submit,
    NextField,
    PrevField,
    NextChoice,
    PrevChoice,
    ChooseCover,
    RemoveCover,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::ShowHelp => "Show help",
            Self::ToggleSidebar => "Collapse / expand side menu",
            Self::GoContent => "Go to content management",
            Self::GoPublish => "Go to publish article",
            Self::Logout => "Log out",
            Self::NavDown => "Next row",
            Self::NavUp => "Previous row",
            Self::OpenDetail => "View article",
            Self::EditArticle => "Edit article",
            Self::DeleteArticle => "Delete article",
            Self::CycleStatusFilter => "Cycle status filter",
            Self::CycleChannelFilter => "Cycle channel filter",
            Self::HeaderLeft => "Previous sortable column",
            Self::HeaderRight => "Next sortable column",
            Self::ToggleSort => "Sort by column / flip order",
            Self::NextPage => "Next page",
            Self::PrevPage => "Previous page",
            Self::FirstPage => "First page",
            Self::LastPage => "Last page",
            Self::GoToPage => "Go to page number",
            Self::Refresh => "Reload",
            Self::Back => "Back / cancel",
            Self::ScrollDown => "Scroll down",
            Self::ScrollUp => "Scroll up",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::OpenCover => "Open cover image",
            Self::Submit => "Submit",
            Self::NextField => "Next field",
            Self::PrevField => "Previous field",
            Self::NextChoice => "Next channel",
            Self::PrevChoice => "Previous channel",
            Self::ChooseCover => "Choose cover image file",
            Self::RemoveCover => "Remove cover",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Login,
    Articles,
    Detail,
    /// Editor with a text field (title, content) focused.
    Editor,
    /// Editor with the channel or cover field focused.
    EditorChoice,
}

impl Context {
    /// Context consulted when this one has no binding for a key.
    fn parent(self) -> Option<Context> {
        match self {
            Context::Global => None,
            Context::EditorChoice => Some(Context::Editor),
            _ => Some(Context::Global),
        }
    }

    /// Plain characters are typed into a field instead of triggering
    /// inherited bindings.
    fn accepts_text(self) -> bool {
        matches!(self, Context::Login | Context::Editor)
    }

    /// Section title on the help screen.
    pub fn title(self) -> &'static str {
        match self {
            Context::Global => "Global",
            Context::Login => "Login",
            Context::Articles => "Content management",
            Context::Detail => "Article detail",
            Context::Editor => "Editor",
            Context::EditorChoice => "Editor: channel / cover field",
        }
    }

    pub const ALL: [Context; 6] = [
        Context::Global,
        Context::Login,
        Context::Articles,
        Context::Detail,
        Context::Editor,
        Context::EditorChoice,
    ];
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    /// SHIFT is dropped for characters and BackTab: the key itself already
    /// carries it, and terminals disagree on whether to report it.
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) | KeyCode::BackTab => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    fn is_plain_char(&self) -> bool {
        matches!(self.code, KeyCode::Char(_)) && self.modifiers.is_empty()
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings with context-aware dispatch: the same key can map
/// to different actions in different contexts.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        reg.register_defaults();
        reg
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn bind_all(&mut self, context: Context, keys: &[KeySpec], action: Action) {
        for key in keys {
            self.bind(context, *key, action);
        }
    }

    fn register_defaults(&mut self) {
        use KeyCode::{BackTab, Char, Down, End, Enter, Esc, Home, Left, Right, Tab, Up, F};
        let p = KeySpec::plain;

        // === Global ===
        self.bind_all(Context::Global, &[p(Char('q')), KeySpec::ctrl('c')], Action::Quit);
        self.bind_all(Context::Global, &[p(Char('?')), p(F(1))], Action::ShowHelp);
        self.bind(Context::Global, p(Char('[')), Action::ToggleSidebar);
        self.bind_all(Context::Global, &[p(Char('1')), p(F(2))], Action::GoContent);
        self.bind_all(Context::Global, &[p(Char('2')), p(F(3))], Action::GoPublish);
        self.bind(Context::Global, p(Char('L')), Action::Logout);

        // === Login ===
        self.bind(Context::Login, p(Enter), Action::Submit);
        self.bind_all(Context::Login, &[p(Tab), p(BackTab), p(Down), p(Up)], Action::NextField);

        // === Article list ===
        self.bind_all(Context::Articles, &[p(Char('j')), p(Down)], Action::NavDown);
        self.bind_all(Context::Articles, &[p(Char('k')), p(Up)], Action::NavUp);
        self.bind(Context::Articles, p(Enter), Action::OpenDetail);
        self.bind(Context::Articles, p(Char('e')), Action::EditArticle);
        self.bind_all(Context::Articles, &[p(Char('d')), p(KeyCode::Delete)], Action::DeleteArticle);
        self.bind(Context::Articles, p(Char('s')), Action::CycleStatusFilter);
        self.bind(Context::Articles, p(Char('c')), Action::CycleChannelFilter);
        self.bind_all(Context::Articles, &[p(Char('h')), p(Left)], Action::HeaderLeft);
        self.bind_all(Context::Articles, &[p(Char('l')), p(Right)], Action::HeaderRight);
        self.bind(Context::Articles, p(Char('o')), Action::ToggleSort);
        self.bind_all(Context::Articles, &[p(Char('n')), p(KeyCode::PageDown)], Action::NextPage);
        self.bind_all(Context::Articles, &[p(Char('p')), p(KeyCode::PageUp)], Action::PrevPage);
        self.bind_all(Context::Articles, &[p(Char('g')), p(Home)], Action::FirstPage);
        self.bind_all(Context::Articles, &[p(Char('G')), p(End)], Action::LastPage);
        self.bind(Context::Articles, p(Char(':')), Action::GoToPage);
        self.bind(Context::Articles, p(Char('r')), Action::Refresh);

        // === Article detail ===
        self.bind_all(Context::Detail, &[p(Esc), p(Char('b'))], Action::Back);
        self.bind_all(Context::Detail, &[p(Char('j')), p(Down)], Action::ScrollDown);
        self.bind_all(Context::Detail, &[p(Char('k')), p(Up)], Action::ScrollUp);
        self.bind_all(Context::Detail, &[KeySpec::ctrl('d'), p(KeyCode::PageDown)], Action::PageDown);
        self.bind_all(Context::Detail, &[KeySpec::ctrl('u'), p(KeyCode::PageUp)], Action::PageUp);
        self.bind(Context::Detail, p(Char('e')), Action::EditArticle);
        self.bind(Context::Detail, p(Char('o')), Action::OpenCover);
        self.bind(Context::Detail, p(Char('r')), Action::Refresh);

        // === Editor ===
        self.bind(Context::Editor, KeySpec::ctrl('s'), Action::Submit);
        self.bind(Context::Editor, p(Tab), Action::NextField);
        self.bind(Context::Editor, p(BackTab), Action::PrevField);
        self.bind(Context::Editor, p(Esc), Action::Back);

        // === Editor channel / cover fields ===
        self.bind_all(Context::EditorChoice, &[p(Right), p(Char('l'))], Action::NextChoice);
        self.bind_all(Context::EditorChoice, &[p(Left), p(Char('h'))], Action::PrevChoice);
        self.bind_all(Context::EditorChoice, &[p(Char('a')), p(Enter)], Action::ChooseCover);
        self.bind(Context::EditorChoice, p(Char('x')), Action::RemoveCover);
    }

    /// Look up the action for a key, walking from `context` up to Global.
    ///
    /// Text contexts stop the walk for plain characters so typing never
    /// triggers an inherited binding.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);
        let mut current = Some(context);
        while let Some(ctx) = current {
            if let Some(&action) = self.lookup.get(&(ctx, key)) {
                return Some(action);
            }
            if ctx.accepts_text() && key.is_plain_char() {
                return None;
            }
            current = ctx.parent();
        }
        None
    }

    /// Get all bindings for the help screen.
    ///
    /// Returns (context, key_display_string, description) tuples, one per
    /// action and context with its keys joined.
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        let mut out: Vec<(Context, Action, Vec<String>)> = Vec::new();
        for (ctx, key, action) in &self.bindings {
            match out.iter_mut().find(|(c, a, _)| c == ctx && a == action) {
                Some((_, _, keys)) => keys.push(format_key(key)),
                None => out.push((*ctx, *action, vec![format_key(key)])),
            }
        }
        out.into_iter()
            .map(|(ctx, action, keys)| (ctx, keys.join(" / "), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
