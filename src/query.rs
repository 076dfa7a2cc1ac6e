//! Article list query: filters, sort, pagination and load state.
//!
//! `ListQuery` is the client-local description of the next fetch and turns
//! into request parameters. `ListState` wraps it with the last received page,
//! the load state machine (`Idle -> Loading -> Ready | Error`) and the
//! generation counter that keeps superseded fetches from overwriting newer
//! results.

use crate::api::{ArticlePage, ArticleStatus, ArticleSummary};

/// Maximum number of page buttons in the pagination bar.
pub const PAGE_WINDOW: u32 = 5;

// ============================================================================
// Sorting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Status,
    Pubdate,
    ReadCount,
    CommentCount,
    LikeCount,
}

impl SortField {
    /// Sortable columns in table order.
    pub const ALL: [SortField; 5] = [
        SortField::Status,
        SortField::Pubdate,
        SortField::ReadCount,
        SortField::CommentCount,
        SortField::LikeCount,
    ];

    pub fn param(self) -> &'static str {
        match self {
            SortField::Status => "status",
            SortField::Pubdate => "pubdate",
            SortField::ReadCount => "read_count",
            SortField::CommentCount => "comment_count",
            SortField::LikeCount => "like_count",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Status => "Status",
            SortField::Pubdate => "Published",
            SortField::ReadCount => "Reads",
            SortField::CommentCount => "Comments",
            SortField::LikeCount => "Likes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Pubdate,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    /// Header click: the active field flips direction, another field is
    /// selected descending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.order = self.order.flipped();
        } else {
            self.field = field;
            self.order = SortOrder::Desc;
        }
    }

    /// `field` ascending, `-field` descending.
    pub fn param(self) -> String {
        match self.order {
            SortOrder::Asc => self.field.param().to_string(),
            SortOrder::Desc => format!("-{}", self.field.param()),
        }
    }

    /// Indicator for a column header.
    pub fn indicator(self, field: SortField) -> &'static str {
        if self.field == field {
            self.order.arrow()
        } else {
            "↕"
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ArticleStatus),
}

impl StatusFilter {
    /// All → Pending → Approved → Rejected → All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(ArticleStatus::Pending),
            StatusFilter::Only(ArticleStatus::Pending) => StatusFilter::Only(ArticleStatus::Approved),
            StatusFilter::Only(ArticleStatus::Approved) => StatusFilter::Only(ArticleStatus::Rejected),
            StatusFilter::Only(_) => StatusFilter::All,
        }
    }

    pub fn param(self) -> Option<String> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => status.code().map(|c| c.to_string()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// Everything that determines which rows the next list fetch returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub status: StatusFilter,
    pub channel: Option<i64>,
    pub sort: Sort,
}

impl ListQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            status: StatusFilter::All,
            channel: None,
            sort: Sort::default(),
        }
    }

    /// Query-string pairs for `GET /mp/articles`. Unset filters are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.page_size.to_string()),
        ];
        if let Some(status) = self.status.param() {
            params.push(("status", status));
        }
        if let Some(channel) = self.channel {
            params.push(("channel_id", channel.to_string()));
        }
        params.push(("sort", self.sort.param()));
        params
    }
}

// ============================================================================
// Load state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// List view state: the query plus what the last accepted fetch returned.
#[derive(Debug, Clone)]
pub struct ListState {
    pub query: ListQuery,
    pub load: LoadState,
    pub items: Vec<ArticleSummary>,
    pub total_pages: u32,
    pub total_count: u64,
    /// Highlighted row.
    pub selected: usize,
    /// Highlighted sortable column (index into `SortField::ALL`).
    pub header_cursor: usize,
    /// Digits typed into the go-to-page prompt, when it is open.
    pub page_prompt: Option<String>,
    generation: u64,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: ListQuery::new(page_size),
            load: LoadState::Idle,
            items: Vec::new(),
            total_pages: 1,
            total_count: 0,
            selected: 0,
            header_cursor: SortField::ALL
                .iter()
                .position(|f| *f == SortField::Pubdate)
                .unwrap_or(0),
            page_prompt: None,
            generation: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    /// Move to `page`. Pages outside `[1, total_pages]` and the current page
    /// are no-ops; returns whether a fetch is needed.
    pub fn request_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages || page == self.query.page {
            tracing::debug!(
                page,
                current = self.query.page,
                total_pages = self.total_pages,
                "Ignoring page request"
            );
            return false;
        }
        self.query.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.request_page(self.query.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.request_page(self.query.page.saturating_sub(1))
    }

    pub fn open_page_prompt(&mut self) {
        self.page_prompt = Some(String::new());
    }

    pub fn cancel_page_prompt(&mut self) {
        self.page_prompt = None;
    }

    /// Append a digit to the open prompt. Anything else is ignored.
    pub fn page_prompt_push(&mut self, c: char) {
        if let Some(input) = &mut self.page_prompt {
            if c.is_ascii_digit() && input.len() < 9 {
                input.push(c);
            }
        }
    }

    pub fn page_prompt_backspace(&mut self) {
        if let Some(input) = &mut self.page_prompt {
            input.pop();
        }
    }

    /// Close the prompt and jump to the typed page. Same rules as
    /// [`ListState::request_page`]; an empty prompt does nothing.
    pub fn confirm_page_prompt(&mut self) -> bool {
        let Some(input) = self.page_prompt.take() else {
            return false;
        };
        match input.parse::<u32>() {
            Ok(page) => self.request_page(page),
            Err(_) => false,
        }
    }

    pub fn first_page(&mut self) -> bool {
        self.request_page(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.request_page(self.total_pages)
    }

    /// Change the status filter; resets to page 1. Returns whether it changed.
    pub fn set_status_filter(&mut self, status: StatusFilter) -> bool {
        if self.query.status == status {
            return false;
        }
        self.query.status = status;
        self.query.page = 1;
        true
    }

    /// Change the channel filter; resets to page 1. Returns whether it changed.
    pub fn set_channel_filter(&mut self, channel: Option<i64>) -> bool {
        if self.query.channel == channel {
            return false;
        }
        self.query.channel = channel;
        self.query.page = 1;
        true
    }

    /// Apply a header click to `field`. Always changes the query.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.query.sort.toggle(field);
        if let Some(idx) = SortField::ALL.iter().position(|f| *f == field) {
            self.header_cursor = idx;
        }
    }

    /// Field under the header cursor.
    pub fn header_field(&self) -> SortField {
        SortField::ALL[self.header_cursor.min(SortField::ALL.len() - 1)]
    }

    pub fn move_header_cursor(&mut self, forward: bool) {
        let len = SortField::ALL.len();
        self.header_cursor = if forward {
            (self.header_cursor + 1) % len
        } else {
            (self.header_cursor + len - 1) % len
        };
    }

    /// Enter `Loading` and return the generation the new fetch must report.
    pub fn begin_load(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.load = LoadState::Loading;
        self.generation
    }

    /// Apply a fetch result. Results from superseded fetches are dropped;
    /// returns whether the result was applied.
    pub fn finish_load(&mut self, generation: u64, result: Result<ArticlePage, String>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale article list result"
            );
            return false;
        }
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total_pages = page.total_pages.max(1);
                self.total_count = page.total_count;
                self.query.page = page.page.max(1);
                self.load = LoadState::Ready;
                self.clamp_selection();
            }
            Err(message) => {
                self.load = LoadState::Error(message);
            }
        }
        true
    }

    pub fn clamp_selection(&mut self) {
        self.selected = if self.items.is_empty() {
            0
        } else {
            self.selected.min(self.items.len() - 1)
        };
    }

    pub fn selected_item(&self) -> Option<&ArticleSummary> {
        self.items.get(self.selected)
    }

    pub fn nav_down(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Page numbers to show in the pagination bar.
    pub fn page_window(&self) -> Vec<u32> {
        page_window(self.query.page, self.total_pages)
    }
}

/// At most [`PAGE_WINDOW`] page numbers around `current`.
///
/// Pages 1..=5 while `current <= 3`, the last five while
/// `current >= total - 2`, otherwise `current - 2 ..= current + 2`. Fewer than
/// five pages are all shown.
pub fn page_window(current: u32, total_pages: u32) -> Vec<u32> {
    let total = total_pages.max(1);
    let len = PAGE_WINDOW.min(total);
    let current = current.clamp(1, total);
    let start = current.saturating_sub(PAGE_WINDOW / 2).clamp(1, total - len + 1);
    (start..start + len).collect()
}
