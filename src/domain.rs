use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_SORT: &str = "created_at";
pub const DEFAULT_ORDER: &str = "desc";

/// Columns a list may be ordered by.
pub const SORTABLE: &[&str] = &["id", "description", "due_date", "created_at", "updated_at"];

/// Identity and audit fields shared by every entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Base {
    id: Option<i64>,
    uuid: Option<Uuid>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Base {
    pub fn id(&self) -> i64 {
        self.id.unwrap_or_default()
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// `Uuid::nil()` when unset.
    pub fn uuid(&self) -> Uuid {
        self.uuid.unwrap_or_else(Uuid::nil)
    }

    pub fn has_uuid(&self) -> bool {
        self.uuid.is_some_and(|u| !u.is_nil())
    }

    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = Some(uuid);
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set_created_at(&mut self, t: DateTime<Utc>) {
        self.created_at = Some(t);
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set_updated_at(&mut self, t: DateTime<Utc>) {
        self.updated_at = Some(t);
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn set_deleted_at(&mut self, t: Option<DateTime<Utc>>) {
        self.deleted_at = t;
    }
}

/// Storage row of the `todos` table.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub uuid: Uuid,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Todo {
    pub base: Base,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uuid(&self) -> Uuid {
        self.base.uuid()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set_due_date(&mut self, due_date: DateTime<Utc>) {
        self.due_date = Some(due_date);
    }

    pub fn from_db(row: TodoRow) -> Self {
        let mut todo = Todo::new();
        todo.base.set_id(row.id);
        todo.base.set_uuid(row.uuid);
        todo.base.set_created_at(row.created_at);
        todo.base.set_updated_at(row.updated_at);
        todo.base.set_deleted_at(row.deleted_at);
        todo.set_description(row.description);
        todo.set_due_date(row.due_date);
        todo
    }

    /// Server-assigned columns (`id`, audit stamps) are left for the database to fill.
    pub fn to_db(&self) -> TodoRow {
        TodoRow {
            id: self.base.id(),
            uuid: self.uuid(),
            description: self.description().to_string(),
            due_date: self.due_date(),
            created_at: self.base.created_at(),
            updated_at: self.base.updated_at(),
            deleted_at: self.base.deleted_at(),
        }
    }
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo::from_db(row)
    }
}

/// One page of todos plus the unpaginated match count.
#[derive(Clone, Debug, Default)]
pub struct TodoList {
    total: i64,
    list: Vec<Todo>,
}

impl TodoList {
    pub fn new(list: Vec<Todo>, total: i64) -> Self {
        Self { total, list }
    }

    pub fn from_db(rows: Vec<TodoRow>, total: i64) -> Self {
        Self::new(rows.into_iter().map(Todo::from_db).collect(), total)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn list(&self) -> &[Todo] {
        &self.list
    }
}

/// Paging, ordering and search for collection endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
    order: Option<String>,
    search: Option<String>,
}

impl QueryParams {
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE)
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = Some(page);
    }

    /// Never above [`MAX_LIMIT`].
    pub fn limit(&self) -> u32 {
        match self.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(l) => l.min(MAX_LIMIT),
        }
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    pub fn sort(&self) -> &str {
        self.sort.as_deref().unwrap_or(DEFAULT_SORT)
    }

    pub fn set_sort(&mut self, sort: impl Into<String>) {
        self.sort = Some(sort.into());
    }

    pub fn order(&self) -> &str {
        self.order.as_deref().unwrap_or(DEFAULT_ORDER)
    }

    pub fn set_order(&mut self, order: impl Into<String>) {
        self.order = Some(order.into());
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = Some(search.into());
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoListQuery {
    pub base: QueryParams,
}

impl TodoListQuery {
    pub fn new(base: QueryParams) -> Self {
        Self { base }
    }
}
