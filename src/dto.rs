use crate::{
    domain::{QueryParams, Todo, TodoList, TodoListQuery, SORTABLE},
    request::IntoDomain,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Wire format of `dueDate` in requests.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAME_MAX_CHARS: usize = 20;

// ---- requests ----

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRequest {
    #[validate(required, length(min = 1), custom(function = "ascii"))]
    #[schema(example = "Create new todo item")]
    pub description: Option<String>,

    #[serde(rename = "dueDate")]
    #[validate(required, custom(function = "date_time"))]
    #[schema(example = "2025-08-07 10:11:12")]
    pub due_date: Option<String>,
}

impl IntoDomain for CreateRequest {
    type Domain = Todo;

    fn into_domain(self) -> Todo {
        let mut todo = Todo::new();
        if let Some(description) = self.description {
            todo.set_description(description);
        }
        if let Some(due) = self.due_date.as_deref().and_then(parse_date_time) {
            todo.set_due_date(due);
        }
        todo
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct DetailRequest {
    /// Todo UUID
    #[validate(length(min = 1), custom(function = "valid_uuid"))]
    #[param(example = "f81eee2d-2cca-4169-8062-7404a78d5c3b")]
    pub uuid: String,
}

impl IntoDomain for DetailRequest {
    type Domain = Todo;

    fn into_domain(self) -> Todo {
        let mut todo = Todo::new();
        if let Ok(id) = Uuid::parse_str(&self.uuid) {
            todo.base.set_uuid(id);
        }
        todo
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TodoListQueryRequest {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size, at most 50
    pub limit: Option<u32>,
    /// One of `id` `description` `due_date` `created_at` `updated_at`
    #[validate(custom(function = "sortable"))]
    pub sort: Option<String>,
    /// `asc` or `desc`
    #[validate(custom(function = "sort_order"))]
    pub order: Option<String>,
    /// Substring of the description
    #[validate(custom(function = "alphanumeric"))]
    pub search: Option<String>,
}

impl IntoDomain for TodoListQueryRequest {
    type Domain = TodoListQuery;

    fn into_domain(self) -> TodoListQuery {
        let mut qp = QueryParams::default();
        if let Some(page) = self.page {
            qp.set_page(page);
        }
        if let Some(limit) = self.limit {
            qp.set_limit(limit);
        }
        if let Some(sort) = self.sort.filter(|s| !s.is_empty()) {
            qp.set_sort(sort);
        }
        if let Some(order) = self.order.filter(|o| !o.is_empty()) {
            qp.set_order(order.to_ascii_lowercase());
        }
        if let Some(search) = self.search {
            qp.set_search(search);
        }
        TodoListQuery::new(qp)
    }
}

// ---- responses ----

#[derive(Debug, Serialize, ToSchema)]
pub struct TodoResponse {
    #[schema(example = "e48c48a3-cb72-4d64-b035-5c30fc900ef6")]
    pub uuid: String,
    #[schema(example = "Create new todo item")]
    pub description: String,
    #[serde(rename = "dueDate")]
    #[schema(example = "2025-08-07T10:11:12Z")]
    pub due_date: String,
}

impl From<&Todo> for TodoResponse {
    fn from(todo: &Todo) -> Self {
        Self {
            uuid: if todo.base.has_uuid() {
                todo.uuid().to_string()
            } else {
                String::new()
            },
            description: todo.description().to_string(),
            due_date: rfc3339(todo.due_date()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodoListItem {
    #[schema(example = "02bda2f0-61e5-483c-a2d8-15eafb00b945")]
    pub id: String,
    #[schema(example = "Create new todo item...")]
    pub name: String,
    #[serde(rename = "dueDate")]
    pub due_date: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodoListResponse {
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
    pub total: i64,
    pub todos: Vec<TodoListItem>,
}

impl TodoListResponse {
    pub fn new(query: &TodoListQuery, list: &TodoList) -> Self {
        let limit = query.base.limit();
        let total = list.total().max(0);
        Self {
            page: query.base.page(),
            limit,
            pages: (total as u64).div_ceil(u64::from(limit)),
            total,
            todos: list
                .list()
                .iter()
                .map(|todo| TodoListItem {
                    id: todo.uuid().to_string(),
                    name: truncate_name(todo.description()),
                    due_date: rfc3339(todo.due_date()),
                })
                .collect(),
        }
    }
}

fn truncate_name(description: &str) -> String {
    match description.char_indices().nth(NAME_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .ok()
        .map(|t| t.and_utc())
}

// ---- validators ----

fn ascii(value: &str) -> Result<(), ValidationError> {
    if value.is_ascii() {
        Ok(())
    } else {
        Err(ValidationError::new("ascii"))
    }
}

fn date_time(value: &str) -> Result<(), ValidationError> {
    parse_date_time(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("datetime"))
}

fn valid_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("uuid"))
}

fn sortable(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || (value.is_ascii() && SORTABLE.contains(&value)) {
        Ok(())
    } else {
        Err(ValidationError::new("oneof"))
    }
}

fn sort_order(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.eq_ignore_ascii_case("asc") || value.eq_ignore_ascii_case("desc") {
        Ok(())
    } else {
        Err(ValidationError::new("oneof"))
    }
}

fn alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("alphanum"))
    }
}
