use crate::{
    db::Database,
    domain::{Todo, TodoList, TodoListQuery, TodoRow, SORTABLE},
    error::ServiceError,
    status::StatusKind,
};
use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

const TODO_COLUMNS: &str = "id, uuid, description, due_date, created_at, updated_at, deleted_at";

/// Persistence port for todos.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn create(&self, todo: Todo) -> Result<Todo, ServiceError>;
    async fn get_by_uuid(&self, id: Uuid) -> Result<Todo, ServiceError>;
    async fn get_list(&self, query: &TodoListQuery) -> Result<TodoList, ServiceError>;
}

#[derive(Clone)]
pub struct PgTodoRepository {
    db: Database,
}

impl PgTodoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert on a caller-supplied connection, so several writes can share one [`crate::db::Tx`].
    pub async fn insert(&self, conn: &mut PgConnection, mut todo: Todo) -> Result<Todo, ServiceError> {
        if !todo.base.has_uuid() {
            todo.base.set_uuid(Uuid::new_v4());
        }
        let row = todo.to_db();

        let inserted: TodoRow = sqlx::query_as(&format!(
            "INSERT INTO todos (uuid, description, due_date) VALUES ($1, $2, $3) RETURNING {TODO_COLUMNS}"
        ))
        .bind(row.uuid)
        .bind(&row.description)
        .bind(row.due_date)
        .fetch_one(conn)
        .await
        .map_err(|e| classify("todo.repo.create", e))?;

        Ok(Todo::from(inserted))
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn create(&self, todo: Todo) -> Result<Todo, ServiceError> {
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| classify("todo.repo.create.begin", e))?;
        let outcome = self.insert(tx.conn(), todo).await;
        tx.resolve(outcome).await
    }

    async fn get_by_uuid(&self, id: Uuid) -> Result<Todo, ServiceError> {
        let row: TodoRow = sqlx::query_as(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE uuid = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| classify("todo.repo.detail", e))?;

        Ok(Todo::from(row))
    }

    async fn get_list(&self, query: &TodoListQuery) -> Result<TodoList, ServiceError> {
        let qp = &query.base;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM todos");
        push_filters(&mut count, qp.search());
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| classify("todo.repo.list.count.total", e))?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {TODO_COLUMNS} FROM todos"));
        push_filters(&mut select, qp.search());
        select
            .push(format!(" ORDER BY {} {}", sort_column(qp.sort()), sort_order(qp.order())))
            .push(" OFFSET ")
            .push_bind(qp.offset() as i64)
            .push(" LIMIT ")
            .push_bind(i64::from(qp.limit()));

        let rows: Vec<TodoRow> = select
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| classify("todo.repo.list", e))?;

        Ok(TodoList::from_db(rows, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, search: &str) {
    qb.push(" WHERE deleted_at IS NULL");
    if !search.is_empty() {
        qb.push(" AND description LIKE ").push_bind(format!("%{search}%"));
    }
}

/// Only whitelisted identifiers ever reach the ORDER BY clause.
fn sort_column(sort: &str) -> &'static str {
    SORTABLE
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(sort))
        .unwrap_or("created_at")
}

fn sort_order(order: &str) -> &'static str {
    if order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    }
}

/// Logs the storage error under `scope` and maps it to a status kind.
/// The storage error itself never leaves the repository.
fn classify(scope: &'static str, err: sqlx::Error) -> ServiceError {
    tracing::error!(scope, error = %err, "repository error");
    match &err {
        sqlx::Error::RowNotFound => ServiceError::not_found(),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServiceError::new(StatusKind::ItemExist)
        }
        _ => ServiceError::new(StatusKind::Failed),
    }
}
