/// Soft-delete aware query builders
///
/// Every query against a soft-deletable table is built here, so the
/// `deleted_at IS NULL` predicate cannot be forgotten:
///
/// - [`Live::select`] starts a `SELECT` already filtered to live rows.
/// - [`LiveUpdate::table`] starts an `UPDATE` that can only touch live rows.
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::scope::Live;
/// use uuid::Uuid;
///
/// let mut query = Live::select("*", "tasks", "tasks");
/// query.and_eq("id", Uuid::nil());
///
/// assert_eq!(
///     query.sql(),
///     "SELECT * FROM tasks WHERE tasks.deleted_at IS NULL AND id = $1"
/// );
/// ```

use sqlx::{postgres::Postgres, Encode, QueryBuilder, Type};

/// `SELECT` restricted to rows whose `deleted_at` is unset
pub struct Live<'args> {
    builder: QueryBuilder<'args, Postgres>,
}

impl<'args> Live<'args> {
    /// `alias` is the table (or alias) whose `deleted_at` is checked
    pub fn select(columns: &str, from: &str, alias: &str) -> Self {
        let builder = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE {}.deleted_at IS NULL",
            columns, from, alias
        ));
        Self { builder }
    }

    /// Appends `AND column = $n`
    pub fn and_eq<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        self.and_cmp(column, "=", value)
    }

    /// Appends `AND column <op> $n`; `op` is trusted SQL
    pub fn and_cmp<T>(&mut self, column: &str, op: &str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        self.builder
            .push(" AND ")
            .push(column)
            .push(format!(" {} ", op))
            .push_bind(value);
        self
    }

    /// Appends raw SQL (ordering, locking clauses)
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.builder.push(sql);
        self
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub fn into_builder(self) -> QueryBuilder<'args, Postgres> {
        self.builder
    }
}

/// `UPDATE` restricted to a live row, always bumping `updated_at`
pub struct LiveUpdate<'args> {
    builder: QueryBuilder<'args, Postgres>,
    table: String,
}

impl<'args> LiveUpdate<'args> {
    pub fn table(table: &str) -> Self {
        let builder = QueryBuilder::new(format!("UPDATE {} SET updated_at = NOW()", table));
        Self {
            builder,
            table: table.to_string(),
        }
    }

    /// Appends `, column = $n`
    pub fn set<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        self.builder
            .push(", ")
            .push(column)
            .push(" = ")
            .push_bind(value);
        self
    }

    /// Appends `, column = NOW()`
    pub fn set_now(&mut self, column: &str) -> &mut Self {
        self.builder.push(", ").push(column).push(" = NOW()");
        self
    }

    /// Closes the statement with the live-row predicate, `id = $n`, and any
    /// `extra` conditions (already AND-prefixed SQL without binds)
    pub fn where_id<T>(mut self, id: T, extra: &str) -> QueryBuilder<'args, Postgres>
    where
        T: 'args + Encode<'args, Postgres> + Send + Type<Postgres>,
    {
        self.builder
            .push(format!(" WHERE {}.deleted_at IS NULL AND {}.id = ", self.table, self.table))
            .push_bind(id)
            .push(extra);
        self.builder
    }
}
