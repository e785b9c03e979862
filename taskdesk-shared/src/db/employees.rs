use super::{fetch_all, fetch_optional, scope::{Live, LiveUpdate}, PgStore};
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::store::{EmployeeStore, StoreResult};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl EmployeeStore for PgStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (name, department, position, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.department)
        .bind(new.position)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn find_employee(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        let mut query = Live::select("*", "employees", "employees");
        query.and_eq("id", id);
        fetch_optional(&self.pool, query).await
    }

    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let mut query = Live::select("*", "employees", "employees");
        query.and_eq("email", email.to_string());
        fetch_optional(&self.pool, query).await
    }

    async fn list_employees(&self, department: Option<&str>) -> StoreResult<Vec<Employee>> {
        let mut query = Live::select("*", "employees", "employees");
        if let Some(department) = department {
            query.and_eq("department", department.to_string());
        }
        query.push(" ORDER BY name, id");
        fetch_all(&self.pool, query).await
    }

    async fn update_employee(
        &self,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let mut update = LiveUpdate::table("employees");
        if let Some(name) = changes.name {
            update.set("name", name);
        }
        if let Some(department) = changes.department {
            update.set("department", department);
        }
        if let Some(position) = changes.position {
            update.set("position", position);
        }
        if let Some(email) = changes.email {
            update.set("email", email);
        }

        let mut builder = update.where_id(id, " RETURNING *");
        Ok(builder
            .build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn soft_delete_employee(&self, id: Uuid) -> StoreResult<bool> {
        let mut update = LiveUpdate::table("employees");
        update.set_now("deleted_at");
        let mut builder = update.where_id(id, "");
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
