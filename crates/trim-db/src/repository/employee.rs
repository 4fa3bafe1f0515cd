//! # Employee Repository
//!
//! Staff records. The employee's own schedule (working days, hours, breaks,
//! disabled dates) is stored as one JSON column next to the profile.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{new_id, parse_json, parse_timestamp, timestamp, to_json};
use crate::error::{DbError, DbResult};
use trim_core::{Employee, ScheduleSpec};

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: String,
    business_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    service_ids: String,
    schedule: String,
    created_at: String,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = DbError;

    fn try_from(row: EmployeeRow) -> DbResult<Self> {
        Ok(Employee {
            service_ids: parse_json("employees.service_ids", &row.service_ids)?,
            schedule: parse_json("employees.schedule", &row.schedule)?,
            created_at: parse_timestamp("employees.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    employee: EmployeeRow,
    password_hash: String,
}

/// An employee together with their password hash, for login only.
#[derive(Debug, Clone)]
pub struct EmployeeCredentials {
    pub employee: Employee,
    pub password_hash: String,
}

/// Editable employee fields. Disabled dates have their own update.
#[derive(Debug, Clone)]
pub struct EmployeeProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_ids: Vec<String>,
    pub schedule: ScheduleSpec,
}

const EMPLOYEE_COLUMNS: &str =
    "id, business_id, name, email, phone, service_ids, schedule, created_at";

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// ## Errors
    /// * `UniqueViolation` - email already used by another employee
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        business_id: &str,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        service_ids: &[String],
        schedule: &ScheduleSpec,
    ) -> DbResult<Employee> {
        let employee = Employee {
            id: new_id(),
            business_id: business_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            service_ids: service_ids.to_vec(),
            schedule: schedule.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO employees
                (id, business_id, name, email, phone, password_hash, service_ids, schedule, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.business_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(password_hash)
        .bind(to_json("employees.service_ids", &employee.service_ids)?)
        .bind(to_json("employees.schedule", &employee.schedule)?)
        .bind(timestamp(employee.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: email.to_string(),
            },
            other => other,
        })?;

        info!(employee_id = %employee.id, business_id = %business_id, "Employee created");
        Ok(employee)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Employee>> {
        let row: Option<EmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Employee::try_from).transpose()
    }

    pub async fn require(&self, id: &str) -> DbResult<Employee> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", id))
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Employee>> {
        let rows: Vec<EmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE business_id = ?1 ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(business_id = %business_id, count = rows.len(), "Listed employees");
        rows.into_iter().map(Employee::try_from).collect()
    }

    pub async fn credentials_by_email(&self, email: &str) -> DbResult<Option<EmployeeCredentials>> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {EMPLOYEE_COLUMNS}, password_hash FROM employees WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(EmployeeCredentials {
                employee: Employee::try_from(row.employee)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    /// Replaces profile and weekly schedule, keeping stored disabled dates.
    pub async fn update_profile(&self, id: &str, profile: EmployeeProfile) -> DbResult<Employee> {
        let mut employee = self.require(id).await?;

        let disabled_dates = std::mem::take(&mut employee.schedule.disabled_dates);
        employee.name = profile.name;
        employee.email = profile.email;
        employee.phone = profile.phone;
        employee.service_ids = profile.service_ids;
        employee.schedule = ScheduleSpec {
            disabled_dates,
            ..profile.schedule
        };

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?1, email = ?2, phone = ?3, service_ids = ?4, schedule = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(to_json("employees.service_ids", &employee.service_ids)?)
        .bind(to_json("employees.schedule", &employee.schedule)?)
        .bind(id)
        .execute(&self.pool)
        .await?;

        info!(employee_id = %id, "Employee updated");
        Ok(employee)
    }

    pub async fn set_disabled_dates(
        &self,
        id: &str,
        dates: &BTreeSet<NaiveDate>,
    ) -> DbResult<Employee> {
        let mut employee = self.require(id).await?;
        employee.schedule.disabled_dates = dates.clone();

        sqlx::query("UPDATE employees SET schedule = ?1 WHERE id = ?2")
            .bind(to_json("employees.schedule", &employee.schedule)?)
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(employee_id = %id, count = dates.len(), "Employee disabled dates updated");
        Ok(employee)
    }

    /// ## Errors
    /// * `ForeignKeyViolation` - bookings still reference the employee
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        info!(employee_id = %id, "Employee deleted");
        Ok(())
    }

    /// Deletes every listed employee of a business, or none of them.
    /// Repeated ids count once.
    ///
    /// ## Errors
    /// * `NotFound` - an id is unknown or belongs to another business;
    ///   nothing is deleted
    pub async fn delete_many(&self, business_id: &str, ids: &[String]) -> DbResult<u64> {
        let ids: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        let mut tx = self.pool.begin().await?;

        for id in ids.iter().copied() {
            let deleted = sqlx::query("DELETE FROM employees WHERE id = ?1 AND business_id = ?2")
                .bind(id)
                .bind(business_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(DbError::not_found("Employee", id));
            }
        }

        tx.commit().await?;
        info!(business_id = %business_id, count = ids.len(), "Employees deleted");
        Ok(ids.len() as u64)
    }
}
