//! Document backend: typed collections held in process.
//!
//! Records are projected to JSON documents for filtering and ordering, so
//! the same `Filter` drives both this store and PostgreSQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::models::{Alumnus, AlumnusChanges, EmploymentInput, EmploymentRecord, NewAlumnus, Role};
use super::store::{Store, StoreError};
use crate::clock::Clock;
use crate::filter::Filter;
use crate::query::{aggregate, EmploymentStatusQuery, EmploymentStatusView};

#[derive(Default)]
struct Collections {
    alumni: BTreeMap<i64, Alumnus>,
    employment: BTreeMap<i64, EmploymentRecord>,
    roles: BTreeMap<i64, Role>,
    last_alumni_id: i64,
    last_employment_id: i64,
    last_role_id: i64,
}

impl Collections {
    fn check_alumnus_unique(&self, student_number: &str, email: &str, except: Option<i64>) -> Result<(), StoreError> {
        for other in self.alumni.values().filter(|a| Some(a.id) != except) {
            if other.student_number == student_number {
                return Err(StoreError::Conflict(format!("student number {} already exists", student_number)));
            }
            if other.email == email {
                return Err(StoreError::Conflict(format!("email {} already exists", email)));
            }
        }
        Ok(())
    }

    fn check_role_name_unique(&self, name: &str, except: Option<i64>) -> Result<(), StoreError> {
        if self.roles.values().any(|r| r.name == name && Some(r.id) != except) {
            return Err(StoreError::Conflict(format!("role {} already exists", name)));
        }
        Ok(())
    }
}

pub struct MemoryStore {
    inner: RwLock<Collections>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Empty store with the `admin` and `user` roles (ids 1 and 2).
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let mut collections = Collections::default();
        for name in ["admin", "user"] {
            collections.last_role_id += 1;
            let id = collections.last_role_id;
            collections.roles.insert(id, Role { id, name: name.to_string() });
        }
        Self { inner: RwLock::new(collections), clock }
    }
}

fn to_document<T: Serialize>(row: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Query("row did not serialize to an object".to_string())),
        Err(e) => Err(StoreError::Query(e.to_string())),
    }
}

/// Evaluates `filter` over `rows` keyed by id and returns clones of the
/// selected page.
fn select<T: Serialize + Clone>(filter: &Filter, rows: &BTreeMap<i64, T>) -> Result<(Vec<T>, i64), StoreError> {
    let docs = rows.values().map(to_document).collect::<Result<Vec<_>, _>>()?;
    let (page, total) = filter.apply(docs)?;
    let items = page
        .iter()
        .filter_map(|doc| doc.get("id").and_then(Value::as_i64))
        .filter_map(|id| rows.get(&id).cloned())
        .collect();
    Ok((items, total))
}

fn employment_from_input(id: i64, input: EmploymentInput, at: DateTime<Utc>) -> EmploymentRecord {
    EmploymentRecord {
        id,
        alumni_id: input.alumni_id,
        company: input.company,
        position: input.position,
        industry: input.industry,
        location: input.location,
        salary_range: input.salary_range,
        start_date: input.start_date,
        end_date: input.end_date,
        status: input.status,
        description: input.description,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_alumni(&self, filter: &Filter) -> Result<(Vec<Alumnus>, i64), StoreError> {
        let inner = self.inner.read().await;
        select(filter, &inner.alumni)
    }

    async fn get_alumnus(&self, id: i64) -> Result<Option<Alumnus>, StoreError> {
        Ok(self.inner.read().await.alumni.get(&id).cloned())
    }

    async fn get_alumnus_by_email(&self, email: &str) -> Result<Option<Alumnus>, StoreError> {
        Ok(self.inner.read().await.alumni.values().find(|a| a.email == email).cloned())
    }

    async fn create_alumnus(&self, alumnus: NewAlumnus) -> Result<Alumnus, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_alumnus_unique(&alumnus.student_number, &alumnus.email, None)?;
        if !inner.roles.contains_key(&alumnus.role_id) {
            return Err(StoreError::Conflict(format!("role {} does not exist", alumnus.role_id)));
        }

        let now = self.clock.now();
        inner.last_alumni_id += 1;
        let row = Alumnus {
            id: inner.last_alumni_id,
            student_number: alumnus.student_number,
            name: alumnus.name,
            major: alumnus.major,
            cohort: alumnus.cohort,
            graduation_year: alumnus.graduation_year,
            email: alumnus.email,
            phone: alumnus.phone,
            address: alumnus.address,
            password_hash: alumnus.password_hash,
            role_id: alumnus.role_id,
            created_at: now,
            updated_at: now,
        };
        inner.alumni.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_alumnus(&self, id: i64, changes: AlumnusChanges) -> Result<Option<Alumnus>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(mut updated) = inner.alumni.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply_to(&mut updated);
        inner.check_alumnus_unique(&updated.student_number, &updated.email, Some(id))?;
        if !inner.roles.contains_key(&updated.role_id) {
            return Err(StoreError::Conflict(format!("role {} does not exist", updated.role_id)));
        }
        updated.updated_at = self.clock.now();
        inner.alumni.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_alumnus(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.alumni.remove(&id).is_none() {
            return Ok(false);
        }
        inner.employment.retain(|_, record| record.alumni_id != id);
        Ok(true)
    }

    async fn find_employment(&self, filter: &Filter) -> Result<(Vec<EmploymentRecord>, i64), StoreError> {
        let inner = self.inner.read().await;
        select(filter, &inner.employment)
    }

    async fn get_employment(&self, id: i64) -> Result<Option<EmploymentRecord>, StoreError> {
        Ok(self.inner.read().await.employment.get(&id).cloned())
    }

    async fn create_employment(&self, input: EmploymentInput) -> Result<EmploymentRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.alumni.contains_key(&input.alumni_id) {
            return Err(StoreError::Conflict(format!("alumnus {} does not exist", input.alumni_id)));
        }
        inner.last_employment_id += 1;
        let record = employment_from_input(inner.last_employment_id, input, self.clock.now());
        inner.employment.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_employment(&self, id: i64, input: EmploymentInput) -> Result<Option<EmploymentRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.alumni.contains_key(&input.alumni_id) {
            return Err(StoreError::Conflict(format!("alumnus {} does not exist", input.alumni_id)));
        }
        let Some(existing) = inner.employment.get(&id).filter(|r| !r.is_deleted()) else {
            return Ok(None);
        };
        let mut updated = employment_from_input(id, input, self.clock.now());
        updated.created_at = existing.created_at;
        inner.employment.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_employment_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Option<EmploymentRecord>, StoreError> {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;
        Ok(inner.employment.get_mut(&id).map(|record| {
            record.deleted_at = deleted_at;
            record.updated_at = now;
            record.clone()
        }))
    }

    async fn delete_employment(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.employment.remove(&id).is_some())
    }

    async fn employment_status(
        &self,
        query: &EmploymentStatusQuery,
    ) -> Result<(Vec<EmploymentStatusView>, i64), StoreError> {
        let filter = query.filter()?;
        let inner = self.inner.read().await;
        let alumni: Vec<Alumnus> = inner.alumni.values().cloned().collect();
        let records: Vec<EmploymentRecord> = inner.employment.values().cloned().collect();
        drop(inner);

        let views: BTreeMap<i64, EmploymentStatusView> =
            aggregate(&alumni, &records, query.threshold).into_iter().map(|v| (v.id, v)).collect();
        select(&filter, &views)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.inner.read().await.roles.values().cloned().collect())
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.read().await.roles.get(&id).cloned())
    }

    async fn create_role(&self, name: &str) -> Result<Role, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_role_name_unique(name, None)?;
        inner.last_role_id += 1;
        let role = Role { id: inner.last_role_id, name: name.to_string() };
        inner.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_role_name_unique(name, Some(id))?;
        Ok(inner.roles.get_mut(&id).map(|role| {
            role.name = name.to_string();
            role.clone()
        }))
    }

    async fn delete_role(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.alumni.values().any(|a| a.role_id == id) {
            return Err(StoreError::Conflict(format!("role {} is still assigned to alumni", id)));
        }
        Ok(inner.roles.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::models::EmploymentStatus;
    use crate::query::{Entity, ListQuery, ListSpec};
    use chrono::TimeZone;

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())))
    }

    fn new_alumnus(n: i64, name: &str) -> NewAlumnus {
        NewAlumnus {
            student_number: format!("NIM{:03}", n),
            name: name.to_string(),
            major: "Informatics".to_string(),
            cohort: 2018,
            graduation_year: 2022,
            email: format!("alum{}@example.com", n),
            phone: None,
            address: None,
            password_hash: "x".to_string(),
            role_id: 2,
        }
    }

    fn job(alumni_id: i64, company: &str, start: &str) -> EmploymentInput {
        EmploymentInput {
            alumni_id,
            company: company.to_string(),
            position: "Engineer".to_string(),
            industry: "Technology".to_string(),
            location: "Jakarta".to_string(),
            salary_range: None,
            start_date: start.parse().unwrap(),
            end_date: None,
            status: EmploymentStatus::Active,
            description: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = store();
        store.create_alumnus(new_alumnus(1, "A")).await.unwrap();
        let mut dup = new_alumnus(2, "B");
        dup.email = "alum1@example.com".to_string();
        assert!(matches!(store.create_alumnus(dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn listing_hides_soft_deleted_employment() {
        let store = store();
        let alum = store.create_alumnus(new_alumnus(1, "A")).await.unwrap();
        let first = store.create_employment(job(alum.id, "Acme", "2024-01-01")).await.unwrap();
        store.create_employment(job(alum.id, "Globex", "2024-02-01")).await.unwrap();
        store.set_employment_deleted_at(first.id, Some(Utc::now())).await.unwrap();

        let spec = ListSpec::build(
            Entity::Employment,
            &ListQuery { page: 1, limit: 10, sort_by: String::new(), order: String::new(), search: String::new() },
        );
        let (items, total) = store.find_employment(&spec.filter().unwrap()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].company, "Globex");
    }

    #[tokio::test]
    async fn deleting_alumnus_removes_its_employment() {
        let store = store();
        let alum = store.create_alumnus(new_alumnus(1, "A")).await.unwrap();
        let record = store.create_employment(job(alum.id, "Acme", "2024-01-01")).await.unwrap();
        assert!(store.delete_alumnus(alum.id).await.unwrap());
        assert!(store.get_employment(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn referenced_role_cannot_be_deleted() {
        let store = store();
        store.create_alumnus(new_alumnus(1, "A")).await.unwrap();
        assert!(matches!(store.delete_role(2).await, Err(StoreError::Conflict(_))));
        let spare = store.create_role("auditor").await.unwrap();
        assert!(store.delete_role(spare.id).await.unwrap());
    }
}
