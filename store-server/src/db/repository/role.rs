//! Role repository
//!
//! One record per identity uid (`role:<uid>`), holding only the role
//! name. Absence of a record means the default role.

use super::{BaseRepository, RepoResult, strip_table_prefix};
use crate::auth::Role;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ROLE_TABLE: &str = "role";

#[derive(Debug, Deserialize)]
struct RoleRecord {
    role: Role,
}

#[derive(Clone)]
pub struct RoleRepository {
    base: BaseRepository,
}

impl RoleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// The explicit role on record for a uid, if any
    pub async fn find_role(&self, uid: &str) -> RepoResult<Option<Role>> {
        let pure_uid = strip_table_prefix(ROLE_TABLE, uid);
        let record: Option<RoleRecord> = self.base.db().select((ROLE_TABLE, pure_uid)).await?;
        Ok(record.map(|r| r.role))
    }

    pub async fn set_role(&self, uid: &str, role: Role) -> RepoResult<()> {
        let pure_uid = strip_table_prefix(ROLE_TABLE, uid).to_string();
        self.base
            .db()
            .query("UPSERT type::thing('role', $uid) SET role = $role")
            .bind(("uid", pure_uid))
            .bind(("role", role))
            .await?
            .check()?;
        Ok(())
    }
}
