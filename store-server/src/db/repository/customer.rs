//! Customer profile repository
//!
//! Profiles are keyed by the identity uid. Customer code assignment
//! is write-once: the conditional UPSERT only fires while the field
//! holds no valid code, so a retried or concurrent assignment always
//! settles on the first valid code ever written.

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{CustomerProfile, CustomerProfileUpsert};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use validator::Validate;

const PROFILE_TABLE: &str = "profile";

#[derive(Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All profiles, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<CustomerProfile>> {
        let profiles: Vec<CustomerProfile> = self
            .base
            .db()
            .query("SELECT * FROM profile ORDER BY createdAt DESC")
            .await?
            .take(0)?;
        Ok(profiles)
    }

    pub async fn find_by_uid(&self, uid: &str) -> RepoResult<Option<CustomerProfile>> {
        let pure_uid = strip_table_prefix(PROFILE_TABLE, uid);
        let profile: Option<CustomerProfile> =
            self.base.db().select((PROFILE_TABLE, pure_uid)).await?;
        Ok(profile)
    }

    /// Look a profile up by email or phone. Guest checkouts have no
    /// uid, so deactivation is enforced by contact match instead.
    pub async fn find_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> RepoResult<Option<CustomerProfile>> {
        if email.is_none() && phone.is_none() {
            return Ok(None);
        }
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM profile \
                 WHERE ($email != NONE AND email = $email) \
                    OR ($phone != NONE AND phone = $phone) \
                 LIMIT 1",
            )
            .bind(("email", email.map(str::to_string)))
            .bind(("phone", phone.map(str::to_string)))
            .await?;
        let profiles: Vec<CustomerProfile> = result.take(0)?;
        Ok(profiles.into_iter().next())
    }

    /// Merge caller-editable fields into the caller's own profile,
    /// creating it on first contact.
    pub async fn upsert(
        &self,
        uid: &str,
        data: CustomerProfileUpsert,
    ) -> RepoResult<CustomerProfile> {
        data.validate()
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let mut merge = serde_json::to_value(&data)
            .map_err(|e| RepoError::Validation(format!("Unserializable profile: {e}")))?;
        if let Some(map) = merge.as_object_mut() {
            map.insert("updatedAt".into(), chrono::Utc::now().to_rfc3339().into());
        }

        let pure_uid = strip_table_prefix(PROFILE_TABLE, uid).to_string();
        let mut result = self
            .base
            .db()
            .query(
                "UPSERT type::thing('profile', $uid) SET \
                     createdAt = (createdAt ?? $now), \
                     isActive = (isActive ?? true); \
                 UPDATE type::thing('profile', $uid) MERGE $data RETURN AFTER",
            )
            .bind(("uid", pure_uid))
            .bind(("data", merge))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;

        let profiles: Vec<CustomerProfile> = result.take(1)?;
        profiles
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("profile upsert returned no record".into()))
    }

    /// Write a customer code onto a profile only if it does not hold
    /// a valid one yet.
    ///
    /// Returns the code now on the profile, which is the existing one
    /// when the conditional write did not fire. A legacy value that is
    /// not a bare decimal string counts as absent and gets replaced.
    /// The caller allocates the candidate code before calling.
    pub async fn set_customer_code_once(&self, uid: &str, code: &str) -> RepoResult<String> {
        let pure_uid = strip_table_prefix(PROFILE_TABLE, uid).to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let mut result = self
            .base
            .db()
            .query(
                "UPSERT type::thing('profile', $uid) \
                 SET customerCode = (IF customerCode != NONE \
                         AND customerCode != '' \
                         AND string::is::numeric(customerCode) \
                     THEN customerCode ELSE $code END), \
                     updatedAt = $now, \
                     createdAt = (createdAt ?? $now), \
                     isActive = (isActive ?? true) \
                 RETURN VALUE customerCode",
            )
            .bind(("uid", pure_uid))
            .bind(("code", code.to_string()))
            .bind(("now", now))
            .await?;

        let codes: Vec<String> = result.take(0)?;
        codes
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("customer code assignment returned no value".into()))
    }

    /// Owner toggle for whether a customer may place new orders
    pub async fn set_active(&self, uid: &str, active: bool) -> RepoResult<CustomerProfile> {
        let pure_uid = strip_table_prefix(PROFILE_TABLE, uid).to_string();
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE type::thing('profile', $uid) \
                 SET isActive = $active, updatedAt = $now RETURN AFTER",
            )
            .bind(("uid", pure_uid))
            .bind(("active", active))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;

        let profiles: Vec<CustomerProfile> = result.take(0)?;
        profiles
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Profile {uid}")))
    }
}
