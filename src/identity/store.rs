//! Postgres-backed identity lookup

use crate::identity::IdentityLookup;
use crate::types::{Eligibility, UserId};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::warn;

/// Row shape of the `members` lookup table
#[derive(Debug, FromRow)]
struct MemberRow {
    chat_user_id: i64,
    verified: bool,
    affiliation: Option<String>,
}

/// sqlx implementation of `IdentityLookup`
///
/// Each call runs a single-row query scoped through the pool; no connection
/// is held between calls. Query errors are logged and collapsed into the
/// miss / not-eligible result per the fail-closed contract.
pub struct PgIdentityLookup {
    pool: PgPool,
}

impl PgIdentityLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool to the member store
    pub async fn connect(database_url: &str) -> crate::error::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl IdentityLookup for PgIdentityLookup {
    async fn resolve_chat_user(&self, platform_id: &str) -> Option<UserId> {
        let result = sqlx::query_as::<_, MemberRow>(
            "SELECT chat_user_id, verified, affiliation FROM members \
             WHERE platform_player_id = $1",
        )
        .bind(platform_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => row.map(|member| UserId(member.chat_user_id as u64)),
            Err(e) => {
                warn!(
                    "Identity query failed for platform id {}, treating as miss: {}",
                    platform_id, e
                );
                None
            }
        }
    }

    async fn check_eligibility(&self, user: UserId) -> Eligibility {
        let result = sqlx::query_as::<_, MemberRow>(
            "SELECT chat_user_id, verified, affiliation FROM members \
             WHERE chat_user_id = $1",
        )
        .bind(user.0 as i64)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(member)) => Eligibility {
                eligible: member.verified,
                affiliation: member.affiliation,
            },
            Ok(None) => Eligibility::default(),
            Err(e) => {
                warn!(
                    "Eligibility query failed for user {}, treating as not eligible: {}",
                    user, e
                );
                Eligibility::default()
            }
        }
    }
}
