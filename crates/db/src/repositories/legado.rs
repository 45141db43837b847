//! Legacy audit repository.
//!
//! `legados` rows are append-only: the `"Legado"` category hook inserts one
//! inside the same transaction as the transfer it audits, and nothing ever
//! updates or deletes them.

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::legados;

/// Legacy audit repository for read access.
#[derive(Debug, Clone)]
pub struct LegadoRepository {
    db: DatabaseConnection,
}

impl LegadoRepository {
    /// Creates a new legado repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the audit records granted to a student, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<legados::Model>, DbErr> {
        legados::Entity::find()
            .filter(legados::Column::StudentId.eq(student_id))
            .order_by_desc(legados::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

/// Inserts an audit row, on any connection.
///
/// Called by the category hook inside the ledger transaction so the audit
/// commits or rolls back atomically with the transfer.
pub(crate) async fn insert_legado<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    grantor_id: Uuid,
    rule_id: Option<Uuid>,
    description: String,
) -> Result<legados::Model, DbErr> {
    let now = chrono::Utc::now().into();
    let model = legados::ActiveModel {
        id: Set(Uuid::now_v7()),
        student_id: Set(student_id),
        grantor_id: Set(grantor_id),
        rule_id: Set(rule_id),
        description: Set(description),
        created_at: Set(now),
    };

    model.insert(conn).await
}
