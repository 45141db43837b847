//! Discipline lookups for the per-discipline limit gate.
//!
//! Disciplines and enrollments are owned by the school-administration
//! subsystem; the ledger only reads them.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;
use valcoin_core::rules::types::DisciplineSnapshot;
use valcoin_shared::types::DisciplineId;

use crate::entities::{discipline_enrollments, disciplines};

/// Loads the applicability snapshot for a discipline, on any connection.
pub(crate) async fn load_snapshot<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<DisciplineSnapshot>, DbErr> {
    let discipline = disciplines::Entity::find_by_id(id).one(conn).await?;
    Ok(discipline.map(|d| DisciplineSnapshot {
        id: DisciplineId::from_uuid(d.id),
        is_active: d.is_active,
    }))
}

/// Returns true when the student holds an active enrollment in the discipline.
pub(crate) async fn is_enrolled<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    discipline_id: Uuid,
) -> Result<bool, DbErr> {
    let count = discipline_enrollments::Entity::find()
        .filter(discipline_enrollments::Column::StudentId.eq(student_id))
        .filter(discipline_enrollments::Column::DisciplineId.eq(discipline_id))
        .filter(discipline_enrollments::Column::IsActive.eq(true))
        .count(conn)
        .await?;

    Ok(count > 0)
}
