use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A lending transaction. `returned_at == None` marks an outstanding loan;
/// at most one outstanding loan may exist per copy (partial unique index
/// `ux_loans_active_per_copy`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub borrowed_at: DateTimeUtc,
    pub due_date: Date,
    pub returned_at: Option<DateTimeUtc>,
    pub book_copy_id: i32,
    pub reader_id: i32,
}

impl Model {
    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book_copy::Entity",
        from = "Column::BookCopyId",
        to = "super::book_copy::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BookCopy,
    #[sea_orm(
        belongs_to = "super::reader::Entity",
        from = "Column::ReaderId",
        to = "super::reader::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Reader,
}

impl Related<super::book_copy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookCopy.def()
    }
}

impl Related<super::reader::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
