//! Insight/tag association (many-to-many join table).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "insight_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub insight_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::insight::Entity",
        from = "Column::InsightId",
        to = "super::insight::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Insight,
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Tag,
}

impl Related<super::insight::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Insight.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
