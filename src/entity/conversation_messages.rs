use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "conversation_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub intent: Option<String>,
    pub entities: Option<Json>,
    pub tool_calls: Option<Json>,
    pub tool_results: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conversation_sessions::Entity",
        from = "Column::SessionId",
        to = "super::conversation_sessions::Column::Id"
    )]
    ConversationSessions,
}

impl Related<super::conversation_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConversationSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
