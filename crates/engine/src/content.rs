//! Read-only content shown on the public site: courses, their lessons and
//! blog posts. Rows are seeded by operators; the engine never mutates them.

use chrono::{DateTime, Utc};

pub(crate) mod courses {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "courses")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(unique)]
        pub slug: String,
        pub title: String,
        pub description: Option<String>,
        pub image: Option<String>,
        pub featured: bool,
        pub published_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::lessons::Entity")]
        Lessons,
    }

    impl Related<super::lessons::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Lessons.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub(crate) mod lessons {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "lessons")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub course_id: String,
        pub slug: String,
        pub title: String,
        pub content: String,
        pub position: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::courses::Entity",
            from = "Column::CourseId",
            to = "super::courses::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        Course,
    }

    impl Related<super::courses::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Course.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub(crate) mod blogs {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "blogs")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(unique)]
        pub slug: String,
        pub title: String,
        pub summary: Option<String>,
        pub body: String,
        pub featured: bool,
        pub published_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub published_at: DateTime<Utc>,
}

impl From<courses::Model> for Course {
    fn from(model: courses::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            description: model.description,
            image: model.image,
            featured: model.featured,
            published_at: model.published_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub position: i32,
}

impl From<lessons::Model> for Lesson {
    fn from(model: lessons::Model) -> Self {
        Self {
            id: model.id,
            course_id: model.course_id,
            slug: model.slug,
            title: model.title,
            content: model.content,
            position: model.position,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blog {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub featured: bool,
    pub published_at: DateTime<Utc>,
}

impl From<blogs::Model> for Blog {
    fn from(model: blogs::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            summary: model.summary,
            body: model.body,
            featured: model.featured,
            published_at: model.published_at,
        }
    }
}
