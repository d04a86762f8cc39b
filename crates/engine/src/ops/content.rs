use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Blog, Course, EngineError, Lesson, ResultEngine,
    content::{blogs, courses, lessons},
};

use super::Engine;

/// How many featured items the home page shows.
const HOME_LIMIT: u64 = 4;

impl Engine {
    /// Every published course, newest first.
    pub async fn courses(&self) -> ResultEngine<Vec<Course>> {
        Ok(courses::Entity::find()
            .order_by_desc(courses::Column::PublishedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Course::from)
            .collect())
    }

    /// Featured courses for the home page.
    pub async fn home_courses(&self) -> ResultEngine<Vec<Course>> {
        Ok(courses::Entity::find()
            .filter(courses::Column::Featured.eq(true))
            .order_by_desc(courses::Column::PublishedAt)
            .limit(HOME_LIMIT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Course::from)
            .collect())
    }

    pub async fn course(&self, slug: &str) -> ResultEngine<Course> {
        courses::Entity::find()
            .filter(courses::Column::Slug.eq(slug))
            .one(&self.database)
            .await?
            .map(Course::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("course {slug}")))
    }

    /// Lessons of the course identified by `slug`, in reading order.
    pub async fn lessons_by_course(&self, slug: &str) -> ResultEngine<Vec<Lesson>> {
        let course = self.course(slug).await?;
        Ok(lessons::Entity::find()
            .filter(lessons::Column::CourseId.eq(course.id))
            .order_by_asc(lessons::Column::Position)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Lesson::from)
            .collect())
    }

    /// Every published blog post, newest first.
    pub async fn blogs(&self) -> ResultEngine<Vec<Blog>> {
        Ok(blogs::Entity::find()
            .order_by_desc(blogs::Column::PublishedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Blog::from)
            .collect())
    }

    /// Featured posts for the home page.
    pub async fn home_blogs(&self) -> ResultEngine<Vec<Blog>> {
        Ok(blogs::Entity::find()
            .filter(blogs::Column::Featured.eq(true))
            .order_by_desc(blogs::Column::PublishedAt)
            .limit(HOME_LIMIT)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Blog::from)
            .collect())
    }

    pub async fn blog(&self, slug: &str) -> ResultEngine<Blog> {
        blogs::Entity::find()
            .filter(blogs::Column::Slug.eq(slug))
            .one(&self.database)
            .await?
            .map(Blog::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("blog {slug}")))
    }
}
