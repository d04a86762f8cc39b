//! Public content API consumed by the site front end.

use api_types::content::{BlogView, ContentQuery, CourseView, LessonView};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState};

fn map_course(course: engine::Course) -> CourseView {
    CourseView {
        slug: course.slug,
        title: course.title,
        description: course.description,
        image: course.image,
        featured: course.featured,
        published_at: course.published_at,
    }
}

fn map_lesson(lesson: engine::Lesson) -> LessonView {
    LessonView {
        slug: lesson.slug,
        title: lesson.title,
        content: lesson.content,
        position: lesson.position,
    }
}

fn map_blog(blog: engine::Blog) -> BlogView {
    BlogView {
        slug: blog.slug,
        title: blog.title,
        summary: blog.summary,
        body: blog.body,
        featured: blog.featured,
        published_at: blog.published_at,
    }
}

pub async fn blogs(State(state): State<ServerState>) -> Result<Json<Vec<BlogView>>, ServerError> {
    let blogs = state.engine.blogs().await?;
    Ok(Json(blogs.into_iter().map(map_blog).collect()))
}

pub async fn home_blogs(
    State(state): State<ServerState>,
) -> Result<Json<Vec<BlogView>>, ServerError> {
    let blogs = state.engine.home_blogs().await?;
    Ok(Json(blogs.into_iter().map(map_blog).collect()))
}

pub async fn blog_detail(
    State(state): State<ServerState>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<BlogView>, ServerError> {
    let blog = state.engine.blog(&query.url).await?;
    Ok(Json(map_blog(blog)))
}

pub async fn courses(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CourseView>>, ServerError> {
    let courses = state.engine.courses().await?;
    Ok(Json(courses.into_iter().map(map_course).collect()))
}

pub async fn home_courses(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CourseView>>, ServerError> {
    let courses = state.engine.home_courses().await?;
    Ok(Json(courses.into_iter().map(map_course).collect()))
}

pub async fn course_detail(
    State(state): State<ServerState>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<CourseView>, ServerError> {
    let course = state.engine.course(&query.url).await?;
    Ok(Json(map_course(course)))
}

pub async fn lessons_by_course(
    State(state): State<ServerState>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<LessonView>>, ServerError> {
    let lessons = state.engine.lessons_by_course(&query.url).await?;
    Ok(Json(lessons.into_iter().map(map_lesson).collect()))
}
