use std::time::Duration;

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use content_client::ContentClient;
use engine::Engine;
use mailer::Mailer;
use migration::MigratorTrait;
use server::ServerState;

async fn spawn_server() -> (String, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = server::spawn_with_listener(
        ServerState::new(engine, Mailer::log(), "http://ledgerly.test"),
        listener,
    )
    .unwrap();
    (format!("http://{addr}"), db)
}

async fn insert_course(db: &DatabaseConnection, id: &str, slug: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO courses (id, slug, title, featured, published_at) VALUES (?, ?, ?, ?, ?)",
        vec![
            id.into(),
            slug.into(),
            slug.to_uppercase().into(),
            false.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn lists_are_served_from_cache_within_ttl() {
    let (base, db) = spawn_server().await;
    insert_course(&db, "c1", "rust-basics").await;

    let client = ContentClient::builder(base).build();
    assert_eq!(client.courses().await.unwrap().len(), 1);

    insert_course(&db, "c2", "async-rust").await;
    // Still within the list TTL: no second request.
    assert_eq!(client.courses().await.unwrap().len(), 1);

    client.clear_cache().await;
    assert_eq!(client.courses().await.unwrap().len(), 2);
}

#[tokio::test]
async fn zero_ttl_disables_caching() {
    let (base, db) = spawn_server().await;
    let client = ContentClient::builder(base)
        .list_ttl(Duration::ZERO)
        .build();

    assert!(client.courses().await.unwrap().is_empty());
    insert_course(&db, "c1", "rust-basics").await;
    assert_eq!(client.courses().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_details_are_none() {
    let (base, db) = spawn_server().await;
    insert_course(&db, "c1", "rust-basics").await;
    let client = ContentClient::builder(base).build();

    let course = client.course_detail("rust-basics").await.unwrap().unwrap();
    assert_eq!(course.title, "RUST-BASICS");
    assert!(client.course_detail("missing").await.unwrap().is_none());
    assert!(client.blog_detail("missing").await.unwrap().is_none());
    assert!(client.lessons_by_course("missing").await.unwrap().is_none());
    assert_eq!(
        client.lessons_by_course("rust-basics").await.unwrap(),
        Some(Vec::new())
    );
    assert!(client.home_blogs().await.unwrap().is_empty());
}
