use anyhow::Result;
use axum::http::StatusCode;
use serde_json::Value;

mod common;

use common::request_utils::{as_user, location};
use common::server_utils::create_test_server;
use common::{seed, test_utils};

#[tokio::test]
async fn test_anonymous_like_redirects_to_login() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    let response = server.post("/article/hello-world/like/").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "/accounts/login/?next=%2Farticle%2Fhello-world%2Flike%2F"
    );

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_likes(&mut conn, article.id), 0);
    Ok(())
}

#[tokio::test]
async fn test_anonymous_get_like_redirects_to_login() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    let response = server.get("/article/hello-world/like/").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "/accounts/login/?next=%2Farticle%2Fhello-world%2Flike%2F"
    );

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_likes(&mut conn, article.id), 0);
    Ok(())
}

#[tokio::test]
async fn test_anonymous_dislike_redirects_to_login() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    let response = server.get("/article/hello-world/dislike/").await;
    response.assert_status(StatusCode::FOUND);
    assert!(location(&response).starts_with("/accounts/login/?next="));

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_dislikes(&mut conn, article.id), 0);
    Ok(())
}

#[tokio::test]
async fn test_like_redirects_to_article() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let bob = seed::user(&db, "bob").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    let response = as_user(server.post("/article/hello-world/like/"), "bob").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/article/hello-world/");

    {
        let mut conn = db.lock().unwrap();
        let likes = test_utils::likes_for(&mut conn, article.id);
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].user_id, bob.id);
    }

    let body: Value = server.get("/article/hello-world/").await.json();
    assert_eq!(body["likes"], 1);
    assert_eq!(body["popularity_score"], -1);
    Ok(())
}

#[tokio::test]
async fn test_repeated_like_renders_article_without_recording() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    seed::user(&db, "bob").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    as_user(server.post("/article/hello-world/like/"), "bob")
        .await
        .assert_status(StatusCode::FOUND);

    let response = as_user(server.post("/article/hello-world/like/"), "bob").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["article"]["slug"], "hello-world");
    assert_eq!(body["likes"], 1);

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_likes(&mut conn, article.id), 1);
    Ok(())
}

#[tokio::test]
async fn test_like_accepts_get() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    as_user(server.get("/article/hello-world/like/"), "alice")
        .await
        .assert_status(StatusCode::FOUND);

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_likes(&mut conn, article.id), 1);
    Ok(())
}

#[tokio::test]
async fn test_dislike_redirects_even_when_repeated() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let bob = seed::user(&db, "bob").await;
    let article = seed::article(&db, &alice, "Hello World", true, 1).await;

    for _ in 0..2 {
        let response = as_user(server.post("/article/hello-world/dislike/"), "bob").await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(location(&response), "/article/hello-world/");
    }

    let mut conn = db.lock().unwrap();
    let dislikes = test_utils::dislikes_for(&mut conn, article.id);
    assert_eq!(dislikes.len(), 1);
    assert_eq!(dislikes[0].user_id, bob.id);
    Ok(())
}

#[tokio::test]
async fn test_like_and_dislike_can_coexist() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    seed::user(&db, "bob").await;
    seed::article(&db, &alice, "Hello World", true, 1).await;

    as_user(server.post("/article/hello-world/like/"), "bob")
        .await
        .assert_status(StatusCode::FOUND);
    as_user(server.post("/article/hello-world/dislike/"), "bob")
        .await
        .assert_status(StatusCode::FOUND);

    let body: Value = server.get("/article/hello-world/").await.json();
    assert_eq!(body["likes"], 1);
    assert_eq!(body["dislikes"], 1);
    assert_eq!(body["popularity_score"], 0);
    Ok(())
}

#[tokio::test]
async fn test_votes_on_missing_article_are_not_found() -> Result<()> {
    let (server, db) = create_test_server();
    seed::user(&db, "bob").await;

    as_user(server.post("/article/missing/like/"), "bob")
        .await
        .assert_status_not_found();
    as_user(server.post("/article/missing/dislike/"), "bob")
        .await
        .assert_status_not_found();
    Ok(())
}

#[tokio::test]
async fn test_drafts_can_be_voted_on() -> Result<()> {
    let (server, db) = create_test_server();
    let alice = seed::user(&db, "alice").await;
    let draft = seed::article(&db, &alice, "Unfinished", false, 1).await;

    let response = as_user(server.post("/article/unfinished/like/"), "alice").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/article/unfinished/");

    let mut conn = db.lock().unwrap();
    assert_eq!(test_utils::count_likes(&mut conn, draft.id), 1);
    Ok(())
}
