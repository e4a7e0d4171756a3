mod common;

use serde_json::{json, Value};

async fn post_comment(
    app: &common::TestApp,
    token: &str,
    article_id: &Value,
    parent_id: Option<i64>,
    body: &str,
) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/articles/{}/comments", article_id)))
        .bearer_auth(token)
        .json(&json!({ "body": body, "parent_id": parent_id }))
        .send()
        .await
        .unwrap()
}

async fn comment_id(resp: reqwest::Response) -> i64 {
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn comment_tree_nests_replies() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "news").await;

    let root = comment_id(post_comment(&app, &reader_token, &article["id"], None, "First!").await).await;
    let reply =
        comment_id(post_comment(&app, &editor_token, &article["id"], Some(root), "Thanks").await).await;
    comment_id(post_comment(&app, &reader_token, &article["id"], Some(reply), "Welcome").await).await;

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments", article["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["id"], root);
    assert_eq!(tree[0]["children"][0]["id"], reply);
    assert_eq!(tree[0]["children"][0]["children"][0]["body"], "Welcome");
}

#[tokio::test]
async fn cannot_comment_on_drafts() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let draft = common::create_draft(&app, &token, "news", "Quiet Draft").await;

    let resp = post_comment(&app, &token, &draft["id"], None, "Hello").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn reply_parent_must_be_in_same_article() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let first = common::create_published(&app, &editor_token, "news").await;
    let second = common::create_published(&app, &editor_token, "news").await;

    let root = comment_id(post_comment(&app, &editor_token, &first["id"], None, "On first").await).await;

    let resp = post_comment(&app, &editor_token, &second["id"], Some(root), "Cross").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn hiding_a_comment_hides_its_replies() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "crimes").await;

    let root = comment_id(post_comment(&app, &reader_token, &article["id"], None, "Rude").await).await;
    comment_id(post_comment(&app, &reader_token, &article["id"], Some(root), "Ruder").await).await;
    comment_id(post_comment(&app, &reader_token, &article["id"], None, "Polite").await).await;

    // Readers cannot moderate
    let resp = app
        .client
        .put(app.url(&format!("/comments/{}/active", root)))
        .bearer_auth(&reader_token)
        .json(&json!({ "active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/comments/{}/active", root)))
        .bearer_auth(&editor_token)
        .json(&json!({ "active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["body"], "Polite");

    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", root)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // No replies to hidden comments either
    let resp = post_comment(&app, &reader_token, &article["id"], Some(root), "Still?").await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn reactivating_a_parent_restores_its_active_replies() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "sports").await;

    let root = comment_id(post_comment(&app, &reader_token, &article["id"], None, "Offside?").await).await;
    let reply =
        comment_id(post_comment(&app, &reader_token, &article["id"], Some(root), "Clearly").await).await;

    for active in [false, true] {
        let resp = app
            .client
            .put(app.url(&format!("/comments/{}/active", root)))
            .bearer_auth(&editor_token)
            .json(&json!({ "active": active }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["id"], root);
    assert_eq!(tree[0]["children"][0]["id"], reply);

    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", root)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], reply);
}

#[tokio::test]
async fn replies_endpoint_lists_direct_children() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "sports").await;

    let root = comment_id(post_comment(&app, &editor_token, &article["id"], None, "Root").await).await;
    let child = comment_id(post_comment(&app, &editor_token, &article["id"], Some(root), "Child").await).await;
    comment_id(post_comment(&app, &editor_token, &article["id"], Some(child), "Grandchild").await).await;

    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", root)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let replies = body["data"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], child);
}

#[tokio::test]
async fn edit_comment_marks_edited() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "news").await;

    let id = comment_id(post_comment(&app, &reader_token, &article["id"], None, "Typo").await).await;

    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&editor_token)
        .json(&json!({ "body": "Not yours" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&reader_token)
        .json(&json!({ "body": "Fixed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["body"], "Fixed");
    assert_eq!(body["data"]["edited"], true);
}

#[tokio::test]
async fn deleting_a_comment_removes_replies() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let (_, other_token) = common::create_test_user(&app, "other").await;
    let article = common::create_published(&app, &editor_token, "news").await;

    let root = comment_id(post_comment(&app, &reader_token, &article["id"], None, "Root").await).await;
    comment_id(post_comment(&app, &other_token, &article["id"], Some(root), "Reply").await).await;

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", root)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Editors may delete any comment
    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", root)))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn like_and_dislike_are_mutually_exclusive() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "news").await;
    let id = comment_id(post_comment(&app, &editor_token, &article["id"], None, "Opinion").await).await;

    let react = |kind: &'static str| {
        let url = app.url(&format!("/comments/{}/{}", id, kind));
        let token = reader_token.clone();
        let client = app.client.clone();
        async move {
            let resp = client.post(url).bearer_auth(token).send().await.unwrap();
            assert_eq!(resp.status(), 200);
            let body: Value = resp.json().await.unwrap();
            body["data"].clone()
        }
    };

    let data = react("like").await;
    assert_eq!(data["reaction"], "like");
    assert_eq!(data["likes"], 1);
    assert_eq!(data["dislikes"], 0);

    let data = react("dislike").await;
    assert_eq!(data["reaction"], "dislike");
    assert_eq!(data["likes"], 0);
    assert_eq!(data["dislikes"], 1);

    let data = react("dislike").await;
    assert_eq!(data["reaction"], Value::Null);
    assert_eq!(data["dislikes"], 0);

    react("like").await;
    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["likes"], 1);
}

#[tokio::test]
async fn reacting_requires_auth() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "news").await;
    let id = comment_id(post_comment(&app, &editor_token, &article["id"], None, "Hi").await).await;

    let resp = app
        .client
        .post(app.url(&format!("/comments/{}/like", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn top_level_only_listing() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "news").await;

    let root = comment_id(post_comment(&app, &editor_token, &article["id"], None, "Root").await).await;
    comment_id(post_comment(&app, &editor_token, &article["id"], Some(root), "Reply").await).await;

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}/comments?replies=false", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert!(roots[0]["children"].as_array().unwrap().is_empty());
}
