mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn tags_are_listed_and_browsable() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&editor_token)
        .json(&json!({
            "section": "personalities",
            "title": "Profile Of A Chef",
            "body": "Cooking since 1990.",
            "news_image": "https://cdn.example.com/chef.jpg",
            "tags": ["Food Culture", "Profiles"]
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let published_id = body["data"]["id"].as_i64().unwrap();
    common::set_status(&app, &editor_token, published_id, "published").await;

    // A draft with the same tag is not listed under it
    app.client
        .post(app.url("/articles"))
        .bearer_auth(&editor_token)
        .json(&json!({
            "section": "personalities",
            "title": "Unpublished Chef",
            "body": "Soon.",
            "news_image": "https://cdn.example.com/chef2.jpg",
            "tags": ["food culture"]
        }))
        .send()
        .await
        .unwrap();

    let resp = app.client.get(app.url("/tags")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let tags = body["data"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["name"], "food culture");
    assert_eq!(tags[0]["slug"], "food-culture");

    let resp = app
        .client
        .get(app.url("/tags/food-culture/articles"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["tag"]["name"], "food culture");
    assert_eq!(body["data"]["articles"]["total"], 1);
    assert_eq!(body["data"]["articles"]["items"][0]["id"], published_id);
}

#[tokio::test]
async fn unknown_tag_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/tags/nothing-here/articles"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn tag_names_with_the_same_slug_are_merged() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&editor_token)
        .json(&json!({
            "section": "sciences",
            "title": "Systems Languages Compared",
            "body": "Two languages, one tag.",
            "news_image": "https://cdn.example.com/lang.jpg",
            "tags": ["c++", "c#"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let tags = body["data"]["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0], "c++");

    let resp = app.client.get(app.url("/tags")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["slug"], "c");
}
