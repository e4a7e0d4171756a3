mod common;

use serde_json::{json, Value};

/// API path of an article's public detail route, derived from its canonical URL.
fn detail_path(article: &Value) -> String {
    let url = article["url"].as_str().unwrap();
    let path = url.strip_prefix(common::SITE_URL).unwrap();
    format!("/sections{}", path.trim_end_matches('/'))
}

#[tokio::test]
async fn create_article_starts_as_draft() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&json!({
            "section": "health-articles",
            "title": "Malaria Vaccine Rollout Begins",
            "body": "The *first* doses arrived.",
            "news_image": "https://cdn.example.com/a.jpg",
            "news_image_three": "https://cdn.example.com/c.jpg",
            "tags": ["Health", "health", "Vaccines"]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["status"], "draft");
    assert_eq!(data["user_id"], user_id);
    assert_eq!(data["slug"], "malaria-vaccine-rollout-begins");
    assert_eq!(data["section_name"], "Health Articles");
    assert_eq!(data["edited"], false);
    assert_eq!(data["images"].as_array().unwrap().len(), 2);
    assert!(data["body_html"].as_str().unwrap().contains("<em>first</em>"));
    let tags: Vec<&str> = data["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&"health"));
    assert!(data["url"]
        .as_str()
        .unwrap()
        .starts_with("https://news.example.com/health-articles/"));
}

#[tokio::test]
async fn create_article_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .json(&json!({
            "section": "sports",
            "title": "No token",
            "body": "x",
            "news_image": "https://cdn.example.com/a.jpg"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_article_requires_news_image() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&json!({
            "section": "sports",
            "title": "Missing image",
            "body": "x",
            "news_image": "not a url"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn too_many_tags_rejected() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&json!({
            "section": "sports",
            "title": "Tag storm",
            "body": "x",
            "news_image": "https://cdn.example.com/a.jpg",
            "tags": ["a", "b", "c", "d", "e", "f"]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn same_slug_same_day_conflicts() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;

    common::create_draft(&app, &token, "business", "Markets Rally").await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&token)
        .json(&json!({
            "section": "business",
            "title": "Markets Rally",
            "body": "again",
            "news_image": "https://cdn.example.com/a.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Another section is free to use the slug.
    let other = common::create_draft(&app, &token, "business-articles", "Markets Rally").await;
    assert_eq!(other["slug"], "markets-rally");
}

#[tokio::test]
async fn draft_is_hidden_from_the_public() {
    let app = common::spawn_app().await;
    let (_, author_token) = common::create_test_user(&app, "writer").await;
    let (_, other_token) = common::create_test_user(&app, "reader").await;
    let (_, editor_token) = common::create_editor(&app).await;

    let draft = common::create_draft(&app, &author_token, "campus", "Exam Timetable").await;
    let id = draft["id"].as_i64().unwrap();

    let anon = app
        .client
        .get(app.url(&format!("/articles/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(anon.status(), 404);

    let other = app
        .client
        .get(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), 404);

    let author = app
        .client
        .get(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(author.status(), 200);

    let editor = app
        .client
        .get(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(editor.status(), 200);

    let detail = app
        .client
        .get(app.url(&detail_path(&draft)))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), 404);
}

#[tokio::test]
async fn publishing_workflow() {
    let app = common::spawn_app().await;
    let (_, author_token) = common::create_test_user(&app, "writer").await;
    let (_, editor_token) = common::create_editor(&app).await;

    let draft = common::create_draft(&app, &author_token, "events", "Jazz Night").await;
    let id = draft["id"].as_i64().unwrap();

    // Only the author may submit
    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/submit", id)))
        .bearer_auth(&editor_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/submit", id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");

    // A pending article cannot be submitted twice
    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/submit", id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Authors cannot publish their own work
    let resp = app
        .client
        .put(app.url(&format!("/articles/{}/status", id)))
        .bearer_auth(&author_token)
        .json(&json!({ "status": "published" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    common::set_status(&app, &editor_token, id, "published").await;

    let resp = app
        .client
        .get(app.url("/sections/events/articles"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], id);
}

#[tokio::test]
async fn section_listing_is_published_only_and_newest_first() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;

    let older = common::create_published(&app, &editor_token, "foods").await;
    let newer = common::create_published(&app, &editor_token, "foods").await;
    common::create_draft(&app, &editor_token, "foods", "Unfinished Recipe").await;
    common::create_published(&app, &editor_token, "loves").await;

    let resp = app
        .client
        .get(app.url("/sections/foods/articles?page=1&per_page=10"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], newer["id"]);
    assert_eq!(items[1]["id"], older["id"]);
}

#[tokio::test]
async fn unknown_section_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/sections/weather/articles"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn list_sections_returns_all_in_order() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/sections")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let sections = body["data"].as_array().unwrap();
    assert_eq!(sections.len(), 24);
    assert_eq!(sections[0]["slug"], "crimes");
    assert_eq!(sections[23]["slug"], "events");
}

#[tokio::test]
async fn forwarded_clients_counted_separately_when_trusted() {
    let app = common::spawn_app_with_site(newsroom::config::site::SiteConfig {
        site_url: common::SITE_URL.to_string(),
        trust_forwarded_for: true,
        ..Default::default()
    })
    .await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "events").await;
    let path = detail_path(&article);

    let mut last = Value::Null;
    for client in ["198.51.100.1", "198.51.100.2", "198.51.100.1"] {
        let resp = app
            .client
            .get(app.url(&path))
            .header("X-Forwarded-For", client)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        last = resp.json().await.unwrap();
    }
    assert_eq!(last["data"]["hit_count"], 2);
}

#[tokio::test]
async fn forwarded_header_ignored_by_default() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "events").await;
    let path = detail_path(&article);

    let mut last = Value::Null;
    for client in ["198.51.100.1", "198.51.100.2"] {
        let resp = app
            .client
            .get(app.url(&path))
            .header("X-Forwarded-For", client)
            .send()
            .await
            .unwrap();
        last = resp.json().await.unwrap();
    }
    assert_eq!(last["data"]["hit_count"], 1);
}

#[tokio::test]
async fn detail_by_path_counts_one_hit_per_client() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let article = common::create_published(&app, &editor_token, "sciences").await;
    let path = detail_path(&article);

    let first = app.client.get(app.url(&path)).send().await.unwrap();
    assert_eq!(first.status(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["hit_count"], 1);

    let second = app.client.get(app.url(&path)).send().await.unwrap();
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["data"]["hit_count"], 1);

    // Reading by id does not count
    let by_id = app
        .client
        .get(app.url(&format!("/articles/{}", article["id"])))
        .send()
        .await
        .unwrap();
    let body: Value = by_id.json().await.unwrap();
    assert_eq!(body["data"]["hit_count"], 1);
}

#[tokio::test]
async fn detail_with_impossible_date_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/sections/sports/2024/02/31/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn update_marks_edited_and_replaces_tags() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let (_, stranger_token) = common::create_test_user(&app, "stranger").await;

    let draft = common::create_draft(&app, &token, "cultures", "Festival Season").await;
    let id = draft["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&stranger_token)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Festival Season Opens",
            "caption": "",
            "tags": ["Music"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["title"], "Festival Season Opens");
    // Slug is kept unless given explicitly
    assert_eq!(data["slug"], "festival-season");
    assert_eq!(data["edited"], true);
    assert_eq!(data["images"][0]["caption"], Value::Null);
    assert_eq!(data["tags"], json!(["music"]));
}

#[tokio::test]
async fn delete_article_by_author() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let (_, stranger_token) = common::create_test_user(&app, "stranger").await;

    let draft = common::create_draft(&app, &token, "howtos", "Fix A Bike").await;
    let id = draft["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&stranger_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn my_drafts_lists_only_own_drafts() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let (_, other_token) = common::create_test_user(&app, "other").await;

    common::create_draft(&app, &token, "celeb", "Red Carpet").await;
    let submitted = common::create_draft(&app, &token, "celeb", "Awards Recap").await;
    common::create_draft(&app, &other_token, "celeb", "Not Mine").await;

    app.client
        .post(app.url(&format!("/articles/{}/submit", submitted["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/articles/drafts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Red Carpet");
}

#[tokio::test]
async fn search_finds_published_matches() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;

    let published = common::create_draft(&app, &editor_token, "sciences", "Quantum Lagoon Discovery").await;
    common::set_status(&app, &editor_token, published["id"].as_i64().unwrap(), "published").await;
    common::create_draft(&app, &editor_token, "sciences", "Quantum Lagoon Draft").await;

    let resp = app
        .client
        .get(app.url("/search?q=lagoon"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], published["id"]);

    let resp = app
        .client
        .get(app.url("/search?q=lagoon&section=sports"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn paging_far_past_the_end_is_empty() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;

    let published = common::create_draft(&app, &editor_token, "sciences", "Lagoon Survey Results").await;
    common::set_status(&app, &editor_token, published["id"].as_i64().unwrap(), "published").await;

    for path in [
        "/search?q=lagoon&page=18446744073709551615",
        "/sections/sciences/articles?page=18446744073709551615&per_page=100",
    ] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["total"], 1);
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn empty_search_rejected() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/search?q=%20"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn share_published_article_without_smtp() {
    let app = common::spawn_app().await;
    let (_, editor_token) = common::create_editor(&app).await;
    let (_, reader_token) = common::create_test_user(&app, "reader").await;
    let article = common::create_published(&app, &editor_token, "internationals").await;

    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/share", article["id"])))
        .bearer_auth(&reader_token)
        .json(&json!({
            "name": "Ada",
            "to": "friend@example.com",
            "comments": "Worth a read"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["sent"], false);
    assert_eq!(
        body["data"]["subject"],
        format!("Ada recommends you read {}", article["title"].as_str().unwrap())
    );
}

#[tokio::test]
async fn share_rejects_drafts_and_bad_addresses() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "writer").await;
    let draft = common::create_draft(&app, &token, "news", "Not Yet").await;

    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/share", draft["id"])))
        .bearer_auth(&token)
        .json(&json!({ "to": "friend@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .post(app.url(&format!("/articles/{}/share", draft["id"])))
        .bearer_auth(&token)
        .json(&json!({ "to": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
