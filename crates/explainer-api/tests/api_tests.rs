//! Router-level tests against an in-memory database.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, body_json, test_app, Services};
use explainer_db::ProjectRepo;
use explainer_models::ProjectStatus;
use serde_json::json;

#[tokio::test]
async fn test_health_and_headers() {
    let app = test_app(Services::NONE).await;
    let response = app.get("/health").await;
    assert_status(&response, StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers.get("x-request-id").unwrap().len(), 36);
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(Services::NONE).await;
    let response = app
        .request(
            axum::http::Request::builder()
                .uri("/health")
                .header("x-request-id", "review-123")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "review-123");
}

#[tokio::test]
async fn test_ready_reports_services() {
    let app = test_app(Services::NONE).await;
    let response = app.get("/ready").await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["script_generation"], false);
}

#[tokio::test]
async fn test_api_info_and_unknown_route() {
    let app = test_app(Services::NONE).await;
    let json = body_json(app.get("/api").await).await;
    assert_eq!(json["name"], "Explainer Video API");

    assert_status(&app.get("/api/video/nope").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_character_crud() {
    let app = test_app(Services::NONE).await;

    let response = app
        .post_json(
            "/api/video/characters",
            json!({"name": "Thabo", "role": "questioner"}),
        )
        .await;
    assert_status(&response, StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["assets"], json!([]));

    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/video/characters/{id}"),
            json!({"name": "Thabo M."}),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Thabo M.");

    let list = body_json(app.get("/api/video/characters?role=questioner").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    assert_status(
        &app.delete(&format!("/api/video/characters/{id}")).await,
        StatusCode::OK,
    );
    assert_status(
        &app.get(&format!("/api/video/characters/{id}")).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn test_character_validation() {
    let app = test_app(Services::NONE).await;
    let response = app
        .post_json("/api/video/characters", json!({"name": "", "role": "explainer"}))
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");
}

#[tokio::test]
async fn test_character_in_use_cannot_be_deleted() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let response = app
        .delete(&format!("/api/video/characters/{}", project.questioner_id))
        .await;
    assert_status(&response, StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "conflict");
}

#[tokio::test]
async fn test_pose_upload_rejects_text_file() {
    let app = test_app(Services::NONE).await;
    let (questioner, _) = app.seed_characters().await;

    let response = app
        .post_multipart(
            &format!("/api/video/characters/{questioner}/assets"),
            &[("pose", "talking")],
            "pose.txt",
            b"hello",
        )
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Invalid image type: .txt"), "{detail}");
}

#[tokio::test]
async fn test_pose_upload_and_delete() {
    let app = test_app(Services::NONE).await;
    let (questioner, _) = app.seed_characters().await;

    let response = app
        .post_multipart(
            &format!("/api/video/characters/{questioner}/assets"),
            &[("pose", "Talking")],
            "talk.PNG",
            b"\x89PNG fake",
        )
        .await;
    assert_status(&response, StatusCode::CREATED);
    let asset = body_json(response).await;
    assert_eq!(asset["pose"], "talking");
    let path = std::path::PathBuf::from(asset["file_path"].as_str().unwrap());
    assert!(path.ends_with("talking.png"));
    assert!(path.exists());

    let character = body_json(
        app.get(&format!("/api/video/characters/{questioner}")).await,
    )
    .await;
    assert_eq!(character["assets"].as_array().unwrap().len(), 1);

    let asset_id = asset["id"].as_i64().unwrap();
    let response = app
        .delete(&format!("/api/video/characters/{questioner}/assets/{asset_id}"))
        .await;
    assert_status(&response, StatusCode::OK);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_background_upload_and_filter() {
    let app = test_app(Services::NONE).await;

    let response = app
        .post_multipart(
            "/api/video/backgrounds",
            &[("name", "Office"), ("context_style", "finance")],
            "office.jpg",
            b"jpeg bytes",
        )
        .await;
    assert_status(&response, StatusCode::CREATED);

    let response = app
        .post_multipart(
            "/api/video/backgrounds",
            &[("name", "Office"), ("context_style", "sports")],
            "office.jpg",
            b"jpeg bytes",
        )
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    let tech = body_json(app.get("/api/video/backgrounds?context_style=tech").await).await;
    assert!(tech
        .as_array()
        .unwrap()
        .iter()
        .all(|b| b["context_style"] != "finance"));
    let finance = body_json(app.get("/api/video/backgrounds?context_style=finance").await).await;
    assert_eq!(finance.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_music_upload_requires_audio() {
    let app = test_app(Services::NONE).await;
    let response = app
        .post_multipart("/api/video/music", &[("name", "Calm")], "calm.png", b"png")
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    let response = app
        .post_multipart("/api/video/music", &[("name", "Calm")], "calm.mp3", b"ID3")
        .await;
    assert_status(&response, StatusCode::CREATED);
    // No ffprobe in the test environment
    assert!(body_json(response).await["duration_seconds"].is_null());
}

#[tokio::test]
async fn test_create_project_without_generator() {
    let app = test_app(Services::NONE).await;
    let (questioner, explainer) = app.seed_characters().await;

    let response = app
        .post_json(
            "/api/video/projects",
            json!({
                "title": "Saving",
                "topic": "compound interest",
                "questioner_id": questioner,
                "explainer_id": explainer,
            }),
        )
        .await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await["detail"],
        "Script generation is not configured"
    );
}

#[tokio::test]
async fn test_create_project_unknown_character() {
    let app = test_app(Services::ALL).await;
    let (_, explainer) = app.seed_characters().await;

    let response = app
        .post_json(
            "/api/video/projects",
            json!({
                "title": "Saving",
                "topic": "compound interest",
                "questioner_id": 999,
                "explainer_id": explainer,
            }),
        )
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Questioner character not found"
    );
}

#[tokio::test]
async fn test_create_project_generates_script() {
    let app = test_app(Services::ALL).await;
    let (questioner, explainer) = app.seed_characters().await;

    let response = app
        .post_json(
            "/api/video/projects",
            json!({
                "title": "Saving",
                "topic": "compound interest",
                "context_style": "finance",
                "questioner_id": questioner,
                "explainer_id": explainer,
                "target_duration_seconds": 30,
                "document_context": "Interest compounds monthly.",
            }),
        )
        .await;
    assert_status(&response, StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_i64().unwrap();

    app.wait_idle(id).await;

    let project = body_json(app.get(&format!("/api/video/projects/{id}")).await).await;
    assert_eq!(project["status"], "draft");
    assert_eq!(project["takeaway"], "Start saving early.");
    assert_eq!(project["script"]["lines"][0]["speaker_name"], "Thabo");

    let scenes = body_json(app.get(&format!("/api/video/projects/{id}/scenes")).await).await;
    let scenes = scenes.as_array().unwrap();
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[1]["speaker_role"], "explainer");
}

#[tokio::test]
async fn test_list_projects_by_status() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let drafts = body_json(app.get("/api/video/projects?status=draft").await).await;
    assert_eq!(drafts[0]["id"], project.id);
    let completed = body_json(app.get("/api/video/projects?status=completed").await).await;
    assert!(completed.as_array().unwrap().is_empty());

    let response = app.get("/api/video/projects?status=bogus").await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reject_returns_to_draft_with_notes() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let response = app
        .post_json(
            &format!("/api/video/projects/{}/reject", project.id),
            json!({"notes": "too long"}),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "draft");
    assert_eq!(json["error_message"], "Rejected: too long");
}

#[tokio::test]
async fn test_render_requires_audio_ready() {
    let app = test_app(Services::ALL).await;
    let project = app.seed_project().await;

    let response = app
        .post_json(&format!("/api/video/projects/{}/render", project.id), json!({}))
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Project must be in AUDIO_READY status to render"
    );
}

#[tokio::test]
async fn test_approve_without_voiceover_service() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let response = app
        .post_json(&format!("/api/video/projects/{}/approve", project.id), json!({}))
        .await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_approve_requires_draft() {
    let app = test_app(Services::ALL).await;
    let project = app.seed_project().await;
    ProjectRepo::mark_failed(&app.pool, project.id, "boom")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .post_json(&format!("/api/video/projects/{}/approve", project.id), json!({}))
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Project not found or not in DRAFT status"
    );
}

#[tokio::test]
async fn test_regenerate_failed_project() {
    let app = test_app(Services::ALL).await;
    let project = app.seed_project().await;
    ProjectRepo::mark_failed(&app.pool, project.id, "Claude API returned 500")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .post_json(
            &format!("/api/video/projects/{}/regenerate", project.id),
            json!({}),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "regenerating");

    app.wait_idle(project.id).await;
    let stored = ProjectRepo::find_by_id(&app.pool, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ProjectStatus::Draft);
    assert!(stored.script().is_some());
}

#[tokio::test]
async fn test_edit_script_in_draft() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/video/projects/{}/script", project.id),
            json!({
                "lines": [
                    {"speaker_role": "questioner", "speaker_name": "Thabo", "line": "Why save?"},
                    {"speaker_role": "explainer", "speaker_name": "Lerato", "line": "Time helps.", "pose": "pointing"},
                ],
                "takeaway": "Start now.",
            }),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["script"]["lines"][1]["scene_number"], 2);
    assert_eq!(json["script"]["lines"][1]["pose"], "pointing");
    assert_eq!(json["script"]["lines"][0]["pose"], "standing");
    assert_eq!(json["takeaway"], "Start now.");

    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/video/projects/{}/script", project.id),
            json!({"lines": []}),
        )
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");

    let response = app
        .send_json(
            Method::PATCH,
            &format!("/api/video/projects/{}/script", project.id),
            json!({
                "lines": [{"speaker_role": "questioner", "speaker_name": "", "line": "Why save?"}],
            }),
        )
        .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "validation_error");
}

#[tokio::test]
async fn test_files_missing_before_generation() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let response = app
        .get(&format!("/api/video/projects/{}/download", project.id))
        .await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Video not yet rendered");

    let response = app
        .get(&format!("/api/video/projects/{}/preview-audio", project.id))
        .await;
    assert_status(&response, StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["detail"],
        "Voiceover not yet generated"
    );

    assert_status(&app.get("/api/video/projects/999").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_project() {
    let app = test_app(Services::NONE).await;
    let project = app.seed_project().await;

    let uri = format!("/api/video/projects/{}", project.id);
    assert_status(&app.delete(&uri).await, StatusCode::OK);
    assert_status(&app.get(&uri).await, StatusCode::NOT_FOUND);
    assert_status(&app.delete(&uri).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_topics_and_voices() {
    let app = test_app(Services::ALL).await;

    let response = app
        .post_json(
            "/api/video/topics",
            json!({"document": "A long article about saving.", "max_topics": 1}),
        )
        .await;
    assert_status(&response, StatusCode::OK);
    let topics = body_json(response).await;
    assert_eq!(topics["topics"].as_array().unwrap().len(), 1);
    assert_eq!(topics["topics"][0]["context_style"], "finance");

    let voices = body_json(app.get("/api/video/voices").await).await;
    assert_eq!(voices["voices"][0]["voice_id"], "voice-1");
}

#[tokio::test]
async fn test_voice_settings() {
    let app = test_app(Services::ALL).await;

    let response = app
        .post_json("/api/video/settings", json!({"explainer_voice": "voice-9"}))
        .await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "updated");

    let settings = body_json(app.get("/api/video/settings").await).await;
    assert_eq!(settings["explainer_voice"], "voice-9");
    assert_eq!(
        settings["questioner_voice"],
        explainer_pipeline::config::DEFAULT_QUESTIONER_VOICE
    );
}

#[tokio::test]
async fn test_services_unconfigured() {
    let app = test_app(Services::NONE).await;

    assert_status(&app.get("/api/video/voices").await, StatusCode::SERVICE_UNAVAILABLE);
    let response = app
        .post_json("/api/video/topics", json!({"document": "text"}))
        .await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
    let response = app
        .post_json("/api/video/settings", json!({"questioner_voice": "x"}))
        .await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);

    // Defaults are still readable
    let settings = body_json(app.get("/api/video/settings").await).await;
    assert!(settings["questioner_voice"].is_string());
}
