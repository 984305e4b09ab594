use explainer_db::{
    connect_in_memory, is_foreign_key_violation, AssetRepo, CharacterRepo, CreateBackgroundAsset,
    CreateCharacter, CreateCharacterAsset, CreateVideoProject, DbPool, ProjectFilter, ProjectRepo,
    SceneRepo, UpdateCharacter, VideoProject,
};
use explainer_models::{
    AudioSegment, CharacterRole, ContextStyle, DialogueLine, DialogueScript, ProjectStatus,
};

async fn seed_characters(pool: &DbPool) -> (i64, i64) {
    let q = CharacterRepo::create(
        pool,
        &CreateCharacter {
            name: "Sam".into(),
            role: CharacterRole::Questioner,
        },
    )
    .await
    .unwrap();
    let e = CharacterRepo::create(
        pool,
        &CreateCharacter {
            name: "Ada".into(),
            role: CharacterRole::Explainer,
        },
    )
    .await
    .unwrap();
    (q.id, e.id)
}

async fn seed_project(pool: &DbPool) -> VideoProject {
    let (questioner_id, explainer_id) = seed_characters(pool).await;
    ProjectRepo::create(
        pool,
        &CreateVideoProject {
            title: "Compound interest".into(),
            topic: "compound interest".into(),
            context_style: ContextStyle::Finance,
            document_id: None,
            questioner_id,
            explainer_id,
            background_id: None,
            background_music_id: None,
            target_duration_seconds: 45,
        },
    )
    .await
    .unwrap()
}

fn script() -> DialogueScript {
    DialogueScript {
        topic: "compound interest".into(),
        context_style: ContextStyle::Finance,
        lines: vec![
            DialogueLine::new(CharacterRole::Questioner, "Sam", "What is it?", 1),
            DialogueLine::new(CharacterRole::Explainer, "Ada", "Interest on interest.", 2),
        ],
        takeaway: "Start early.".into(),
        target_duration_seconds: 45,
    }
}

#[tokio::test]
async fn test_health_check() {
    let pool = connect_in_memory().await.unwrap();
    explainer_db::health_check(&pool).await.unwrap();
}

#[tokio::test]
async fn test_character_crud() {
    let pool = connect_in_memory().await.unwrap();
    let (q, _) = seed_characters(&pool).await;

    let updated = CharacterRepo::update(
        &pool,
        q,
        &UpdateCharacter {
            name: Some("Sammy".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "Sammy");
    assert_eq!(updated.role, CharacterRole::Questioner);
    assert!(updated.is_active);

    let explainers = CharacterRepo::list(&pool, Some(CharacterRole::Explainer), true)
        .await
        .unwrap();
    assert_eq!(explainers.len(), 1);
    assert_eq!(explainers[0].name, "Ada");

    assert!(CharacterRepo::delete(&pool, q).await.unwrap());
    assert!(!CharacterRepo::delete(&pool, q).await.unwrap());
    assert!(CharacterRepo::find_by_id(&pool, q).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pose_upload_replaces_same_pose() {
    let pool = connect_in_memory().await.unwrap();
    let (q, _) = seed_characters(&pool).await;

    let asset = |path: &str| CreateCharacterAsset {
        character_id: q,
        pose: "talking".into(),
        file_path: path.into(),
        file_size_bytes: 10,
    };
    CharacterRepo::upsert_asset(&pool, &asset("a.png")).await.unwrap();
    let second = CharacterRepo::upsert_asset(&pool, &asset("b.png")).await.unwrap();

    let assets = CharacterRepo::list_assets(&pool, q).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].file_path, "b.png");

    let removed = CharacterRepo::delete_asset(&pool, q, second.id).await.unwrap();
    assert_eq!(removed.unwrap().file_path, "b.png");
    assert!(CharacterRepo::list_assets(&pool, q).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_character_in_use_cannot_be_deleted() {
    let pool = connect_in_memory().await.unwrap();
    let project = seed_project(&pool).await;

    let err = CharacterRepo::delete(&pool, project.questioner_id)
        .await
        .unwrap_err();
    assert!(is_foreign_key_violation(&err));
}

#[tokio::test]
async fn test_project_starts_as_draft_without_script() {
    let pool = connect_in_memory().await.unwrap();
    let project = seed_project(&pool).await;
    assert_eq!(project.status, ProjectStatus::Draft);
    assert!(project.script().is_none());
    assert_eq!(project.context_style, ContextStyle::Finance);
}

#[tokio::test]
async fn test_script_roundtrips_through_json_column() {
    let pool = connect_in_memory().await.unwrap();
    let project = seed_project(&pool).await;

    let stored = ProjectRepo::update_script(&pool, project.id, &script())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.script(), Some(&script()));
    assert_eq!(stored.takeaway.as_deref(), Some("Start early."));

    let reloaded = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.script().unwrap().lines.len(), 2);
}

#[tokio::test]
async fn test_script_locked_after_approval() {
    let pool = connect_in_memory().await.unwrap();
    let project = seed_project(&pool).await;
    ProjectRepo::approve(&pool, project.id, Some("reviewer")).await.unwrap().unwrap();

    let result = ProjectRepo::update_script(&pool, project.id, &script()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_full_lifecycle() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_project(&pool).await.id;

    let approved = ProjectRepo::approve(&pool, id, Some("editor")).await.unwrap().unwrap();
    assert_eq!(approved.status, ProjectStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some("editor"));
    assert!(approved.reviewed_at.is_some());

    let ready = ProjectRepo::set_voiceover(&pool, id, "/p/1/combined_voiceover.mp3", 31.5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ready.status, ProjectStatus::AudioReady);

    let rendering = ProjectRepo::transition(
        &pool,
        id,
        &[ProjectStatus::AudioReady],
        ProjectStatus::Rendering,
        None,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(rendering.status, ProjectStatus::Rendering);

    let done = ProjectRepo::set_output(&pool, id, "/p/1/final_video.mp4", 31.6)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ProjectStatus::Completed);
    assert_eq!(done.output_path.as_deref(), Some("/p/1/final_video.mp4"));
    assert_eq!(done.duration_seconds, Some(31.6));
}

#[tokio::test]
async fn test_transition_requires_expected_state() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_project(&pool).await.id;

    let result = ProjectRepo::transition(
        &pool,
        id,
        &[ProjectStatus::AudioReady],
        ProjectStatus::Rendering,
        None,
    )
    .await
    .unwrap();
    assert!(result.is_none());

    let again = ProjectRepo::approve(&pool, id, None).await.unwrap();
    assert!(again.is_some());
    assert!(ProjectRepo::approve(&pool, id, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mark_failed_skips_terminal_projects() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_project(&pool).await.id;

    let failed = ProjectRepo::mark_failed(&pool, id, "TTS quota exceeded")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, ProjectStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("TTS quota exceeded"));

    assert!(ProjectRepo::mark_failed(&pool, id, "again").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let pool = connect_in_memory().await.unwrap();
    let first = seed_project(&pool).await;
    let second = seed_project(&pool).await;
    ProjectRepo::approve(&pool, second.id, None).await.unwrap();

    let all = ProjectRepo::list(&pool, &ProjectFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let drafts = ProjectRepo::list(&pool, &ProjectFilter::new(Some(ProjectStatus::Draft), None, None))
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, first.id);

    let page = ProjectRepo::list(&pool, &ProjectFilter::new(None, Some(1), Some(1)))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);

    let stuck = ProjectRepo::list_by_status(&pool, &[ProjectStatus::Approved, ProjectStatus::Rendering])
        .await
        .unwrap();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].id, second.id);
}

#[test]
fn test_filter_clamps_limit() {
    assert_eq!(ProjectFilter::new(None, Some(500), None).limit, 100);
    assert_eq!(ProjectFilter::new(None, Some(0), Some(-3)).limit, 1);
    assert_eq!(ProjectFilter::new(None, None, Some(-3)).offset, 0);
    assert_eq!(ProjectFilter::default().limit, 50);
}

#[tokio::test]
async fn test_scenes_follow_script_and_audio() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_project(&pool).await.id;

    let scenes = SceneRepo::replace_for_project(&pool, id, &script().lines).await.unwrap();
    assert_eq!(scenes.len(), 2);
    assert!(scenes[0].audio_segment().is_none());

    // Regenerating replaces rather than appends
    SceneRepo::replace_for_project(&pool, id, &script().lines).await.unwrap();

    let updated = SceneRepo::update_audio(
        &pool,
        id,
        &[
            AudioSegment {
                scene_number: 1,
                speaker_role: CharacterRole::Questioner,
                file_path: "/p/scene_001.mp3".into(),
                duration_seconds: 2.0,
                start_time: 0.0,
            },
            AudioSegment {
                scene_number: 2,
                speaker_role: CharacterRole::Explainer,
                file_path: "/p/scene_002.mp3".into(),
                duration_seconds: 3.5,
                start_time: 2.0,
            },
        ],
    )
    .await
    .unwrap();
    assert_eq!(updated, 2);

    let scenes = SceneRepo::list_for_project(&pool, id).await.unwrap();
    assert_eq!(scenes.len(), 2);
    let segment = scenes[1].audio_segment().unwrap();
    assert_eq!(segment.start_time, 2.0);
    assert_eq!(segment.duration_seconds, 3.5);
    assert_eq!(scenes[1].line, "Interest on interest.");
}

#[tokio::test]
async fn test_deleting_project_removes_scenes() {
    let pool = connect_in_memory().await.unwrap();
    let id = seed_project(&pool).await.id;
    SceneRepo::replace_for_project(&pool, id, &script().lines).await.unwrap();

    assert!(ProjectRepo::delete(&pool, id).await.unwrap());
    assert!(SceneRepo::list_for_project(&pool, id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_background_pick_prefers_style() {
    let pool = connect_in_memory().await.unwrap();
    assert!(AssetRepo::pick_background(&pool, ContextStyle::Tech).await.unwrap().is_none());

    let generic = AssetRepo::create_background(
        &pool,
        &CreateBackgroundAsset {
            name: "plain".into(),
            context_style: None,
            file_path: "backgrounds/general/plain.png".into(),
            file_size_bytes: 1,
        },
    )
    .await
    .unwrap();
    let tech = AssetRepo::create_background(
        &pool,
        &CreateBackgroundAsset {
            name: "circuits".into(),
            context_style: Some(ContextStyle::Tech),
            file_path: "backgrounds/tech/circuits.png".into(),
            file_size_bytes: 1,
        },
    )
    .await
    .unwrap();

    let picked = AssetRepo::pick_background(&pool, ContextStyle::Tech).await.unwrap().unwrap();
    assert_eq!(picked.id, tech.id);
    let fallback = AssetRepo::pick_background(&pool, ContextStyle::Finance)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fallback.id, generic.id);

    let finance = AssetRepo::list_backgrounds(&pool, Some(ContextStyle::Finance)).await.unwrap();
    assert_eq!(finance.len(), 1);
}
