use std::time::Duration;

use songsmith::{
    db::{
        models::{NewAnchorWord, NewRhyme},
        RhymeSource, RhymeType, SessionPatch, SessionStatus,
    },
    sessions::create_session,
    settings::{AutosaveSettings, SettingsStore},
    store::{RemoteStore, StoreError},
    workspace::{SaveStatus, SessionWorkspace, WorkspaceError},
    Songsmith,
};

const USER: &str = "user-1";

fn open_app(dir: &tempfile::TempDir) -> Songsmith {
    Songsmith::open(dir.path()).expect("open app")
}

fn quick_autosave() -> AutosaveSettings {
    AutosaveSettings {
        box_debounce_ms: 30,
        anchor_debounce_ms: 20,
        draft_debounce_ms: 30,
    }
}

async fn settle(workspace: &SessionWorkspace) {
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if workspace.is_idle() {
            return;
        }
    }
    panic!("workspace did not settle");
}

#[tokio::test]
async fn created_session_has_boxes_and_first_draft() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_app(&dir).store();

    let session = create_session(store.as_ref(), USER, "neon after rain").await.unwrap();

    let fetched = store.fetch_session(USER, &session.id).await.unwrap().unwrap();
    assert_eq!(fetched.spark, "neon after rain");
    assert_eq!(fetched.perspectives.len(), 3);
    assert_eq!(fetched.perspectives[1].label, "What you feel");

    let boxes = store.list_boxes(&session.id).await.unwrap();
    let indexes: Vec<u32> = boxes.iter().map(|b| b.perspective_index).collect();
    assert_eq!(indexes, [0, 1, 2]);

    let drafts = store.list_drafts(&session.id).await.unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].version, 1);

    assert!(store.fetch_session("someone-else", &session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn anchor_position_is_unique_per_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_app(&dir).store();
    let session = create_session(store.as_ref(), USER, "spark").await.unwrap();

    let anchor = |word: &str| NewAnchorWord {
        session_id: session.id.clone(),
        word: word.to_string(),
        source_box: None,
        position: 4,
    };
    store.insert_anchor_word(anchor("tide")).await.unwrap();

    let err = store.insert_anchor_word(anchor("pride")).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { table: "anchor_words", .. }));
}

#[tokio::test]
async fn updates_to_missing_rows_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_app(&dir).store();

    let err = store.update_draft("missing", "text").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { table: "drafts", .. }));

    let err = store
        .update_session("missing", SessionPatch::status(SessionStatus::Archived))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { table: "sessions", .. }));
}

#[tokio::test]
async fn deleting_session_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_app(&dir).store();
    let session = create_session(store.as_ref(), USER, "spark").await.unwrap();

    let anchor = store
        .insert_anchor_word(NewAnchorWord {
            session_id: session.id.clone(),
            word: "glass".into(),
            source_box: Some(0),
            position: 0,
        })
        .await
        .unwrap();
    store
        .insert_rhyme(NewRhyme {
            anchor_word_id: anchor.id.clone(),
            word: "pass".into(),
            rhyme_type: RhymeType::Perfect,
            source: RhymeSource::Manual,
            position: 0,
        })
        .await
        .unwrap();

    store.delete_session(&session.id).await.unwrap();

    assert!(store.list_sessions(USER).await.unwrap().is_empty());
    assert!(store.list_boxes(&session.id).await.unwrap().is_empty());
    assert!(store.list_anchor_words(&session.id).await.unwrap().is_empty());
    assert!(store.list_rhymes(&[anchor.id]).await.unwrap().is_empty());
    assert!(store.list_drafts(&session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn workspace_edits_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let session_id;
    let anchor_id;
    {
        let app = open_app(&dir);
        app.settings().update_autosave(quick_autosave()).unwrap();
        let session = create_session(app.store().as_ref(), USER, "two rooms")
            .await
            .unwrap();
        session_id = session.id.clone();

        let workspace = app.open_workspace(USER, &session_id).await.unwrap();
        let box_id = workspace.boxes()[0].id.clone();

        workspace.on_box_content_change(&box_id, "a kettle ticking").unwrap();
        workspace.on_anchor_change(2, "ticking").unwrap();
        workspace.on_draft_change("first line");
        settle(&workspace).await;

        anchor_id = workspace.anchor_slots()[2]
            .as_ref()
            .and_then(|slot| slot.id.remote_id().map(str::to_string))
            .expect("anchor confirmed");
        let rhyme = workspace
            .add_rhyme(&anchor_id, "kicking", RhymeType::Near)
            .await
            .unwrap()
            .expect("rhyme stored");
        assert_eq!(rhyme.position, 0);

        assert_eq!(workspace.box_status(&box_id), SaveStatus::Saved);
        assert_eq!(workspace.anchors_status(), SaveStatus::Saved);
        assert_eq!(workspace.draft_status(), SaveStatus::Saved);
        workspace.close();
    }

    let app = open_app(&dir);
    let workspace = app.open_workspace(USER, &session_id).await.unwrap();
    assert_eq!(workspace.boxes()[0].content, "a kettle ticking");
    assert_eq!(
        workspace.anchor_slots()[2].as_ref().map(|slot| slot.word.as_str()),
        Some("ticking")
    );
    assert_eq!(workspace.rhymes_for(&anchor_id)[0].word, "kicking");

    // The session was created with its first draft, so the edit updated it.
    let draft = workspace.draft();
    assert_eq!(draft.content, "first line");
    assert_eq!(draft.version, 1);
    assert_eq!(app.store().list_drafts(&session_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_session_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let app = open_app(&dir);
    let result = app.open_workspace(USER, "does-not-exist").await;
    assert!(matches!(result, Err(WorkspaceError::SessionNotFound(_))));
}

#[tokio::test]
async fn sidebar_lists_newest_first_and_remembers_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let app = open_app(&dir);
    let actions = app.sidebar_for(USER).await.unwrap();

    let first = actions.create("first spark").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = actions.create("second spark").await.unwrap();
    actions.rename(&first.id, "Opening").await.unwrap();
    actions.refresh().await.unwrap();

    let visible: Vec<String> = actions
        .sidebar()
        .visible_sessions()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(visible, [first.id.clone(), second.id.clone()]);

    actions.sidebar().collapse_sidebar();
    let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
    assert!(settings.sidebar_collapsed());
    assert!(app.settings().sidebar_collapsed());
}
