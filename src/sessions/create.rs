use crate::{
    db::models::{NewBox, NewDraft, NewSession, Perspective, Session, SessionStatus},
    log_info,
    store::RemoteStore,
};

use super::SessionError;

const ENABLE_LOGS: bool = true;

/// The three freewriting angles every new session starts with.
pub fn default_perspectives() -> Vec<Perspective> {
    vec![
        Perspective::new(
            "What you see",
            "The visual imagery, the scene. What does this idea look like? \
             Describe the setting, colors, shapes, movement.",
        ),
        Perspective::new(
            "What you feel",
            "Physical sensations and emotions in the body. Where do you feel \
             this idea? Heat, cold, tension, release.",
        ),
        Perspective::new(
            "What you think",
            "Inner thoughts, reflections, meanings. What does this idea make \
             you consider? Questions, realizations, memories.",
        ),
    ]
}

/// Creates an active session for `spark` along with one empty box per
/// perspective and an empty first draft.
///
/// The three inserts are independent writes. If a later one fails the
/// session row is left in place and the error is returned.
pub async fn create_session(
    store: &dyn RemoteStore,
    user_id: &str,
    spark: &str,
) -> Result<Session, SessionError> {
    let spark = spark.trim();
    if spark.is_empty() {
        return Err(SessionError::EmptySpark);
    }

    let perspectives = default_perspectives();
    let session = store
        .insert_session(NewSession {
            user_id: user_id.to_string(),
            spark: spark.to_string(),
            perspectives: perspectives.clone(),
            status: SessionStatus::Active,
        })
        .await?;

    let boxes = (0..perspectives.len() as u32)
        .map(|perspective_index| NewBox {
            session_id: session.id.clone(),
            perspective_index,
            content: String::new(),
            duration_seconds: Some(0),
        })
        .collect();
    store.insert_boxes(boxes).await?;

    store
        .insert_draft(NewDraft {
            session_id: session.id.clone(),
            content: String::new(),
            version: 1,
        })
        .await?;

    log_info!(
        "Created session {} with {} perspectives",
        session.id,
        perspectives.len()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreCall};

    #[tokio::test]
    async fn creates_boxes_and_first_draft() {
        let store = InMemoryStore::new();
        let session = create_session(&store, "u1", "  rain on a tin roof ").await.unwrap();

        assert_eq!(session.spark, "rain on a tin roof");
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.perspectives.len(), 3);

        let boxes = store.boxes();
        assert_eq!(boxes.len(), 3);
        assert!(boxes.iter().all(|b| b.content.is_empty() && b.duration_seconds == Some(0)));

        let drafts = store.drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].version, 1);
    }

    #[tokio::test]
    async fn blank_spark_writes_nothing() {
        let store = InMemoryStore::new();
        let result = create_session(&store, "u1", "   ").await;
        assert!(matches!(result, Err(SessionError::EmptySpark)));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn failed_session_insert_stops_the_flow() {
        let store = InMemoryStore::new();
        store.fail_next_writes(1);

        let result = create_session(&store, "u1", "second spark").await;
        assert!(matches!(result, Err(SessionError::Store(_))));
        assert_eq!(store.writes(), vec![StoreCall::InsertSession { user_id: "u1".into() }]);
        assert!(store.boxes().is_empty());
    }
}
