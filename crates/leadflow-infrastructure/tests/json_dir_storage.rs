use leadflow_core::config::NotifierConfig;
use leadflow_core::notifier::{Notification, Notifier};
use leadflow_core::session::{
    Checkpoint, MessageKind, NewMessage, Sender, Session, SessionRepository, SessionStatus,
    TranscriptRepository,
};
use leadflow_infrastructure::notifier::OutboxEnvelope;
use leadflow_infrastructure::{
    JsonDirSessionRepository, JsonDirTranscriptRepository, LeadflowPaths, OutboxNotifier,
};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn session_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let paths = LeadflowPaths::new(dir.path());

    {
        let repo = JsonDirSessionRepository::new(paths.sessions_dir()).await.unwrap();
        let (mut session, created) = repo.create_if_absent(Session::new("lead-1")).await.unwrap();
        assert!(created);

        session.step = 5;
        session.answers.insert("purpose".into(), "Work".into());
        session.mark_checkpoint_sent(Checkpoint::GermanEmail);
        session.status = SessionStatus::Closed;
        repo.save(&session).await.unwrap();
    }

    let repo = JsonDirSessionRepository::new(paths.sessions_dir()).await.unwrap();
    let session = repo.find_by_id("lead-1").await.unwrap().unwrap();
    assert_eq!(session.step, 5);
    assert_eq!(session.answer("purpose"), Some("Work"));
    assert!(session.checkpoint_sent(Checkpoint::GermanEmail));
    assert!(session.is_closed());

    let (existing, created) = repo.create_if_absent(Session::new("lead-1")).await.unwrap();
    assert!(!created);
    assert_eq!(existing.step, 5);

    assert!(repo.find_by_id("lead-2").await.unwrap().is_none());
    assert_eq!(repo.list_all().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_store_one_record() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(JsonDirSessionRepository::new(dir.path()).await.unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.create_if_absent(Session::new("race")).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().1 {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn unsafe_session_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = JsonDirSessionRepository::new(dir.path()).await.unwrap();

    let err = repo.find_by_id("../escape").await.unwrap_err();
    assert!(!err.is_persistence());
}

#[tokio::test]
async fn transcript_sequences_continue_after_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let repo = JsonDirTranscriptRepository::new(dir.path()).await.unwrap();
        repo.append(NewMessage::bot("lead-1", "Welcome!", MessageKind::Text))
            .await
            .unwrap();
        repo.append(NewMessage::options("lead-1", vec!["Get Started".into()]))
            .await
            .unwrap();
    }

    let repo = JsonDirTranscriptRepository::new(dir.path()).await.unwrap();
    let third = repo.append(NewMessage::user("lead-1", "Get Started")).await.unwrap();
    assert_eq!(third.sequence, 3);

    let transcript = repo.list("lead-1").await.unwrap();
    let sequences: Vec<u64> = transcript.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(transcript[1].options, vec!["Get Started"]);
    assert_eq!(transcript[2].sender, Sender::User);

    assert!(repo.list("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn outbox_notifier_writes_envelope() {
    let dir = TempDir::new().unwrap();
    let config = NotifierConfig {
        staff_recipients: vec!["admissions@example.com".into()],
        sender: "bot@example.com".into(),
    };
    let notifier = OutboxNotifier::new(dir.path(), config).unwrap();

    let notification = Notification {
        checkpoint: Checkpoint::GermanEmail,
        session_id: "lead-1".into(),
        payload: [("name", "Anna Berg"), ("germanReady", "Yes")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    };
    notifier.notify(&notification).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);

    let envelope: OutboxEnvelope =
        serde_json::from_str(&std::fs::read_to_string(&entries[0]).unwrap()).unwrap();
    assert_eq!(envelope.to, vec!["admissions@example.com"]);
    assert_eq!(envelope.from, "bot@example.com");
    assert_eq!(envelope.subject, "New work-abroad lead: Anna Berg");
    assert!(envelope.body.contains("Ready to learn German: Yes"));
    assert_eq!(envelope.payload, notification.payload);
}

#[tokio::test]
async fn outbox_notifier_without_recipients_fails() {
    let dir = TempDir::new().unwrap();
    let notifier = OutboxNotifier::new(dir.path(), NotifierConfig::default()).unwrap();

    let notification = Notification {
        checkpoint: Checkpoint::StudyEmail,
        session_id: "lead-1".into(),
        payload: Default::default(),
    };
    let err = notifier.notify(&notification).await.unwrap_err();
    assert!(matches!(err, leadflow_core::LeadflowError::Notification(_)));
}
