//! Session Flow Integration Tests
//!
//! End-to-end dialog runs against a scripted channel.

mod common;

use std::path::Path;

use common::ScriptedChannel;
use kyc_voice::core::{
    RecordStore, SessionContext, SessionController, SessionOutcome, DECLINED_ERROR,
};
use kyc_voice::domain::{FieldKind, FieldSpec};
use tempfile::TempDir;

fn controller(channel: ScriptedChannel, dir: &Path) -> SessionController {
    let ctx = SessionContext::new(Box::new(channel), RecordStore::new(dir), 2);
    SessionController::new(ctx)
}

fn files_in(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_completed_session_persists_record() {
    let temp = TempDir::new().unwrap();
    let (channel, transcript) = ScriptedChannel::typed(&[
        "Alice Kumar",
        "nine eight seven six five four three two one zero",
        "ABCDE1234F",
        "Yes, I consent",
    ]);

    let outcome = controller(channel, temp.path()).run().await.unwrap();

    let path = match &outcome {
        SessionOutcome::Completed { record, path } => {
            assert_eq!(record.name.as_deref(), Some("Alice Kumar"));
            assert_eq!(record.phone.as_deref(), Some("9876543210"));
            assert_eq!(record.pan.as_deref(), Some("ABCDE1234F"));
            assert!(record.consent);
            path.clone()
        }
        other => panic!("Expected Completed, got {:?}", other),
    };

    assert_eq!(path.parent(), Some(temp.path()));
    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("kyc_session_"));
    assert!(file_name.ends_with(".json"));
    assert_eq!(files_in(temp.path()), vec![file_name]);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["consent", "name", "pan", "phone", "timestamp"]);
    assert_eq!(json["name"], "Alice Kumar");
    assert_eq!(json["phone"], "9876543210");
    assert_eq!(json["pan"], "ABCDE1234F");
    assert_eq!(json["consent"], true);
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    let transcript = transcript.lock().unwrap();
    assert_eq!(transcript.prompts.len(), 4);
    assert!(transcript.announcements.contains(
        &"Confirming details. Name: Alice Kumar. Phone: 9876543210. PAN: ABCDE1234F.".to_string()
    ));
    assert_eq!(
        transcript.announcements.first().map(String::as_str),
        Some("Welcome to KYC verification.")
    );
}

#[tokio::test]
async fn test_name_exhaustion_aborts_without_further_fields() {
    let temp = TempDir::new().unwrap();
    let records = temp.path().join("records");
    let (channel, transcript) = ScriptedChannel::typed(&["", " ", "\t"]);

    let outcome = controller(channel, &records).run().await.unwrap();
    assert_eq!(
        outcome,
        SessionOutcome::Aborted {
            field: FieldKind::Name
        }
    );
    assert!(outcome.persisted_path().is_none());

    let name = FieldSpec::for_kind(FieldKind::Name, 2);
    let phone = FieldSpec::for_kind(FieldKind::Phone, 2);
    let transcript = transcript.lock().unwrap();
    assert_eq!(transcript.prompts.len(), 3);
    assert_eq!(transcript.prompts[0], name.prompt);
    assert!(transcript.prompts.iter().all(|p| *p != phone.prompt));

    assert!(files_in(&records).is_empty());
}

#[tokio::test]
async fn test_repeated_refusal_declines_without_persisting() {
    let temp = TempDir::new().unwrap();
    let (channel, transcript) = ScriptedChannel::typed(&[
        "Alice Kumar",
        "98765 43210",
        "abcde 1234 f",
        "no",
        "no",
        "no",
    ]);

    let outcome = controller(channel, temp.path()).run().await.unwrap();
    match &outcome {
        SessionOutcome::Declined { record } => {
            assert!(!record.consent);
            assert_eq!(record.error.as_deref(), Some(DECLINED_ERROR));
            assert!(!DECLINED_ERROR.is_empty());
            assert_eq!(record.pan.as_deref(), Some("ABCDE1234F"));
        }
        other => panic!("Expected Declined, got {:?}", other),
    }

    assert!(files_in(temp.path()).is_empty());
    assert_eq!(transcript.lock().unwrap().prompts.len(), 6);
    assert_eq!(
        transcript.lock().unwrap().announcements.last().map(String::as_str),
        Some("Verification cancelled. Have a nice day.")
    );
}

#[tokio::test]
async fn test_phone_retry_then_success() {
    let temp = TempDir::new().unwrap();
    let (channel, transcript) = ScriptedChannel::typed(&[
        "Alice Kumar",
        "12345",
        "double nine eight seven six five four three two one",
        "ABCDE1234F",
        "I agree",
    ]);

    let outcome = controller(channel, temp.path()).run().await.unwrap();
    let path = outcome.persisted_path().cloned().unwrap();
    let record = RecordStore::load(&path).unwrap();
    assert_eq!(record.phone.as_deref(), Some("9987654321"));

    let transcript = transcript.lock().unwrap();
    assert_eq!(
        transcript.prompts[2],
        "That didn't sound like a 10 digit number. Please try again."
    );
}
