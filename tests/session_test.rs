use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use voicefill::asr;
use voicefill::audio::{AssumeGranted, MicrophoneAccess};
use voicefill::config::SessionTimings;
use voicefill::error::VoiceFillError;
use voicefill::fields::{self, FieldSpec};
use voicefill::i18n::{Catalog, Locale};
use voicefill::session::{SessionUpdate, StatusKind, VoiceAssistant};

mod common;
use common::mock_tts::MockTts;
use common::{age, sex, TestSession};

const LIMIT: Duration = Duration::from_secs(600);

struct DeniedMicrophone;

#[async_trait]
impl MicrophoneAccess for DeniedMicrophone {
    async fn request(&self) -> Result<()> {
        Err(anyhow::anyhow!("user dismissed the prompt"))
    }

    fn name(&self) -> &str {
        "denied"
    }
}

#[tokio::test(start_paused = true)]
async fn test_fills_single_number_field() {
    let mut t = TestSession::new(Locale::En, &["seventy five"]);
    t.session.start(vec![age()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    let data = data.expect("session should finish");
    assert_eq!(data.len(), 1);
    assert_eq!(data["age"], "75");

    let spoken = t.tts.get_spoken();
    assert!(spoken[0].contains("What is your Age? (29 to 77) (Field 1 of 1)"));
    assert_eq!(spoken.last().unwrap(), "Got it, your Age is 75. All information collected.");
    assert!(seen.contains(&SessionUpdate::Status(StatusKind::Complete)));
    assert!(seen.contains(&SessionUpdate::Progress {
        processed: 1,
        total: 1
    }));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_select_is_skipped_after_retries() {
    let mut t = TestSession::new(Locale::En, &["purple", "banana", "carrot"]);
    t.session.start(vec![sex()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    assert_eq!(data, Some(Default::default()));
    assert_eq!(t.tts.count_spoken("Sorry, I could not understand that"), 2);
    assert!(t.tts.was_spoken("I have collected all available information."));
    assert!(seen.contains(&SessionUpdate::Status(StatusKind::NotUnderstoodRetry {
        attempt: 2,
        max: 2
    })));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_silence_times_out_into_retries() {
    let mut t = TestSession::new(Locale::En, &["-", "-", "-"]);
    t.session.start(vec![age(), sex()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    // age skipped, sex script exhausted and skipped as well
    assert_eq!(data, Some(Default::default()));
    assert!(seen.contains(&SessionUpdate::Status(StatusKind::NoSpeechRetry {
        attempt: 1,
        max: 2
    })));
    assert!(t.tts.was_spoken("Skipping that field. Now, what is your Sex?"));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_segments_are_joined_before_extraction() {
    let mut t = TestSession::new(Locale::En, &["~sev | seventy | two"]);
    t.session.start(vec![age()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    assert_eq!(data.unwrap()["age"], "72");
    assert!(seen.contains(&SessionUpdate::Interim("sev".into())));
    assert!(seen.contains(&SessionUpdate::Interim("seventy two".into())));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let mut t = TestSession::new(Locale::En, &["-"]);
    t.session.start(vec![age(), sex()]).await.unwrap();

    // past the first prompt and its guard delay
    tokio::time::sleep(Duration::from_secs(5)).await;
    t.session.stop().unwrap();
    t.session.stop().unwrap();

    let (data, seen) = t.wait_finished(Duration::from_secs(60)).await;
    assert!(data.is_none());
    let stopped = seen
        .iter()
        .filter(|u| **u == SessionUpdate::Status(StatusKind::Stopped))
        .count();
    assert_eq!(stopped, 1);
    // no retry prompt once stopped
    assert_eq!(t.tts.get_spoken().len(), 1);

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reset_allows_new_session() {
    let mut t = TestSession::new(Locale::En, &["-", "sixty"]);
    t.session.start(vec![age()]).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    t.session.reset().unwrap();
    t.session.start(vec![age()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    assert!(seen.contains(&SessionUpdate::Status(StatusKind::Ready)));
    assert_eq!(data.unwrap()["age"], "60");

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_telugu_falls_back_to_english_recognition() {
    let mut t = TestSession::with_options(
        Locale::Te,
        &["seventy two"],
        &["te-IN"],
        Arc::new(MockTts::new()),
        Arc::new(AssumeGranted),
    );
    t.session.start(vec![age()]).await.unwrap();

    let (data, _) = t.wait_finished(LIMIT).await;
    assert_eq!(data.unwrap()["age"], "72");
    assert_eq!(
        t.recognizer.attempts(),
        vec!["te-IN".to_string(), "en-US".to_string()]
    );
    assert!(t.tts.voices().iter().all(|v| v.language == "te-IN"));
    assert!(t.tts.get_spoken()[0].starts_with("నమస్కారం"));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_recognition_that_cannot_start_skips_fields() {
    let mut t = TestSession::with_options(
        Locale::En,
        &["seventy"],
        &["en-US"],
        Arc::new(MockTts::new()),
        Arc::new(AssumeGranted),
    );
    t.session.start(vec![age(), sex()]).await.unwrap();

    let (data, seen) = t.wait_finished(LIMIT).await;
    assert_eq!(data, Some(Default::default()));
    assert!(seen.contains(&SessionUpdate::Status(StatusKind::RecognitionError(
        "start-failed".into()
    ))));

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_recognizer_is_refreshed_every_three_fields() {
    let fields: Vec<FieldSpec> = (0..4)
        .map(|i| FieldSpec::number(&format!("f{}", i), "Value", 0.0, 100.0))
        .collect();
    let mut t = TestSession::new(Locale::En, &["10", "20", "30", "40"]);
    t.session.start(fields).await.unwrap();

    let (data, _) = t.wait_finished(LIMIT).await;
    assert_eq!(data.unwrap().len(), 4);
    // the first handle plus one refresh before the fourth field
    assert_eq!(t.recognizer.created(), 2);

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_speech_still_listens() {
    let mut t = TestSession::with_options(
        Locale::En,
        &["male"],
        &[],
        Arc::new(MockTts::failing()),
        Arc::new(AssumeGranted),
    );
    t.session.start(vec![sex()]).await.unwrap();

    let (data, _) = t.wait_finished(LIMIT).await;
    assert_eq!(data.unwrap()["sex"], "1");

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_microphone_denied() {
    let mut t = TestSession::with_options(
        Locale::En,
        &["seventy"],
        &[],
        Arc::new(MockTts::new()),
        Arc::new(DeniedMicrophone),
    );

    let result = t.session.start(vec![age()]).await;
    assert!(matches!(result, Err(VoiceFillError::PermissionDenied(_))));
    assert!(matches!(t.updates.recv().await, Some(SessionUpdate::Error(_))));
    assert!(t.tts.get_spoken().is_empty());

    t.session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_form_is_rejected() {
    let t = TestSession::new(Locale::En, &[]);
    let result = t.session.start(vec![]).await;
    assert!(matches!(result, Err(VoiceFillError::NoFields)));
    t.session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_recognizer_is_unsupported() {
    let factory: asr::RecognizerFactory =
        Arc::new(|| Err(anyhow::anyhow!("speech recognition is not available")));
    let result = VoiceAssistant::new(
        Arc::new(Catalog::for_locale(Locale::En)),
        SessionTimings::default(),
        0.95,
        factory,
        None,
        Arc::new(AssumeGranted),
    );
    assert!(matches!(result, Err(VoiceFillError::UnsupportedPlatform(_))));
}

#[tokio::test(start_paused = true)]
async fn test_demo_heart_form() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let form = fields::load_schema(&root.join("demos/heart_fields.json")).unwrap();
    let factory =
        asr::create_factory("script", Some(&root.join("demos/heart_answers.txt"))).unwrap();
    let (assistant, mut updates) = VoiceAssistant::new(
        Arc::new(Catalog::for_locale(Locale::En)),
        SessionTimings::default(),
        0.95,
        factory,
        None,
        Arc::new(AssumeGranted),
    )
    .unwrap();
    let session = assistant.spawn();
    session.start(form).await.unwrap();

    let data = loop {
        match updates.recv().await {
            Some(SessionUpdate::Finished(data)) => break data,
            Some(_) => {}
            None => panic!("session loop ended early"),
        }
    };

    let expected = [
        ("age", "54"),
        ("sex", "1"),
        ("cp", "1"),
        ("trestbps", "130"),
        ("chol", "246"),
        ("fbs", "0"),
        ("restecg", "0"),
        ("thalach", "150"),
        ("exang", "0"),
        ("oldpeak", "1.4"),
        ("slope", "1"),
        ("ca", "0"),
        ("thal", "2"),
    ];
    for (name, value) in expected {
        assert_eq!(data.get(name).map(String::as_str), Some(value), "field {}", name);
    }

    session.shutdown().await.unwrap();
}
