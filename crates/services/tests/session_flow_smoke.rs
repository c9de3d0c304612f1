use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use qbank_core::model::{
    BankId, CompletionFilter, DifficultyFilter, OptionId, PracticeMode, PracticeSettings,
    VoteDirection,
};
use qbank_core::time::fixed_clock;
use services::{AnswerOutcome, AppServices, Navigation, Ticker};

fn exam_settings() -> PracticeSettings {
    PracticeSettings::new(
        PracticeMode::Exam,
        50,
        DifficultyFilter::All,
        Vec::new(),
        CompletionFilter::All,
    )
    .unwrap()
}

#[tokio::test]
async fn exam_session_runs_to_report() {
    let services = AppServices::in_memory_seeded(fixed_clock()).await.unwrap();
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);

    let mut session = services
        .session_loop()
        .prepare_session(BankId::new(1), exam_settings())
        .await
        .unwrap()
        .on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    session.start(Ticker::Manual).unwrap();

    assert_eq!(
        session.select_answer(&OptionId::new("1a")).unwrap(),
        AnswerOutcome::Recorded
    );
    assert_eq!(
        session.select_answer(&OptionId::new("1c")).unwrap(),
        AnswerOutcome::Locked
    );
    let note = session.add_note("Remember GABA-A").unwrap();
    assert_eq!(session.vote(note, VoteDirection::Up).unwrap(), 1);
    for _ in 0..90 {
        session.tick();
    }

    assert!(matches!(session.advance().unwrap(), Navigation::Moved { index: 1 }));
    session.select_answer(&OptionId::new("2d")).unwrap();
    session.advance().unwrap();
    assert_eq!(session.advance().unwrap(), Navigation::Completed);
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    let outcome = services.session_loop().finish_session(&session).await.unwrap();
    assert_eq!(outcome.score.correct, 1);
    assert_eq!(outcome.report.accuracy, "33%");
    assert_eq!(outcome.report.time_spent, "1m 30s");
    assert_eq!(outcome.report.average_time_per_question, "30s");

    let dir = tempfile::tempdir().unwrap();
    let path = outcome.report.write_to_dir(dir.path()).unwrap();
    assert!(path.ends_with("exam-report-2024-03-10.json"));

    let stats = services.progress().stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.incorrect, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.accuracy_percent(), 33);
}

#[tokio::test(start_paused = true)]
async fn interval_ticker_counts_session_time() {
    let services = AppServices::in_memory_seeded(fixed_clock()).await.unwrap();
    let mut session = services
        .session_loop()
        .start_session(BankId::new(2), exam_settings(), Ticker::every_second())
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(4_200)).await;
    session.close().unwrap();
    assert_eq!(session.elapsed_secs(), 4);
    assert!(!session.is_ticking());

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert_eq!(session.elapsed_secs(), 4);
}
