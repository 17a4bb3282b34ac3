use chrono::Duration;
use storage::repository::{ContentRepository, ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use tutor_core::curriculum::{Curriculum, CurriculumDraft};
use tutor_core::model::{
    ExerciseAttempt, ExerciseId, ExerciseKind, LessonId, Level, Subject, TopicId,
};
use tutor_core::time::fixed_now;

const CURRICULUM: &str = r#"{
    "topics": [
        { "id": "3", "title": "Energy", "subject": "physics", "level": "gcse",
          "description": "Stores and transfers", "lessonCount": 1 },
        { "id": "2", "title": "Particles", "subject": "chemistry", "level": "ks3",
          "description": "Solids, liquids and gases", "lessonCount": 0 },
        { "id": "1", "title": "Cells and Organisation", "subject": "biology", "level": "ks3",
          "description": "Cells, tissues, organs", "lessonCount": 2 }
    ],
    "lessons": [
        { "id": "l2", "topicId": "1", "title": "Tissues and Organs",
          "content": "<h2>From Cells to Systems</h2>", "order": 1, "hasExercises": false },
        { "id": "l1", "topicId": "1", "title": "What are Cells?",
          "content": "<h2>Introduction to Cells</h2>\n<p>All living things.</p>",
          "order": 0, "hasExercises": true },
        { "id": "l3", "topicId": "3", "title": "Energy Stores",
          "content": "<p>Kinetic, thermal</p>", "order": 0, "hasExercises": false }
    ],
    "exercises": [
        { "id": "e2", "lessonId": "l1", "question": "Prokaryotic cells have a nucleus.",
          "type": "true-false", "correctAnswer": "false", "order": 1 },
        { "id": "e1", "lessonId": "l1", "question": "What is a group of similar cells called?",
          "type": "multiple-choice", "options": ["An organ", "A tissue", "A system"],
          "correctAnswer": "A tissue", "explanation": "Tissues are groups of cells.", "order": 0 },
        { "id": "e3", "lessonId": "l1", "question": "Which organelle releases energy?",
          "type": "short-answer", "correctAnswer": "Mitochondria", "order": 2 }
    ]
}"#;

async fn seeded(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::open(&url).await.expect("open");
    let curriculum = Curriculum::from_json(CURRICULUM).expect("curriculum");
    repo.load_curriculum(&curriculum).await.expect("load");
    repo
}

#[tokio::test]
async fn topics_come_back_in_catalog_order() {
    let repo = seeded("memdb_catalog").await;

    let ids: Vec<String> = repo
        .list_topics()
        .await
        .unwrap()
        .iter()
        .map(|t| t.id().to_string())
        .collect();
    assert_eq!(ids, ["1", "2", "3"]);

    let ks3 = repo.list_topics_by_level(Level::Ks3).await.unwrap();
    assert_eq!(ks3.len(), 2);
    assert!(ks3.iter().all(|t| t.level() == Level::Ks3));

    let physics = repo.list_topics_by_subject(Subject::Physics).await.unwrap();
    assert_eq!(physics.len(), 1);
    assert_eq!(physics[0].title(), "Energy");
}

#[tokio::test]
async fn lessons_and_exercises_are_ordered_by_position() {
    let repo = seeded("memdb_positions").await;

    let lessons = repo.list_lessons_by_topic(&TopicId::new("1")).await.unwrap();
    let ids: Vec<&str> = lessons.iter().map(|l| l.id().as_str()).collect();
    assert_eq!(ids, ["l1", "l2"]);
    assert_eq!(
        lessons[0].content(),
        "<h2>Introduction to Cells</h2>\n<p>All living things.</p>"
    );
    assert!(lessons[0].has_exercises());

    let exercises = repo
        .list_exercises_by_lesson(&LessonId::new("l1"))
        .await
        .unwrap();
    let ids: Vec<&str> = exercises.iter().map(|e| e.id().as_str()).collect();
    assert_eq!(ids, ["e1", "e2", "e3"]);
}

#[tokio::test]
async fn exercise_options_survive_storage() {
    let repo = seeded("memdb_options").await;

    let choice = repo
        .get_exercise(&ExerciseId::new("e1"))
        .await
        .unwrap()
        .expect("e1");
    assert_eq!(
        choice.kind(),
        &ExerciseKind::MultipleChoice {
            options: vec!["An organ".into(), "A tissue".into(), "A system".into()]
        }
    );
    assert_eq!(choice.explanation(), "Tissues are groups of cells.");

    let short = repo
        .get_exercise(&ExerciseId::new("e3"))
        .await
        .unwrap()
        .expect("e3");
    assert_eq!(short.kind(), &ExerciseKind::ShortAnswer);
    assert_eq!(short.kind().options(), None);
}

#[tokio::test]
async fn unknown_ids_are_absent_not_errors() {
    let repo = seeded("memdb_absent").await;

    assert!(repo.get_topic(&TopicId::new("99")).await.unwrap().is_none());
    assert!(repo.get_lesson(&LessonId::new("nope")).await.unwrap().is_none());
    assert!(repo.get_exercise(&ExerciseId::new("nope")).await.unwrap().is_none());
    assert!(
        repo.list_lessons_by_topic(&TopicId::new("99"))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        repo.list_exercises_by_lesson(&LessonId::new("l2"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reloading_overwrites_by_id() {
    let repo = seeded("memdb_reload").await;

    let mut draft = CurriculumDraft::from_json(CURRICULUM).unwrap();
    draft.topics[2].title = "Cell Biology".into();
    repo.load_curriculum(&draft.validate().unwrap()).await.unwrap();

    let topics = repo.list_topics().await.unwrap();
    assert_eq!(topics.len(), 3);
    let cells = repo.get_topic(&TopicId::new("1")).await.unwrap().unwrap();
    assert_eq!(cells.title(), "Cell Biology");
}

#[tokio::test]
async fn position_clash_with_stored_content_is_a_conflict() {
    let repo = seeded("memdb_clash").await;

    let extra = Curriculum::from_json(
        r#"{
            "topics": [
                { "id": "1", "title": "Cells and Organisation", "subject": "biology",
                  "level": "ks3", "lessonCount": 3 }
            ],
            "lessons": [
                { "id": "l9", "topicId": "1", "title": "Another", "order": 0 }
            ]
        }"#,
    )
    .unwrap();

    let err = repo.load_curriculum(&extra).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    // The failed load is rolled back as a whole.
    let cells = repo.get_topic(&TopicId::new("1")).await.unwrap().unwrap();
    assert_eq!(cells.lesson_count(), 2);
    assert!(repo.get_lesson(&LessonId::new("l9")).await.unwrap().is_none());
}

#[tokio::test]
async fn reloading_may_reorder_overwritten_rows() {
    let repo = seeded("memdb_reorder").await;

    let mut draft = CurriculumDraft::from_json(CURRICULUM).unwrap();
    for lesson in &mut draft.lessons {
        match lesson.id.as_str() {
            "l1" => lesson.order = 1,
            "l2" => lesson.order = 0,
            _ => {}
        }
    }
    for exercise in &mut draft.exercises {
        match exercise.id.as_str() {
            "e1" => exercise.order = 2,
            "e3" => exercise.order = 0,
            _ => {}
        }
    }
    repo.load_curriculum(&draft.validate().unwrap()).await.unwrap();

    let lessons = repo.list_lessons_by_topic(&TopicId::new("1")).await.unwrap();
    let ids: Vec<&str> = lessons.iter().map(|l| l.id().as_str()).collect();
    assert_eq!(ids, ["l2", "l1"]);
    assert_eq!(lessons[1].position(), 1);

    let exercises = repo
        .list_exercises_by_lesson(&LessonId::new("l1"))
        .await
        .unwrap();
    let ids: Vec<&str> = exercises.iter().map(|e| e.id().as_str()).collect();
    assert_eq!(ids, ["e3", "e2", "e1"]);
}

#[tokio::test]
async fn completion_upserts_and_is_idempotent() {
    let repo = seeded("memdb_progress").await;
    let lesson = LessonId::new("l1");
    let topic = TopicId::new("1");

    assert!(!repo.is_lesson_complete(&lesson).await.unwrap());

    repo.mark_lesson_complete(&lesson, &topic, fixed_now())
        .await
        .unwrap();
    let later = fixed_now() + Duration::minutes(5);
    repo.mark_lesson_complete(&lesson, &topic, later).await.unwrap();

    assert!(repo.is_lesson_complete(&lesson).await.unwrap());
    let progress = repo.all_progress().await.unwrap();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].completed);
    assert_eq!(progress[0].completed_at, Some(later));
}

#[tokio::test]
async fn attempt_log_is_append_only() {
    let repo = seeded("memdb_attempts").await;
    let now = fixed_now();

    for (i, (id, answer, correct)) in [
        ("e1", "An organ", false),
        ("e1", "A tissue", true),
        ("e3", "mitochondria", true),
        ("e1", "A tissue", true),
    ]
    .into_iter()
    .enumerate()
    {
        let at = now + Duration::seconds(i64::try_from(i).unwrap());
        repo.record_attempt(&ExerciseAttempt::new(ExerciseId::new(id), answer, correct, at))
            .await
            .unwrap();
    }

    let all = repo.attempts().await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].user_answer, "An organ");
    assert!(!all[0].is_correct);
    assert_eq!(all[3].attempted_at, now + Duration::seconds(3));

    let e1 = repo
        .attempts_for_exercises(&[ExerciseId::new("e1")])
        .await
        .unwrap();
    assert_eq!(e1.len(), 3);

    let both = repo
        .attempts_for_exercises(&[ExerciseId::new("e3"), ExerciseId::new("e1")])
        .await
        .unwrap();
    assert_eq!(both.len(), 4);

    assert!(repo.attempts_for_exercises(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn migrations_are_rerunnable() {
    let repo = seeded("memdb_remigrate").await;
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.list_topics().await.unwrap().len(), 3);
}

#[tokio::test]
async fn private_memory_database_outlives_single_queries() {
    let storage = Storage::sqlite("sqlite::memory:").await.expect("open");
    let curriculum = Curriculum::from_json(CURRICULUM).unwrap();
    storage.content.load_curriculum(&curriculum).await.unwrap();

    let topics = storage.content.list_topics().await.unwrap();
    assert_eq!(topics.len(), 3);
    storage
        .progress
        .mark_lesson_complete(&LessonId::new("l1"), &TopicId::new("1"), fixed_now())
        .await
        .unwrap();
    assert!(
        storage
            .progress
            .is_lesson_complete(&LessonId::new("l1"))
            .await
            .unwrap()
    );
}
