//! Form Submission Scenario Tests
//!
//! End-to-end form behavior over a service that counts store calls:
//! - Invalid input never reaches `create`
//! - Valid input calls `create` exactly once and runs the success callback
//! - Store failures surface as one general message and leave the form retryable

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use registrar::entity::{Record, RecordId, Student, Term};
use registrar::form::{FormController, FormMode, FormState, SubmitOutcome, SUBMIT_FAILED_MESSAGE};
use registrar::realtime::ChangeFeed;
use registrar::schema::FieldErrors;
use registrar::service::{CrudService, ValidatedEntity};
use registrar::store::{MemoryRecordStore, StoreResult};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Student service that records how often each mutation is called.
struct CountingStudents {
    inner: CrudService<Student, MemoryRecordStore<Student>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingStudents {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: CrudService::new(
                Arc::new(MemoryRecordStore::new()),
                Arc::new(ChangeFeed::new()),
            ),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        })
    }

    fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl ValidatedEntity<Student> for CountingStudents {
    fn validate(&self, input: &Map<String, Value>) -> Result<Student, FieldErrors> {
        self.inner.validate(input)
    }

    async fn create(&self, fields: Student) -> StoreResult<RecordId> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(fields).await
    }

    async fn update(&self, id: RecordId, fields: Student) -> StoreResult<Record<Student>> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, fields).await
    }

    async fn remove(&self, id: RecordId) -> StoreResult<()> {
        self.inner.remove(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Record<Student>>> {
        self.inner.list().await
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<Record<Student>>> {
        self.inner.get_by_id(id).await
    }
}

type StudentForm = FormController<Student, CountingStudents>;

fn ana_ruiz() -> Map<String, Value> {
    json!({
        "numeroMatricula": "A12345",
        "nombre": "Ana Ruiz",
        "correo": "ana@uni.edu",
        "carrera": "Medicina",
        "grado": "1er Semestre",
        "edad": 17
    })
    .as_object()
    .cloned()
    .unwrap()
}

// =============================================================================
// Create Scenarios
// =============================================================================

/// A 2-character enrollment number is rejected before any store call.
#[tokio::test]
async fn test_short_enrollment_number_never_calls_create() {
    let service = CountingStudents::new();
    let mut form: StudentForm = FormController::create(Arc::clone(&service));
    form.set_fields(ana_ruiz()).unwrap();
    form.set_field("numeroMatricula", json!("A1")).unwrap();

    let outcome = form.submit().await;

    let errors = match outcome {
        SubmitOutcome::Invalid(errors) => errors,
        other => panic!("expected validation failure, got {:?}", other),
    };
    assert_eq!(
        errors.get("numeroMatricula"),
        Some("La matrícula debe tener al menos 5 caracteres")
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(service.creates(), 0);
    assert_eq!(form.state(), FormState::Idle);
}

/// The reference student saves once and fires the callback once.
#[tokio::test]
async fn test_valid_student_creates_once_and_calls_back() {
    let service = CountingStudents::new();
    let saved = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&saved);
    let mut form: StudentForm =
        FormController::create(Arc::clone(&service)).on_success(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
    form.set_fields(ana_ruiz()).unwrap();

    let outcome = form.submit().await;

    let id = match outcome {
        SubmitOutcome::Saved(id) => id,
        other => panic!("expected save, got {:?}", other),
    };
    assert_eq!(service.creates(), 1);
    assert_eq!(saved.load(Ordering::SeqCst), 1);
    assert_eq!(form.state(), FormState::Success);

    let record = service.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.fields.full_name, "Ana Ruiz");
    assert_eq!(record.fields.age, 17);
}

/// A blank create form reports every field at once.
#[tokio::test]
async fn test_blank_form_reports_all_fields() {
    let service = CountingStudents::new();
    let mut form: StudentForm = FormController::create(Arc::clone(&service));

    let outcome = form.submit().await;

    let errors = match outcome {
        SubmitOutcome::Invalid(errors) => errors,
        other => panic!("expected validation failure, got {:?}", other),
    };
    assert_eq!(errors.len(), 6);
    assert_eq!(errors.get("edad"), Some("La edad mínima es 5 años"));
    assert_eq!(form.field_errors(), &errors);
    assert_eq!(service.creates(), 0);
}

/// Fixing the invalid field and resubmitting succeeds.
#[tokio::test]
async fn test_resubmit_after_fixing_field() {
    let service = CountingStudents::new();
    let mut form: StudentForm = FormController::create(Arc::clone(&service));
    form.set_fields(ana_ruiz()).unwrap();
    form.set_field("edad", json!(19)).unwrap();

    assert!(matches!(form.submit().await, SubmitOutcome::Invalid(_)));
    assert!(form.field_errors().contains("edad"));

    form.set_field("edad", json!("18")).unwrap();
    assert!(matches!(form.submit().await, SubmitOutcome::Saved(_)));
    assert!(form.field_errors().is_empty());
    assert_eq!(service.creates(), 1);
}

// =============================================================================
// Edit Scenarios
// =============================================================================

/// Edit forms start from the stored row and replace it in place.
#[tokio::test]
async fn test_edit_prepopulates_and_updates() {
    let service = CountingStudents::new();
    let fields = service.validate(&ana_ruiz()).unwrap();
    let id = service.create(fields).await.unwrap();

    let mut form: StudentForm = FormController::open_edit(Arc::clone(&service), id)
        .await
        .unwrap();
    assert_eq!(form.mode(), FormMode::Edit(id));
    assert_eq!(form.field("nombre"), Some(&json!("Ana Ruiz")));

    form.set_field("grado", json!("3er Semestre")).unwrap();
    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Saved(id));
    assert_eq!(service.updates(), 1);
    let record = service.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.fields.term, Term::Third);
}

/// Editing a row deleted in the meantime yields the general error.
#[tokio::test]
async fn test_edit_of_deleted_row_reports_general_error() {
    let service = CountingStudents::new();
    let fields = service.validate(&ana_ruiz()).unwrap();
    let id = service.create(fields).await.unwrap();
    let mut form: StudentForm = FormController::open_edit(Arc::clone(&service), id)
        .await
        .unwrap();

    service.remove(id).await.unwrap();
    let outcome = form.submit().await;

    let message = match outcome {
        SubmitOutcome::Failed(message) => message,
        other => panic!("expected failure, got {:?}", other),
    };
    assert!(message.starts_with(SUBMIT_FAILED_MESSAGE));
    assert_eq!(form.general_error(), Some(message.as_str()));
    assert!(form.error_in_view());
    assert_eq!(form.state(), FormState::Failed);
    assert!(!form.is_submitting());
}
