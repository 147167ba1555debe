//! CLI command implementations
//!
//! Each invocation loads the config, opens the file-backed collection it
//! needs, performs one operation through the form, dialog or service layer,
//! and prints exactly one JSON response. Log lines go to stderr so stdout
//! carries nothing but that response.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::config::ConsoleConfig;
use crate::dialog::{DeleteConfirmation, DialogError};
use crate::entity::{Entity, RecordId, Student, Teacher};
use crate::form::{FormController, FormError, SubmitOutcome};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::realtime::ChangeFeed;
use crate::schema::{FieldError, FieldErrors};
use crate::service::{CrudService, ValidatedEntity};
use crate::store::FileRecordStore;

use super::args::{Cli, Command, EntityAction};
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_request, validation_response, write_response};

/// Service over the file store for any entity kind
type FileService<E> = CrudService<E, FileRecordStore<E>>;

/// Code for a submit that reached the store and failed
pub const SUBMIT_FAILED_CODE: &str = "REG_SUBMIT_FAILED";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(run_command(cli))
}

/// Run the appropriate command based on CLI args, reading stdin when the
/// command takes a record
pub async fn run_command(cli: Cli) -> CliResult<()> {
    Logger::reserve_stdout(true);

    let input = if takes_record(&cli.command) {
        Some(read_request()?)
    } else {
        None
    };

    let response = execute(cli, input).await?;
    write_response(&response)
}

/// Run a parsed command against an already-read request and return its
/// response
pub async fn execute(cli: Cli, input: Option<Map<String, Value>>) -> CliResult<Value> {
    let config = load_config(&cli.config)?;
    log_event_with_fields(Event::ConsoleStart, &[("command", cli.command.name())]);

    match cli.command {
        Command::Init => init(&config),
        Command::Students { action } => run_entity::<Student>(&config, action, input).await,
        Command::Teachers { action } => run_entity::<Teacher>(&config, action, input).await,
    }
}

fn takes_record(command: &Command) -> bool {
    match command {
        Command::Init => false,
        Command::Students { action } | Command::Teachers { action } => {
            matches!(action, EntityAction::Create | EntityAction::Edit { .. })
        }
    }
}

fn load_config(path: &Path) -> CliResult<ConsoleConfig> {
    let config = ConsoleConfig::load(path)?;
    Logger::set_min_severity(config.severity());

    let data_dir = config.data_dir.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", data_dir.as_str())]);

    Ok(config)
}

/// Create the data directory with an empty file per collection
pub fn init(config: &ConsoleConfig) -> CliResult<Value> {
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    fs::create_dir_all(data_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", data_dir, e))
    })?;

    for collection in [Student::COLLECTION, Teacher::COLLECTION] {
        let path = data_dir.join(format!("{}.json", collection));
        if !path.exists() {
            fs::write(&path, "[]")?;
        }
    }

    let shown = data_dir.display().to_string();
    log_event_with_fields(Event::DataDirInitialized, &[("data_dir", shown.as_str())]);

    Ok(ok_response(json!({"initialized": true, "data_dir": shown})))
}

fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join(format!("{}.json", Student::COLLECTION)).exists()
        && data_dir.join(format!("{}.json", Teacher::COLLECTION)).exists()
}

fn parse_id(raw: &str) -> CliResult<RecordId> {
    raw.parse()
        .map_err(|e| CliError::invalid_input(format!("Invalid record id '{}': {}", raw, e)))
}

fn require_record(input: Option<Map<String, Value>>) -> CliResult<Map<String, Value>> {
    input.ok_or_else(|| CliError::invalid_input("Expected a JSON object on stdin"))
}

/// Run one action against the collection of `E`
///
/// `input` is the record read for `create` and `edit`; other actions ignore it.
pub async fn run_entity<E: Entity>(
    config: &ConsoleConfig,
    action: EntityAction,
    input: Option<Map<String, Value>>,
) -> CliResult<Value> {
    if !is_initialized(config.data_path()) {
        return Err(CliError::not_initialized());
    }

    let store = Arc::new(FileRecordStore::<E>::new(config.data_path()));
    let service: Arc<FileService<E>> = Arc::new(
        CrudService::new(store, Arc::new(ChangeFeed::new())).with_owner(config.owner_id.clone()),
    );

    match action {
        EntityAction::List => list(&service).await,
        EntityAction::Get { id } => get(&service, parse_id(&id)?).await,
        EntityAction::Create => {
            let form = FormController::create(Arc::clone(&service));
            submit(&service, form, require_record(input)?).await
        }
        EntityAction::Edit { id } => {
            let id = parse_id(&id)?;
            let input = require_record(input)?;
            match FormController::open_edit(Arc::clone(&service), id).await {
                Ok(form) => submit(&service, form, input).await,
                Err(err) => Ok(form_error(&err)),
            }
        }
        EntityAction::Delete { id, yes } => delete(&service, parse_id(&id)?, yes).await,
    }
}

async fn list<E: Entity>(service: &Arc<FileService<E>>) -> CliResult<Value> {
    match service.list().await {
        Ok(records) => Ok(ok_response(serde_json::to_value(records)?)),
        Err(err) => Ok(error_response(err.code(), &err.to_string())),
    }
}

async fn get<E: Entity>(service: &Arc<FileService<E>>, id: RecordId) -> CliResult<Value> {
    match service.get_by_id(id).await {
        Ok(Some(record)) => Ok(ok_response(serde_json::to_value(record)?)),
        Ok(None) => Ok(ok_response(Value::Null)),
        Err(err) => Ok(error_response(err.code(), &err.to_string())),
    }
}

async fn submit<E: Entity>(
    service: &Arc<FileService<E>>,
    mut form: FormController<E, FileService<E>>,
    input: Map<String, Value>,
) -> CliResult<Value> {
    let mut undeclared = FieldErrors::new();
    for (name, value) in input {
        match form.set_field(&name, value) {
            Ok(()) => {}
            Err(FormError::UnknownField { field, .. }) => undeclared.push(FieldError::undeclared(field)),
            Err(err) => return Ok(form_error(&err)),
        }
    }
    if !undeclared.is_empty() {
        return Ok(validation_response(&undeclared));
    }

    match form.submit().await {
        SubmitOutcome::Invalid(errors) => Ok(validation_response(&errors)),
        SubmitOutcome::Saved(id) => get(service, id).await,
        SubmitOutcome::Failed(message) => Ok(error_response(SUBMIT_FAILED_CODE, &message)),
    }
}

async fn delete<E: Entity>(service: &Arc<FileService<E>>, id: RecordId, confirmed: bool) -> CliResult<Value> {
    let mut dialog = DeleteConfirmation::<E, _>::new(Arc::clone(service), id);
    dialog.open();

    if !confirmed {
        dialog
            .cancel()
            .map_err(|e| CliError::invalid_input(e.to_string()))?;
        return Ok(ok_response(json!({
            "deleted": false,
            "id": id.to_string(),
            "message": "Delete not confirmed; pass --yes to remove the record"
        })));
    }

    match dialog.confirm().await {
        Ok(()) => Ok(ok_response(json!({"deleted": true, "id": id.to_string()}))),
        Err(err @ DialogError::DeleteFailed(_)) => Ok(error_response(err.code(), &err.to_string())),
        Err(err) => Err(CliError::invalid_input(err.to_string())),
    }
}

fn form_error(err: &FormError) -> Value {
    error_response(err.code(), &err.to_string())
}
