use tauri::State;

use crate::desktop::AppState;
use crate::marks::ImageRect;
use crate::models::{BorderColor, CounterKind, Outcome, Position, RecordPatch, SettingsChange};
use crate::session::{SessionEvent, ViewState};

async fn dispatch(state: &State<'_, AppState>, event: SessionEvent) -> Result<ViewState, String> {
    Ok(state.session.dispatch(event).await)
}

#[tauri::command]
pub async fn get_session_state(state: State<'_, AppState>) -> Result<ViewState, String> {
    Ok(state.session.view().await)
}

#[tauri::command]
pub async fn select_image(state: State<'_, AppState>, bytes: Vec<u8>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::ImageSelected { bytes }).await
}

#[tauri::command]
pub async fn remove_image(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::ImageRemoved).await
}

#[tauri::command]
pub async fn click_image(
    state: State<'_, AppState>,
    pointer_x: f64,
    pointer_y: f64,
    image_rect: Option<ImageRect>,
) -> Result<ViewState, String> {
    dispatch(
        &state,
        SessionEvent::ImageClicked {
            pointer_x,
            pointer_y,
            image_rect,
        },
    )
    .await
}

#[tauri::command]
pub async fn undo_mark(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::MarkUndone).await
}

#[tauri::command]
pub async fn set_mark_size(state: State<'_, AppState>, size: f64) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::MarkSizeChanged { size }).await
}

#[tauri::command]
pub async fn set_mark_color(
    state: State<'_, AppState>,
    color: BorderColor,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::MarkColorChanged { color }).await
}

#[tauri::command]
pub async fn report_activity(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::InputActivity).await
}

#[tauri::command]
pub async fn toggle_ledger(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::LedgerToggled).await
}

#[tauri::command]
pub async fn toggle_add_record(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::AddRecordToggled).await
}

#[tauri::command]
pub async fn add_record(
    state: State<'_, AppState>,
    name: String,
    number: String,
    position: Position,
) -> Result<ViewState, String> {
    dispatch(
        &state,
        SessionEvent::RecordSubmitted {
            name,
            number,
            position,
        },
    )
    .await
}

#[tauri::command]
pub async fn resolve_popup(
    state: State<'_, AppState>,
    popup_id: u64,
    outcome: Option<Outcome>,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::PopupResolved { popup_id, outcome }).await
}

#[tauri::command]
pub async fn resolve_record(
    state: State<'_, AppState>,
    record_id: i64,
    outcome: Outcome,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::RecordResolved { record_id, outcome }).await
}

#[tauri::command]
pub async fn edit_record(
    state: State<'_, AppState>,
    record_id: i64,
    patch: RecordPatch,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::RecordEdited { record_id, patch }).await
}

#[tauri::command]
pub async fn delete_record(state: State<'_, AppState>, record_id: i64) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::RecordDeleted { record_id }).await
}

#[tauri::command]
pub async fn remove_oldest_record(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::OldestRecordRemoved).await
}

#[tauri::command]
pub async fn change_setting(
    state: State<'_, AppState>,
    change: SettingsChange,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::SettingsChanged { change }).await
}

#[tauri::command]
pub async fn adjust_counter(
    state: State<'_, AppState>,
    which: CounterKind,
    delta: i64,
) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::CounterAdjusted { which, delta }).await
}

#[tauri::command]
pub async fn request_reset(state: State<'_, AppState>) -> Result<ViewState, String> {
    dispatch(&state, SessionEvent::ResetRequested).await
}
