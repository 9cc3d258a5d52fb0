pub mod config;
pub mod ledger;
pub mod marks;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod session;
pub mod timer;
pub mod utils;

#[cfg(feature = "desktop")]
mod commands;

pub use config::EngineConfig;
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistedSnapshot, PersistenceMirror};
pub use session::{Change, Session, SessionController, SessionEvent, ViewState};
pub use utils::{Clock, ManualClock, MonotonicClock};

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;

    use log::warn;
    use tauri::{Emitter, Manager};

    use crate::commands::{
        add_record, adjust_counter, change_setting, click_image, delete_record, edit_record,
        get_session_state, remove_image, remove_oldest_record, report_activity, request_reset,
        resolve_popup, resolve_record, select_image, set_mark_color, set_mark_size,
        toggle_add_record, toggle_ledger, undo_mark,
    };
    use crate::{utils::logging, EngineConfig, FileStore, MonotonicClock, SessionController};

    pub(crate) struct AppState {
        pub(crate) session: SessionController<FileStore>,
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        let config = EngineConfig::from_env();
        logging::init(config.debug);

        log::info!("MarkLedger starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(move |app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    let store = FileStore::new(app_data_dir)?;

                    let controller =
                        SessionController::new(config.clone(), store, Arc::new(MonotonicClock::new()));

                    let forwarder = controller.clone();
                    let app_handle = app.handle().clone();
                    tauri::async_runtime::spawn(async move {
                        forwarder.start().await;
                        let mut updates = forwarder.subscribe();
                        while updates.changed().await.is_ok() {
                            let view = updates.borrow_and_update().clone();
                            if let Err(err) = app_handle.emit("session-state-changed", view) {
                                warn!("Failed to emit session state: {err}");
                            }
                        }
                    });

                    app.manage(AppState {
                        session: controller,
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                get_session_state,
                select_image,
                remove_image,
                click_image,
                undo_mark,
                set_mark_size,
                set_mark_color,
                report_activity,
                toggle_ledger,
                toggle_add_record,
                add_record,
                resolve_popup,
                resolve_record,
                edit_record,
                delete_record,
                remove_oldest_record,
                change_setting,
                adjust_counter,
                request_reset,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
