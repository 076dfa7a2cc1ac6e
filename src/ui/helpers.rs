//! Helper functions shared across the UI layer: background task spawning
//! and small formatting utilities for widgets.

use crate::app::AppEvent;
use futures::FutureExt;
use ratatui::layout::Rect;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking background task would otherwise vanish silently; this turns
/// the panic payload into `Err(message)` so the UI can reset its loading
/// flags and tell the operator.
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run `future` on the runtime and deliver its event to the loop.
///
/// A panic inside the task is reported as [`AppEvent::TaskPanicked`] tagged
/// with `task`.
pub(crate) fn spawn_task<F>(
    tx: &mpsc::Sender<AppEvent>,
    task: &'static str,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(future).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(task, error = %error, "Background task panicked");
                AppEvent::TaskPanicked { task, error }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task, error = %e, "Failed to send task result (receiver dropped)");
        }
    })
}

/// Publication date as shown in tables: the server's string up to minutes.
///
/// `"2024-03-01 12:30:45"` → `"2024-03-01 12:30"`. Anything that doesn't
/// look like that is shown as-is; a missing date is `-`.
pub(super) fn format_pubdate(pubdate: Option<&str>) -> String {
    let Some(raw) = pubdate.map(str::trim).filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

/// Compact count: 999, 1.2k, 35k, 1.1M.
pub(super) fn format_count(n: u64) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=9_999 => format!("{:.1}k", n as f64 / 1_000.0),
        10_000..=999_999 => format!("{}k", n / 1_000),
        _ => format!("{:.1}M", n as f64 / 1_000_000.0),
    }
}

/// Rect of at most `width` x `height`, centered in `area`.
pub(super) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Braille spinner frames, advanced on each tick while a request is busy.
pub(super) const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub(super) fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        let result = catch_task_panic(async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_catch_task_panic_str_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_string_message() {
        let code = 7;
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("failed with {}", code) }).await;
        assert_eq!(result, Err("failed with 7".to_string()));
    }

    #[tokio::test]
    async fn test_spawn_task_reports_panic() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_task(&tx, "probe", async {
            panic!("kaboom");
        });
        handle.await.unwrap();
        match rx.recv().await {
            Some(AppEvent::TaskPanicked { task, error }) => {
                assert_eq!(task, "probe");
                assert_eq!(error, "kaboom");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_task_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        spawn_task(&tx, "redirect", async {
            AppEvent::RedirectDue(crate::app::Route::Articles)
        })
        .await
        .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::RedirectDue(crate::app::Route::Articles))
        ));
    }

    #[test]
    fn test_format_pubdate() {
        assert_eq!(format_pubdate(Some("2024-03-01 12:30:45")), "2024-03-01 12:30");
        assert_eq!(format_pubdate(Some("2024-03-01T08:00:00")), "2024-03-01 08:00");
        assert_eq!(format_pubdate(Some("yesterday")), "yesterday");
        assert_eq!(format_pubdate(Some("  ")), "-");
        assert_eq!(format_pubdate(None), "-");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_240), "1.2k");
        assert_eq!(format_count(35_400), "35k");
        assert_eq!(format_count(1_100_000), "1.1M");
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 20, area), area);
    }
}
