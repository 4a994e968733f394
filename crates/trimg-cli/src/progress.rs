//! Live transfer progress on stderr

use std::io::Write;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use trimg_transfer::{ProgressEvent, ProgressKind};

/// Human-readable line for one event
#[must_use]
pub fn render(event: &ProgressEvent) -> String {
    let name = format!("[{}]", event.image);
    match &event.kind {
        ProgressKind::Started { total } => format!("{name} started ({total} steps)"),
        ProgressKind::StepCompleted {
            step,
            completed,
            total,
        } => {
            let percent = completed * 100 / (*total).max(1);
            format!("{name} {step} done {completed}/{total} {percent}%")
        }
        ProgressKind::Finished { success: true } => format!("{name} finished"),
        ProgressKind::Finished { success: false } => format!("{name} failed"),
    }
}

/// Drain `events` onto stderr until every sender is gone
pub fn spawn_renderer(mut events: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", render(&event));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimg_transfer::TransferStep;

    fn event(kind: ProgressKind) -> ProgressEvent {
        ProgressEvent {
            index: 0,
            image: "nginx:latest".into(),
            kind,
        }
    }

    #[test]
    fn step_line_shows_percentage() {
        let line = render(&event(ProgressKind::StepCompleted {
            step: TransferStep::Tag,
            completed: 4,
            total: 5,
        }));
        assert_eq!(line, "[nginx:latest] tag done 4/5 80%");
    }

    #[test]
    fn finished_lines() {
        assert_eq!(
            render(&event(ProgressKind::Finished { success: false })),
            "[nginx:latest] failed"
        );
        assert_eq!(
            render(&event(ProgressKind::Started { total: 5 })),
            "[nginx:latest] started (5 steps)"
        );
    }
}
