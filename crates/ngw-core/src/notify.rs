//! Hidden-count notifications
//!
//! Counts flow one way, to whatever renders the toolbar badge. The receiver
//! may already be gone (extension reloaded, popup closed), so callers treat
//! every failure as ignorable.

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Count receiver disconnected")]
    Disconnected,
    #[error("Count notification failed: {0}")]
    Failed(String),
}

pub trait CountNotifier {
    fn notify_hidden_count(&self, count: usize) -> Result<(), NotifyError>;
}

/// Discards every count.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl CountNotifier for NoopNotifier {
    fn notify_hidden_count(&self, _count: usize) -> Result<(), NotifyError> {
        Ok(())
    }
}

impl<F> CountNotifier for F
where
    F: Fn(usize) -> Result<(), NotifyError>,
{
    fn notify_hidden_count(&self, count: usize) -> Result<(), NotifyError> {
        self(count)
    }
}

/// Badge text for the toolbar icon.
pub fn badge_text(enabled: bool, count: usize) -> String {
    if !enabled {
        "OFF".to_string()
    } else if count == 0 {
        String::new()
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_text_states() {
        assert_eq!(badge_text(false, 5), "OFF");
        assert_eq!(badge_text(true, 0), "");
        assert_eq!(badge_text(true, 12), "12");
    }

    #[test]
    fn closures_are_notifiers() {
        let notifier = |count: usize| if count > 1 { Err(NotifyError::Disconnected) } else { Ok(()) };
        assert!(notifier.notify_hidden_count(1).is_ok());
        assert!(matches!(notifier.notify_hidden_count(2), Err(NotifyError::Disconnected)));
    }
}
