use notify_rust::Notification;

use super::Notifier;

/// Desktop notifications through the platform notification daemon.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn show(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .show()
            .map_err(|e| anyhow::anyhow!("Showing notification failed: {}", e))?;
        log::info!("Notification shown: {}: {}", title, message);
        Ok(())
    }
}
