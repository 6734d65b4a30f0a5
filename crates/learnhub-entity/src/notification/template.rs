//! Reusable notification templates with `{{name}}` placeholders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::notification::types::{
    NotificationChannel, NotificationPriority, NotificationType,
};

/// A reusable content factory for one notification type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTemplate {
    /// Unique template identifier.
    pub id: Uuid,
    /// The notification type this template produces.
    pub kind: NotificationType,
    /// Title pattern with `{{name}}` placeholders.
    pub title_template: String,
    /// Body pattern with `{{name}}` placeholders.
    pub body_template: String,
    /// Channels applied to notifications built from this template.
    pub default_channels: HashSet<NotificationChannel>,
    /// Priority applied to notifications built from this template.
    pub default_priority: NotificationPriority,
    /// Lifetime in seconds applied to notifications built from this
    /// template. `None` means never expires.
    pub default_expiry_seconds: Option<i64>,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
}

impl NotificationTemplate {
    /// Create a template with the type's default priority and the
    /// default channel set `{in_app}`.
    pub fn new(
        kind: NotificationType,
        title_template: impl Into<String>,
        body_template: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title_template: title_template.into(),
            body_template: body_template.into(),
            default_channels: HashSet::from([NotificationChannel::InApp]),
            default_priority: kind.default_priority(),
            default_expiry_seconds: None,
            created_at: Utc::now(),
        }
    }

    /// Replace the default channel set.
    pub fn with_channels(
        mut self,
        channels: impl IntoIterator<Item = NotificationChannel>,
    ) -> Self {
        self.default_channels = channels.into_iter().collect();
        self
    }

    /// Override the default priority.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Set the default lifetime in seconds.
    pub fn with_expiry_seconds(mut self, seconds: i64) -> Self {
        self.default_expiry_seconds = Some(seconds);
        self
    }

    /// Render the title and body, substituting `{{name}}` placeholders
    /// from `parameters`.
    ///
    /// Placeholders without a matching key stay verbatim in the output;
    /// rendering never fails. Substitution is a single pass over the
    /// template text, so substituted values are never themselves scanned.
    pub fn render(&self, parameters: &HashMap<String, String>) -> (String, String) {
        (
            render_placeholders(&self.title_template, parameters),
            render_placeholders(&self.body_template, parameters),
        )
    }
}

/// Substitute `{{name}}` tokens in one template string.
fn render_placeholders(template: &str, parameters: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = &after_open[..close];
                match parameters.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                // Unterminated token: keep the tail as-is.
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let t = NotificationTemplate::new(
            NotificationType::CourseAssigned,
            "Новый курс: {{courseName}}",
            "Курс {{courseName}} назначен. Срок: {{deadline}}",
        );
        let (title, body) = t.render(&params(&[
            ("courseName", "Swift Basics"),
            ("deadline", "01.09.2026"),
        ]));
        assert_eq!(title, "Новый курс: Swift Basics");
        assert_eq!(body, "Курс Swift Basics назначен. Срок: 01.09.2026");
    }

    #[test]
    fn test_missing_parameters_stay_verbatim() {
        let t = NotificationTemplate::new(
            NotificationType::CourseAssigned,
            "Курс {{courseName}} от {{instructor}}",
            "",
        );
        let (title, _) = t.render(&params(&[("courseName", "iOS Development")]));
        assert_eq!(title, "Курс iOS Development от {{instructor}}");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let t = NotificationTemplate::new(
            NotificationType::SystemMessage,
            "{{a}} {{b}}",
            "",
        );
        let (title, _) = t.render(&params(&[("a", "{{b}}"), ("b", "x")]));
        assert_eq!(title, "{{b}} x");
    }

    #[test]
    fn test_unterminated_token_kept() {
        let t = NotificationTemplate::new(NotificationType::SystemMessage, "oops {{name", "");
        let (title, _) = t.render(&params(&[("name", "x")]));
        assert_eq!(title, "oops {{name");
    }

    #[test]
    fn test_empty_parameters_leave_template_unchanged() {
        let t = NotificationTemplate::new(
            NotificationType::TestDeadline,
            "Тест '{{testName}}'",
            "До дедлайна {{hoursLeft}} ч.",
        );
        let (title, body) = t.render(&HashMap::new());
        assert_eq!(title, "Тест '{{testName}}'");
        assert_eq!(body, "До дедлайна {{hoursLeft}} ч.");
    }
}
