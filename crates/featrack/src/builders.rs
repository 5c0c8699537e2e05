//! Payload builders for the fluent API.

use crate::types::{CreateCustomerPayload, UsagePayload};
use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way the API stores it (`2024-01-01T12:00:00.000Z`).
pub(crate) fn iso_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================
// CUSTOMER BUILDER
// ============================================

/// Builder for `customers/create` requests.
#[derive(Debug)]
pub(crate) struct CustomerBuilder {
    unique_id: String,
    customer_name: Option<String>,
    identify: bool,
}

impl CustomerBuilder {
    pub(crate) fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            customer_name: None,
            identify: false,
        }
    }

    /// Set the display name.
    pub(crate) fn name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Identify as this customer once it has been created.
    pub(crate) fn and_identify(mut self) -> Self {
        self.identify = true;
        self
    }

    pub(crate) fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub(crate) fn identifies(&self) -> bool {
        self.identify
    }

    /// Build the payload.
    pub(crate) fn build(&self, application_slug: &str) -> CreateCustomerPayload {
        CreateCustomerPayload {
            application_slug: application_slug.into(),
            unique_id: self.unique_id.clone(),
            customer_name: self.customer_name.clone(),
        }
    }
}

// ============================================
// USAGE BUILDER
// ============================================

/// Builder for `usages/consume` requests.
#[derive(Debug)]
pub(crate) struct UsageBuilder {
    feature_slug: String,
    date: Option<DateTime<Utc>>,
    customer_name: Option<String>,
    feature_emoji: Option<String>,
    feature_name: Option<String>,
    feature_description: Option<String>,
}

impl UsageBuilder {
    pub(crate) fn new(feature_slug: impl Into<String>) -> Self {
        Self {
            feature_slug: feature_slug.into(),
            date: None,
            customer_name: None,
            feature_emoji: None,
            feature_name: None,
            feature_description: None,
        }
    }

    /// Set when the usage happened. Defaults to now.
    pub(crate) fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the customer display name.
    pub(crate) fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Set the feature emoji.
    pub(crate) fn feature_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.feature_emoji = Some(emoji.into());
        self
    }

    /// Set the feature display name.
    pub(crate) fn feature_name(mut self, name: impl Into<String>) -> Self {
        self.feature_name = Some(name.into());
        self
    }

    /// Set the feature description.
    pub(crate) fn feature_description(mut self, description: impl Into<String>) -> Self {
        self.feature_description = Some(description.into());
        self
    }

    pub(crate) fn feature_slug(&self) -> &str {
        &self.feature_slug
    }

    /// Build the payload. `session_id` is attached only when a session is
    /// active.
    pub(crate) fn build(
        self,
        application_slug: &str,
        customer_unique_id: String,
        session_id: Option<String>,
    ) -> UsagePayload {
        UsagePayload {
            customer_unique_id,
            feature_slug: self.feature_slug,
            application_slug: application_slug.into(),
            created_at: iso_timestamp(self.date.unwrap_or_else(Utc::now)),
            session_id,
            customer_name: self.customer_name,
            feature_emoji: self.feature_emoji,
            feature_name: self.feature_name,
            feature_description: self.feature_description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_customer_builder() {
        let payload = CustomerBuilder::new("u1").name("Ann").build("app");

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "applicationSlug": "app", "uniqueId": "u1", "customerName": "Ann" })
        );
    }

    #[test]
    fn test_customer_builder_without_name() {
        let builder = CustomerBuilder::new("u1");
        assert!(!builder.identifies());

        let json = serde_json::to_value(builder.build("app")).unwrap();
        assert!(json.get("customerName").is_none());
    }

    #[test]
    fn test_usage_builder_all_fields() {
        let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let payload = UsageBuilder::new("feature-slug")
            .date(date)
            .customer_name("John Doe")
            .feature_emoji("🚀")
            .feature_name("Feature Name")
            .feature_description("Feature Description")
            .build("test-app", "user-123".into(), Some("s1".into()));

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "customerUniqueId": "user-123",
                "featureSlug": "feature-slug",
                "applicationSlug": "test-app",
                "createdAt": "2023-01-01T00:00:00.000Z",
                "sessionId": "s1",
                "customerName": "John Doe",
                "featureEmoji": "🚀",
                "featureName": "Feature Name",
                "featureDescription": "Feature Description"
            })
        );
    }

    #[test]
    fn test_usage_builder_defaults_created_at_to_now() {
        let before = Utc::now();
        let payload = UsageBuilder::new("export").build("app", "u1".into(), None);
        let created = DateTime::parse_from_rfc3339(&payload.created_at)
            .unwrap()
            .with_timezone(&Utc);

        // millisecond truncation may put it just below `before`
        assert!(created >= before - chrono::Duration::milliseconds(1));
        assert!(created <= Utc::now());
        assert!(payload.session_id.is_none());
    }
}
