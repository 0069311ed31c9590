//! Serializable condition vocabulary for permission overrides and policy rules.
//!
//! Conditions are plain data so they can be loaded from configuration and
//! compared, logged and tested independently of the evaluators that use them.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Request attributes a [`Condition`] is evaluated against.
pub trait ConditionSubject {
    /// Role ids held by the subject for this request.
    fn roles(&self) -> &[String];

    /// Tenant the request is scoped to, if any.
    fn tenant_id(&self) -> Option<&str>;

    /// Free-form request attribute.
    fn attribute(&self, key: &str) -> Option<&str>;

    /// Instant the request is evaluated at.
    fn evaluated_at(&self) -> DateTime<Utc>;
}

/// A single constraint attached to an override or a policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// The subject must hold at least one of the listed roles.
    RequireRole {
        /// Accepted role ids.
        roles: Vec<String>,
    },
    /// The attribute must be present and equal to one of the listed values.
    AttributeEquals {
        /// Attribute name.
        key: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// The request must be scoped to one of the listed tenants.
    /// A request without a tenant never matches.
    TenantIn {
        /// Accepted tenant ids.
        tenants: Vec<String>,
    },
    /// The request must fall inside an hour-of-day window.
    TimeWindow(TimeWindow),
}

/// Hour-of-day window, evaluated at a fixed UTC offset.
///
/// `start_hour <= end_hour` describes `[start, end)`; otherwise the window
/// wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First hour inside the window (0-23).
    pub start_hour: u32,
    /// First hour after the window (0-23).
    pub end_hour: u32,
    /// Offset from UTC in minutes. Defaults to UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl TimeWindow {
    /// Creates a UTC window.
    pub fn utc(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
            utc_offset_minutes: 0,
        }
    }

    /// Returns whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let local = at + Duration::minutes(i64::from(self.utc_offset_minutes));
        let hour = local.hour();
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

impl Condition {
    /// Shorthand for [`Condition::RequireRole`].
    pub fn require_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequireRole {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Shorthand for [`Condition::AttributeEquals`].
    pub fn attribute_equals<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AttributeEquals {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Shorthand for [`Condition::TenantIn`].
    pub fn tenant_in<I, S>(tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::TenantIn {
            tenants: tenants.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluates the condition against the request subject.
    pub fn evaluate<S: ConditionSubject + ?Sized>(&self, subject: &S) -> bool {
        match self {
            Self::RequireRole { roles } => subject.roles().iter().any(|r| roles.contains(r)),
            Self::AttributeEquals { key, values } => subject
                .attribute(key)
                .is_some_and(|value| values.iter().any(|v| v == value)),
            Self::TenantIn { tenants } => match subject.tenant_id() {
                Some(tenant) if !tenant.is_empty() => tenants.iter().any(|t| t == tenant),
                _ => false,
            },
            Self::TimeWindow(window) => window.contains(subject.evaluated_at()),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequireRole { roles } => write!(f, "require_role[{}]", roles.join(",")),
            Self::AttributeEquals { key, values } => {
                write!(f, "attribute_equals[{key}={}]", values.join("|"))
            }
            Self::TenantIn { tenants } => write!(f, "tenant_in[{}]", tenants.join(",")),
            Self::TimeWindow(w) => write!(
                f,
                "time_window_{:02}-{:02}_{:+}m",
                w.start_hour, w.end_hour, w.utc_offset_minutes
            ),
        }
    }
}
