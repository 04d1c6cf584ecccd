//! Structured action results and error-tracking helpers.
//!
//! User-facing actions (login, register, catalog administration) return
//! `Result<T, E>` to Rust callers; logout always completes. At an outer boundary, such as the
//! CLI, those results are flattened into an [`ActionResult`]: failures become
//! `{"success": false, "error": "<message>"}` and never escape as panics.
//!
//! Background operations (cart hydration and save, catalog refresh) do not
//! return errors at all; they log and record a status instead.

use serde::Serialize;

/// Serializable outcome of a user-facing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    /// A successful result carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// A failed result with a user-facing message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            data: None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ActionResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let result: ActionResult = Err::<(), _>("invalid username or password").into();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"success": false, "error": "invalid username or password"})
        );
    }

    #[test]
    fn test_success_shape() {
        let result: ActionResult<u32> = Ok::<_, String>(3).into();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"success": true, "data": 3})
        );

        let unit: ActionResult = ActionResult::ok(());
        assert_eq!(
            serde_json::to_value(&unit).unwrap(),
            serde_json::json!({"success": true, "data": null})
        );
    }
}
