use std::io::Write;

use super::Reporter;
use crate::auth::FirebaseAuth;
use crate::config::ProbeOptions;

/// Which branch the authentication probe ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The throwaway account was registered.
    Created { email: String, uid: String },
    /// The throwaway email was taken, and the fallback identity signed in.
    SignedInFallback { email: String, uid: String },
    /// The throwaway email was taken, and the fallback sign-in failed too.
    FallbackFailed { email: String, error: String },
    /// Registration failed for any other reason.
    Failed { email: String, error: String },
}

/// `testuser_<timestamp>@<domain>`, unique per second.
pub fn throwaway_email(timestamp: i64, domain: &str) -> String {
    format!("testuser_{}@{}", timestamp, domain)
}

/// Registers `email`, falling back to signing in with the configured identity if the
/// account already exists. Never fails: every error ends up in the returned outcome.
pub async fn run_auth_probe<W: Write>(
    auth: &FirebaseAuth,
    email: &str,
    options: &ProbeOptions,
    reporter: &mut Reporter<W>,
) -> AuthOutcome {
    reporter.section("Testing Authentication");

    let err = match auth
        .create_user_with_email_and_password(email, &options.test_password)
        .await
    {
        Ok(session) => {
            let email = session.email.unwrap_or_else(|| email.to_string());
            reporter.line(format!(
                "User registered: {} (UID: {})",
                email, session.local_id
            ));
            return AuthOutcome::Created {
                email,
                uid: session.local_id,
            };
        }
        Err(err) => err,
    };

    if !err.is_email_exists() {
        tracing::warn!(error = %err, "registration failed");
        reporter.line(format!("Unexpected error while registering: {}", err));
        reporter.line(
            "Make sure the Email/Password sign-in provider is enabled in Firebase Authentication.",
        );
        return AuthOutcome::Failed {
            email: email.to_string(),
            error: err.to_string(),
        };
    }

    reporter.line(format!("An account for {} already exists.", email));
    reporter.line(format!(
        "Signing in with the fallback identity {} instead.",
        options.fallback_email
    ));

    match auth
        .sign_in_with_email_and_password(&options.fallback_email, &options.fallback_password)
        .await
    {
        Ok(session) => {
            let email = session
                .email
                .unwrap_or_else(|| options.fallback_email.clone());
            reporter.line(format!("Signed in existing user: {}", email));
            AuthOutcome::SignedInFallback {
                email,
                uid: session.local_id,
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "fallback sign-in failed");
            reporter.line(format!("Error signing in the existing user: {}", err));
            AuthOutcome::FallbackFailed {
                email: options.fallback_email.clone(),
                error: err.to_string(),
            }
        }
    }
}
