use std::env;
use std::fmt;

use anyhow::{Result, bail};

pub const EMAIL_VAR: &str = "FRIENDASSIGN_EMAIL";
pub const PASSWORD_VAR: &str = "FRIENDASSIGN_PASSWORD";

/// An email and password for the identity provider. The password never shows up in `Debug`
/// output, so creds can be logged with `?creds`.
#[derive(Clone)]
pub struct Creds {
    email: String,
    password: String,
}

impl Creds {
    /// Reads [`EMAIL_VAR`] and [`PASSWORD_VAR`]. Unset and blank values are both missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        match (present(EMAIL_VAR), present(PASSWORD_VAR)) {
            (Some(email), Some(password)) => Ok(Self::new(email.trim().to_owned(), password)),
            (None, _) => bail!("{EMAIL_VAR} is not set"),
            (_, None) => bail!("{PASSWORD_VAR} is not set"),
        }
    }

    pub fn new(email: String, password: String) -> Self {
        Self { email, password }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Creds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creds")
            .field("email", &self.email)
            .field("password", &"<hidden>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn debug_shows_the_email_but_never_the_password() {
        let creds = Creds::new("ana@x.com".to_owned(), "correct horse".to_owned());
        let shown = format!("{creds:?}");

        assert!(shown.contains("ana@x.com"));
        assert!(shown.contains("<hidden>"));
        assert!(!shown.contains("correct horse"));
    }

    #[test]
    fn email_is_trimmed_but_the_password_is_kept_as_typed() {
        let creds = Creds::from_lookup(lookup(&[
            (EMAIL_VAR, "  ana@x.com "),
            (PASSWORD_VAR, " spaced "),
        ]))
        .unwrap();

        assert_eq!(creds.email(), "ana@x.com");
        assert_eq!(creds.password(), " spaced ");
    }

    #[test]
    fn blank_or_missing_values_name_the_variable() {
        let err = Creds::from_lookup(lookup(&[(EMAIL_VAR, "ana@x.com"), (PASSWORD_VAR, "  ")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "FRIENDASSIGN_PASSWORD is not set");

        let err = Creds::from_lookup(lookup(&[(PASSWORD_VAR, "pw")])).unwrap_err();
        assert_eq!(err.to_string(), "FRIENDASSIGN_EMAIL is not set");
    }
}
