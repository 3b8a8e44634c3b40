//! Rename request model and builder.

use thiserror::Error;

/// Parameters for a single claim rename.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenameRequest {
    /// Name of the claim being renamed.
    pub source_name: String,
    /// Namespace holding the claim being renamed.
    pub source_namespace: String,
    /// Name given to the replacement claim.
    pub target_name: String,
    /// Namespace the replacement claim is created in.
    pub target_namespace: String,
    /// Skips the interactive confirmation when set.
    pub skip_confirmation: bool,
}

impl RenameRequest {
    /// Starts a builder for a [`RenameRequest`].
    #[must_use]
    pub fn builder() -> RenameRequestBuilder {
        RenameRequestBuilder::new()
    }

    /// Returns `true` when the replacement lives in another namespace.
    #[must_use]
    pub fn crosses_namespaces(&self) -> bool {
        self.source_namespace != self.target_namespace
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingField`] when a name or namespace is
    /// empty and [`RequestError::SameClaim`] when source and target coincide.
    pub fn validate(&self) -> Result<(), RequestError> {
        for (field, value) in [
            ("source_name", &self.source_name),
            ("source_namespace", &self.source_namespace),
            ("target_name", &self.target_name),
            ("target_namespace", &self.target_namespace),
        ] {
            if value.is_empty() {
                return Err(RequestError::MissingField(field.to_owned()));
            }
        }
        if !self.crosses_namespaces() && self.source_name == self.target_name {
            return Err(RequestError::SameClaim {
                namespace: self.source_namespace.clone(),
                name: self.source_name.clone(),
            });
        }
        Ok(())
    }
}

/// Builder for [`RenameRequest`] that trims inputs and defaults the target
/// namespace to the source namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenameRequestBuilder {
    source_name: String,
    source_namespace: String,
    target_name: String,
    target_namespace: Option<String>,
    skip_confirmation: bool,
}

impl RenameRequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the claim being renamed.
    #[must_use]
    pub fn source(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.source_name = name.into();
        self.source_namespace = namespace.into();
        self
    }

    /// Sets the replacement claim name.
    #[must_use]
    pub fn target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = name.into();
        self
    }

    /// Overrides the replacement namespace. Blank values fall back to the
    /// source namespace.
    #[must_use]
    pub fn target_namespace(mut self, namespace: Option<String>) -> Self {
        self.target_namespace = namespace;
        self
    }

    /// Skips the interactive confirmation.
    #[must_use]
    pub const fn skip_confirmation(mut self, skip: bool) -> Self {
        self.skip_confirmation = skip;
        self
    }

    /// Builds and validates the [`RenameRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when validation fails.
    pub fn build(self) -> Result<RenameRequest, RequestError> {
        let source_namespace = self.source_namespace.trim().to_owned();
        let target_namespace = self
            .target_namespace
            .map(|namespace| namespace.trim().to_owned())
            .filter(|namespace| !namespace.is_empty())
            .unwrap_or_else(|| source_namespace.clone());

        let request = RenameRequest {
            source_name: self.source_name.trim().to_owned(),
            source_namespace,
            target_name: self.target_name.trim().to_owned(),
            target_namespace,
            skip_confirmation: self.skip_confirmation,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while building a [`RenameRequest`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a required field is empty.
    #[error("missing or empty field: {0}")]
    MissingField(String),
    /// Raised when the target is the source claim itself.
    #[error("claim '{name}' in namespace '{namespace}' cannot be renamed onto itself")]
    SameClaim {
        /// Shared namespace.
        namespace: String,
        /// Shared name.
        name: String,
    },
}
