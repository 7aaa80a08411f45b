//! Comment builder for fluent API

use super::model::CommentPayload;
use crate::error::{Result, TreeError};
use crate::types::Extensions;
use chrono::{DateTime, Utc};

/// Builder for comment payloads posted under a tree node
pub struct CommentBuilder {
    content: Option<String>,
    rendered: Option<String>,
    user_name: String,
    user_email: String,
    user_url: String,
    ip_address: Option<String>,
    followup: bool,
    is_public: bool,
    is_removed: bool,
    submit_date: Option<DateTime<Utc>>,
    updated_on: Option<DateTime<Utc>>,
    extensions: Extensions,
}

impl CommentBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            content: None,
            rendered: None,
            user_name: String::new(),
            user_email: String::new(),
            user_url: String::new(),
            ip_address: None,
            followup: false,
            is_public: true,
            is_removed: false,
            submit_date: None,
            updated_on: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the raw comment text
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the rendered text produced by the host's markup pipeline
    pub fn rendered(mut self, rendered: impl Into<String>) -> Self {
        self.rendered = Some(rendered.into());
        self
    }

    /// Set author name
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = email.into();
        self
    }

    pub fn user_url(mut self, url: impl Into<String>) -> Self {
        self.user_url = url.into();
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Ask for follow-up notifications
    pub fn followup(mut self, followup: bool) -> Self {
        self.followup = followup;
        self
    }

    /// Set public visibility
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Post as removed
    pub fn removed(mut self, is_removed: bool) -> Self {
        self.is_removed = is_removed;
        self
    }

    /// Override the submission timestamp
    pub fn submit_date(mut self, at: DateTime<Utc>) -> Self {
        self.submit_date = Some(at);
        self
    }

    /// Override the update timestamp
    pub fn updated_on(mut self, at: DateTime<Utc>) -> Self {
        self.updated_on = Some(at);
        self
    }

    /// Set a free-form payload field
    pub fn extension<T: serde::Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        self.extensions.set(key, value);
        self
    }

    /// Build the payload
    pub fn build(self) -> Result<CommentPayload> {
        let content = self.content.ok_or_else(|| {
            TreeError::Validation("Comment content is required".to_string())
        })?;

        if content.trim().is_empty() {
            return Err(TreeError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let submit_date = self.submit_date.unwrap_or(now);

        Ok(CommentPayload {
            comment: content,
            rendered_comment: self.rendered,
            user_name: self.user_name,
            user_email: self.user_email,
            user_url: self.user_url,
            ip_address: self.ip_address,
            followup: self.followup,
            is_public: self.is_public,
            is_removed: self.is_removed,
            submit_date,
            updated_on: self.updated_on.unwrap_or(submit_date),
            extensions: self.extensions,
        })
    }
}

impl Default for CommentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
