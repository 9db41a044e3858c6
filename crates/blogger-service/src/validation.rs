use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::models::slugify_title;

pub const TITLE_MAX_CHARS: usize = 120;
pub const FULL_NAME_MAX_CHARS: usize = 30;
pub const HANDLE_MAX_CHARS: usize = 50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,
    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    TooLong { max: usize, actual: usize },
    #[error("Title must contain at least one letter or digit.")]
    EmptySlug,
    #[error("An article with this {0} already exists.")]
    Duplicate(&'static str),
    #[error("Enter a valid URL.")]
    MalformedUrl(String),
    #[error("URL must have a host")]
    MissingHost,
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Field-keyed validation failures, rendered back alongside the form.
#[derive(Error, Debug, Default, Clone, PartialEq, Serialize)]
#[error("{} invalid field(s)", .0.len())]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: &'static str, error: ValidationError) {
        self.0.entry(field).or_default().push(error.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Raw article form as posted. Every field defaults so a missing field is
/// reported as a validation error rather than a rejected request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "publish")]
    pub published: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidArticle {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl ArticleForm {
    pub fn validate(&self) -> Result<ValidArticle, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        if let Err(err) = required(title).and_then(|t| max_chars(t, TITLE_MAX_CHARS)) {
            errors.add("title", err);
        } else if slugify_title(title).is_empty() {
            errors.add("title", ValidationError::EmptySlug);
        }

        let content = self.content.trim();
        if let Err(err) = required(content) {
            errors.add("content", err);
        }

        errors.into_result(ValidArticle {
            title: title.to_string(),
            content: content.to_string(),
            published: checkbox(self.published.as_deref()),
        })
    }
}

impl From<&crate::models::Article> for ArticleForm {
    fn from(article: &crate::models::Article) -> Self {
        ArticleForm {
            title: article.title.clone(),
            content: article.content.clone(),
            published: article.published.then(|| "on".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProfile {
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ValidProfile, FormErrors> {
        let mut errors = FormErrors::new();

        let full_name = self.full_name.trim();
        if let Err(err) = required(full_name).and_then(|n| max_chars(n, FULL_NAME_MAX_CHARS)) {
            errors.add("full_name", err);
        }

        let github = match optional(&self.github).map(normalize_url).transpose() {
            Ok(github) => github,
            Err(err) => {
                errors.add("github", err);
                None
            }
        };

        let twitter = optional(&self.twitter);
        if let Some(Err(err)) = twitter.as_deref().map(|t| max_chars(t, HANDLE_MAX_CHARS)) {
            errors.add("twitter", err);
        }

        let facebook = optional(&self.facebook);
        if let Some(Err(err)) = facebook.as_deref().map(|f| max_chars(f, HANDLE_MAX_CHARS)) {
            errors.add("facebook", err);
        }

        errors.into_result(ValidProfile {
            full_name: full_name.to_string(),
            bio: optional(&self.bio),
            avatar: optional(&self.avatar),
            github,
            twitter,
            facebook,
        })
    }
}

impl From<&crate::models::Profile> for ProfileForm {
    fn from(profile: &crate::models::Profile) -> Self {
        ProfileForm {
            full_name: profile.full_name.clone(),
            bio: profile.bio.clone(),
            avatar: profile.avatar.clone(),
            github: profile.github.clone(),
            twitter: profile.twitter.clone(),
            facebook: profile.facebook.clone(),
        }
    }
}

fn required(value: &str) -> Result<&str, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::Required)
    } else {
        Ok(value)
    }
}

fn max_chars(value: &str, max: usize) -> Result<&str, ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        Err(ValidationError::TooLong { max, actual })
    } else {
        Ok(value)
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checkbox semantics: absent, empty and "false" are unchecked.
pub fn checkbox(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !(v.is_empty() || v.eq_ignore_ascii_case("false")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
    Ftps,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
            Scheme::Ftp => write!(f, "ftp"),
            Scheme::Ftps => write!(f, "ftps"),
        }
    }
}

/// A profile link that parsed as an absolute URL with a host.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUrl {
    pub scheme: Scheme,
    pub host: String,
    raw: String,
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<&str> for ValidatedUrl {
    type Error = ValidationError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        let url = Url::parse(raw).map_err(|_| ValidationError::MalformedUrl(raw.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "ftp" => Scheme::Ftp,
            "ftps" => Scheme::Ftps,
            scheme => return Err(ValidationError::UnsupportedScheme(scheme.to_string())),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(ValidationError::MissingHost)?
            .to_lowercase();

        Ok(ValidatedUrl {
            scheme,
            host,
            raw: raw.to_string(),
        })
    }
}

/// Validates a link field, assuming `http://` when no scheme was typed.
/// The returned string is what the user entered, plus any assumed scheme.
pub fn validate_url(url_str: &str) -> Result<ValidatedUrl, ValidationError> {
    let url_str = url_str.trim();
    if url_str.is_empty() {
        return Err(ValidationError::Required);
    }

    if has_scheme(url_str) {
        ValidatedUrl::try_from(url_str)
    } else {
        ValidatedUrl::try_from(format!("http://{url_str}").as_str())
    }
}

// "host.tld:port" reads as a scheme-less address, so dotted prefixes don't count.
fn has_scheme(url_str: &str) -> bool {
    match url_str.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
        }
        None => false,
    }
}

pub fn normalize_url(url_str: String) -> Result<String, ValidationError> {
    Ok(validate_url(&url_str)?.to_string())
}
