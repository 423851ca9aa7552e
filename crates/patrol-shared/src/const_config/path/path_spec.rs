use std::borrow::Cow;

use reqwest::Method;

use crate::wire::encode_path_segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub path: Cow<'static, str>,
    pub method: Method,
}

impl PathSpec {
    pub const fn get(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            method: Method::GET,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            method: Method::POST,
        }
    }

    pub const fn put(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            method: Method::PUT,
        }
    }

    pub const fn delete(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            method: Method::DELETE,
        }
    }

    /// Appends the (encoded) id as the last path segment
    pub fn with_id(&self, id: impl AsRef<str>) -> Self {
        Self {
            path: Cow::Owned(format!(
                "{}/{}",
                self.path.trim_end_matches('/'),
                encode_path_segment(id.as_ref())
            )),
            method: self.method.clone(),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }
}
