use std::fmt;

/// Where in the response an error happened: response keys and list indices from the root.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default, serde::Serialize)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

impl std::ops::Deref for ErrorPath {
    type Target = Vec<ErrorPathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ErrorPath {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum ErrorPathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for ErrorPathSegment {
    fn from(key: &str) -> Self {
        ErrorPathSegment::Field(key.to_owned())
    }
}

impl From<usize> for ErrorPathSegment {
    fn from(index: usize) -> Self {
        ErrorPathSegment::Index(index)
    }
}

impl<S: Into<ErrorPathSegment>> FromIterator<S> for ErrorPath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ErrorPath(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<ErrorPathSegment>> for ErrorPath {
    fn from(segments: Vec<ErrorPathSegment>) -> Self {
        ErrorPath(segments)
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                ErrorPathSegment::Field(key) => f.write_str(key)?,
                ErrorPathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}
