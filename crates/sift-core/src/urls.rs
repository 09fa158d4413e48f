/// Placeholder replaced by the page index in [`UrlSet::range`] templates.
pub const RANGE_PLACEHOLDER: &str = "{}";

/// An ordered set of target URLs, optionally stamped with one shared tag.
///
/// Duplicates are kept and insertion order is preserved. Building a set does
/// no I/O; it is consumed when merged into a [`PagingJob`](crate::PagingJob).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSet {
    urls: Vec<String>,
    tag: Option<String>,
}

impl UrlSet {
    pub fn one(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            tag: None,
        }
    }

    pub fn many<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            tag: None,
        }
    }

    /// One URL per integer in `begin..=end`, in ascending order.
    ///
    /// Every `{}` in `template` is replaced by the index:
    /// `range("https://example.com/page/{}", 1, 3)` yields pages 1, 2 and 3.
    /// An empty range (`begin > end`) yields an empty set.
    pub fn range(template: &str, begin: i64, end: i64) -> Self {
        Self {
            urls: (begin..=end)
                .map(|i| template.replace(RANGE_PLACEHOLDER, &i.to_string()))
                .collect(),
            tag: None,
        }
    }

    /// Stamp every URL in the set with `tag`, replacing any previous tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Append more URLs to the set.
    pub fn extend<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Option<String>) {
        (self.urls, self.tag)
    }
}
