//! Path components: the keys and indices leading from the document root to a
//! node.

/// A single step in the path to a JSON node: an object key or an array index.
///
/// # Examples
///
/// ```
/// use jsonflume::PathComponent;
///
/// let key = PathComponent::Key("foo".to_string());
/// assert_eq!(key.as_key(), Some("foo"));
///
/// let idx = PathComponent::Index(3);
/// assert_eq!(idx.as_index(), Some(3));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// A property name within an object.
    Key(String),
    /// An element index within an array.
    Index(usize),
}

impl PathComponent {
    /// Returns the property name, if this component is a key.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Index(_) => None,
        }
    }

    /// Returns the element index, if this component is an index.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(i) => Some(*i),
        }
    }
}

macro_rules! impl_from_int_for_path_component {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PathComponent {
                fn from(i: $t) -> Self {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    PathComponent::Index(i as usize)
                }
            }
        )*
    };
}

impl_from_int_for_path_component!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&str> for PathComponent {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for PathComponent {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

/// Builds a `Vec<PathComponent>` from a heterogeneous list of keys and
/// indices.
///
/// ```rust
/// # use jsonflume::{path, PathComponent};
/// let p = path![0, "foo", 2];
/// assert_eq!(
///     p,
///     vec![
///         PathComponent::Index(0),
///         PathComponent::Key("foo".into()),
///         PathComponent::Index(2)
///     ]
/// );
/// ```
#[macro_export]
macro_rules! path {
    ( $( $elem:expr ),* $(,)? ) => {
        vec![$($crate::PathComponent::from($elem)),*]
    };
}
