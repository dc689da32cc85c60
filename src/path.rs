use std::{borrow::Cow, fmt};

/// A `/`-separated broadcast namespace.
///
/// The empty path is allowed. A single trailing `/` is allowed and denotes a
/// pure prefix; it is ignored by [Path::components] and prefix matching but
/// preserved by equality, which is byte-exact.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path<'a>(#[cfg_attr(feature = "serde", serde(borrow))] Cow<'a, str>);

/// A [Path] that owns its storage.
pub type PathOwned = Path<'static>;

impl<'a> Path<'a> {
	/// Create a path, asserting validity in debug builds.
	pub fn new(path: &'a str) -> Self {
		debug_assert!(Self::valid(path), "invalid path: {path}");
		Self(Cow::Borrowed(path))
	}

	/// Whether the string is a well-formed path: no leading slash, no empty
	/// interior component. A single trailing slash is tolerated.
	pub fn valid(path: &str) -> bool {
		if path.is_empty() {
			return true;
		}
		if path.starts_with('/') {
			return false;
		}
		let path = path.strip_suffix('/').unwrap_or(path);
		!path.split('/').any(|part| part.is_empty())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterate the name components, ignoring a trailing slash.
	pub fn components(&self) -> impl Iterator<Item = &str> {
		let inner = self.0.strip_suffix('/').unwrap_or(&self.0);
		inner.split('/').filter(|part| !part.is_empty())
	}

	/// Whether `prefix` matches this path on a component boundary.
	///
	/// The empty prefix matches everything; `"room"` and `"room/"` both match
	/// `"room"` and `"room/a"` but not `"roommate"`.
	pub fn has_prefix(&self, prefix: &Path) -> bool {
		let prefix = prefix.0.strip_suffix('/').unwrap_or(&prefix.0);
		if prefix.is_empty() {
			return true;
		}
		match self.0.strip_prefix(prefix) {
			Some("") => true,
			Some(rest) => rest.starts_with('/'),
			None => false,
		}
	}

	pub fn to_owned(&self) -> PathOwned {
		Path(Cow::Owned(self.0.clone().into_owned()))
	}
}

impl<'a> From<&'a str> for Path<'a> {
	fn from(path: &'a str) -> Self {
		Self::new(path)
	}
}

impl From<String> for PathOwned {
	fn from(path: String) -> Self {
		debug_assert!(Path::valid(&path), "invalid path: {path}");
		Path(Cow::Owned(path))
	}
}

impl fmt::Debug for Path<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl fmt::Display for Path<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn valid() {
		assert!(Path::valid(""));
		assert!(Path::valid("room"));
		assert!(Path::valid("room/a"));
		assert!(Path::valid("room/"));
		assert!(!Path::valid("/room"));
		assert!(!Path::valid("room//a"));
		assert!(!Path::valid("/"));
	}

	#[test]
	fn components() {
		let path = Path::new("room/a/b");
		assert_eq!(path.components().collect::<Vec<_>>(), vec!["room", "a", "b"]);

		let prefix = Path::new("room/");
		assert_eq!(prefix.components().collect::<Vec<_>>(), vec!["room"]);

		assert_eq!(Path::new("").components().count(), 0);
	}

	#[test]
	fn prefix_component_boundary() {
		let path = Path::new("room/alpha");
		assert!(path.has_prefix(&Path::new("")));
		assert!(path.has_prefix(&Path::new("room")));
		assert!(path.has_prefix(&Path::new("room/")));
		assert!(path.has_prefix(&Path::new("room/alpha")));
		assert!(!path.has_prefix(&Path::new("room/alp")));
		assert!(!path.has_prefix(&Path::new("roo")));
		assert!(!path.has_prefix(&Path::new("room/alpha/x")));
	}

	#[test]
	fn byte_exact_equality() {
		assert_eq!(Path::new("room"), Path::new("room"));
		assert_ne!(Path::new("room"), Path::new("room/"));
	}
}
