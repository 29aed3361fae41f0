//! Registry identifier grammar
//!
//! Objects are identified as `{institution-domain}/{bag-name}` and generic
//! files as `{institution-domain}/{bag-name}/data/{relative-path}`, e.g.
//! `uc.edu/cin.675812/data/object.properties`. Parsing splits on `/` and on
//! the literal `/data/` marker. A string that does not decompose is a
//! `MalformedIdentifier` error carrying the offending input; it must never
//! be defaulted or silently treated as a miss.

use crate::error::{BagflowError, Result};
use serde::{Deserialize, Serialize};

/// Parsed `{institution}/{bag-name}` object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    pub institution: String,
    pub bag_name: String,
}

impl ObjectIdentifier {
    pub fn new(institution: impl Into<String>, bag_name: impl Into<String>) -> Self {
        Self {
            institution: institution.into(),
            bag_name: bag_name.into(),
        }
    }

    /// Parse an object identifier. Exactly two non-empty `/` segments.
    pub fn parse(identifier: &str) -> Result<Self> {
        let mut parts = identifier.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(institution), Some(bag_name), None)
                if !institution.is_empty() && !bag_name.is_empty() =>
            {
                Ok(Self::new(institution, bag_name))
            }
            _ => Err(BagflowError::malformed_identifier(identifier)),
        }
    }
}

impl std::fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.institution, self.bag_name)
    }
}

/// Parsed `{institution}/{bag-name}/data/{relative-path}` file identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentifier {
    pub object: ObjectIdentifier,
    /// Path relative to the bag's data root, without the `data/` prefix
    pub relative_path: String,
}

/// Marker separating the object part from the file path
const DATA_MARKER: &str = "/data/";

impl FileIdentifier {
    /// Parse a generic-file identifier by splitting on the `/data/` marker.
    pub fn parse(identifier: &str) -> Result<Self> {
        let (object_part, relative_path) = identifier
            .split_once(DATA_MARKER)
            .ok_or_else(|| BagflowError::malformed_identifier(identifier))?;

        if relative_path.is_empty() {
            return Err(BagflowError::malformed_identifier(identifier));
        }

        let object = ObjectIdentifier::parse(object_part)
            .map_err(|_| BagflowError::malformed_identifier(identifier))?;

        Ok(Self {
            object,
            relative_path: relative_path.to_string(),
        })
    }

    /// The path as it appeared inside the unpacked bag, keeping the `data/`
    /// root prefix. This is the reconciler's match key against local files.
    pub fn original_path(&self) -> String {
        format!("data/{}", self.relative_path)
    }
}

impl std::fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/data/{}", self.object, self.relative_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_identifier() {
        let id = ObjectIdentifier::parse("uc.edu/cin.675812").unwrap();
        assert_eq!(id.institution, "uc.edu");
        assert_eq!(id.bag_name, "cin.675812");
        assert_eq!(id.to_string(), "uc.edu/cin.675812");
    }

    #[test]
    fn test_parse_object_identifier_rejects_bad_shapes() {
        for bad in ["uc.edu", "uc.edu/", "/cin.675812", "", "uc.edu/a/b"] {
            let err = ObjectIdentifier::parse(bad).unwrap_err();
            match err {
                BagflowError::MalformedIdentifier(s) => assert_eq!(s, bad),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_parse_file_identifier() {
        let id = FileIdentifier::parse("uc.edu/cin.675812/data/object.properties").unwrap();
        assert_eq!(id.object.institution, "uc.edu");
        assert_eq!(id.object.bag_name, "cin.675812");
        assert_eq!(id.relative_path, "object.properties");
        assert_eq!(id.original_path(), "data/object.properties");
        assert_eq!(id.to_string(), "uc.edu/cin.675812/data/object.properties");
    }

    #[test]
    fn test_parse_file_identifier_nested_path() {
        let id = FileIdentifier::parse("test.edu/bag1/data/sub/dir/file.xml").unwrap();
        assert_eq!(id.relative_path, "sub/dir/file.xml");
        assert_eq!(id.original_path(), "data/sub/dir/file.xml");
    }

    #[test]
    fn test_parse_file_identifier_rejects_missing_marker() {
        for bad in [
            "uc.edu/cin.675812",
            "uc.edu/cin.675812/data/",
            "uc.edu/data/file.txt/extra/data/x",
            "/data/file.txt",
        ] {
            assert!(
                FileIdentifier::parse(bad).is_err(),
                "should reject '{bad}'"
            );
        }
    }
}
