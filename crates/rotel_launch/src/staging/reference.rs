//! `s3://bucket/key` references

use std::fmt;

const S3_SCHEME: &str = "s3://";

/// A parsed S3 object reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Reference {
    pub bucket: String,
    pub key: String,
}

impl S3Reference {
    /// Parse `s3://bucket/path/to/object`
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let path = reference
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| ReferenceError::MissingScheme(reference.to_string()))?;

        let (bucket, key) = path
            .split_once('/')
            .ok_or_else(|| ReferenceError::MissingKey(reference.to_string()))?;

        if bucket.is_empty() {
            return Err(ReferenceError::MissingBucket(reference.to_string()));
        }
        if key.trim_matches('/').is_empty() {
            return Err(ReferenceError::MissingKey(reference.to_string()));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Last path segment of the key
    pub fn basename(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}

impl fmt::Display for S3Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

/// Non-blank entries of a comma-separated reference list, numbered from 1
pub fn split_references(references: &str) -> Vec<(usize, &str)> {
    references
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .enumerate()
        .map(|(i, r)| (i + 1, r))
        .collect()
}

/// Local file name for the object staged at `position`
pub fn staged_file_name(position: usize, reference: &S3Reference) -> String {
    format!("{:02}_{}", position, reference.basename())
}

/// Errors for malformed S3 references
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("invalid S3 path (must start with s3://): {0}")]
    MissingScheme(String),

    #[error("S3 path missing bucket: {0}")]
    MissingBucket(String),

    #[error("S3 path missing key: {0}")]
    MissingKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        let r = S3Reference::parse("s3://my-bucket/processors/parse_json.py").unwrap();
        assert_eq!(r.bucket, "my-bucket");
        assert_eq!(r.key, "processors/parse_json.py");
        assert_eq!(r.basename(), "parse_json.py");
        assert_eq!(r.to_string(), "s3://my-bucket/processors/parse_json.py");
    }

    #[test]
    fn test_parse_reference_errors() {
        assert!(matches!(
            S3Reference::parse("https://bucket/key"),
            Err(ReferenceError::MissingScheme(_))
        ));
        assert!(matches!(
            S3Reference::parse("s3://bucket"),
            Err(ReferenceError::MissingKey(_))
        ));
        assert!(matches!(
            S3Reference::parse("s3://bucket/"),
            Err(ReferenceError::MissingKey(_))
        ));
        assert!(matches!(
            S3Reference::parse("s3:///key"),
            Err(ReferenceError::MissingBucket(_))
        ));
    }

    #[test]
    fn test_basename_with_trailing_slash() {
        let r = S3Reference::parse("s3://bucket/dir/file.py/").unwrap();
        assert_eq!(r.basename(), "file.py");

        let r = S3Reference::parse("s3://bucket/top.py").unwrap();
        assert_eq!(r.basename(), "top.py");
    }

    #[test]
    fn test_split_skips_blank_entries() {
        let refs = split_references(" s3://a/x.py , ,,s3://b/y.py ");
        assert_eq!(refs, vec![(1, "s3://a/x.py"), (2, "s3://b/y.py")]);
        assert!(split_references("").is_empty());
        assert!(split_references(" , ").is_empty());
    }

    #[test]
    fn test_staged_file_name() {
        let r = S3Reference::parse("s3://bucket/a/b/proc.py").unwrap();
        assert_eq!(staged_file_name(3, &r), "03_proc.py");
        assert_eq!(staged_file_name(12, &r), "12_proc.py");
    }
}
