//! Docker-style image reference decomposition

/// Namespace used for unqualified images (official images on public hubs)
pub const DEFAULT_NAMESPACE: &str = "library";

/// Namespace/name pair of an image reference, with any registry host dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub namespace: String,
    pub name: String,
}

impl ImageRef {
    /// Split `image` into namespace and name.
    ///
    /// - `redis` -> `library` / `redis`
    /// - `org/app` -> `org` / `app`
    /// - `ghcr.io/org/team/app` -> `org/team` / `app`
    /// - `localhost:5000/app` -> `library` / `app`
    ///
    /// Total over non-empty input: never fails, never touches the network.
    pub fn parse(image: &str) -> Self {
        let segments: Vec<&str> = image.split('/').collect();

        if segments.len() == 1 {
            return Self {
                namespace: DEFAULT_NAMESPACE.to_string(),
                name: segments[0].to_string(),
            };
        }

        let mut rest = segments.as_slice();
        if is_registry_host(rest[0]) {
            rest = &rest[1..];
        }

        let (name, namespace_parts) = match rest.split_last() {
            Some((name, parts)) => (*name, parts),
            None => ("", &[][..]),
        };

        let namespace = namespace_parts.join("/");
        Self {
            namespace: if namespace.is_empty() {
                DEFAULT_NAMESPACE.to_string()
            } else {
                namespace
            },
            name: name.to_string(),
        }
    }

    /// `namespace/name`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// First path segment names a registry host when it carries a dot or a port
pub fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':')
}

/// Registry host of an image reference, if the first segment names one
pub fn registry_host(image: &str) -> Option<&str> {
    match image.split_once('/') {
        Some((first, _)) if is_registry_host(first) => Some(first),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_image_uses_library() {
        let parsed = ImageRef::parse("redis");
        assert_eq!(parsed.namespace, "library");
        assert_eq!(parsed.name, "redis");
    }

    #[test]
    fn test_host_is_dropped() {
        let parsed = ImageRef::parse("host.tld/a/b/name");
        assert_eq!(parsed.namespace, "a/b");
        assert_eq!(parsed.name, "name");
    }

    #[test]
    fn test_namespace_without_host() {
        let parsed = ImageRef::parse("bitnami/postgresql");
        assert_eq!(parsed.namespace, "bitnami");
        assert_eq!(parsed.name, "postgresql");
        assert_eq!(parsed.repository(), "bitnami/postgresql");
    }

    #[test]
    fn test_host_with_port_only() {
        let parsed = ImageRef::parse("localhost:5000/app");
        assert_eq!(parsed.namespace, "library");
        assert_eq!(parsed.name, "app");
    }

    #[test]
    fn test_trailing_slash_does_not_panic() {
        let parsed = ImageRef::parse("ghcr.io/");
        assert_eq!(parsed.namespace, "library");
        assert_eq!(parsed.name, "");
    }

    #[test]
    fn test_registry_host() {
        assert_eq!(registry_host("ghcr.io/org/app"), Some("ghcr.io"));
        assert_eq!(registry_host("org/app"), None);
        assert_eq!(registry_host("redis"), None);
    }
}
