/// URL-safe slug: lowercase ASCII alphanumerics separated by single dashes.
///
/// Names without any alphanumeric character slug to `"category"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("category");
    }
    slug
}

/// Hierarchical id: the parent's id path followed by this node's slug.
pub fn child_id(parent_id: Option<&str>, name: &str) -> String {
    match parent_id {
        Some(parent) => format!("{}/{}", parent, slugify(name)),
        None => slugify(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Stable Releases"), "stable-releases");
        assert_eq!(slugify("  v2.x / LTS  "), "v2-x-lts");
        assert_eq!(slugify("C++ SDK"), "c-sdk");
        assert_eq!(slugify("Ünïcode"), "n-code");
        assert_eq!(slugify("!!!"), "category");
    }

    #[test]
    fn test_child_id() {
        assert_eq!(child_id(None, "Tools"), "tools");
        assert_eq!(child_id(Some("tools"), "CLI Apps"), "tools/cli-apps");
    }
}
