//! Lexical path handling for include identities
//!
//! Nothing here touches the filesystem: identities are compared after
//! removing `.` and `..` components textually.

use std::path::{Component, Path, PathBuf};

/// Remove `.` and resolvable `..` components
///
/// A `..` directly under the root is dropped; leading `..` of a relative
/// path are kept since there is nothing to pop.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Directory an include path written inside `source` is relative to
pub fn base_dir(source: &Path) -> &Path {
    source.parent().unwrap_or_else(|| Path::new(""))
}

/// Identity of `raw` as written inside a file living in `base_dir`
pub fn resolve_include_path(base_dir: &Path, raw: &str) -> PathBuf {
    normalize(&base_dir.join(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c.yml")), PathBuf::from("a/c.yml"));
        assert_eq!(normalize(Path::new("../shared/x.yml")), PathBuf::from("../shared/x.yml"));
        assert_eq!(normalize(Path::new("a/../../x.yml")), PathBuf::from("../x.yml"));
        assert_eq!(normalize(Path::new("/../etc/x.yml")), PathBuf::from("/etc/x.yml"));
        assert_eq!(normalize(Path::new("./wf.yml")), PathBuf::from("wf.yml"));
    }

    #[test]
    fn test_resolve_relative_to_including_file() {
        let source = Path::new("flows/wf.yml");
        assert_eq!(
            resolve_include_path(base_dir(source), "graphs/g1.yml"),
            PathBuf::from("flows/graphs/g1.yml")
        );
        assert_eq!(
            resolve_include_path(base_dir(source), "../common.yml"),
            PathBuf::from("common.yml")
        );
        assert_eq!(
            resolve_include_path(base_dir(Path::new("wf.yml")), "g1.yml"),
            PathBuf::from("g1.yml")
        );
    }

    #[test]
    fn test_absolute_include_ignores_base() {
        assert_eq!(
            resolve_include_path(Path::new("flows"), "/opt/g.yml"),
            PathBuf::from("/opt/g.yml")
        );
    }
}
