//! Destination path mapping for extracted entries.

use std::path::{Component, Path, PathBuf};

/// Maps an in-archive entry name to the path it is extracted to.
///
/// Implementations must be pure and total: every name yields a path.
pub trait DestinationMap {
    fn map(&self, entry_name: &str) -> PathBuf;
}

impl<F> DestinationMap for F
where
    F: Fn(&str) -> PathBuf,
{
    fn map(&self, entry_name: &str) -> PathBuf {
        self(entry_name)
    }
}

/// Built-in extraction roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// PlayStation 3 internal hard drive
    Ps3,
    /// Xbox 360 cache partition
    Xbox360,
    /// A directory on the host filesystem
    Directory(PathBuf),
}

impl Destination {
    pub const PS3_ROOT: &'static str = "/dev_hdd1/";
    pub const XBOX360_ROOT: &'static str = "cache:\\";
}

impl DestinationMap for Destination {
    fn map(&self, entry_name: &str) -> PathBuf {
        match self {
            // Console roots are joined textually so the host separator never
            // leaks into the target path.
            Destination::Ps3 => PathBuf::from(format!("{}{}", Self::PS3_ROOT, entry_name)),
            Destination::Xbox360 => {
                PathBuf::from(format!("{}{}", Self::XBOX360_ROOT, entry_name))
            }
            Destination::Directory(root) => root.join(contained(entry_name)),
        }
    }
}

/// Relative form of `entry_name` that cannot leave the directory it is
/// joined onto: roots and prefixes are dropped, `..` only pops components
/// the name itself added.
fn contained(entry_name: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::ParentDir => {
                path.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_roots() {
        assert_eq!(
            Destination::Ps3.map("rom.smc"),
            PathBuf::from("/dev_hdd1/rom.smc")
        );
        assert_eq!(
            Destination::Xbox360.map("rom.smc"),
            PathBuf::from("cache:\\rom.smc")
        );
    }

    #[test]
    fn directory_root_joins_name() {
        let dest = Destination::Directory(PathBuf::from("out"));
        assert_eq!(dest.map("a/b.bin"), Path::new("out").join("a/b.bin"));
    }

    #[test]
    fn directory_root_contains_every_name() {
        let dest = Destination::Directory(PathBuf::from("out"));
        assert_eq!(dest.map("/etc/victim.bin"), Path::new("out").join("etc/victim.bin"));
        assert_eq!(dest.map("../escaped.bin"), Path::new("out").join("escaped.bin"));
        assert_eq!(dest.map("a/../../b/./c.bin"), Path::new("out").join("b/c.bin"));
        assert_eq!(dest.map("a/b/../c.bin"), Path::new("out").join("a/c.bin"));
    }

    #[test]
    fn closures_are_destinations() {
        let map = |name: &str| PathBuf::from("/tmp").join(name);
        assert_eq!(map.map("x"), PathBuf::from("/tmp/x"));
    }
}
