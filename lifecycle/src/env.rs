//! Process environments and the build-time environment accumulator.

use lifecycle_data::api::ApiVersion;
use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

const PATH_LIST_SEPARATOR: &str = if cfg!(target_family = "windows") {
    ";"
} else {
    ":"
};

/// The layer subdirectories with conventional environment variables, and the
/// variables each one is prepended to.
const ROOT_DIR_VARS: [(&str, &[&str]); 4] = [
    ("bin", &["PATH"]),
    ("lib", &["LIBRARY_PATH", "LD_LIBRARY_PATH"]),
    ("include", &["CPATH"]),
    ("pkgconfig", &["PKG_CONFIG_PATH"]),
];

fn is_path_list_var(name: &OsStr) -> bool {
    ROOT_DIR_VARS
        .iter()
        .flat_map(|(_, vars)| vars.iter())
        .any(|var| OsStr::new(var) == name)
}

/// Generic collection of environment variables.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Env {
    inner: BTreeMap<OsString, OsString>,
}

impl Env {
    /// Creates an empty `Env`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an `Env` from a snapshot of the current process environment.
    pub fn from_current() -> Self {
        Self {
            inner: env::vars_os().collect(),
        }
    }

    /// Inserts a key-value pair, overriding the value if `key` was already
    /// present.
    pub fn insert(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> &mut Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsString> {
        self.inner.get(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<OsStr>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, OsString, OsString> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a Env {
    type Item = (&'a OsString, &'a OsString);
    type IntoIter = std::collections::btree_map::Iter<'a, OsString, OsString>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How a file in an `env/` directory modifies the variable it names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionType {
    Append,
    Default,
    Override,
    Prepend,
    /// Prepend with the OS path-list separator. The implicit action of
    /// suffix-less files for buildpack APIs before 0.5.
    PrependPath,
}

impl ActionType {
    /// The action applied to files without an action suffix.
    pub fn default_for(api: ApiVersion) -> Self {
        if api < ApiVersion::new(0, 5) {
            ActionType::PrependPath
        } else {
            ActionType::Override
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "append" => Some(ActionType::Append),
            "default" => Some(ActionType::Default),
            "override" => Some(ActionType::Override),
            "prepend" => Some(ActionType::Prepend),
            _ => None,
        }
    }
}

/// The environment a build runs in, accumulated across buildpacks.
///
/// Layers that declare `build = true` contribute twice: their conventional
/// subdirectories (`bin`, `lib`, ...) are prepended to the matching path
/// variables, and the files of their `env/` and `env.build/` directories are
/// applied as modifications, with the file suffix selecting the action.
pub struct BuildEnv {
    vars: Env,
}

impl BuildEnv {
    pub fn new(vars: Env) -> Self {
        Self { vars }
    }

    /// Discovers the conventional subdirectories of `base_dir` and prepends
    /// them to their variables.
    pub fn add_root_dir(&mut self, base_dir: &Path) -> io::Result<()> {
        for (subdir, vars) in ROOT_DIR_VARS {
            let path = base_dir.join(subdir);
            if path.is_dir() {
                for var in vars {
                    self.prepend_with(var, path.as_os_str(), Some(OsStr::new(PATH_LIST_SEPARATOR)));
                }
            }
        }
        Ok(())
    }

    /// Applies every file of `env_dir` as an environment modification.
    ///
    /// The file name is the variable, the contents are the value and the file
    /// suffix selects the action; files without a suffix use
    /// `default_action`. `<name>.delim` files configure the delimiter used
    /// for `<name>`; without one, path-list variables use the OS path-list
    /// separator and everything else concatenates without a delimiter.
    ///
    /// A missing directory is not an error.
    pub fn add_env_dir(&mut self, env_dir: &Path, default_action: ActionType) -> io::Result<()> {
        let entries = match read_env_files(env_dir) {
            Ok(entries) => entries,
            Err(io_error) if io_error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(io_error) => return Err(io_error),
        };

        let mut delims: BTreeMap<OsString, OsString> = BTreeMap::new();
        for (file_name, contents) in &entries {
            let path = Path::new(file_name);
            if path.extension() == Some(OsStr::new("delim")) {
                if let Some(stem) = path.file_stem() {
                    delims.insert(stem.to_os_string(), contents.clone());
                }
            }
        }

        for (file_name, contents) in entries {
            let path = Path::new(&file_name);
            let Some(name) = path.file_stem().map(OsStr::to_os_string) else {
                continue;
            };

            let action = match path.extension() {
                None => default_action,
                Some(extension) => match extension.to_str().and_then(ActionType::from_suffix) {
                    Some(action) => action,
                    // Unknown suffixes (including `delim`) are not
                    // modifications themselves.
                    None => continue,
                },
            };

            let delim = delims.get(&name).map(OsString::clone).or_else(|| {
                is_path_list_var(&name).then(|| OsString::from(PATH_LIST_SEPARATOR))
            });

            match action {
                ActionType::Override => {
                    self.vars.insert(name, contents);
                }
                ActionType::Default => {
                    if !self.vars.contains_key(&name) {
                        self.vars.insert(name, contents);
                    }
                }
                ActionType::Append => self.append_with(&name, &contents, delim.as_deref()),
                ActionType::Prepend => self.prepend_with(&name, &contents, delim.as_deref()),
                ActionType::PrependPath => {
                    self.prepend_with(&name, &contents, Some(OsStr::new(PATH_LIST_SEPARATOR)));
                }
            }
        }

        Ok(())
    }

    /// The accumulated environment with the platform's `env/` directory
    /// applied on top: the full environment a non-`clear-env` buildpack runs
    /// with.
    pub fn with_platform(&self, platform_dir: &Path) -> io::Result<Env> {
        let mut env = self.vars.clone();

        match read_env_files(&platform_dir.join("env")) {
            Ok(entries) => {
                for (file_name, contents) in entries {
                    env.insert(file_name, contents);
                }
            }
            Err(io_error) if io_error.kind() == io::ErrorKind::NotFound => {}
            Err(io_error) => return Err(io_error),
        }

        Ok(env)
    }

    /// The accumulated environment without platform additions: what a
    /// `clear-env` buildpack runs with.
    pub fn list(&self) -> Env {
        self.vars.clone()
    }

    fn append_with(&mut self, name: &OsStr, value: &OsStr, delim: Option<&OsStr>) {
        let mut new_value = self.vars.get(name).cloned().unwrap_or_default();
        if !new_value.is_empty() {
            if let Some(delim) = delim {
                new_value.push(delim);
            }
        }
        new_value.push(value);
        self.vars.insert(name, new_value);
    }

    fn prepend_with(&mut self, name: impl AsRef<OsStr>, value: &OsStr, delim: Option<&OsStr>) {
        let mut new_value = OsString::from(value);
        if let Some(previous) = self.vars.get(&name) {
            if !previous.is_empty() {
                if let Some(delim) = delim {
                    new_value.push(delim);
                }
                new_value.push(previous);
            }
        }
        self.vars.insert(name.as_ref(), new_value);
    }
}

/// Reads the flat files of a directory as `(file name, contents)` pairs,
/// sorted by file name. Subdirectories are ignored.
fn read_env_files(dir: &Path) -> io::Result<Vec<(OsString, OsString)>> {
    let mut files = Vec::new();

    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }

        // Contents must not be reinterpreted through an assumed charset;
        // they are raw bytes that end up in environment values verbatim.
        #[cfg(target_family = "unix")]
        let contents = {
            use std::os::unix::ffi::OsStringExt;
            OsString::from_vec(fs::read(dir_entry.path())?)
        };
        #[cfg(not(target_family = "unix"))]
        let contents = OsString::from(fs::read_to_string(dir_entry.path())?);

        files.push((dir_entry.file_name(), contents));
    }

    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> Env {
        let mut env = Env::new();
        for (key, value) in pairs {
            env.insert(*key, *value);
        }
        env
    }

    #[test]
    fn add_root_dir_prepends_conventional_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("bin")).unwrap();
        fs::create_dir_all(temp_dir.path().join("lib")).unwrap();

        let mut build_env = BuildEnv::new(env_with(&[("PATH", "/usr/bin")]));
        build_env.add_root_dir(temp_dir.path()).unwrap();
        let env = build_env.list();

        let expected_path = format!(
            "{}{}{}",
            temp_dir.path().join("bin").display(),
            PATH_LIST_SEPARATOR,
            "/usr/bin"
        );
        assert_eq!(env.get("PATH").unwrap(), &OsString::from(expected_path));
        assert_eq!(
            env.get("LIBRARY_PATH").unwrap(),
            temp_dir.path().join("lib").as_os_str()
        );
        assert_eq!(
            env.get("LD_LIBRARY_PATH").unwrap(),
            temp_dir.path().join("lib").as_os_str()
        );
        assert_eq!(env.get("CPATH"), None);
    }

    #[test]
    fn add_env_dir_applies_suffix_actions() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("APPENDED.append"), "two").unwrap();
        fs::write(temp_dir.path().join("DEFAULTED.default"), "ignored").unwrap();
        fs::write(temp_dir.path().join("NEW.default"), "fresh").unwrap();
        fs::write(temp_dir.path().join("OVERRIDDEN.override"), "new").unwrap();
        fs::write(temp_dir.path().join("PREPENDED.prepend"), "head").unwrap();

        let mut build_env = BuildEnv::new(env_with(&[
            ("APPENDED", "one"),
            ("DEFAULTED", "kept"),
            ("OVERRIDDEN", "old"),
            ("PREPENDED", "tail"),
        ]));
        build_env
            .add_env_dir(temp_dir.path(), ActionType::Override)
            .unwrap();
        let env = build_env.list();

        // No delim file and not a path-list variable: values concatenate.
        assert_eq!(env.get("APPENDED").unwrap(), &OsString::from("onetwo"));
        assert_eq!(env.get("DEFAULTED").unwrap(), &OsString::from("kept"));
        assert_eq!(env.get("NEW").unwrap(), &OsString::from("fresh"));
        assert_eq!(env.get("OVERRIDDEN").unwrap(), &OsString::from("new"));
        assert_eq!(env.get("PREPENDED").unwrap(), &OsString::from("headtail"));
    }

    #[test]
    fn add_env_dir_uses_delim_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("LIST.append"), "two").unwrap();
        fs::write(temp_dir.path().join("LIST.delim"), ",").unwrap();

        let mut build_env = BuildEnv::new(env_with(&[("LIST", "one")]));
        build_env
            .add_env_dir(temp_dir.path(), ActionType::Override)
            .unwrap();

        assert_eq!(
            build_env.list().get("LIST").unwrap(),
            &OsString::from("one,two")
        );
    }

    #[test]
    fn suffixless_files_use_the_default_action() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("PATH"), "/layer/bin").unwrap();

        // Buildpack API < 0.5: prepend as a path list.
        let mut build_env = BuildEnv::new(env_with(&[("PATH", "/usr/bin")]));
        build_env
            .add_env_dir(temp_dir.path(), ActionType::default_for(ApiVersion::new(0, 4)))
            .unwrap();
        assert_eq!(
            build_env.list().get("PATH").unwrap(),
            &OsString::from(format!("/layer/bin{PATH_LIST_SEPARATOR}/usr/bin"))
        );

        // Buildpack API >= 0.5: override.
        let mut build_env = BuildEnv::new(env_with(&[("PATH", "/usr/bin")]));
        build_env
            .add_env_dir(temp_dir.path(), ActionType::default_for(ApiVersion::new(0, 5)))
            .unwrap();
        assert_eq!(
            build_env.list().get("PATH").unwrap(),
            &OsString::from("/layer/bin")
        );
    }

    #[test]
    fn path_list_vars_get_the_path_separator_by_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("PATH.append"), "/layer/bin").unwrap();

        let mut build_env = BuildEnv::new(env_with(&[("PATH", "/usr/bin")]));
        build_env
            .add_env_dir(temp_dir.path(), ActionType::Override)
            .unwrap();

        assert_eq!(
            build_env.list().get("PATH").unwrap(),
            &OsString::from(format!("/usr/bin{PATH_LIST_SEPARATOR}/layer/bin"))
        );
    }

    #[test]
    fn missing_env_dir_is_not_an_error() {
        let mut build_env = BuildEnv::new(Env::new());
        build_env
            .add_env_dir(Path::new("/does/not/exist"), ActionType::Override)
            .unwrap();
    }

    #[test]
    fn with_platform_overrides_but_does_not_leak_into_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let env_dir = temp_dir.path().join("env");
        fs::create_dir_all(&env_dir).unwrap();
        fs::write(env_dir.join("SETTING"), "from-platform").unwrap();

        let build_env = BuildEnv::new(env_with(&[("SETTING", "from-process")]));

        let with_platform = build_env.with_platform(temp_dir.path()).unwrap();
        assert_eq!(
            with_platform.get("SETTING").unwrap(),
            &OsString::from("from-platform")
        );
        assert_eq!(
            build_env.list().get("SETTING").unwrap(),
            &OsString::from("from-process")
        );
    }
}
