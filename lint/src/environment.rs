use std::collections::BTreeMap;
use std::ffi::OsString;

use metalint_types::{LintConfig, ViewSettings};

/// Child environment for one pass: the inherited variables with the
/// toolchain variables replaced by the view's overrides, if any.
///
/// The host process environment is never mutated. Inherited entries pass
/// through byte for byte, including ones that are not valid UTF-8.
pub fn build_environment<I>(
    inherited: I,
    config: &LintConfig,
    settings: &ViewSettings,
) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: BTreeMap<OsString, OsString> = inherited.into_iter().collect();

    let overrides = [
        (config.toolchain_root_var(), settings.toolchain_root.as_ref()),
        (config.toolchain_path_var(), settings.toolchain_path.as_ref()),
    ];
    for (var, value) in overrides {
        if let Some(value) = value {
            env.insert(OsString::from(var), value.clone().into_os_string());
        }
    }
    env
}
