use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use rowflow_error::{Result, RowflowError};

use crate::runtime::security::SecurityProvider;
use crate::values::scalar::ScalarValue;

pub const DEFAULT_ENCRYPTION_ITERATIONS: u64 = 1000;
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 10;
pub const DEFAULT_PROFILE_DISTRIBUTION_LIMIT: usize = 1000;

/// Ambient configuration passed to every bind.
///
/// Function factories read settings from here instead of global state.
#[derive(Clone)]
pub struct TransformConfig {
    pub encryption_key: String,
    pub encryption_iterations: u64,
    /// Number of levels produced by hierarchy flattening when not
    /// specified on the function.
    pub max_hierarchy_depth: usize,
    /// Maximum number of distinct values tracked by profile functions.
    pub profile_distribution_limit: usize,
    pub security: Option<Arc<dyn SecurityProvider>>,
}

impl fmt::Debug for TransformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformConfig")
            .field("encryption_key", &"<redacted>")
            .field("encryption_iterations", &self.encryption_iterations)
            .field("max_hierarchy_depth", &self.max_hierarchy_depth)
            .field("profile_distribution_limit", &self.profile_distribution_limit)
            .field("security", &self.security.is_some())
            .finish()
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            encryption_key: String::new(),
            encryption_iterations: DEFAULT_ENCRYPTION_ITERATIONS,
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            profile_distribution_limit: DEFAULT_PROFILE_DISTRIBUTION_LIMIT,
            security: None,
        }
    }
}

impl TransformConfig {
    pub fn with_security(mut self, security: Arc<dyn SecurityProvider>) -> Self {
        self.security = Some(security);
        self
    }

    /// Get the security provider, erroring if one wasn't configured.
    pub fn try_security(&self) -> Result<&Arc<dyn SecurityProvider>> {
        self.security
            .as_ref()
            .ok_or_else(|| RowflowError::binding("Missing security provider in transform config"))
    }

    pub fn set_from_scalar(&mut self, name: &str, value: &ScalarValue) -> Result<()> {
        let func = get_setting(name)?;
        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = get_setting(name)?;
        Ok((func.get)(self))
    }

    /// Reset a single setting to its default value.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let func = get_setting(name)?;
        let scalar = (func.get)(&Self::default());
        (func.set)(&scalar, self)
    }

    /// Reset all settings, keeping the security provider.
    pub fn reset_all(&mut self) {
        let security = self.security.take();
        *self = Self::default();
        self.security = security;
    }

    /// Names and descriptions of all settings.
    pub fn settings() -> impl Iterator<Item = (&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, funcs)| (*name, funcs.description))
            .collect();
        settings.sort_unstable();
        settings.into_iter()
    }
}

fn get_setting(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS
        .get(name)
        .ok_or_else(|| RowflowError::new(format!("Missing setting for '{name}'")))
}

struct SettingFunctions {
    description: &'static str,
    set: fn(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()>,
    get: fn(conf: &TransformConfig) -> ScalarValue,
}

impl SettingFunctions {
    const fn new<S: TransformSetting>() -> Self {
        SettingFunctions {
            description: S::DESCRIPTION,
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
        }
    }
}

fn insert_setting<S: TransformSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<EncryptionKey>(&mut map);
    insert_setting::<EncryptionIterations>(&mut map);
    insert_setting::<MaxHierarchyDepth>(&mut map);
    insert_setting::<ProfileDistributionLimit>(&mut map);

    map
});

pub trait TransformSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()>;
    fn get_as_scalar(conf: &TransformConfig) -> ScalarValue;
}

fn validate_range(name: &str, val: usize, min: usize, max: usize) -> Result<()> {
    if val < min || val > max {
        return Err(RowflowError::new(format!(
            "Setting '{name}' must be between {min} and {max}"
        ))
        .with_field("value", val));
    }
    Ok(())
}

pub struct EncryptionKey;

impl TransformSetting for EncryptionKey {
    const NAME: &'static str = "encryption_key";
    const DESCRIPTION: &'static str = "Key passed to the security provider by encrypt and decrypt";

    fn set_from_scalar(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()> {
        conf.encryption_key = scalar.try_into_string()?;
        Ok(())
    }

    fn get_as_scalar(conf: &TransformConfig) -> ScalarValue {
        conf.encryption_key.clone().into()
    }
}

pub struct EncryptionIterations;

impl TransformSetting for EncryptionIterations {
    const NAME: &'static str = "encryption_iterations";
    const DESCRIPTION: &'static str = "Key derivation iterations used by the security provider";

    fn set_from_scalar(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()> {
        let val = scalar.try_as_usize()?;
        validate_range(Self::NAME, val, 1, 10_000_000)?;
        conf.encryption_iterations = val as u64;
        Ok(())
    }

    fn get_as_scalar(conf: &TransformConfig) -> ScalarValue {
        conf.encryption_iterations.into()
    }
}

pub struct MaxHierarchyDepth;

impl TransformSetting for MaxHierarchyDepth {
    const NAME: &'static str = "max_hierarchy_depth";
    const DESCRIPTION: &'static str = "Default number of levels produced by hierarchy flattening";

    fn set_from_scalar(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()> {
        let val = scalar.try_as_usize()?;
        validate_range(Self::NAME, val, 1, 1024)?;
        conf.max_hierarchy_depth = val;
        Ok(())
    }

    fn get_as_scalar(conf: &TransformConfig) -> ScalarValue {
        (conf.max_hierarchy_depth as u64).into()
    }
}

pub struct ProfileDistributionLimit;

impl TransformSetting for ProfileDistributionLimit {
    const NAME: &'static str = "profile_distribution_limit";
    const DESCRIPTION: &'static str = "Maximum distinct values tracked in a profile distribution";

    fn set_from_scalar(scalar: &ScalarValue, conf: &mut TransformConfig) -> Result<()> {
        let val = scalar.try_as_usize()?;
        validate_range(Self::NAME, val, 1, 1_000_000)?;
        conf.profile_distribution_limit = val;
        Ok(())
    }

    fn get_as_scalar(conf: &TransformConfig) -> ScalarValue {
        (conf.profile_distribution_limit as u64).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut conf = TransformConfig::default();
        conf.set_from_scalar("max_hierarchy_depth", &ScalarValue::Int32(4))
            .unwrap();
        assert_eq!(4, conf.max_hierarchy_depth);
        assert_eq!(
            ScalarValue::UInt64(4),
            conf.get_as_scalar("max_hierarchy_depth").unwrap()
        );

        conf.set_from_scalar("encryption_key", &ScalarValue::from("secret"))
            .unwrap();
        assert_eq!("secret", conf.encryption_key);
    }

    #[test]
    fn invalid_values() {
        let mut conf = TransformConfig::default();
        conf.set_from_scalar("max_hierarchy_depth", &ScalarValue::Int32(0))
            .unwrap_err();
        conf.set_from_scalar("encryption_iterations", &ScalarValue::from("many"))
            .unwrap_err();
        conf.set_from_scalar("does_not_exist", &ScalarValue::Int32(1))
            .unwrap_err();
        assert_eq!(DEFAULT_MAX_HIERARCHY_DEPTH, conf.max_hierarchy_depth);
    }

    #[test]
    fn reset_setting() {
        let mut conf = TransformConfig::default();
        conf.profile_distribution_limit = 5;
        conf.max_hierarchy_depth = 3;
        conf.reset("profile_distribution_limit").unwrap();
        assert_eq!(
            DEFAULT_PROFILE_DISTRIBUTION_LIMIT,
            conf.profile_distribution_limit
        );
        assert_eq!(3, conf.max_hierarchy_depth);

        conf.reset_all();
        assert_eq!(DEFAULT_MAX_HIERARCHY_DEPTH, conf.max_hierarchy_depth);
    }

    #[test]
    fn missing_security_provider() {
        let conf = TransformConfig::default();
        assert!(conf.try_security().unwrap_err().is_binding());
    }

    #[test]
    fn list_settings() {
        let names: Vec<_> = TransformConfig::settings().map(|(name, _)| name).collect();
        assert_eq!(
            vec![
                "encryption_iterations",
                "encryption_key",
                "max_hierarchy_depth",
                "profile_distribution_limit"
            ],
            names
        );
    }
}
