use std::sync::Arc;

use rowflow_error::{Result, RowflowError};

use crate::functions::bind::BindContext;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::parameter::{ParamType, ParamValue, ParameterDef, arg};
use crate::functions::scalar::ScalarFunctionImpl;
use crate::functions::{
    FunctionDefinition,
    FunctionImpl,
    FunctionKind,
    FunctionOutput,
    GenericPolicy,
};
use crate::runtime::security::SecurityProvider;
use crate::values::datatype::DataType;
use crate::values::scalar::ScalarValue;

const UTF8: GenericPolicy = GenericPolicy::Fixed(DataType::Utf8);

pub const FUNCTION_ENCRYPT: FunctionDefinition = FunctionDefinition {
    name: "encrypt",
    category: Category::Security,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[ParameterDef::single("value", ParamType::Generic)],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Encrypts a value with the configured key.",
        description: r#"
Encrypts a value using the security provider with the `encryption_key` and
`encryption_iterations` settings. Binding fails if no provider or key is
configured.
"#,
        examples: &[],
    },
    factory: |ctx| bind_keyed(ctx, Direction::Encrypt),
};

pub const FUNCTION_DECRYPT: FunctionDefinition = FunctionDefinition {
    name: "decrypt",
    category: Category::Security,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[ParameterDef::single("value", ParamType::Generic)],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Decrypts a value with the configured key.",
        description: "Decrypts a value produced by `encrypt` using the same settings.",
        examples: &[],
    },
    factory: |ctx| bind_keyed(ctx, Direction::Decrypt),
};

pub const FUNCTION_HASH: FunctionDefinition = FunctionDefinition {
    name: "hash",
    category: Category::Security,
    aliases: &[],
    kind: FunctionKind::Map,
    generic: UTF8,
    inputs: &[ParameterDef::single("value", ParamType::Generic)],
    returns: Some(ParamType::Generic),
    outputs: &[],
    doc: &Documentation {
        summary: "Hashes a value with the security provider.",
        description: "Hashes a value with the security provider.",
        examples: &[],
    },
    factory: |ctx| {
        Ok(FunctionImpl::Map(Box::new(HashValue {
            provider: ctx.config.try_security()?.clone(),
        })))
    },
};

pub const FUNCTION_VALIDATE_HASH: FunctionDefinition = FunctionDefinition {
    name: "validate_hash",
    category: Category::Security,
    aliases: &[],
    kind: FunctionKind::Condition,
    generic: UTF8,
    inputs: &[
        ParameterDef::single("value", ParamType::Generic),
        ParameterDef::single("hash", ParamType::Generic),
    ],
    returns: Some(ParamType::Fixed(DataType::Boolean)),
    outputs: &[],
    doc: &Documentation {
        summary: "Checks a value against a hash.",
        description: "Returns true if the value hashes to the given hash. Null inputs are false.",
        examples: &[Example {
            inputs: "'secret', hash('secret')",
            output: "true",
        }],
    },
    factory: |ctx| {
        Ok(FunctionImpl::Condition(Box::new(ValidateHash {
            provider: ctx.config.try_security()?.clone(),
        })))
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn bind_keyed(ctx: &BindContext, direction: Direction) -> Result<FunctionImpl> {
    let provider = ctx.config.try_security()?.clone();
    if ctx.config.encryption_key.is_empty() {
        return Err(RowflowError::binding("Missing encryption key in transform config"));
    }

    Ok(FunctionImpl::Map(Box::new(Keyed {
        provider,
        direction,
        key: ctx.config.encryption_key.clone(),
        iterations: ctx.config.encryption_iterations,
    })))
}

#[derive(Debug)]
struct Keyed {
    provider: Arc<dyn SecurityProvider>,
    direction: Direction,
    key: String,
    iterations: u64,
}

impl ScalarFunctionImpl for Keyed {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        let value = value.try_as_str()?;
        let out = match self.direction {
            Direction::Encrypt => self.provider.encrypt(value, &self.key, self.iterations)?,
            Direction::Decrypt => self.provider.decrypt(value, &self.key, self.iterations)?,
        };
        Ok(FunctionOutput::value(out))
    }
}

#[derive(Debug)]
struct HashValue {
    provider: Arc<dyn SecurityProvider>,
}

impl ScalarFunctionImpl for HashValue {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let value = arg(args, 0)?;
        if value.is_null() {
            return Ok(FunctionOutput::value(ScalarValue::Null));
        }
        Ok(FunctionOutput::value(self.provider.hash(value.try_as_str()?)?))
    }
}

#[derive(Debug)]
struct ValidateHash {
    provider: Arc<dyn SecurityProvider>,
}

impl ScalarFunctionImpl for ValidateHash {
    fn execute(&self, args: &[ParamValue]) -> Result<FunctionOutput> {
        let (value, hash) = (arg(args, 0)?, arg(args, 1)?);
        if value.is_null() || hash.is_null() {
            return Ok(FunctionOutput::value(false));
        }
        let valid = self
            .provider
            .validate_hash(value.try_as_str()?, hash.try_as_str()?)?;
        Ok(FunctionOutput::value(valid))
    }
}
